use mindgo_core::instruments::mental_health_assessment;
use mindgo_core::{FlowConfig, FlowSession, FlowStatus, RecordStore, ScaleId, Transition};
use mindgo_tests::{TestApp, GAD7_MILD, PHQ9_MODERATE};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn config() -> FlowConfig {
    FlowConfig {
        auto_advance_delay_ms: 300,
        ..FlowConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_auto_advance_through_assessment() -> anyhow::Result<()> {
    let app = TestApp::new();
    let config = config();
    let session = FlowSession::new(app.controller(), &config);
    session.start(mental_health_assessment("assessments")).await?;

    for value in PHQ9_MODERATE.iter().chain(GAD7_MILD.iter()) {
        session.select_option(*value).await?;
        tokio::time::sleep(Duration::from_millis(301)).await;
    }

    assert_eq!(session.status().await, FlowStatus::FlowComplete);
    let records = app.store.get("assessments")?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["phq9"]["score"], 12);
    assert_eq!(records[0]["gad7"]["score"], 8);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_tab_switch_cancels_pending_advance() -> anyhow::Result<()> {
    let app = TestApp::new();
    let session = FlowSession::new(app.controller(), &config());
    session.start(mental_health_assessment("assessments")).await?;

    for value in PHQ9_MODERATE {
        session.select_option(value).await?;
        tokio::time::sleep(Duration::from_millis(350)).await;
    }
    let view = session.view().await.unwrap();
    assert_eq!(view.scale_id, ScaleId::from("gad7"));

    session.select_option(2).await?;
    assert!(session.has_pending_advance().await);
    let transition = session.select_scale(&ScaleId::from("phq9")).await?;
    assert_eq!(transition, Transition::ScaleStarted { scale: ScaleId::from("phq9") });
    assert!(!session.has_pending_advance().await);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let view = session.view().await.unwrap();
    assert_eq!(view.scale_id, ScaleId::from("phq9"));
    assert_eq!(view.current_index, 0);
    assert_eq!(view.running_score, Some(12));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_abandon_cancels_pending_advance() -> anyhow::Result<()> {
    let app = TestApp::new();
    let session = FlowSession::new(app.controller(), &config());
    session.start(mental_health_assessment("assessments")).await?;

    session.select_option(1).await?;
    session.abandon().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(session.status().await, FlowStatus::Abandoned);
    assert!(app.store.get("assessments")?.is_empty());
    assert_eq!(app.events.types().last(), Some(&"flow.abandoned"));
    Ok(())
}
