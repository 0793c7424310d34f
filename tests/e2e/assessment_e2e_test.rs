use mindgo_core::instruments::{mental_health_assessment, onboarding_tutorial};
use mindgo_core::{
    is_onboarded, CoreError, FlowConfig, FlowDefinition, FlowStatus, RecordStore, ScaleId,
    Transition, UserIntent,
};
use mindgo_state_inmemory::InMemoryRecordStore;
use mindgo_tests::{TestApp, GAD7_MILD, PHQ9_MODERATE};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_assessment_end_to_end() -> anyhow::Result<()> {
    mindgo_monitoring::init_test_tracing();
    let app = TestApp::new();
    let mut controller = app.controller();
    controller.start(mental_health_assessment("assessments"))?;

    for value in PHQ9_MODERATE {
        controller.dispatch(UserIntent::OptionSelected(value))?;
    }
    assert_eq!(app.navigator.routes(), vec!["gad7".to_string()]);
    assert_eq!(
        app.navigator.last_params(),
        Some(json!({"scale": "phq9", "score": 12}))
    );

    for (i, value) in GAD7_MILD.iter().enumerate() {
        controller.record_answer(*value)?;
        if i + 1 < GAD7_MILD.len() {
            controller.dispatch(UserIntent::Next)?;
        }
    }
    assert_eq!(controller.complete_scale()?, Transition::FlowComplete);

    let records = app.store.get("assessments")?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["phq9"]["score"], 12);
    assert_eq!(records[0]["phq9"]["maxScore"], 27);
    assert_eq!(records[0]["gad7"]["score"], 8);
    assert!(records[0]["duration"].is_u64());

    assert_eq!(
        app.navigator.routes(),
        vec!["gad7".to_string(), "assessment-complete".to_string()]
    );
    let params = app.navigator.last_params().unwrap();
    assert_eq!(params["totalScore"], 20);
    assert_eq!(params["flagged"], false);

    let types = app.events.types();
    assert_eq!(types.first(), Some(&"flow.started"));
    assert_eq!(types.last(), Some(&"flow.completed"));
    assert_eq!(types.iter().filter(|t| **t == "scale.completed").count(), 2);
    Ok(())
}

#[test]
fn test_critical_answer_is_flagged() -> anyhow::Result<()> {
    let app = TestApp::new();
    let mut controller = app.controller();
    controller.start(mental_health_assessment("formalEvaluations"))?;

    let mut answers = PHQ9_MODERATE;
    answers[8] = 2;
    for value in answers {
        controller.submit_answer(value)?;
    }
    for value in GAD7_MILD {
        controller.submit_answer(value)?;
    }
    assert_eq!(controller.status(), FlowStatus::FlowComplete);

    let record = app.store.latest("formalEvaluations")?.unwrap();
    assert_eq!(record["phq9"]["flagged"], json!([8]));
    assert_eq!(record["phq9"]["score"], 14);
    assert_eq!(record["phq9"]["band"], "moderate");
    assert_eq!(app.navigator.last_params().unwrap()["flagged"], true);
    Ok(())
}

#[test]
fn test_gad7_locked_until_phq9_complete() -> anyhow::Result<()> {
    let app = TestApp::new();
    let mut controller = app.controller();
    controller.start(mental_health_assessment("assessments"))?;

    let result = controller.dispatch(UserIntent::SelectScale(ScaleId::from("gad7")));
    assert!(matches!(result, Err(CoreError::PreconditionNotMet { .. })));

    let view = controller.view().unwrap();
    assert_eq!(view.scale_id, ScaleId::from("phq9"));
    assert!(!view.tabs[1].selectable);
    assert!(view.tabs[0].active);
    Ok(())
}

#[test]
fn test_onboarding_marks_patient() -> anyhow::Result<()> {
    let app = TestApp::new();
    let mut controller = app.controller();
    assert!(!is_onboarded(&app.store, "ana")?);

    controller.start(onboarding_tutorial("ana"))?;
    let mut transitions = Vec::new();
    for _ in 0..6 {
        transitions.push(controller.advance()?);
    }
    assert_eq!(transitions[3], Transition::Moved { scale: ScaleId::from("tutorial"), step: 4 });
    assert_eq!(transitions[4], Transition::FlowComplete);
    assert_eq!(transitions[5], Transition::FlowComplete);

    assert!(is_onboarded(&app.store, "ana")?);
    assert_eq!(app.store.len("patient_ana_onboarded"), 1);
    Ok(())
}

#[test]
fn test_configured_collection_and_snapshot() -> anyhow::Result<()> {
    let yaml = r#"
id: check-in
name: Quick check-in
scales:
  - id: mood
    name: Mood
    kind:
      type: questionnaire
      questions:
        - prompt: How is your mood today?
          options:
            - { value: 1, label: Low }
            - { value: 2, label: Neutral }
            - { value: 3, label: Good }
"#;
    let definition = FlowDefinition::from_yaml(yaml)?;
    let config = FlowConfig::from_yaml_str("results_collection: dailyCheckIns\n")?;

    let app = TestApp::new();
    let handler = std::sync::Arc::new(mindgo_core::NoopEventHandler);
    let mut controller = mindgo_core::FlowController::from_config(
        std::sync::Arc::new(app.store.clone()),
        handler,
        &config,
    );
    controller.start(definition)?;
    controller.set_payload("note", json!("slept well"))?;
    assert_eq!(controller.submit_answer(3)?, Transition::FlowComplete);

    let snapshot = app.store.snapshot();
    assert_eq!(snapshot["dailyCheckIns"][0]["mood"]["score"], 3);
    assert_eq!(snapshot["dailyCheckIns"][0]["payload"]["note"], "slept well");

    let restored = InMemoryRecordStore::from_snapshot(&snapshot)?;
    assert_eq!(restored.get("dailyCheckIns")?, app.store.get("dailyCheckIns")?);
    Ok(())
}
