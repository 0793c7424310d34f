//! Built-in instruments
//!
//! PHQ-9 and GAD-7 as questionnaire scales, the combined mental health
//! assessment and the onboarding walkthrough.

use crate::domain::flow_definition::{
    AnswerOption, FlowDefinition, Question, ScaleDefinition, ScaleKind, ScoreBand, WalkthroughStep,
};
use crate::domain::flow_state::{FlowId, ScaleId};
use crate::domain::repository::Collection;

/// Route shown after the PHQ-9 is finished
pub const GAD7_ROUTE: &str = "gad7";

/// Route shown after the whole assessment is finished
pub const ASSESSMENT_COMPLETE_ROUTE: &str = "assessment-complete";

const PHQ9_ITEMS: [&str; 9] = [
    "Little interest or pleasure in doing things",
    "Feeling down, depressed, or hopeless",
    "Trouble falling or staying asleep, or sleeping too much",
    "Feeling tired or having little energy",
    "Poor appetite or overeating",
    "Feeling bad about yourself, or that you are a failure or have let yourself or your family down",
    "Trouble concentrating on things, such as reading the newspaper or watching television",
    "Moving or speaking so slowly that other people could have noticed, or the opposite, being so fidgety or restless that you have been moving around a lot more than usual",
    "Thoughts that you would be better off dead, or of hurting yourself in some way",
];

const GAD7_ITEMS: [&str; 7] = [
    "Feeling nervous, anxious, or on edge",
    "Not being able to stop or control worrying",
    "Worrying too much about different things",
    "Trouble relaxing",
    "Being so restless that it is hard to sit still",
    "Becoming easily annoyed or irritable",
    "Feeling afraid, as if something awful might happen",
];

const TUTORIAL_STEPS: [(&str, &str); 5] = [
    (
        "Welcome to MindGo",
        "MindGo accompanies you between sessions with your psychologist.",
    ),
    (
        "Daily check-in",
        "Record how you feel each day. It takes less than a minute.",
    ),
    (
        "Journal",
        "Write down thoughts and situations you want to talk about.",
    ),
    (
        "Panic button",
        "Use the panic button whenever you need immediate support.",
    ),
    (
        "You are all set",
        "Your psychologist will follow your progress from here.",
    ),
];

/// Frequency options shared by PHQ-9 and GAD-7
pub fn frequency_options() -> Vec<AnswerOption> {
    vec![
        AnswerOption::new(0, "Not at all"),
        AnswerOption::new(1, "Several days"),
        AnswerOption::new(2, "More than half the days"),
        AnswerOption::new(3, "Nearly every day"),
    ]
}

fn band(min: u32, max: u32, label: &str) -> ScoreBand {
    ScoreBand {
        min,
        max,
        label: label.to_string(),
    }
}

fn questionnaire(items: &[&str]) -> ScaleKind {
    let options = frequency_options();
    ScaleKind::Questionnaire {
        questions: items
            .iter()
            .map(|prompt| Question::new(*prompt, options.clone()))
            .collect(),
    }
}

/// Patient Health Questionnaire, nine items; item 9 is critical
pub fn phq9() -> ScaleDefinition {
    let mut kind = questionnaire(&PHQ9_ITEMS);
    if let ScaleKind::Questionnaire { questions } = &mut kind {
        if let Some(last) = questions.last_mut() {
            last.critical = true;
        }
    }

    ScaleDefinition {
        id: ScaleId::from("phq9"),
        name: "PHQ-9".to_string(),
        kind,
        prerequisite: None,
        completion_route: None,
        bands: vec![
            band(0, 4, "minimal"),
            band(5, 9, "mild"),
            band(10, 14, "moderate"),
            band(15, 19, "moderately severe"),
            band(20, 27, "severe"),
        ],
    }
}

/// Generalized Anxiety Disorder scale, seven items
pub fn gad7() -> ScaleDefinition {
    ScaleDefinition {
        id: ScaleId::from("gad7"),
        name: "GAD-7".to_string(),
        kind: questionnaire(&GAD7_ITEMS),
        prerequisite: None,
        completion_route: None,
        bands: vec![
            band(0, 4, "minimal"),
            band(5, 9, "mild"),
            band(10, 14, "moderate"),
            band(15, 21, "severe"),
        ],
    }
}

/// PHQ-9 followed by GAD-7, persisted to `collection`
pub fn mental_health_assessment(collection: impl Into<String>) -> FlowDefinition {
    let mut phq9 = phq9();
    phq9.completion_route = Some(GAD7_ROUTE.to_string());

    let mut gad7 = gad7();
    gad7.prerequisite = Some(phq9.id.clone());

    FlowDefinition {
        id: FlowId::from("mental-health-assessment"),
        name: "Mental health assessment".to_string(),
        description: Some("Depression and anxiety screening".to_string()),
        scales: vec![phq9, gad7],
        result_collection: Some(collection.into()),
        completion_route: Some(ASSESSMENT_COMPLETE_ROUTE.to_string()),
    }
}

/// First-run walkthrough for `username`
pub fn onboarding_tutorial(username: &str) -> FlowDefinition {
    FlowDefinition {
        id: FlowId::from("onboarding-tutorial"),
        name: "Onboarding".to_string(),
        description: None,
        scales: vec![ScaleDefinition {
            id: ScaleId::from("tutorial"),
            name: "Tutorial".to_string(),
            kind: ScaleKind::Walkthrough {
                steps: TUTORIAL_STEPS
                    .iter()
                    .map(|(title, body)| WalkthroughStep::new(*title, *body))
                    .collect(),
            },
            prerequisite: None,
            completion_route: None,
            bands: Vec::new(),
        }],
        result_collection: Some(Collection::Onboarded(username.to_string()).key().into_owned()),
        completion_route: None,
    }
}
