//! Collaborator traits for the MindGo core
//!
//! The flow controller persists results through a `RecordStore` and hands
//! screen changes to a `Navigator`. External crates implement these traits to
//! provide the actual storage and routing.

use crate::CoreError;
use chrono::Utc;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::fmt;

/// Append-only storage of JSON records grouped into named collections
pub trait RecordStore: Send + Sync {
    /// Append `record` to the end of `collection`
    fn append(&self, collection: &str, record: Value) -> Result<(), CoreError>;

    /// All records of `collection` in insertion order, empty if unknown
    fn get(&self, collection: &str) -> Result<Vec<Value>, CoreError>;

    /// Most recently appended record of `collection`
    fn latest(&self, collection: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.get(collection)?.pop())
    }
}

/// Named-route navigation
pub trait Navigator: Send + Sync {
    /// Show the screen registered under `route`
    fn go_to(&self, route: &str, params: Option<Value>) -> Result<(), CoreError>;
}

/// Well-known storage collections
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Daily mood check-ins
    DailyCheckIns,
    /// Free-text journal entries
    JournalEntries,
    /// Evaluations recorded by the psychologist
    FormalEvaluations,
    /// Panic button activations
    PanicButtonLogs,
    /// Questionnaire results
    Assessments,
    /// Note written during the first session
    InitialNote,
    /// Baseline evaluation results
    BaselineEvaluation,
    /// Streak counter
    PatientStreak,
    /// Onboarding flag of one patient
    Onboarded(String),
    /// Any other collection
    Custom(String),
}

impl Collection {
    /// Storage key of the collection
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            Collection::DailyCheckIns => Cow::Borrowed("dailyCheckIns"),
            Collection::JournalEntries => Cow::Borrowed("journalEntries"),
            Collection::FormalEvaluations => Cow::Borrowed("formalEvaluations"),
            Collection::PanicButtonLogs => Cow::Borrowed("panicButtonLogs"),
            Collection::Assessments => Cow::Borrowed("assessments"),
            Collection::InitialNote => Cow::Borrowed("initialNote"),
            Collection::BaselineEvaluation => Cow::Borrowed("baselineEvaluation"),
            Collection::PatientStreak => Cow::Borrowed("patientStreak"),
            Collection::Onboarded(username) => Cow::Owned(format!("patient_{}_onboarded", username)),
            Collection::Custom(name) => Cow::Borrowed(name.as_str()),
        }
    }

    /// Map a storage key back to a collection
    pub fn from_key(key: &str) -> Self {
        match key {
            "dailyCheckIns" => Collection::DailyCheckIns,
            "journalEntries" => Collection::JournalEntries,
            "formalEvaluations" => Collection::FormalEvaluations,
            "panicButtonLogs" => Collection::PanicButtonLogs,
            "assessments" => Collection::Assessments,
            "initialNote" => Collection::InitialNote,
            "baselineEvaluation" => Collection::BaselineEvaluation,
            "patientStreak" => Collection::PatientStreak,
            other => match other
                .strip_prefix("patient_")
                .and_then(|rest| rest.strip_suffix("_onboarded"))
            {
                Some(username) if !username.is_empty() => {
                    Collection::Onboarded(username.to_string())
                }
                _ => Collection::Custom(other.to_string()),
            },
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Record that `username` finished onboarding
pub fn mark_onboarded(store: &dyn RecordStore, username: &str) -> Result<(), CoreError> {
    let collection = Collection::Onboarded(username.to_string());
    store.append(
        &collection.key(),
        json!({ "onboarded": true, "at": Utc::now().to_rfc3339() }),
    )
}

/// True once `username` has an onboarding record
pub fn is_onboarded(store: &dyn RecordStore, username: &str) -> Result<bool, CoreError> {
    let collection = Collection::Onboarded(username.to_string());
    Ok(store
        .latest(&collection.key())?
        .map_or(false, |record| match &record {
            Value::Bool(flag) => *flag,
            Value::Object(map) => map.get("onboarded").and_then(Value::as_bool).unwrap_or(true),
            _ => true,
        }))
}
