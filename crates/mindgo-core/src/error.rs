use thiserror::Error;

/// Core error type for the MindGo flow runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Value is not one of the question's allowed option values
    #[error("Invalid answer {value} for question {question} of scale {scale}")]
    InvalidAnswer {
        /// Scale the question belongs to
        scale: String,
        /// Question index within the scale
        question: usize,
        /// Rejected value
        value: u32,
    },

    /// Question index outside the active scale
    #[error("Question {question} is out of range for scale {scale} ({count} questions)")]
    QuestionOutOfRange {
        /// Scale that was addressed
        scale: String,
        /// Requested question index
        question: usize,
        /// Number of questions in the scale
        count: usize,
    },

    /// Attempted to finish a scale that still has unanswered questions
    #[error("Scale {scale} is incomplete, unanswered questions: {missing:?}")]
    IncompleteScale {
        /// Scale that is incomplete
        scale: String,
        /// Indices still missing an answer
        missing: Vec<usize>,
    },

    /// Attempted to enter a scale whose prerequisite is not complete
    #[error("Scale {scale} requires {prerequisite} to be completed first")]
    PreconditionNotMet {
        /// Target scale
        scale: String,
        /// Prerequisite that is not yet complete
        prerequisite: String,
    },

    /// Scale id not present in the flow definition
    #[error("Unknown scale: {0}")]
    UnknownScale(String),

    /// Operation requires a running flow
    #[error("No active flow: {0}")]
    FlowNotActive(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Navigation collaborator error
    #[error("Navigation error: {0}")]
    NavigationError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Input/output error
    #[error("Input/output error: {0}")]
    IOError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// True for the caller-contract violations the presentation layer is expected to prevent
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAnswer { .. }
                | CoreError::QuestionOutOfRange { .. }
                | CoreError::IncompleteScale { .. }
                | CoreError::PreconditionNotMet { .. }
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::IOError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
