//! Uniform result of a unit of installer work.
//!
//! Tasks, probes, and collaborators all report through `Outcome` so the
//! pipeline driver can make control-flow decisions (continue, halt, display)
//! without knowing what the work was.

/// Terminal result of a task or probe. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Work completed; may carry an informational message.
    Success { message: Option<String> },
    /// Work completed with a caveat the user should see; the pipeline continues.
    Warning { message: String },
    /// Work failed; the pipeline halts. The message is always non-empty.
    Failure { message: String },
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::Success { message: None }
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Outcome::Success {
            message: Some(message.into()),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Outcome::Warning {
            message: message.into(),
        }
    }

    /// Build a failure. An empty message would leave the user with nothing to
    /// act on, so it is replaced with a fixed placeholder.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "unspecified failure".to_string()
        } else {
            message
        };
        Outcome::Failure { message }
    }

    pub fn succeeded(&self) -> bool {
        !matches!(self, Outcome::Failure { .. })
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Outcome::Warning { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success { message } => message.as_deref(),
            Outcome::Warning { message } | Outcome::Failure { message } => Some(message),
        }
    }
}
