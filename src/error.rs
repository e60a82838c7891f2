//! Error types for stalepatch
//!
//! Every remote failure is classified into one of the categories the scenario
//! cares about. Two of them (`Conflict` and `PreconditionFailed`) are expected
//! at specific steps of the scenario; everything else is fatal.

use thiserror::Error;

/// Main error type for stalepatch operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Connectivity, authentication, or any unclassified client failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The requested object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// An object with the same name already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The submitted resourceVersion is stale
    #[error("conflict: {0}")]
    Conflict(String),

    /// A client-side precondition rejected a computed patch before submission
    #[error("precondition {precondition} failed for patch: {patch}")]
    PreconditionFailed {
        /// Name of the precondition that rejected the patch
        precondition: String,
        /// The rejected patch document
        patch: String,
    },

    /// The payload was rejected as malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Cluster connection configuration could not be built
    #[error("config error: {0}")]
    Config(String),

    /// A scripted step did not behave the way the scenario requires
    #[error("scenario error: {0}")]
    Scenario(String),
}

impl Error {
    /// Create a transport error with the given message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a not-found error with the given message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an already-exists error with the given message
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a conflict error with the given message
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a precondition failure for the named precondition and patch
    pub fn precondition_failed(precondition: impl Into<String>, patch: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            precondition: precondition.into(),
            patch: patch.into(),
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a config error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a scenario error with the given message
    pub fn scenario(msg: impl Into<String>) -> Self {
        Self::Scenario(msg.into())
    }

    /// True for a stale-resourceVersion rejection
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// True when a client-side precondition blocked a patch
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => match (resp.code, resp.reason.as_str()) {
                (404, _) => Self::NotFound(resp.message),
                (409, "AlreadyExists") => Self::AlreadyExists(resp.message),
                (409, _) => Self::Conflict(resp.message),
                (400, _) | (422, _) => Self::Validation(resp.message),
                (code, reason) => Self::Transport(format!(
                    "{} ({} {})",
                    resp.message, code, reason
                )),
            },
            kube::Error::SerdeError(e) => Self::Serialization(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
