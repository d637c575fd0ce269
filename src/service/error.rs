//! Runtime errors raised by a service.

use crate::core::{ActionError, ActionKind};
use thiserror::Error;

/// Errors that can occur while running a service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("Service has already been started")]
    AlreadyStarted,

    #[error("Service is not running")]
    NotRunning,

    #[error("{kind} action '{action}' on state '{state}' failed: {source}")]
    ActionFailed {
        action: String,
        state: String,
        kind: ActionKind,
        #[source]
        source: ActionError,
    },

    #[error("More than {limit} raised events processed in one step, last was '{event}'")]
    RaiseLimitExceeded { event: String, limit: usize },
}
