//! Engine lifecycle errors.
//!
//! These are caller mistakes: the operation is refused, logged, and the
//! engine is left as it was.

use thiserror::Error;

use crate::status::Status;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// `initialise` called on an engine that is not `Uninitialised`.
    #[error("engine already initialised (status {status:?})")]
    AlreadyInitialised { status: Status },

    /// `start` called on an engine that is not `Ready`.
    #[error("engine not ready to start (status {status:?})")]
    NotReady { status: Status },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
