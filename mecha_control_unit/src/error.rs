//! Error types of the control core.
//!
//! No error here is fatal. Each is returned to the caller that made the
//! request, and the callee's state is left exactly as it was.

use thiserror::Error;

/// Task registration failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("task table full ({0} tasks)")]
    TaskTableFull(usize),
}

/// Tunable-parameter access failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("parameter '{0}' is read-only")]
    ReadOnly(String),

    #[error("invalid value {value} for parameter '{name}'")]
    InvalidValue { name: String, value: f64 },
}

impl ParamError {
    /// Stable numeric code reported to configuration front-ends.
    pub const fn code(&self) -> i32 {
        match self {
            Self::UnknownParam(_) => -1,
            Self::ReadOnly(_) => -2,
            Self::InvalidValue { .. } => -3,
        }
    }
}
