use std::fmt;

use crate::{adapter::ReportError, registry::CancelError, step::StepStatus};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Cancel(#[from] CancelError),
    #[error("step reporting failed: {0}")]
    Reporting(#[from] ReportError),
    #[error("task canceled")]
    Canceled,
    #[error("{0}")]
    Domain(String),
    #[error("invalid param [{key}]: {reason}")]
    InvalidParam { key: String, reason: String },
    #[error("invalid step status transition: {from} -> {to}")]
    InvalidTransition { from: StepStatus, to: StepStatus },
    #[error("step already finished with status {0}")]
    StepAlreadyTerminal(StepStatus),
    #[error("plugin [{0}] not found")]
    PluginNotFound(String),
    #[error("not supported")]
    NotSupported,
}

impl TaskError {
    pub fn domain(err: impl fmt::Display) -> Self {
        Self::Domain(err.to_string())
    }

    pub fn invalid_param(key: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidParam {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// failures of the action itself, as opposed to failures of the
    /// plumbing around it
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_) | Self::InvalidParam { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Cancel(CancelError::NotFound(_)) | Self::PluginNotFound(_))
    }
}
