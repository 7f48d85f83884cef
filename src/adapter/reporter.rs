use serde::{Deserialize, Serialize};

use crate::step::{StepRecord, StepUpdate};

/// Addresses one execution on one platform of the execution-tracking service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportTarget {
    pub execution_id: String,
    #[serde(default)]
    pub platform: String,
}

impl ReportTarget {
    pub fn new(execution_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            platform: platform.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("platform [{0}] is not configured")]
    UnknownPlatform(String),
    #[error("step [{0}] not found")]
    StepNotFound(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Execution-tracking service the steps report to.
#[async_trait::async_trait]
pub trait StepReporter: Send + Sync {
    /// merge a partial update into the persisted step record
    async fn update_step(&self, target: &ReportTarget, update: StepUpdate)
        -> Result<(), ReportError>;

    async fn get_step(&self, target: &ReportTarget, step_id: &str)
        -> Result<StepRecord, ReportError>;

    async fn get_steps(&self, target: &ReportTarget) -> Result<Vec<StepRecord>, ReportError>;

    /// flag the whole execution as blocked on a user interaction
    async fn set_execution_interaction_required(
        &self,
        target: &ReportTarget,
    ) -> Result<(), ReportError>;

    /// clear the interaction flag set by `set_execution_interaction_required`
    async fn set_execution_running(&self, target: &ReportTarget) -> Result<(), ReportError>;
}
