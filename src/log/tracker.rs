use chrono::{DateTime, Local};
use colored::Colorize;

/// Identifies one dispatched task in log output: the execution and step it
/// works on, and when the dispatch started.
pub(crate) struct Tracker {
    execution_id: String,
    step_id: String,
    init_time: DateTime<Local>,
}

impl Tracker {
    pub(crate) fn new(execution_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            step_id: step_id.into(),
            init_time: Local::now(),
        }
    }

    pub(crate) fn to_str(&self) -> String {
        format!("{}/{}", self.execution_id, self.step_id)
    }

    pub(crate) fn to_color_str(&self) -> String {
        format!(
            "{}/{}",
            self.execution_id.bright_black(),
            self.step_id.bright_white()
        )
    }

    pub(crate) fn duration(&self) -> std::time::Duration {
        Local::now()
            .signed_duration_since(self.init_time)
            .to_std()
            .unwrap_or_default()
    }
}
