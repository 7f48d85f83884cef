use std::sync::Arc;

use chrono::Utc;

use super::{Line, Redactor, StepStatus, StepUpdate};
use crate::{
    adapter::{ReportTarget, StepReporter},
    task::TaskError,
};

/// Drives the status of one step and sends its updates to the reporter.
///
/// The local status only moves after the reporter accepted the update, and an
/// update that would break the lifecycle is refused before anything is sent.
pub struct StepProgress {
    reporter: Arc<dyn StepReporter>,
    target: ReportTarget,
    step_id: String,
    status: StepStatus,
    redactor: Redactor,
}

impl StepProgress {
    pub fn new(
        reporter: Arc<dyn StepReporter>,
        target: ReportTarget,
        step_id: impl Into<String>,
        redactor: Redactor,
    ) -> Self {
        Self {
            reporter,
            target,
            step_id: step_id.into(),
            status: StepStatus::Pending,
            redactor,
        }
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn target(&self) -> &ReportTarget {
        &self.target
    }

    pub fn reporter(&self) -> &Arc<dyn StepReporter> {
        &self.reporter
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// Send an update, checking its status change against the lifecycle.
    ///
    /// `started_at` is stamped when the step leaves `pending` for an active
    /// status and `finished_at` when it enters a terminal one.
    pub async fn report(&mut self, mut update: StepUpdate) -> Result<(), TaskError> {
        update.id.clone_from(&self.step_id);
        if let Some(next) = update.status {
            if self.status.is_terminal() {
                return Err(TaskError::StepAlreadyTerminal(self.status));
            }
            if !self.status.can_transition_to(next) {
                return Err(TaskError::InvalidTransition {
                    from: self.status,
                    to: next,
                });
            }
            let now = Utc::now();
            if self.status == StepStatus::Pending && !next.is_terminal() {
                update.started_at.get_or_insert(now);
            }
            if next.is_terminal() {
                update.finished_at.get_or_insert(now);
            }
        }
        self.redactor.redact_update(&mut update);
        let next = update.status;
        self.reporter.update_step(&self.target, update).await?;
        if let Some(next) = next {
            self.status = next;
        }
        Ok(())
    }

    /// append log lines without touching the status
    pub async fn log(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.report(StepUpdate::new(&self.step_id).message(title, lines))
            .await
    }

    pub async fn running(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.transition(StepStatus::Running, title, lines).await
    }

    pub async fn transition(
        &mut self,
        status: StepStatus,
        title: &str,
        lines: Vec<Line>,
    ) -> Result<(), TaskError> {
        self.report(
            StepUpdate::new(&self.step_id)
                .status(status)
                .message(title, lines),
        )
        .await
    }

    pub async fn succeed(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.transition(StepStatus::Success, title, lines).await
    }

    pub async fn fail(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.transition(StepStatus::Error, title, lines).await
    }

    pub async fn cancel(&mut self, canceled_by: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.report(
            StepUpdate::new(&self.step_id)
                .status(StepStatus::Canceled)
                .canceled_by(canceled_by)
                .message("Cancel", lines),
        )
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reporter::MemoryStepReporter;

    fn progress(reporter: &Arc<MemoryStepReporter>, redactor: Redactor) -> StepProgress {
        StepProgress::new(
            reporter.clone(),
            ReportTarget::new("exec-1", "test"),
            "step-1",
            redactor,
        )
    }

    #[tokio::test]
    async fn test_lifecycle_timestamps() {
        let reporter = Arc::new(MemoryStepReporter::new());
        let mut progress = progress(&reporter, Redactor::default());

        progress.running("Start", vec![Line::new("go")]).await.unwrap();
        progress.log("Work", vec![Line::new("step")]).await.unwrap();
        progress.succeed("Done", vec![]).await.unwrap();

        let updates = reporter.updates("exec-1");
        assert_eq!(updates.len(), 3);
        assert!(updates[0].started_at.is_some());
        assert!(updates[0].finished_at.is_none());
        assert!(updates[1].status.is_none());
        assert!(updates[2].finished_at.is_some());
        assert_eq!(progress.status(), StepStatus::Success);
    }

    #[tokio::test]
    async fn test_refuses_after_terminal() {
        let reporter = Arc::new(MemoryStepReporter::new());
        let mut progress = progress(&reporter, Redactor::default());

        progress.running("Start", vec![]).await.unwrap();
        progress.fail("Error", vec![Line::danger("boom")]).await.unwrap();

        let err = progress.succeed("Done", vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::StepAlreadyTerminal(StepStatus::Error)
        ));
        let err = progress.cancel("test", vec![]).await.unwrap_err();
        assert!(matches!(err, TaskError::StepAlreadyTerminal(_)));
        assert_eq!(reporter.updates("exec-1").len(), 2);
    }

    #[tokio::test]
    async fn test_refuses_invalid_transition() {
        let reporter = Arc::new(MemoryStepReporter::new());
        let mut progress = progress(&reporter, Redactor::default());

        let err = progress.succeed("Done", vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::InvalidTransition {
                from: StepStatus::Pending,
                to: StepStatus::Success
            }
        ));
        assert!(reporter.updates("exec-1").is_empty());
        assert_eq!(progress.status(), StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_reporter_failure_keeps_status() {
        let reporter = Arc::new(MemoryStepReporter::new());
        let mut progress = progress(&reporter, Redactor::default());

        reporter.fail_updates(true);
        let err = progress.running("Start", vec![]).await.unwrap_err();
        assert!(matches!(err, TaskError::Reporting(_)));
        assert_eq!(progress.status(), StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_lines_are_redacted() {
        let reporter = Arc::new(MemoryStepReporter::new());
        let mut progress = progress(&reporter, Redactor::new(["pa55"]));

        progress
            .running("Start", vec![Line::new("connecting with pa55")])
            .await
            .unwrap();

        let record = reporter.step("exec-1", "step-1").unwrap();
        assert_eq!(
            record.lines().next().unwrap().content,
            "connecting with [REDACTED]"
        );
    }
}
