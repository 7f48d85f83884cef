use std::{future::Future, str::FromStr, sync::Arc, time::Duration};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{ExecuteTaskRequest, TaskError};
use crate::{
    interaction::{InteractionOutcome, InteractionWaiter},
    log,
    registry::CancelTrigger,
    step::{Line, StepProgress, StepRecord, StepStatus},
    warn,
};

/// Everything an action needs while it runs one step: the request, the
/// cancellation trigger of the step and the status reporting of the step.
pub struct TaskContext {
    request: ExecuteTaskRequest,
    trigger: CancelTrigger,
    progress: StepProgress,
    logger: Arc<Box<dyn log::Logger>>,
    tracker: Arc<log::Tracker>,
    source: String,
    poll_interval: Duration,
}

impl TaskContext {
    pub(crate) fn new(
        request: ExecuteTaskRequest,
        trigger: CancelTrigger,
        progress: StepProgress,
        logger: Arc<Box<dyn log::Logger>>,
        tracker: Arc<log::Tracker>,
        source: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            request,
            trigger,
            progress,
            logger,
            tracker,
            source,
            poll_interval,
        }
    }

    pub fn request(&self) -> &ExecuteTaskRequest {
        &self.request
    }

    pub fn step_id(&self) -> &str {
        &self.request.step.id
    }

    pub fn execution_id(&self) -> &str {
        &self.request.execution.id
    }

    pub fn payload(&self) -> &Value {
        &self.request.payload
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.request.param(key)
    }

    /// Parse a param, falling back to `default` when it is missing or blank.
    pub fn param_or<T>(&self, key: &str, default: T) -> Result<T, TaskError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.param(key).map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| TaskError::invalid_param(key, format!("{} ({})", e, raw))),
        }
    }

    pub fn progress(&self) -> &StepProgress {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut StepProgress {
        &mut self.progress
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        self.trigger.token()
    }

    pub fn is_canceled(&self) -> bool {
        self.trigger.is_fired()
    }

    /// name recorded as the canceller of the step
    pub fn canceled_by(&self) -> &str {
        self.trigger.reason().unwrap_or(&self.source)
    }

    pub(crate) fn logger(&self) -> &Arc<Box<dyn log::Logger>> {
        &self.logger
    }

    pub(crate) fn tracker(&self) -> &log::Tracker {
        &self.tracker
    }

    /// Report the step canceled if it is still open.
    pub async fn report_canceled(&mut self) -> Result<(), TaskError> {
        if self.progress.is_terminal() {
            return Ok(());
        }
        let canceled_by = self.canceled_by().to_owned();
        self.progress
            .cancel(&canceled_by, vec![Line::danger("Action canceled")])
            .await
    }

    /// Fails with `TaskError::Canceled` once the step has been canceled,
    /// after reporting it.
    pub async fn checkpoint(&mut self) -> Result<(), TaskError> {
        if !self.is_canceled() {
            return Ok(());
        }
        warn!(
            self.logger,
            { tracker = self.tracker },
            "cancellation observed, canceled by {}",
            self.canceled_by()
        );
        self.report_canceled().await?;
        Err(TaskError::Canceled)
    }

    /// Run `fut` until it completes or the step is canceled, whichever is
    /// first. A canceled future is dropped.
    pub async fn run_cancellable<F>(&mut self, fut: F) -> Result<F::Output, TaskError>
    where
        F: Future,
    {
        let token = self.trigger.token().clone();
        let output = tokio::select! {
            output = fut => Some(output),
            _ = token.cancelled() => None,
        };
        match output {
            Some(output) => Ok(output),
            None => {
                self.checkpoint().await?;
                Err(TaskError::Canceled)
            }
        }
    }

    pub async fn running(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.checkpoint().await?;
        self.progress.running(title, lines).await
    }

    pub async fn log(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.progress.log(title, lines).await
    }

    /// Finish the step with a terminal `status`, unless it was canceled in
    /// the meantime.
    pub async fn finish(
        &mut self,
        status: StepStatus,
        title: &str,
        lines: Vec<Line>,
    ) -> Result<(), TaskError> {
        self.checkpoint().await?;
        self.progress.transition(status, title, lines).await
    }

    pub async fn succeed(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.finish(StepStatus::Success, title, lines).await
    }

    pub async fn fail(&mut self, title: &str, lines: Vec<Line>) -> Result<(), TaskError> {
        self.finish(StepStatus::Error, title, lines).await
    }

    /// every step of the current execution, as the tracking service has them
    pub async fn fetch_steps(&mut self) -> Result<Vec<StepRecord>, TaskError> {
        let reporter = self.progress.reporter().clone();
        let target = self.progress.target().clone();
        Ok(self.run_cancellable(reporter.get_steps(&target)).await??)
    }

    /// Block until the step is approved or rejected, or `timeout_secs`
    /// (0 = no timeout) ran out.
    pub async fn wait_for_interaction(
        &mut self,
        timeout_secs: u64,
    ) -> Result<InteractionOutcome, TaskError> {
        InteractionWaiter::new(timeout_secs)
            .with_poll_interval(self.poll_interval)
            .wait(self)
            .await
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::{
        adapter::StepReporter,
        registry::CancelRegistry,
        step::Redactor,
    };

    /// a context registered in `registry`, as the host would build it
    pub(crate) fn context(
        registry: &CancelRegistry,
        reporter: Arc<dyn StepReporter>,
        request: ExecuteTaskRequest,
        poll_interval: Duration,
    ) -> (TaskContext, crate::registry::Registration) {
        let registration = registry.register(request.step.id.clone());
        let progress = StepProgress::new(
            reporter,
            request.target(),
            request.step.id.clone(),
            Redactor::from_params(request.params()),
        );
        let tracker = Arc::new(log::Tracker::new(
            request.execution.id.clone(),
            request.step.id.clone(),
        ));
        let ctx = TaskContext::new(
            request,
            registration.trigger().clone(),
            progress,
            Arc::new(log::NopLogger.into_box()),
            tracker,
            "test".to_owned(),
            poll_interval,
        );
        (ctx, registration)
    }
}
