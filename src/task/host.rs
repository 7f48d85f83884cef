use std::{collections::HashMap, sync::Arc, time::Duration};

use super::{
    CancelTaskRequest, EndpointRequest, ExecuteTaskRequest, PluginInfo, Response, TaskContext,
    TaskError,
};
use crate::{
    adapter::{ActionPlugin, StepReporter},
    debug, error, info,
    interaction::DEFAULT_POLL_INTERVAL,
    log,
    registry::CancelRegistry,
    step::{Line, Redactor, StepProgress},
    warn,
};

/// Routes the four dispatch verbs to the registered action plugins.
///
/// Owns the cancellation registry shared by every task of the process.
pub struct PluginHost {
    logger: Arc<Box<dyn log::Logger>>,
    reporter: Arc<dyn StepReporter>,
    registry: CancelRegistry,
    plugins: HashMap<String, Arc<Box<dyn ActionPlugin>>>,
    poll_interval: Duration,
}

impl PluginHost {
    pub fn new(reporter: Arc<dyn StepReporter>) -> Self {
        Self {
            logger: Arc::new(log::NopLogger.into_box()),
            reporter,
            registry: CancelRegistry::new(),
            plugins: HashMap::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub(crate) fn with_logger(mut self, logger: Box<dyn log::Logger>) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn ActionPlugin>) -> anyhow::Result<()> {
        let tag = plugin.tag().to_owned();
        if self.plugins.contains_key(&tag) {
            return Err(anyhow::anyhow!("action plugin [{}] already exists", tag));
        }
        self.plugins.insert(tag, Arc::new(plugin));
        Ok(())
    }

    pub fn registry(&self) -> &CancelRegistry {
        &self.registry
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags = self.plugins.keys().cloned().collect::<Vec<_>>();
        tags.sort();
        tags
    }

    fn plugin(&self, tag: &str) -> Result<Arc<Box<dyn ActionPlugin>>, TaskError> {
        self.plugins
            .get(tag)
            .cloned()
            .ok_or_else(|| TaskError::PluginNotFound(tag.to_owned()))
    }

    pub fn info(&self, tag: &str) -> Result<PluginInfo, TaskError> {
        Ok(self.plugin(tag)?.info())
    }

    /// Run one step with the plugin `tag`.
    ///
    /// The step stays registered for cancellation exactly as long as this
    /// future is alive.
    pub async fn execute_task(
        &self,
        tag: &str,
        request: ExecuteTaskRequest,
    ) -> Result<Response, TaskError> {
        let plugin = self.plugin(tag)?;
        let tracker = Arc::new(log::Tracker::new(
            request.execution.id.clone(),
            request.step.id.clone(),
        ));
        let registration = self.registry.register_owned(tag, request.step.id.clone());
        info!(
            self.logger,
            { tracker = tracker },
            "execute task with plugin [{}]",
            tag
        );

        let progress = StepProgress::new(
            self.reporter.clone(),
            request.target(),
            request.step.id.clone(),
            Redactor::from_params(request.params()),
        );
        let mut ctx = TaskContext::new(
            request,
            registration.trigger().clone(),
            progress,
            self.logger.clone(),
            tracker.clone(),
            tag.to_owned(),
            self.poll_interval,
        );

        let result = match ctx.checkpoint().await {
            Ok(()) => plugin.execute(&mut ctx).await,
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(response) => {
                if !ctx.progress().is_terminal() {
                    warn!(
                        self.logger,
                        { tracker = tracker },
                        "plugin [{}] returned with step still {}",
                        tag,
                        ctx.progress().status()
                    );
                }
                Ok(response)
            }
            Err(TaskError::Canceled) => match ctx.report_canceled().await {
                Ok(()) => Ok(Response::canceled()),
                Err(e) => Err(e),
            },
            Err(e) => {
                let message = ctx.progress().redactor().redact(&e.to_string());
                if !ctx.progress().is_terminal() {
                    if let Err(report_err) = ctx
                        .progress_mut()
                        .fail("Error", vec![Line::danger(message.clone())])
                        .await
                    {
                        warn!(
                            self.logger,
                            { tracker = tracker },
                            "failed to report error status: {}",
                            report_err
                        );
                    }
                }
                if e.is_domain() {
                    Err(TaskError::Domain(message))
                } else {
                    Err(e)
                }
            }
        };
        drop(registration);

        match &result {
            Ok(response) => info!(
                self.logger,
                { tracker = tracker },
                "task finished, success: {}, canceled: {}, cost: {}ms",
                response.success,
                response.canceled,
                tracker.duration().as_millis()
            ),
            Err(e) => error!(
                self.logger,
                { tracker = tracker },
                "task failed: {}, cost: {}ms",
                e,
                tracker.duration().as_millis()
            ),
        }
        result
    }

    /// Fire the cancellation of a running step. Never removes the entry.
    pub fn cancel_task(&self, request: CancelTaskRequest) -> Result<Response, TaskError> {
        match self
            .registry
            .cancel_with_reason(&request.step.id, request.canceled_by.as_deref())
        {
            Ok(()) => {
                info!(self.logger, "cancel task [{}]", request.step.id);
                Ok(Response::success())
            }
            Err(e) => {
                warn!(self.logger, "cancel task [{}]: {}", request.step.id, e);
                Err(e.into())
            }
        }
    }

    /// Like [`cancel_task`](Self::cancel_task), for a step run by the plugin
    /// `tag` only.
    pub fn cancel_plugin_task(
        &self,
        tag: &str,
        request: CancelTaskRequest,
    ) -> Result<Response, TaskError> {
        self.plugin(tag)?;
        match self
            .registry
            .cancel_owned(tag, &request.step.id, request.canceled_by.as_deref())
        {
            Ok(()) => {
                info!(
                    self.logger,
                    "cancel task [{}] of plugin [{}]", request.step.id, tag
                );
                Ok(Response::success())
            }
            Err(e) => {
                warn!(
                    self.logger,
                    "cancel task [{}] of plugin [{}]: {}", request.step.id, tag, e
                );
                Err(e.into())
            }
        }
    }

    pub async fn endpoint_request(
        &self,
        tag: &str,
        request: EndpointRequest,
    ) -> Result<Response, TaskError> {
        let plugin = self.plugin(tag)?;
        debug!(
            self.logger,
            "endpoint request for plugin [{}] from platform [{}]",
            tag,
            request.platform
        );
        plugin.endpoint_request(request).await
    }

    /// cancel every running step, used on shutdown
    pub fn cancel_all(&self, reason: &str) -> usize {
        self.registry.cancel_all(Some(reason))
    }
}

