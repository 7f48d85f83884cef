mod plugins;

use std::{sync::Arc, time::Duration};

use crate::{
    adapter::{self, ReportError, ReportTarget, StepReporter},
    reporter::MemoryStepReporter,
    step::{StepRecord, StepUpdate},
    task::{PluginHost, PluginInfo},
};

/// a host with the given plugins over a fresh in-memory reporter
fn new_host(
    plugins: Vec<Box<dyn adapter::ActionPlugin>>,
    poll_interval: Duration,
) -> (Arc<PluginHost>, Arc<MemoryStepReporter>) {
    let reporter = Arc::new(MemoryStepReporter::new());
    (
        new_host_with(plugins, poll_interval, reporter.clone()),
        reporter,
    )
}

fn new_host_with(
    plugins: Vec<Box<dyn adapter::ActionPlugin>>,
    poll_interval: Duration,
    reporter: Arc<dyn StepReporter>,
) -> Arc<PluginHost> {
    let mut host = PluginHost::new(reporter).with_poll_interval(poll_interval);
    for plugin in plugins {
        host.add_plugin(plugin).unwrap();
    }
    Arc::new(host)
}

fn test_info(r#type: &str) -> PluginInfo {
    crate::plugin::builtin_info(r#type, r#type, "test plugin", "", "Test", vec![])
}

/// Accepts updates but cannot read steps back.
struct FailingReads(Arc<MemoryStepReporter>);

fn read_failed() -> ReportError {
    ReportError::Transport("read failed".to_owned())
}

#[async_trait::async_trait]
impl StepReporter for FailingReads {
    async fn update_step(
        &self,
        target: &ReportTarget,
        update: StepUpdate,
    ) -> Result<(), ReportError> {
        self.0.update_step(target, update).await
    }

    async fn get_step(&self, _: &ReportTarget, _: &str) -> Result<StepRecord, ReportError> {
        Err(read_failed())
    }

    async fn get_steps(&self, _: &ReportTarget) -> Result<Vec<StepRecord>, ReportError> {
        Err(read_failed())
    }

    async fn set_execution_interaction_required(
        &self,
        target: &ReportTarget,
    ) -> Result<(), ReportError> {
        self.0.set_execution_interaction_required(target).await
    }

    async fn set_execution_running(&self, target: &ReportTarget) -> Result<(), ReportError> {
        self.0.set_execution_running(target).await
    }
}
