use std::{error::Error, sync::Arc};

use serde_json::Value;

use crate::{
    adapter, info, log,
    step::{Line, StepStatus, StepUpdate},
    task::{PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "actions_check";

const TITLE: &str = "Actions Checks";

/// shown as the canceller when the flow has nothing to run
const CANCELED_BY: &str = "Flow Action Check";

/// `None` when the flow defines no actions at all
fn active_actions(flow: &Value) -> Option<usize> {
    let actions = flow.get("actions")?.as_array()?;
    if actions.is_empty() {
        return None;
    }
    Some(
        actions
            .iter()
            .filter(|action| action.get("active").and_then(Value::as_bool) == Some(true))
            .count(),
    )
}

pub(crate) struct ActionsCheck {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
}

impl ActionsCheck {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        tag: String,
        _options: serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
        Ok(Box::new(Self {
            logger: Arc::new(logger),
            tag,
        }))
    }
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for ActionsCheck {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        super::builtin_info(
            "Actions Check",
            TYPE,
            "Check for actions in flow",
            "hugeicons:blockchain-06",
            "Utility",
            Vec::new(),
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        ctx.running(TITLE, vec![Line::new("Checking for actions in flow")])
            .await?;

        let lines = match active_actions(&ctx.request().flow) {
            Some(count) if count > 0 => {
                info!(
                    self.logger,
                    { tracker = ctx.tracker() },
                    "flow has {} active actions",
                    count
                );
                ctx.succeed(
                    TITLE,
                    vec![Line::success(format!("Found {} actions in flow", count))],
                )
                .await?;
                return Ok(Response::success());
            }
            Some(_) => vec![Line::danger("Flow has no Actions defined. Cancel execution")],
            None => vec![
                Line::danger("Flow has no Actions defined"),
                Line::new("Please add actions to the flow"),
                Line::danger("Cancel execution"),
            ],
        };

        info!(
            self.logger,
            { tracker = ctx.tracker() },
            "flow has no active actions, canceling execution"
        );
        ctx.checkpoint().await?;
        let step_id = ctx.step_id().to_owned();
        ctx.progress_mut()
            .report(
                StepUpdate::new(&step_id)
                    .status(StepStatus::Canceled)
                    .canceled_by(CANCELED_BY)
                    .message(TITLE, lines),
            )
            .await?;
        Ok(Response::failure().with_data("status", StepStatus::Canceled.as_str()))
    }
}
