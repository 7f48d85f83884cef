use std::{error::Error, sync::Arc};

use serde::Deserialize;

use crate::{
    adapter, info, log,
    step::Line,
    task::{ParamSpec, PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "interaction";

#[derive(Deserialize, Default)]
struct Options {
    /// seconds, used when the step does not set `Timeout`
    #[serde(default)]
    timeout: u64,
}

pub(crate) struct Interaction {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
    default_timeout: u64,
}

impl Interaction {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        tag: String,
        options: serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
        let options = super::parse_options::<Options>(options)?;
        Ok(Box::new(Self {
            logger: Arc::new(logger),
            tag,
            default_timeout: options.timeout,
        }))
    }
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for Interaction {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        super::builtin_info(
            "Interaction",
            TYPE,
            "Wait for user interaction to continue",
            "hugeicons:waving-hand-01",
            "Utility",
            vec![ParamSpec::new(
                "Timeout",
                "number",
                &self.default_timeout.to_string(),
                "Continue to the next step after the specified time (in seconds). 0 to disable",
            )
            .required()],
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        let timeout = ctx.param_or("Timeout", self.default_timeout)?;
        ctx.running("Interaction", vec![Line::new("Interaction requested")])
            .await?;
        let outcome = ctx.wait_for_interaction(timeout).await?;
        info!(
            self.logger,
            { tracker = ctx.tracker() },
            "interaction resolved: {:?}",
            outcome
        );
        Ok(outcome.into_response())
    }
}
