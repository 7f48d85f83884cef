use std::{error::Error, sync::Arc};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    adapter, common, debug, log,
    step::Line,
    task::{ParamSpec, PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "log";

const PAYLOAD_PREFIX: &str = "payload.";

#[derive(Deserialize, Default)]
struct Options {
    /// logged when the step sets no `additionalMessage`
    #[serde(default)]
    message: String,
}

pub(crate) struct Log {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
    default_message: String,
}

impl Log {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        tag: String,
        options: serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
        let options = super::parse_options::<Options>(options)?;
        Ok(Box::new(Self {
            logger: Arc::new(logger),
            tag,
            default_message: options.message,
        }))
    }
}

/// replace every `payload.<path>` word with the value found in the payload
fn resolve_payload_refs(message: &str, payload: &Value) -> String {
    message
        .split(' ')
        .map(|word| match word.strip_prefix(PAYLOAD_PREFIX) {
            Some(path) => common::json_lookup(payload, path)
                .map(common::json_plain_string)
                .unwrap_or_default(),
            None => word.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for Log {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        super::builtin_info(
            "Log Message",
            TYPE,
            "Logs a message in action messages",
            "hugeicons:files-01",
            "Utility",
            vec![ParamSpec::new(
                "additionalMessage",
                "text",
                &self.default_message,
                "Additional message to log. Payload data can be referenced with payload.<key>",
            )],
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        let message = match ctx.param("additionalMessage") {
            Some(message) if !message.is_empty() => message.to_owned(),
            _ => self.default_message.clone(),
        };
        let message = if message.contains(PAYLOAD_PREFIX) {
            resolve_payload_refs(&message, ctx.payload())
        } else {
            message
        };
        debug!(
            self.logger,
            { tracker = ctx.tracker() },
            "additional message: {}",
            message
        );

        let execution_line = format!("Execution ID: {}", ctx.execution_id());
        let step_line = format!("Step ID: {}", ctx.step_id());
        ctx.running(
            "Log",
            vec![
                Line::new("Log Action started"),
                Line::new(execution_line),
                Line::new(step_line),
            ],
        )
        .await?;
        ctx.succeed(
            "Log",
            vec![
                Line::new("Additional Message"),
                Line::new(message),
                Line::success("Log Action finished"),
            ],
        )
        .await?;
        Ok(Response::success())
    }
}
