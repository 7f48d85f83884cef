use std::{error::Error, sync::Arc};

use serde::Serialize;

use crate::{
    adapter, debug, log,
    step::{redact_secret_params, Line},
    task::{ParamSpec, PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "debug";

const TITLE: &str = "Debugging";

pub(crate) struct Debug {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
}

impl Debug {
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

fn separator(title: &str) -> Line {
    Line::primary(format!("-------------------- {} --------------------", title))
}

/// Section header plus the value as indented JSON, one line per row, with
/// password params masked.
fn json_lines<T: Serialize>(title: &str, value: &T) -> Result<Vec<Line>, TaskError> {
    let mut value = serde_json::to_value(value).map_err(TaskError::domain)?;
    redact_secret_params(&mut value);
    let pretty = serde_json::to_string_pretty(&value).map_err(TaskError::domain)?;
    let mut lines = vec![separator(title)];
    lines.extend(pretty.lines().map(Line::new));
    Ok(lines)
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for Debug {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        let section = |key: &str, default: &str, description: &str| {
            ParamSpec::new(key, "boolean", default, description)
        };
        super::builtin_info(
            "Debug",
            TYPE,
            "Show information about the flow, execution, step, platform and payload",
            "hugeicons:bug-02",
            "Debug",
            vec![
                section("flow", "true", "Show flow data in the output messages"),
                section("execution", "false", "Show execution data in the output messages"),
                section("step", "false", "Show step data in the output messages"),
                section("platform", "false", "Show platform data in the output messages"),
                section("payload", "false", "Show payload data in the output messages"),
            ],
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        let show_flow = ctx.param_or("flow", true)?;
        let show_execution = ctx.param_or("execution", false)?;
        let show_step = ctx.param_or("step", false)?;
        let show_platform = ctx.param_or("platform", false)?;
        let show_payload = ctx.param_or("payload", false)?;

        ctx.running(TITLE, vec![Line::new("Start Debugging")])
            .await?;

        let request = ctx.request();
        let mut lines = Vec::new();
        if show_flow {
            lines.extend(json_lines("Flow", &request.flow)?);
        }
        if show_execution {
            lines.extend(json_lines("Execution", &request.execution)?);
        }
        if show_step {
            lines.extend(json_lines("Step", &request.step)?);
        }
        if show_platform {
            lines.push(separator("Platform"));
            lines.push(Line::new(format!("Platform: {}", request.platform)));
        }
        if show_payload {
            lines.extend(json_lines("Payload", &request.payload)?);
        }
        if lines.is_empty() {
            lines.push(Line::warning("Nothing selected to show"));
        }
        debug!(
            self.logger,
            { tracker = ctx.tracker() },
            "dumping {} lines",
            lines.len()
        );

        ctx.log(TITLE, lines).await?;
        ctx.succeed(TITLE, vec![Line::success("Debugging finished")])
            .await?;
        Ok(Response::success())
    }
}

#[cfg(test)]
mod test {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_json_lines_redacts() {
        let step = serde_json::json!({
            "id": "s1",
            "action": { "params": [{ "key": "Token", "value": "abc", "type": "password" }] }
        });
        let lines = json_lines("Step", &step).unwrap();
        assert_eq!(
            lines[0].content,
            "-------------------- Step --------------------"
        );
        let text = lines
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("[REDACTED]"));
        assert!(!text.contains("abc"));
        assert!(matches!(serde_json::from_str::<Value>(&text[text.find('{').unwrap()..]), Ok(_)));
    }
}
