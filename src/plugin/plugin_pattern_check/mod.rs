use std::{error::Error, fmt, sync::Arc};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    adapter, common, info, log,
    step::{Line, StepStatus},
    task::{PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "pattern_check";

const TITLE: &str = "Pattern Check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PatternType {
    Equals,
    NotEquals,
    Contains,
    NotContains,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => write!(f, "=="),
            Self::NotEquals => write!(f, "!="),
            Self::Contains => write!(f, "contains"),
            Self::NotContains => write!(f, "not contains"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Pattern {
    key: String,
    #[serde(rename = "type")]
    r#type: PatternType,
    #[serde(default)]
    value: String,
}

impl Pattern {
    fn matches(&self, payload: &Value) -> bool {
        let actual = common::json_lookup(payload, &self.key)
            .map(common::json_plain_string)
            .unwrap_or_default();
        match self.r#type {
            PatternType::Equals => actual == self.value,
            PatternType::NotEquals => actual != self.value,
            PatternType::Contains => actual.contains(&self.value),
            PatternType::NotContains => !actual.contains(&self.value),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.r#type, self.value)
    }
}

#[derive(Deserialize, Default)]
struct Options {
    /// checked when the flow defines no patterns
    #[serde(default)]
    patterns: Vec<Pattern>,
}

pub(crate) struct PatternCheck {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
    default_patterns: Vec<Pattern>,
}

impl PatternCheck {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        tag: String,
        options: serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
        let options = super::parse_options::<Options>(options)?;
        Ok(Box::new(Self {
            logger: Arc::new(logger),
            tag,
            default_patterns: options.patterns,
        }))
    }

    fn patterns(&self, flow: &Value) -> Result<Vec<Pattern>, TaskError> {
        match flow.get("patterns") {
            Some(patterns) if !patterns.is_null() => {
                serde_json::from_value::<Vec<Pattern>>(patterns.clone())
                    .map_err(|e| TaskError::invalid_param("flow.patterns", e))
            }
            _ => Ok(self.default_patterns.clone()),
        }
    }
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for PatternCheck {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        super::builtin_info(
            "Pattern Check",
            TYPE,
            "Check flow patterns",
            "solar:list-check-minimalistic-bold",
            "Utility",
            Vec::new(),
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        ctx.running(TITLE, vec![Line::new("Checking patterns")])
            .await?;
        let patterns = self.patterns(&ctx.request().flow)?;
        if patterns.is_empty() {
            ctx.succeed(
                TITLE,
                vec![
                    Line::new("No patterns are defined"),
                    Line::success("Continue to next step"),
                ],
            )
            .await?;
            return Ok(Response::success());
        }

        let mut missed = 0;
        for pattern in &patterns {
            ctx.checkpoint().await?;
            let line = if pattern.matches(ctx.payload()) {
                Line::success(format!("Pattern: {} matched", pattern))
            } else {
                missed += 1;
                Line::danger(format!("Pattern: {} not matched", pattern))
            };
            ctx.log(TITLE, vec![line]).await?;
        }
        info!(
            self.logger,
            { tracker = ctx.tracker() },
            "{} of {} patterns missed",
            missed,
            patterns.len()
        );

        if missed > 0 {
            ctx.finish(
                StepStatus::NoPatternMatch,
                TITLE,
                vec![Line::danger(format!(
                    "{} of {} patterns did not match",
                    missed,
                    patterns.len()
                ))],
            )
            .await?;
            return Ok(Response::failure().with_data("status", StepStatus::NoPatternMatch.as_str()));
        }
        ctx.succeed(
            TITLE,
            vec![
                Line::success("All patterns matched"),
                Line::success("Continue to next step"),
            ],
        )
        .await?;
        Ok(Response::success())
    }
}
