use std::{error::Error, str::FromStr, sync::Arc};

use crate::{
    adapter, info, log,
    step::{Line, StepRecord, StepStatus},
    task::{ParamSpec, PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "step_analysis";

const TITLE: &str = "Step Analysis";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Match,
    NotMatch,
    Contains,
    NotContains,
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match" => Ok(Self::Match),
            "notMatch" | "not_match" => Ok(Self::NotMatch),
            "contains" => Ok(Self::Contains),
            "notContains" | "not_contains" => Ok(Self::NotContains),
            _ => Err(format!("unknown condition: {}", s)),
        }
    }
}

enum Matcher {
    Regex(regex::Regex),
    Line {
        condition: Condition,
        content: String,
    },
}

impl Matcher {
    /// first line of the step that satisfies the matcher, with whether the
    /// condition holds
    fn check<'a>(&self, step: &'a StepRecord) -> (bool, Option<&'a str>) {
        let find = |pred: &dyn Fn(&str) -> bool| {
            step.lines()
                .map(|line| line.content.as_str())
                .find(|content| pred(*content))
        };
        match self {
            Self::Regex(regex) => {
                let found = find(&|content| regex.is_match(content));
                (found.is_some(), found)
            }
            Self::Line { condition, content } => match condition {
                Condition::Match => {
                    let found = find(&|line| line == content);
                    (found.is_some(), found)
                }
                Condition::NotMatch => {
                    let found = find(&|line| line == content);
                    (found.is_none(), found)
                }
                Condition::Contains => {
                    let found = find(&|line| line.contains(content.as_str()));
                    (found.is_some(), found)
                }
                Condition::NotContains => {
                    let found = find(&|line| line.contains(content.as_str()));
                    (found.is_none(), found)
                }
            },
        }
    }
}

pub(crate) struct StepAnalysis {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
}

impl StepAnalysis {
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

    fn matcher(ctx: &TaskContext) -> Result<Matcher, TaskError> {
        if ctx.param_or("regex", false)? {
            let pattern = ctx.param("regexPattern").unwrap_or_default();
            if pattern.is_empty() {
                return Err(TaskError::invalid_param("regexPattern", "must not be empty"));
            }
            let regex =
                regex::Regex::new(pattern).map_err(|e| TaskError::invalid_param("regexPattern", e))?;
            return Ok(Matcher::Regex(regex));
        }
        Ok(Matcher::Line {
            condition: ctx.param_or("condition", Condition::Match)?,
            content: ctx.param("lineContent").unwrap_or_default().to_owned(),
        })
    }

    /// one of the `endsWith` options of the descriptor
    fn ends_with(ctx: &TaskContext) -> Result<StepStatus, TaskError> {
        let status = ctx.param_or("endsWith", StepStatus::Success)?;
        match status {
            StepStatus::Success | StepStatus::Error | StepStatus::NoPatternMatch => Ok(status),
            _ => Err(TaskError::invalid_param(
                "endsWith",
                format!("{} is not a supported final status", status),
            )),
        }
    }
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for StepAnalysis {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        super::builtin_info(
            "Step Analysis",
            TYPE,
            "Analyse the previous steps and their messages",
            "hugeicons:package-search",
            "Utility",
            vec![
                ParamSpec::new("actionID", "text", "", "ID of the action to analyse").required(),
                ParamSpec::new(
                    "endsWith",
                    "select",
                    "success",
                    "Choose in which status the step should end if the message matches",
                )
                .required()
                .option("success", "Success")
                .option("error", "Error")
                .option("noPatternMatch", "No Pattern Match"),
                ParamSpec::new("regex", "boolean", "false", "Regex to match the messages")
                    .required()
                    .category("Regex"),
                ParamSpec::new(
                    "regexPattern",
                    "text",
                    "",
                    "Regex pattern to match the messages",
                )
                .category("Regex"),
                ParamSpec::new(
                    "lineContent",
                    "text",
                    "",
                    "Content of the line to check for. If regex is true, this will be ignored",
                )
                .category("Line Check"),
                ParamSpec::new(
                    "condition",
                    "select",
                    "match",
                    "Condition to match for the message lines. If regex is true, this will be ignored",
                )
                .required()
                .category("Line Check")
                .option("match", "Match")
                .option("notMatch", "Not Match")
                .option("contains", "Contains")
                .option("notContains", "Not Contains"),
            ],
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        let action_id = ctx.param("actionID").unwrap_or_default().to_owned();
        let matcher = Self::matcher(ctx)?;
        let ends_with = Self::ends_with(ctx)?;

        ctx.running(
            TITLE,
            vec![
                Line::new("Starting step analysis"),
                Line::new("Requesting all steps for the current execution"),
            ],
        )
        .await?;
        let steps = ctx.fetch_steps().await?;
        ctx.log(
            TITLE,
            vec![
                Line::new(format!(
                    "Received {} total steps for further analysis",
                    steps.len()
                )),
                Line::new(format!(
                    "Filtering steps based on the provided action ID: {}",
                    action_id
                )),
            ],
        )
        .await?;

        let target = steps.iter().find(|step| {
            step.action
                .as_ref()
                .is_some_and(|action| !action_id.is_empty() && action.id == action_id)
        });
        let Some(target) = target else {
            ctx.fail(TITLE, vec![Line::danger("Step not found")]).await?;
            return Ok(Response::failure());
        };
        let step_name = target
            .action
            .as_ref()
            .map(|action| {
                if action.custom_name.is_empty() {
                    action.name.clone()
                } else {
                    action.custom_name.clone()
                }
            })
            .unwrap_or_default();
        ctx.log(
            TITLE,
            vec![Line::success(format!("Step found: {}", step_name))],
        )
        .await?;

        if target.status == StepStatus::Pending {
            ctx.fail(
                TITLE,
                vec![Line::danger(
                    "Step is in pending state. Please select a step that has finished",
                )],
            )
            .await?;
            return Ok(Response::failure());
        }

        let (satisfied, line) = matcher.check(target);
        info!(
            self.logger,
            { tracker = ctx.tracker() },
            "analysed step [{}], condition satisfied: {}",
            target.id,
            satisfied
        );
        let mut lines = vec![if satisfied {
            Line::success("Step messages satisfy the condition")
        } else {
            Line::danger("Step messages do not satisfy the condition")
        }];
        if let Some(line) = line {
            lines.push(Line::new(format!("Matched line content: {}", line)));
        }

        if satisfied {
            ctx.finish(ends_with, TITLE, lines).await?;
            Ok(Response::success())
        } else {
            ctx.fail(TITLE, lines).await?;
            Ok(Response::failure())
        }
    }
}
