use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{adapter::ReportTarget, step::SECRET_PARAM_TYPE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    #[serde(rename = "type")]
    pub r#type: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            r#type: "text".to_owned(),
        }
    }

    pub fn secret(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            r#type: SECRET_PARAM_TYPE.to_owned(),
            ..Self::new(key, value)
        }
    }

    pub fn is_secret(&self) -> bool {
        self.r#type == SECRET_PARAM_TYPE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    pub id: String,
    pub name: String,
    pub plugin: String,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRef {
    pub id: String,
    #[serde(default)]
    pub action: ActionSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteTaskRequest {
    pub execution: ExecutionRef,
    pub step: StepRef,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub flow: Value,
    #[serde(default)]
    pub payload: Value,
}

impl ExecuteTaskRequest {
    pub fn new(execution_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        Self {
            execution: ExecutionRef {
                id: execution_id.into(),
            },
            step: StepRef {
                id: step_id.into(),
                action: ActionSpec::default(),
            },
            ..Default::default()
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.step.action.params.push(param);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.step.action.params
    }

    /// value of the last param with `key`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params()
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn target(&self) -> ReportTarget {
        ReportTarget::new(&self.execution.id, &self.platform)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelTaskRequest {
    #[serde(default)]
    pub execution: Option<ExecutionRef>,
    pub step: StepRef,
    /// shown as the canceller of the step
    #[serde(default)]
    pub canceled_by: Option<String>,
}

impl CancelTaskRequest {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step: StepRef {
                id: step_id.into(),
                action: ActionSpec::default(),
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointRequest {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub canceled: bool,
}

impl Response {
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure() -> Self {
        Self::default()
    }

    pub fn canceled() -> Self {
        Self {
            canceled: true,
            ..Default::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamOption {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub key: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub default: String,
    pub required: bool,
    pub description: String,
    pub category: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ParamOption>,
}

impl ParamSpec {
    pub fn new(key: &str, r#type: &str, default: &str, description: &str) -> Self {
        Self {
            key: key.to_owned(),
            r#type: r#type.to_owned(),
            default: default.to_owned(),
            description: description.to_owned(),
            category: "General".to_owned(),
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.options.push(ParamOption {
            key: key.to_owned(),
            value: value.to_owned(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub name: String,
    pub description: String,
    pub plugin: String,
    pub icon: String,
    pub category: String,
    pub params: Vec<ParamSpec>,
}

/// Inbound route of an endpoint plugin on the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub id: String,
    pub name: String,
    pub path: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub version: String,
    pub author: String,
    #[serde(default)]
    pub action: ActionInfo,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointInfo>,
}
