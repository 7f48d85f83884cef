use std::{error::Error, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    adapter, common, debug, log,
    task::{EndpointInfo, EndpointRequest, PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "alertmanager";

const DEFAULT_PLATFORM: &str = "alertflow";

const UNKNOWN_ALERT: &str = "Unknown";

#[derive(Deserialize)]
struct Options {
    /// the only platform whose webhooks are accepted
    #[serde(default = "default_platform")]
    platform: String,
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_owned()
}

impl Default for Options {
    fn default() -> Self {
        Self {
            platform: default_platform(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubAlert {
    name: String,
    status: String,
    labels: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
}

/// An Alertmanager webhook, normalised for the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Alert {
    name: String,
    status: String,
    /// the receiver names the flow the alert is routed to
    flow_id: String,
    plugin: &'static str,
    sub_alerts: Vec<SubAlert>,
    payload: Value,
}

fn lookup_string(value: &Value, path: &str) -> Option<String> {
    common::json_lookup(value, path)
        .filter(|v| !v.is_null())
        .map(common::json_plain_string)
}

fn parse_time(value: &Value, path: &str) -> Option<DateTime<Utc>> {
    let raw = lookup_string(value, path)?;
    DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_alert(body: Value) -> Result<Alert, TaskError> {
    if !body.is_object() {
        return Err(TaskError::domain("body is not a json object"));
    }
    let name = lookup_string(&body, "commonLabels.alertname")
        .or_else(|| lookup_string(&body, "groupLabels.alertname"))
        .unwrap_or_else(|| UNKNOWN_ALERT.to_owned());
    let sub_alerts = body
        .get("alerts")
        .and_then(Value::as_array)
        .map(|alerts| {
            alerts
                .iter()
                .map(|alert| SubAlert {
                    name: lookup_string(alert, "labels.alertname").unwrap_or_default(),
                    status: lookup_string(alert, "status").unwrap_or_default(),
                    labels: alert.get("labels").cloned().unwrap_or(Value::Null),
                    started_at: parse_time(alert, "startsAt"),
                    resolved_at: parse_time(alert, "endsAt"),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Alert {
        name,
        status: lookup_string(&body, "status").unwrap_or_default(),
        flow_id: lookup_string(&body, "receiver").unwrap_or_default(),
        plugin: "Alertmanager",
        sub_alerts,
        payload: body,
    })
}

/// Accepts Alertmanager webhooks; takes no steps.
pub(crate) struct Alertmanager {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
    platform: String,
}

impl Alertmanager {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        tag: String,
        options: serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
        let options = super::parse_options::<Options>(options)?;
        Ok(Box::new(Self {
            logger: Arc::new(logger),
            tag,
            platform: options.platform,
        }))
    }
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for Alertmanager {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        let mut info = super::builtin_info(
            "Alertmanager",
            TYPE,
            "Receive alerts from Prometheus Alertmanager",
            "vscode-icons:file-type-prometheus",
            "Endpoint",
            Vec::new(),
        );
        info.r#type = "endpoint".to_owned();
        info.endpoint = Some(EndpointInfo {
            id: TYPE.to_owned(),
            name: "Alertmanager".to_owned(),
            path: "/alertmanager".to_owned(),
            icon: "vscode-icons:file-type-prometheus".to_owned(),
            color: "#e6522c".to_owned(),
        });
        info
    }

    async fn execute(&self, _ctx: &mut TaskContext) -> Result<Response, TaskError> {
        Err(TaskError::NotSupported)
    }

    async fn endpoint_request(&self, request: EndpointRequest) -> Result<Response, TaskError> {
        if request.platform != self.platform {
            return Err(TaskError::domain(format!(
                "platform [{}] not supported",
                request.platform
            )));
        }
        if request.body.is_null() {
            return Err(TaskError::domain("no body found"));
        }
        let alert = parse_alert(request.body)?;
        debug!(
            self.logger,
            "alert [{}] for flow [{}] with {} sub alerts",
            alert.name,
            alert.flow_id,
            alert.sub_alerts.len()
        );
        let data = serde_json::to_value(&alert).map_err(TaskError::domain)?;
        Ok(Response::success().with_data("alert", data))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_alert_name_fallbacks() {
        let alert = parse_alert(serde_json::json!({
            "groupLabels": { "alertname": "DiskFull" },
            "commonLabels": { "alertname": "HighLoad" }
        }))
        .unwrap();
        assert_eq!(alert.name, "HighLoad");

        let alert =
            parse_alert(serde_json::json!({ "groupLabels": { "alertname": "DiskFull" } })).unwrap();
        assert_eq!(alert.name, "DiskFull");

        let alert = parse_alert(serde_json::json!({ "alerts": [] })).unwrap();
        assert_eq!(alert.name, UNKNOWN_ALERT);
        assert!(alert.sub_alerts.is_empty());

        assert!(parse_alert(serde_json::json!("firing")).is_err());
    }

    #[test]
    fn test_sub_alert_times() {
        let alert = parse_alert(serde_json::json!({
            "alerts": [{
                "status": "resolved",
                "labels": { "alertname": "HighLoad" },
                "startsAt": "2024-03-01T10:00:00Z",
                "endsAt": "not a time"
            }]
        }))
        .unwrap();
        let sub = &alert.sub_alerts[0];
        assert_eq!(sub.status, "resolved");
        assert_eq!(
            sub.started_at.map(|t| t.to_rfc3339()),
            Some("2024-03-01T10:00:00+00:00".to_owned())
        );
        assert_eq!(sub.resolved_at, None);
    }
}
