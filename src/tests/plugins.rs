use std::{sync::Arc, time::Duration};

use serde_json::{json, Value};

use super::{new_host, new_host_with, FailingReads};
use crate::{
    adapter::ActionPlugin,
    log,
    reporter::MemoryStepReporter,
    step::{ActionRef, Line, Message, StepRecord, StepStatus},
    task::{EndpointRequest, ExecuteTaskRequest, Param, TaskError},
};

fn builtin(tag: &str, r#type: &str, options: &str) -> Box<dyn ActionPlugin> {
    crate::plugin::new_action_plugin(
        log::NopLogger.into_box(),
        tag.to_owned(),
        r#type.to_owned(),
        serde_yaml::from_str(options).unwrap(),
    )
    .unwrap()
}

fn data_status(data: &Option<serde_json::Map<String, Value>>) -> Option<&str> {
    data.as_ref()?.get("status")?.as_str()
}

#[cfg(feature = "plugin-pattern-check")]
#[tokio::test]
async fn test_pattern_miss_ends_with_no_pattern_match() {
    let (host, reporter) = new_host(
        vec![builtin("patterns", "pattern_check", "~")],
        Duration::from_secs(1),
    );
    let mut request = ExecuteTaskRequest::new("e1", "s1");
    request.flow = json!({
        "patterns": [
            { "key": "status", "type": "equals", "value": "firing" },
            { "key": "labels.env", "type": "contains", "value": "prod" }
        ]
    });
    request.payload = json!({ "status": "resolved", "labels": { "env": "prod-eu" } });

    let response = host.execute_task("patterns", request).await.unwrap();
    assert!(!response.success);
    assert_eq!(data_status(&response.data), Some("noPatternMatch"));
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::NoPatternMatch]
    );
    let record = reporter.step("e1", "s1").unwrap();
    assert!(record.finished_at.is_some());
    assert!(record
        .lines()
        .any(|l| l.content == "Pattern: status == firing not matched"));
    assert!(record
        .lines()
        .any(|l| l.content == "Pattern: labels.env contains prod matched"));
    assert!(host.registry().is_empty());
}

#[cfg(feature = "plugin-pattern-check")]
#[tokio::test]
async fn test_all_patterns_match() {
    let (host, reporter) = new_host(
        vec![builtin("patterns", "pattern_check", "~")],
        Duration::from_secs(1),
    );
    let mut request = ExecuteTaskRequest::new("e1", "s1");
    request.flow = json!({ "patterns": [{ "key": "status", "type": "not_equals", "value": "resolved" }] });
    request.payload = json!({ "status": "firing" });

    let response = host.execute_task("patterns", request).await.unwrap();
    assert!(response.success);
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::Success]
    );
}

#[cfg(feature = "plugin-step-analysis")]
fn seeded_step(status: StepStatus) -> StepRecord {
    StepRecord {
        id: "s0".to_owned(),
        action: Some(ActionRef {
            id: "a0".to_owned(),
            name: "Deploy".to_owned(),
            custom_name: String::new(),
        }),
        status,
        messages: vec![Message {
            title: "Deploy".to_owned(),
            lines: vec![Line::new("deploy started"), Line::new("deploy finished: ok")],
        }],
        ..Default::default()
    }
}

#[cfg(feature = "plugin-step-analysis")]
fn analysis_request(action_id: &str, ends_with: &str) -> ExecuteTaskRequest {
    ExecuteTaskRequest::new("e1", "s1")
        .with_param(Param::new("actionID", action_id))
        .with_param(Param::new("condition", "contains"))
        .with_param(Param::new("lineContent", "finished: ok"))
        .with_param(Param::new("endsWith", ends_with))
}

#[cfg(feature = "plugin-step-analysis")]
#[tokio::test]
async fn test_step_analysis_ends_with_chosen_status() {
    let (host, reporter) = new_host(
        vec![builtin("analysis", "step_analysis", "~")],
        Duration::from_secs(1),
    );
    reporter.insert_step("e1", seeded_step(StepStatus::Success));

    let response = host
        .execute_task("analysis", analysis_request("a0", "noPatternMatch"))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::NoPatternMatch]
    );
    let record = reporter.step("e1", "s1").unwrap();
    assert!(record.lines().any(|l| l.content == "Step found: Deploy"));
    assert!(record
        .lines()
        .any(|l| l.content == "Matched line content: deploy finished: ok"));
    assert_eq!(reporter.step("e1", "s0").unwrap().status, StepStatus::Success);
}

#[cfg(feature = "plugin-step-analysis")]
#[tokio::test]
async fn test_step_analysis_without_target_step() {
    let (host, reporter) = new_host(
        vec![builtin("analysis", "step_analysis", "~")],
        Duration::from_secs(1),
    );
    reporter.insert_step("e1", seeded_step(StepStatus::Success));

    let response = host
        .execute_task("analysis", analysis_request("a9", "success"))
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::Error]
    );
    let record = reporter.step("e1", "s1").unwrap();
    assert!(record.lines().any(|l| l.content == "Step not found"));
}

#[cfg(feature = "plugin-step-analysis")]
#[tokio::test]
async fn test_step_analysis_refuses_pending_target() {
    let (host, reporter) = new_host(
        vec![builtin("analysis", "step_analysis", "~")],
        Duration::from_secs(1),
    );
    reporter.insert_step("e1", seeded_step(StepStatus::Pending));

    let response = host
        .execute_task("analysis", analysis_request("a0", "success"))
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::Error]
    );
}

#[cfg(feature = "plugin-step-analysis")]
#[tokio::test]
async fn test_step_analysis_refuses_canceled_as_final_status() {
    let (host, reporter) = new_host(
        vec![builtin("analysis", "step_analysis", "~")],
        Duration::from_secs(1),
    );
    reporter.insert_step("e1", seeded_step(StepStatus::Success));

    let err = host
        .execute_task("analysis", analysis_request("a0", "canceled"))
        .await
        .unwrap_err();
    match err {
        TaskError::Domain(message) => {
            assert!(message.contains("canceled is not a supported final status"))
        }
        e => panic!("unexpected error: {}", e),
    }
    assert_eq!(reporter.statuses("e1"), vec![StepStatus::Error]);
    let record = reporter.step("e1", "s1").unwrap();
    assert!(record.canceled_by.is_none());
    assert!(record.finished_at.is_some());
}

#[cfg(feature = "plugin-step-analysis")]
#[tokio::test]
async fn test_step_analysis_failed_read_ends_step_with_error() {
    let reporter = Arc::new(MemoryStepReporter::new());
    let host = new_host_with(
        vec![builtin("analysis", "step_analysis", "~")],
        Duration::from_secs(1),
        Arc::new(FailingReads(reporter.clone())),
    );

    let err = host
        .execute_task("analysis", analysis_request("a0", "success"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Reporting(_)));
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::Error]
    );
    assert!(host.registry().is_empty());
}

#[cfg(feature = "plugin-interaction")]
#[tokio::test(start_paused = true)]
async fn test_interaction_plugin_auto_approves() {
    let (host, reporter) = new_host(
        vec![builtin("approve", "interaction", "timeout: 30")],
        Duration::from_secs(5),
    );

    let response = host
        .execute_task("approve", ExecuteTaskRequest::new("e1", "s1"))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(
        reporter.statuses("e1"),
        vec![
            StepStatus::Running,
            StepStatus::InteractionWaiting,
            StepStatus::Success
        ]
    );
}

#[cfg(feature = "plugin-interaction")]
#[tokio::test(start_paused = true)]
async fn test_interaction_plugin_rejected() {
    let (host, reporter) = new_host(
        vec![builtin("approve", "interaction", "~")],
        Duration::from_secs(5),
    );

    let task = {
        let host = host.clone();
        tokio::spawn(async move {
            let request =
                ExecuteTaskRequest::new("e1", "s1").with_param(Param::new("Timeout", "0"));
            host.execute_task("approve", request).await
        })
    };
    tokio::time::sleep(Duration::from_secs(7)).await;
    reporter.interact("e1", "s1", false);

    let response = task.await.unwrap().unwrap();
    assert!(!response.success);
    assert_eq!(data_status(&response.data), Some("canceled"));
    assert_eq!(
        reporter.statuses("e1"),
        vec![
            StepStatus::Running,
            StepStatus::InteractionWaiting,
            StepStatus::Canceled
        ]
    );
}

#[cfg(feature = "plugin-actions-check")]
#[tokio::test]
async fn test_flow_without_active_actions_is_canceled() {
    let (host, reporter) = new_host(
        vec![builtin("actions", "actions_check", "~")],
        Duration::from_secs(1),
    );
    let mut request = ExecuteTaskRequest::new("e1", "s1");
    request.flow = json!({ "actions": [{ "id": "a0", "active": false }] });

    let response = host.execute_task("actions", request).await.unwrap();
    assert!(!response.success);
    assert!(!response.canceled);
    assert_eq!(data_status(&response.data), Some("canceled"));
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::Canceled]
    );
    let record = reporter.step("e1", "s1").unwrap();
    assert_eq!(record.canceled_by.as_deref(), Some("Flow Action Check"));
    assert!(record.canceled_at.is_some());
    assert!(record
        .lines()
        .any(|l| l.content == "Flow has no Actions defined. Cancel execution"));
    assert!(host.registry().is_empty());
}

#[cfg(feature = "plugin-actions-check")]
#[tokio::test]
async fn test_flow_with_active_actions_continues() {
    let (host, reporter) = new_host(
        vec![builtin("actions", "actions_check", "~")],
        Duration::from_secs(1),
    );
    let mut request = ExecuteTaskRequest::new("e1", "s1");
    request.flow = json!({ "actions": [{ "active": true }, { "active": false }, { "active": true }] });

    let response = host.execute_task("actions", request).await.unwrap();
    assert!(response.success);
    assert_eq!(
        reporter.statuses("e1"),
        vec![StepStatus::Running, StepStatus::Success]
    );
    let record = reporter.step("e1", "s1").unwrap();
    assert!(record.lines().any(|l| l.content == "Found 2 actions in flow"));
}

#[cfg(feature = "plugin-alertmanager")]
#[tokio::test]
async fn test_alertmanager_endpoint_request() {
    let (host, reporter) = new_host(
        vec![builtin("alerts", "alertmanager", "~")],
        Duration::from_secs(1),
    );
    let body = json!({
        "receiver": "flow-1",
        "status": "firing",
        "commonLabels": { "alertname": "HighLoad" },
        "alerts": [
            {
                "status": "firing",
                "labels": { "alertname": "HighLoad", "instance": "node-1" },
                "startsAt": "2024-05-01T10:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z"
            },
            {
                "status": "resolved",
                "labels": { "alertname": "HighLoad", "instance": "node-2" },
                "startsAt": "2024-05-01T09:00:00Z",
                "endsAt": "2024-05-01T09:30:00Z"
            }
        ]
    });

    let response = host
        .endpoint_request(
            "alerts",
            EndpointRequest {
                platform: "alertflow".to_owned(),
                body: body.clone(),
            },
        )
        .await
        .unwrap();
    assert!(response.success);
    let data = response.data.unwrap();
    let alert = &data["alert"];
    assert_eq!(alert["name"], "HighLoad");
    assert_eq!(alert["status"], "firing");
    assert_eq!(alert["flowId"], "flow-1");
    assert_eq!(alert["plugin"], "Alertmanager");
    assert_eq!(alert["payload"], body);
    let sub_alerts = alert["subAlerts"].as_array().unwrap();
    assert_eq!(sub_alerts.len(), 2);
    assert_eq!(sub_alerts[1]["status"], "resolved");
    assert_eq!(sub_alerts[1]["labels"]["instance"], "node-2");
    assert!(sub_alerts[1].get("resolvedAt").is_some());
    assert!(reporter.updates("e1").is_empty());
    assert!(host.registry().is_empty());

    let info = host.info("alerts").unwrap();
    assert_eq!(info.r#type, "endpoint");
    assert_eq!(info.endpoint.unwrap().path, "/alertmanager");
}

#[cfg(feature = "plugin-alertmanager")]
#[tokio::test]
async fn test_alertmanager_rejects_bad_requests() {
    let (host, _) = new_host(
        vec![builtin("alerts", "alertmanager", "~")],
        Duration::from_secs(1),
    );

    let wrong_platform = EndpointRequest {
        platform: "other".to_owned(),
        body: json!({ "alerts": [] }),
    };
    match host.endpoint_request("alerts", wrong_platform).await {
        Err(TaskError::Domain(message)) => assert_eq!(message, "platform [other] not supported"),
        r => panic!("unexpected result: {:?}", r),
    }

    let no_body = EndpointRequest {
        platform: "alertflow".to_owned(),
        body: Value::Null,
    };
    match host.endpoint_request("alerts", no_body).await {
        Err(TaskError::Domain(message)) => assert_eq!(message, "no body found"),
        r => panic!("unexpected result: {:?}", r),
    }

    let not_object = EndpointRequest {
        platform: "alertflow".to_owned(),
        body: json!(["HighLoad"]),
    };
    assert!(host.endpoint_request("alerts", not_object).await.is_err());
}
