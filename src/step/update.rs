use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StepStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineColor {
    Success,
    Danger,
    Warning,
    Primary,
}

/// One log line; the color is a rendering hint for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<LineColor>,
    pub timestamp: DateTime<Utc>,
}

impl Line {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            color: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_color(mut self, color: LineColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(content).with_color(LineColor::Success)
    }

    pub fn danger(content: impl Into<String>) -> Self {
        Self::new(content).with_color(LineColor::Danger)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(content).with_color(LineColor::Warning)
    }

    pub fn primary(content: impl Into<String>) -> Self {
        Self::new(content).with_color(LineColor::Primary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub title: String,
    #[serde(default)]
    pub lines: Vec<Line>,
}

/// Partial mutation of a persisted step record. Absent fields are left as
/// they are; messages are appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepUpdate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StepStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interacted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_rejected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
}

impl StepUpdate {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            id: step_id.into(),
            ..Default::default()
        }
    }

    pub fn message(mut self, title: impl Into<String>, lines: Vec<Line>) -> Self {
        self.messages.push(Message {
            title: title.into(),
            lines,
        });
        self
    }

    pub fn status(mut self, status: StepStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    /// interaction result as decided by a user or by the timeout
    pub fn interaction(mut self, approved: bool, rejected: bool) -> Self {
        self.interacted = Some(true);
        self.interaction_approved = Some(approved);
        self.interaction_rejected = Some(rejected);
        self
    }

    pub fn canceled_by(mut self, by: impl Into<String>) -> Self {
        self.canceled_by = Some(by.into());
        self.canceled_at = Some(Utc::now());
        self
    }

    pub(crate) fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.messages.iter_mut().flat_map(|m| m.lines.iter_mut())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionRef {
    pub id: String,
    pub name: String,
    pub custom_name: String,
}

/// Derived view of the interaction flags of a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub interacted: bool,
    pub interaction_approved: bool,
    pub interaction_rejected: bool,
}

/// Persisted state of a step as returned by the reporter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionRef>,
    pub status: StepStatus,
    pub messages: Vec<Message>,
    pub interactive: bool,
    pub interacted: bool,
    pub interaction_approved: bool,
    pub interaction_rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            id: step_id.into(),
            ..Default::default()
        }
    }

    pub fn interaction_state(&self) -> InteractionState {
        InteractionState {
            interacted: self.interacted,
            interaction_approved: self.interaction_approved,
            interaction_rejected: self.interaction_rejected,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.messages.iter().flat_map(|m| m.lines.iter())
    }

    /// merge a partial update the way the tracking service does
    pub fn apply(&mut self, update: &StepUpdate) {
        self.messages.extend(update.messages.iter().cloned());
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.started_at.is_some() {
            self.started_at = update.started_at;
        }
        if update.finished_at.is_some() {
            self.finished_at = update.finished_at;
        }
        if let Some(v) = update.interactive {
            self.interactive = v;
        }
        if let Some(v) = update.interacted {
            self.interacted = v;
        }
        if let Some(v) = update.interaction_approved {
            self.interaction_approved = v;
        }
        if let Some(v) = update.interaction_rejected {
            self.interaction_rejected = v;
        }
        if update.canceled_by.is_some() {
            self.canceled_by = update.canceled_by.clone();
        }
        if update.canceled_at.is_some() {
            self.canceled_at = update.canceled_at;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_update_wire_format() {
        let update = StepUpdate::new("step-1")
            .status(StepStatus::Canceled)
            .canceled_by("Interaction")
            .message("Interaction", vec![Line::danger("Interaction rejected")]);
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["id"], "step-1");
        assert_eq!(value["status"], "canceled");
        assert_eq!(value["canceled_by"], "Interaction");
        assert_eq!(value["messages"][0]["lines"][0]["color"], "danger");
        assert!(value.get("finished_at").is_none());
        assert!(value.get("interacted").is_none());
    }

    #[test]
    fn test_record_apply() {
        let mut record = StepRecord::new("step-1");
        record.apply(&StepUpdate::new("step-1").message("a", vec![Line::new("one")]));
        record.apply(
            &StepUpdate::new("step-1")
                .status(StepStatus::Success)
                .interaction(true, false)
                .message("b", vec![Line::new("two")]),
        );
        assert_eq!(record.status, StepStatus::Success);
        assert_eq!(
            record.lines().map(|l| l.content.as_str()).collect::<Vec<_>>(),
            vec!["one", "two"]
        );
        assert_eq!(
            record.interaction_state(),
            InteractionState {
                interacted: true,
                interaction_approved: true,
                interaction_rejected: false,
            }
        );
    }

    #[test]
    fn test_record_tolerates_sparse_json() {
        let record: StepRecord =
            serde_json::from_str(r#"{"id":"s","status":"running","action":{"id":"a1"}}"#).unwrap();
        assert_eq!(record.status, StepStatus::Running);
        assert_eq!(record.action.unwrap().id, "a1");
        assert!(!record.interacted);
    }
}
