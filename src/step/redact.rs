use serde_json::Value;

use super::StepUpdate;
use crate::task::Param;

pub const REDACTED: &str = "[REDACTED]";

pub const SECRET_PARAM_TYPE: &str = "password";

/// Masks the values of secret params wherever they appear in reported text.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    // longest first, so a secret containing another one is masked whole
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut secrets = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect::<Vec<_>>();
        secrets.sort();
        secrets.dedup();
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        Self { secrets }
    }

    pub fn from_params(params: &[Param]) -> Self {
        Self::new(
            params
                .iter()
                .filter(|p| p.is_secret())
                .map(|p| p.value.clone()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_owned(), |acc, secret| acc.replace(secret, REDACTED))
    }

    pub fn redact_update(&self, update: &mut StepUpdate) {
        if self.is_empty() {
            return;
        }
        for line in update.lines_mut() {
            if self.secrets.iter().any(|s| line.content.contains(s.as_str())) {
                line.content = self.redact(&line.content);
            }
        }
    }
}

/// Replace the `value` of every password-typed param object found in a JSON
/// document, at any depth.
pub fn redact_secret_params(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_secret = map.get("type").and_then(Value::as_str) == Some(SECRET_PARAM_TYPE);
            if is_secret && map.contains_key("value") {
                map.insert("value".to_owned(), Value::String(REDACTED.to_owned()));
            }
            map.values_mut().for_each(redact_secret_params);
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secret_params),
        _ => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::step::Line;

    #[test]
    fn test_redact_lines() {
        let redactor = Redactor::new(["hunter2", "", "hunter2-long"]);
        let mut update = StepUpdate::new("s").message(
            "Error",
            vec![
                Line::new("login with hunter2-long failed"),
                Line::new("retry hunter2"),
                Line::new("nothing here"),
            ],
        );
        redactor.redact_update(&mut update);
        let lines = update.messages[0]
            .lines
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "login with [REDACTED] failed",
                "retry [REDACTED]",
                "nothing here"
            ]
        );
    }

    #[test]
    fn test_redact_secret_params() {
        let mut value = serde_json::json!({
            "action": {
                "params": [
                    { "key": "user", "value": "root", "type": "text" },
                    { "key": "pass", "value": "s3cret", "type": "password" }
                ]
            }
        });
        redact_secret_params(&mut value);
        assert_eq!(value["action"]["params"][0]["value"], "root");
        assert_eq!(value["action"]["params"][1]["value"], REDACTED);
    }
}
