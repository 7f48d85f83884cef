use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
    Canceled,
    InteractionWaiting,
    NoPatternMatch,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Canceled => "canceled",
            Self::InteractionWaiting => "interactionWaiting",
            Self::NoPatternMatch => "noPatternMatch",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Error | Self::Canceled | Self::NoPatternMatch
        )
    }

    /// pending -> running | canceled | error
    /// running -> interactionWaiting | success | error | canceled | noPatternMatch
    /// interactionWaiting -> success | canceled | error
    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        use StepStatus::*;
        matches!(
            (self, next),
            (Pending, Running | Canceled | Error)
                | (
                    Running,
                    InteractionWaiting | Success | Error | Canceled | NoPatternMatch
                )
                | (InteractionWaiting, Success | Canceled | Error)
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "canceled" => Ok(Self::Canceled),
            "interactionWaiting" => Ok(Self::InteractionWaiting),
            "noPatternMatch" => Ok(Self::NoPatternMatch),
            _ => Err(format!("invalid step status: {}", s)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transitions() {
        use StepStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Success));
        assert!(!Pending.can_transition_to(InteractionWaiting));
        assert!(Running.can_transition_to(NoPatternMatch));
        assert!(!Running.can_transition_to(Running));
        assert!(InteractionWaiting.can_transition_to(Canceled));
        assert!(InteractionWaiting.can_transition_to(Error));
        assert!(!InteractionWaiting.can_transition_to(NoPatternMatch));
        for terminal in [Success, Error, Canceled, NoPatternMatch] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Running));
            assert!(!terminal.can_transition_to(Canceled));
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&StepStatus::InteractionWaiting).unwrap(),
            "\"interactionWaiting\""
        );
        let status: StepStatus = serde_json::from_str("\"noPatternMatch\"").unwrap();
        assert_eq!(status, StepStatus::NoPatternMatch);
        assert_eq!("canceled".parse::<StepStatus>(), Ok(StepStatus::Canceled));
        assert!("done".parse::<StepStatus>().is_err());
    }
}
