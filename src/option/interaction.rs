use std::time::Duration;

use serde::Deserialize;

use crate::common;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionOptions {
    /// how often a waiting step is polled, 5s when unset
    #[serde(default)]
    #[serde(rename = "poll-interval")]
    #[serde(deserialize_with = "common::deserialize_with_option_duration")]
    pub poll_interval: Option<Duration>,
}
