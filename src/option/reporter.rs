use std::{collections::HashMap, time::Duration};

use serde::Deserialize;

use crate::common;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type")]
pub enum ReporterOptions {
    /// keep step updates in process, for dry runs
    #[default]
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "http")]
    Http(HttpReporterOptions),
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpReporterOptions {
    #[serde(default)]
    #[serde(deserialize_with = "common::deserialize_with_option_duration")]
    pub timeout: Option<Duration>,
    /// platform name -> service endpoint
    pub endpoints: HashMap<String, EndpointOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointOptions {
    pub url: String,
    #[serde(default)]
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,
}
