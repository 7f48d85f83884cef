use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 50051))
}

/// Dispatch server the orchestrator calls into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct APIServerOptions {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// expected bearer token, no auth when unset
    #[serde(default)]
    pub secret: Option<String>,
}

impl Default for APIServerOptions {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            secret: None,
        }
    }
}
