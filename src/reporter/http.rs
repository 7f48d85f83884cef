use std::{collections::HashMap, sync::Arc, time::Duration};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    adapter::{ReportError, ReportTarget, StepReporter},
    debug, log, option,
    step::{StepRecord, StepStatus, StepUpdate},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

struct Endpoint {
    url: String,
    api_key: Option<String>,
}

/// Step reporter talking to the execution-tracking service over HTTP.
///
/// Each platform has its own base URL and API key.
pub struct HttpStepReporter {
    logger: Arc<Box<dyn log::Logger>>,
    client: Client<HttpConnector, Full<Bytes>>,
    endpoints: HashMap<String, Endpoint>,
    timeout: Duration,
}

// the service answers either with the bare document or wrapped in `data`
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(data) => data,
        }
    }
}

impl HttpStepReporter {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        options: option::HttpReporterOptions,
    ) -> anyhow::Result<Self> {
        let mut endpoints = HashMap::with_capacity(options.endpoints.len());
        for (platform, endpoint) in options.endpoints {
            let url = endpoint.url.trim_end_matches('/').to_owned();
            url.parse::<http::Uri>()
                .map_err(|e| anyhow::anyhow!("invalid url of platform [{}]: {}", platform, e))?;
            endpoints.insert(
                platform,
                Endpoint {
                    url,
                    api_key: endpoint.api_key.filter(|k| !k.is_empty()),
                },
            );
        }
        if endpoints.is_empty() {
            return Err(anyhow::anyhow!("http reporter needs at least one endpoint"));
        }
        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_idle_timeout(Duration::from_secs(90));
        Ok(Self {
            logger: Arc::new(logger),
            client: builder.build_http(),
            endpoints,
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }

    async fn send(
        &self,
        target: &ReportTarget,
        method: http::Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ReportError> {
        let endpoint = self
            .endpoints
            .get(&target.platform)
            .ok_or_else(|| ReportError::UnknownPlatform(target.platform.clone()))?;
        let uri = format!("{}{}", endpoint.url, path);
        debug!(self.logger, "{} {}", method, uri);

        let mut builder = http::Request::builder()
            .method(method)
            .uri(&uri)
            .header(http::header::ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }
        if let Some(api_key) = &endpoint.api_key {
            builder = builder.header(http::header::AUTHORIZATION, api_key);
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ReportError::Transport(e.to_string()))?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ReportError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ReportError::Transport(e.to_string()))?
                .to_bytes();
            Ok::<_, ReportError>((status, body))
        };
        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ReportError::Transport(format!("{} timed out", uri)))??;

        if !status.is_success() {
            return Err(ReportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        target: &ReportTarget,
        path: &str,
    ) -> Result<T, ReportError> {
        let body = self.send(target, http::Method::GET, path, None).await?;
        Ok(serde_json::from_slice::<Envelope<T>>(&body)?.into_inner())
    }

    async fn set_execution_status(
        &self,
        target: &ReportTarget,
        status: StepStatus,
    ) -> Result<(), ReportError> {
        let body = serde_json::to_vec(&serde_json::json!({ "status": status }))?;
        self.send(
            target,
            http::Method::PUT,
            &format!("/api/v1/executions/{}", target.execution_id),
            Some(body),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait::async_trait]
impl StepReporter for HttpStepReporter {
    async fn update_step(
        &self,
        target: &ReportTarget,
        update: StepUpdate,
    ) -> Result<(), ReportError> {
        let body = serde_json::to_vec(&update)?;
        self.send(
            target,
            http::Method::PUT,
            &format!(
                "/api/v1/executions/{}/steps/{}",
                target.execution_id, update.id
            ),
            Some(body),
        )
        .await
        .map(|_| ())
    }

    async fn get_step(
        &self,
        target: &ReportTarget,
        step_id: &str,
    ) -> Result<StepRecord, ReportError> {
        self.get_json(
            target,
            &format!("/api/v1/executions/{}/steps/{}", target.execution_id, step_id),
        )
        .await
    }

    async fn get_steps(&self, target: &ReportTarget) -> Result<Vec<StepRecord>, ReportError> {
        self.get_json(
            target,
            &format!("/api/v1/executions/{}/steps", target.execution_id),
        )
        .await
    }

    async fn set_execution_interaction_required(
        &self,
        target: &ReportTarget,
    ) -> Result<(), ReportError> {
        self.set_execution_status(target, StepStatus::InteractionWaiting)
            .await
    }

    async fn set_execution_running(&self, target: &ReportTarget) -> Result<(), ReportError> {
        self.set_execution_status(target, StepStatus::Running).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn options(url: &str) -> option::HttpReporterOptions {
        serde_yaml::from_str(&format!(
            "endpoints:\n  alertflow:\n    url: {}\n    api-key: key\ntimeout: 2s\n",
            url
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_platform() {
        let reporter =
            HttpStepReporter::new(log::NopLogger.into_box(), options("http://127.0.0.1:1/")).unwrap();
        assert_eq!(reporter.timeout, Duration::from_secs(2));
        assert_eq!(reporter.endpoints["alertflow"].url, "http://127.0.0.1:1");

        let err = reporter
            .get_steps(&ReportTarget::new("exec-1", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::UnknownPlatform(p) if p == "other"));
    }

    #[test]
    fn test_envelope() {
        let wrapped: Envelope<StepRecord> =
            serde_json::from_str(r#"{"data":{"id":"s1","interacted":true}}"#).unwrap();
        assert!(wrapped.into_inner().interacted);
        let bare: Envelope<Vec<StepRecord>> =
            serde_json::from_str(r#"[{"id":"s1"},{"id":"s2"}]"#).unwrap();
        assert_eq!(bare.into_inner().len(), 2);
    }
}
