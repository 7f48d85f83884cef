use std::{error::Error, sync::Arc, time::Duration};

use serde::Deserialize;
use tokio::net::TcpStream;

use crate::{
    adapter, debug, log,
    step::{Line, StepStatus},
    task::{ParamSpec, PluginInfo, Response, TaskContext, TaskError},
};

pub(crate) const TYPE: &str = "port_checker";

const TITLE: &str = "Port Checker";

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    22
}

fn default_timeout() -> u64 {
    3
}

#[derive(Deserialize)]
struct Options {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    /// seconds
    #[serde(default = "default_timeout")]
    timeout: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout: default_timeout(),
        }
    }
}

pub(crate) struct PortChecker {
    logger: Arc<Box<dyn log::Logger>>,
    tag: String,
    defaults: Options,
}

impl PortChecker {
    pub(crate) fn new(
        logger: Box<dyn log::Logger>,
        tag: String,
        options: serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
        let defaults = super::parse_options::<Options>(options)?;
        if defaults.timeout == 0 {
            return Err("timeout must be greater than 0".into());
        }
        Ok(Box::new(Self {
            logger: Arc::new(logger),
            tag,
            defaults,
        }))
    }
}

#[async_trait::async_trait]
impl adapter::ActionPlugin for PortChecker {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn r#type(&self) -> &'static str {
        TYPE
    }

    fn info(&self) -> PluginInfo {
        super::builtin_info(
            "Port Checker",
            TYPE,
            "Checks if a port is open",
            "hugeicons:internet-antenna-04",
            "Network",
            vec![
                ParamSpec::new(
                    "Host",
                    "text",
                    &self.defaults.host,
                    "The host to check for the port",
                )
                .required(),
                ParamSpec::new(
                    "Port",
                    "number",
                    &self.defaults.port.to_string(),
                    "The port to check",
                )
                .required(),
                ParamSpec::new(
                    "Timeout",
                    "number",
                    &self.defaults.timeout.to_string(),
                    "Timeout in seconds",
                ),
            ],
        )
    }

    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError> {
        let host = match ctx.param("Host").map(str::trim) {
            Some(host) if !host.is_empty() => host.to_owned(),
            _ => self.defaults.host.clone(),
        };
        let port = ctx.param_or("Port", self.defaults.port)?;
        let timeout = match ctx.param_or("Timeout", self.defaults.timeout)? {
            0 => self.defaults.timeout,
            timeout => timeout,
        };

        ctx.running(
            TITLE,
            vec![
                Line::new("Checking port"),
                Line::new(format!("Host: {}", host)),
                Line::new(format!("Port: {}", port)),
                Line::new(format!("Timeout: {} seconds", timeout)),
            ],
        )
        .await?;

        let address = format!("{}:{}", host, port);
        let connected = ctx
            .run_cancellable(tokio::time::timeout(
                Duration::from_secs(timeout),
                TcpStream::connect(address.as_str()),
            ))
            .await?;
        match connected {
            Ok(Ok(_stream)) => {
                debug!(self.logger, { tracker = ctx.tracker() }, "{} is open", address);
                ctx.succeed(TITLE, vec![Line::success(format!("Port {} is open", port))])
                    .await?;
                Ok(Response::success())
            }
            Ok(Err(e)) => {
                debug!(self.logger, { tracker = ctx.tracker() }, "{} is closed: {}", address, e);
                self.closed(ctx, port, e.to_string()).await
            }
            Err(_) => {
                debug!(self.logger, { tracker = ctx.tracker() }, "{} timed out", address);
                self.closed(ctx, port, format!("no answer within {} seconds", timeout))
                    .await
            }
        }
    }
}

impl PortChecker {
    async fn closed(
        &self,
        ctx: &mut TaskContext,
        port: u16,
        reason: String,
    ) -> Result<Response, TaskError> {
        ctx.finish(
            StepStatus::Error,
            TITLE,
            vec![
                Line::danger(format!("Port {} is closed", port)),
                Line::danger(reason),
            ],
        )
        .await?;
        Ok(Response::failure())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;
    use crate::{
        adapter::ActionPlugin,
        registry::CancelRegistry,
        reporter::MemoryStepReporter,
        task::{test_util, ExecuteTaskRequest, Param},
    };

    fn plugin() -> Box<dyn ActionPlugin> {
        PortChecker::new(
            log::NopLogger.into_box(),
            "port".to_owned(),
            serde_yaml::Value::Null,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_and_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let closed_port = {
            let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
            unused.local_addr().unwrap().port()
        };

        let registry = CancelRegistry::new();
        let reporter = Arc::new(MemoryStepReporter::new());
        let plugin = plugin();

        let request = ExecuteTaskRequest::new("e1", "open")
            .with_param(Param::new("Host", "127.0.0.1"))
            .with_param(Param::new("Port", open_port.to_string()));
        let (mut ctx, _registration) =
            test_util::context(&registry, reporter.clone(), request, Duration::from_secs(1));
        let response = plugin.execute(&mut ctx).await.unwrap();
        assert!(response.success);
        assert_eq!(
            reporter.step("e1", "open").unwrap().status,
            StepStatus::Success
        );

        let request = ExecuteTaskRequest::new("e1", "closed")
            .with_param(Param::new("Host", "127.0.0.1"))
            .with_param(Param::new("Port", closed_port.to_string()));
        let (mut ctx, _registration) =
            test_util::context(&registry, reporter.clone(), request, Duration::from_secs(1));
        let response = plugin.execute(&mut ctx).await.unwrap();
        assert!(!response.success);
        assert!(!response.canceled);
        assert_eq!(
            reporter.step("e1", "closed").unwrap().status,
            StepStatus::Error
        );
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let options = serde_yaml::from_str("timeout: 0").unwrap();
        assert!(PortChecker::new(log::NopLogger.into_box(), "p".to_owned(), options).is_err());
    }
}
