use std::{
    fs, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

#[cfg(feature = "api")]
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{adapter, info, interaction, log, option, plugin, reporter, task, warn};

const SHUTDOWN_REASON: &str = "plugin host shutdown";

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Manager {
    manager_logger: Arc<Box<dyn log::Logger>>,
    host: Arc<task::PluginHost>,
    //
    #[cfg(feature = "api")]
    api_server: Arc<Mutex<Option<super::APIServer>>>,
    //
    is_running: Arc<AtomicBool>,
    started_notify_token: CancellationToken,
}

impl Manager {
    pub fn prepare(options: option::Options) -> anyhow::Result<Self> {
        let root_logger = Arc::new(if options.log.disabled {
            log::NopLogger.into_box()
        } else {
            let mut color_enabled = false;
            let output = match options.log.output.as_str() {
                "" | "stdout" => {
                    color_enabled = true;
                    Box::new(io::stdout()) as Box<dyn io::Write + Send + Sync>
                }
                "stderr" => {
                    color_enabled = true;
                    Box::new(io::stderr()) as Box<dyn io::Write + Send + Sync>
                }
                _ => {
                    let f = fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&options.log.output)
                        .map_err(|err| anyhow::anyhow!("failed to open log file: {}", err))?;
                    Box::new(f) as Box<dyn io::Write + Send + Sync>
                }
            };
            if options.log.disable_color {
                color_enabled = false;
            }
            log::BasicLogger::new(
                options.log.disable_timestamp,
                options.log.level,
                color_enabled,
                output,
            )
            .into_box()
        });
        let manager_logger = Arc::new(
            log::TagLogger::new(root_logger.clone(), "manager".to_owned())
                .with_color(colored::Color::BrightRed)
                .into_box(),
        );

        // Reporter
        let step_reporter: Arc<dyn adapter::StepReporter> = match options.reporter {
            option::ReporterOptions::Memory => {
                warn!(
                    manager_logger,
                    "reporter type is memory, step updates are kept in process"
                );
                Arc::new(reporter::MemoryStepReporter::new())
            }
            #[cfg(feature = "reporter-http")]
            option::ReporterOptions::Http(o) => {
                let logger = log::TagLogger::new(root_logger.clone(), "reporter".to_owned())
                    .with_color(colored::Color::BrightMagenta);
                Arc::new(
                    reporter::HttpStepReporter::new(logger.into_box(), o)
                        .map_err(|err| anyhow::anyhow!("create reporter failed: {}", err))?,
                )
            }
            #[cfg(not(feature = "reporter-http"))]
            option::ReporterOptions::Http(_) => {
                return Err(anyhow::anyhow!(
                    "create reporter failed: http reporter is not supported"
                ));
            }
        };

        // Plugin Host
        let host_logger = log::TagLogger::new(root_logger.clone(), "host".to_owned())
            .with_color(colored::Color::BrightBlue);
        let mut host = task::PluginHost::new(step_reporter)
            .with_logger(host_logger.into_box())
            .with_poll_interval(
                options
                    .interaction
                    .poll_interval
                    .unwrap_or(interaction::DEFAULT_POLL_INTERVAL),
            );

        // Create Action Plugin
        {
            if options.plugins.is_empty() {
                return Err(anyhow::anyhow!("missing action plugin"));
            }
            for (i, o) in options.plugins.into_iter().enumerate() {
                if o.tag.is_empty() {
                    return Err(anyhow::anyhow!(
                        "create action-plugin[{}] failed: missing tag",
                        i
                    ));
                }
                if o.disabled {
                    info!(manager_logger, "action-plugin[{}] disabled, skipped", o.tag);
                    continue;
                }
                let tag = o.tag.clone();
                let logger = log::TagLogger::new(root_logger.clone(), format!("plugin/{}", tag))
                    .with_color(colored::Color::BrightGreen);
                let p = plugin::new_action_plugin(
                    logger.into_box(),
                    tag.clone(),
                    o.r#type,
                    o.options.unwrap_or(serde_yaml::Value::Null),
                )
                .map_err(|err| {
                    anyhow::anyhow!(
                        "create action-plugin[{}](action-plugin[{}]) failed: {}",
                        i,
                        tag,
                        err
                    )
                })?;
                host.add_plugin(p)
                    .map_err(|err| anyhow::anyhow!("create action-plugin[{}] failed: {}", i, err))?;
            }
        }
        let host = Arc::new(host);

        #[cfg(feature = "api")]
        let api_server = {
            // API Server
            options.api.map(|api_options| {
                let logger = log::TagLogger::new(root_logger.clone(), "api-server".to_owned())
                    .with_color(colored::Color::BrightCyan);
                super::APIServer::new(host.clone(), logger.into_box(), api_options)
            })
        };

        Ok(Self {
            manager_logger,
            host,
            #[cfg(feature = "api")]
            api_server: Arc::new(Mutex::new(api_server)),
            is_running: Arc::new(AtomicBool::new(false)),
            started_notify_token: CancellationToken::new(),
        })
    }

    /// the plugin host, for embedding without the dispatch server
    pub fn host(&self) -> Arc<task::PluginHost> {
        self.host.clone()
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!(
            self.manager_logger,
            "action-plugins: [{}]",
            self.host.tags().join(", ")
        );

        #[cfg(feature = "api")]
        {
            // Start API Server
            if let Some(api_server) = self.api_server.lock().await.as_ref() {
                api_server.start().await.map_err(|err| {
                    crate::error!(self.manager_logger, "api-server start failed: {}", err);
                    err
                })?;
            }
        }
        Ok(())
    }

    async fn close(&self) {
        // Cancel Running Task
        {
            let canceled = self.host.cancel_all(SHUTDOWN_REASON);
            if canceled > 0 {
                warn!(self.manager_logger, "canceling {} running tasks...", canceled);
                let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
                while !self.host.registry().is_empty() && tokio::time::Instant::now() < deadline {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                if !self.host.registry().is_empty() {
                    warn!(
                        self.manager_logger,
                        "{} tasks still running after {:?}",
                        self.host.registry().len(),
                        DRAIN_TIMEOUT
                    );
                }
            }
        }

        #[cfg(feature = "api")]
        {
            // Close API Server
            if let Some(api_server) = self.api_server.lock().await.take() {
                info!(self.manager_logger, "api-server closing...");
                api_server.close().await;
                info!(self.manager_logger, "api-server closed");
            }
        }
    }

    pub async fn run(&self, cancel_token: CancellationToken) -> anyhow::Result<()> {
        if self.is_running.swap(true, Ordering::Relaxed) {
            return Err(anyhow::anyhow!("manager is already running"));
        }
        info!(self.manager_logger, "starting...");
        if let Err(e) = self.start().await {
            self.close().await;
            self.is_running.store(false, Ordering::Relaxed);
            return Err(e);
        }
        info!(self.manager_logger, "started");
        self.started_notify_token.cancel();
        cancel_token.cancelled().await;
        warn!(self.manager_logger, "request to close...");
        info!(self.manager_logger, "closing...");
        self.close().await;
        info!(self.manager_logger, "closed");
        self.is_running.store(false, Ordering::Relaxed);
        Ok(())
    }

    pub fn started_notify_token(&self) -> CancellationToken {
        self.started_notify_token.clone()
    }
}
