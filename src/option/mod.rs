pub mod api;
pub mod interaction;
pub mod log;
pub mod plugin;
pub mod reporter;

pub use api::*;
pub use interaction::*;
pub use log::*;
pub use plugin::*;
pub use reporter::*;

use serde::Deserialize;

#[serde_with::serde_as]
#[derive(Default, Debug, Clone, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub log: LogOptions,
    #[serde(default)]
    pub api: Option<APIServerOptions>,
    #[serde(default)]
    pub reporter: ReporterOptions,
    #[serde(default)]
    pub interaction: InteractionOptions,
    #[serde_as(deserialize_as = "serde_with::OneOrMany<_>")]
    #[serde(default)]
    pub plugins: Vec<PluginOptions>,
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_full_options() {
        let options: Options = serde_yaml::from_str(
            r#"
log:
  level: debug
  disable-color: true
api:
  listen: 0.0.0.0:8080
  secret: s3cret
reporter:
  type: http
  timeout: 3s
  endpoints:
    alertflow:
      url: http://127.0.0.1:8081
      api-key: key
interaction:
  poll-interval: 2
plugins:
  - tag: approve
    type: interaction
    timeout: 30
  - tag: dump
    type: debug
    disabled: true
"#,
        )
        .unwrap();
        assert_eq!(options.log.level, crate::log::Level::Debug);
        assert!(options.log.disable_color);
        assert_eq!(options.api.unwrap().secret.as_deref(), Some("s3cret"));
        match options.reporter {
            ReporterOptions::Http(http) => {
                assert_eq!(http.timeout, Some(Duration::from_secs(3)));
                assert_eq!(http.endpoints["alertflow"].api_key.as_deref(), Some("key"));
            }
            ReporterOptions::Memory => panic!("expected http reporter"),
        }
        assert_eq!(options.interaction.poll_interval, Some(Duration::from_secs(2)));
        assert_eq!(options.plugins.len(), 2);
        assert!(options.plugins[1].disabled);
        let plugin_options = options.plugins[0].options.as_ref().unwrap();
        assert_eq!(plugin_options["timeout"].as_u64(), Some(30));
    }

    #[test]
    fn test_single_plugin_and_defaults() {
        let options: Options = serde_yaml::from_str("plugins:\n  tag: log\n  type: log\n").unwrap();
        assert_eq!(options.plugins.len(), 1);
        assert!(options.api.is_none());
        assert!(matches!(options.reporter, ReporterOptions::Memory));
        assert!(options.interaction.poll_interval.is_none());
    }
}
