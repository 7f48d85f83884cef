use serde::Deserialize;

/// One configured action plugin; everything besides `tag`, `type` and
/// `disabled` is handed to the plugin creator.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginOptions {
    pub tag: String,
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    #[serde(default)]
    pub options: Option<serde_yaml::Value>,
}
