use std::{collections::HashMap, error::Error, ops::Deref};

use serde::de::DeserializeOwned;

use crate::{adapter, log, task};

struct ActionPluginCreator(
    Box<
        dyn Fn(
                Box<dyn log::Logger>,
                String,
                serde_yaml::Value,
            ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>>
            + Sync,
    >,
);

impl<F> From<F> for ActionPluginCreator
where
    F: Fn(
            Box<dyn log::Logger>,
            String,
            serde_yaml::Value,
        ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>>
        + Sync
        + 'static,
{
    fn from(value: F) -> Self {
        Self(Box::new(value))
    }
}

impl Deref for ActionPluginCreator {
    type Target = dyn Fn(
        Box<dyn log::Logger>,
        String,
        serde_yaml::Value,
    ) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct PluginMap<T>(HashMap<String, T>);

impl<T> Default for PluginMap<T> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<T> PluginMap<T> {
    fn register<S: Into<String>, C: Into<T>>(&mut self, r#type: S, creator: C) {
        self.0.insert(r#type.into(), creator.into());
    }

    fn get<S: AsRef<str>>(&self, r#type: S) -> Option<&T> {
        self.0.get(r#type.as_ref())
    }

    fn keys(&self) -> Vec<String> {
        let mut keys = self.0.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

lazy_static::lazy_static! {
  static ref ACTION_CREATOR: PluginMap<ActionPluginCreator> = {
    let mut m = PluginMap::default();

    #[cfg(feature = "plugin-interaction")]
    {
        use super::plugin_interaction::{Interaction, TYPE};
        m.register(TYPE, Interaction::new);
    }

    #[cfg(feature = "plugin-log")]
    {
        use super::plugin_log::{Log, TYPE};
        m.register(TYPE, Log::new);
    }

    #[cfg(feature = "plugin-pattern-check")]
    {
        use super::plugin_pattern_check::{PatternCheck, TYPE};
        m.register(TYPE, PatternCheck::new);
    }

    #[cfg(feature = "plugin-port-checker")]
    {
        use super::plugin_port_checker::{PortChecker, TYPE};
        m.register(TYPE, PortChecker::new);
    }

    #[cfg(feature = "plugin-step-analysis")]
    {
        use super::plugin_step_analysis::{StepAnalysis, TYPE};
        m.register(TYPE, StepAnalysis::new);
    }

    #[cfg(feature = "plugin-actions-check")]
    {
        use super::plugin_actions_check::{ActionsCheck, TYPE};
        m.register(TYPE, ActionsCheck::new);
    }

    #[cfg(feature = "plugin-alertmanager")]
    {
        use super::plugin_alertmanager::{Alertmanager, TYPE};
        m.register(TYPE, Alertmanager::new);
    }

    #[cfg(feature = "plugin-debug")]
    {
        use super::plugin_debug::{Debug, TYPE};
        m.register(TYPE, Debug::new);
    }

    m
  };
}

pub(crate) fn new_action_plugin(
    logger: Box<dyn log::Logger>,
    tag: String,
    r#type: String,
    options: serde_yaml::Value,
) -> Result<Box<dyn adapter::ActionPlugin>, Box<dyn Error + Send + Sync>> {
    let creator = ACTION_CREATOR
        .get(&r#type)
        .ok_or::<Box<dyn Error + Send + Sync>>(
            format!("action-plugin type [{}] not found", r#type).into(),
        )?;
    creator(logger, tag, options)
}

pub fn support_action_plugins() -> Vec<String> {
    ACTION_CREATOR.keys()
}

/// Descriptor of a plugin type, built from a default-configured instance.
pub fn action_plugin_info(r#type: &str) -> Result<task::PluginInfo, Box<dyn Error + Send + Sync>> {
    let plugin = new_action_plugin(
        log::NopLogger.into_box(),
        r#type.to_owned(),
        r#type.to_owned(),
        serde_yaml::Value::Null,
    )?;
    Ok(plugin.info())
}

/// Descriptor shared by the built-in plugins, versioned with the crate.
pub(crate) fn builtin_info(
    name: &str,
    r#type: &str,
    description: &str,
    icon: &str,
    category: &str,
    params: Vec<task::ParamSpec>,
) -> task::PluginInfo {
    task::PluginInfo {
        name: name.to_owned(),
        r#type: "action".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        author: env!("CARGO_PKG_AUTHORS").to_owned(),
        action: task::ActionInfo {
            name: name.to_owned(),
            description: description.to_owned(),
            plugin: r#type.to_owned(),
            icon: icon.to_owned(),
            category: category.to_owned(),
            params,
        },
        endpoint: None,
    }
}

/// Plugin options, where an empty mapping counts as no options.
pub(crate) fn parse_options<T>(options: serde_yaml::Value) -> Result<T, Box<dyn Error + Send + Sync>>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() || options.as_mapping().map(|m| m.is_empty()).unwrap_or(false) {
        return Ok(T::default());
    }
    serde_yaml::from_value(options).map_err::<Box<dyn Error + Send + Sync>, _>(|err| {
        format!("failed to deserialize options: {}", err).into()
    })
}
