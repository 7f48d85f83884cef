mod plugin;

pub use plugin::*;

// Plugin

#[cfg(feature = "plugin-interaction")]
mod plugin_interaction;

#[cfg(feature = "plugin-log")]
mod plugin_log;

#[cfg(feature = "plugin-pattern-check")]
mod plugin_pattern_check;

#[cfg(feature = "plugin-port-checker")]
mod plugin_port_checker;

#[cfg(feature = "plugin-step-analysis")]
mod plugin_step_analysis;

#[cfg(feature = "plugin-actions-check")]
mod plugin_actions_check;

#[cfg(feature = "plugin-alertmanager")]
mod plugin_alertmanager;

#[cfg(feature = "plugin-debug")]
mod plugin_debug;
