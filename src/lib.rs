pub mod adapter;
mod common;
pub mod interaction;
#[allow(hidden_glob_reexports)]
mod log;
pub mod manager;
pub mod option;
pub mod plugin;
pub mod registry;
pub mod reporter;
pub mod step;
pub mod task;

#[cfg(test)]
mod tests;

pub use manager::*;
pub use option::*;
pub use plugin::*;

use shadow_rs::shadow;

shadow!(build_info);
