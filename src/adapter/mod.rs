mod plugin;
mod reporter;

pub use plugin::*;
pub use reporter::*;
