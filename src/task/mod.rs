mod context;
mod error;
mod host;
mod request;

pub use context::*;
pub use error::*;
pub use host::*;
pub use request::*;
