#[cfg(feature = "reporter-http")]
mod http;
mod memory;

#[cfg(feature = "reporter-http")]
pub use self::http::*;
pub use memory::*;
