mod canceller;
#[cfg(feature = "api")]
mod http;
mod json;
mod serde;

pub(crate) use canceller::*;
#[cfg(feature = "api")]
pub(crate) use http::*;
pub(crate) use json::*;
pub(crate) use serde::*;
