#[cfg(feature = "api")]
mod api;

mod manager;

#[cfg(feature = "api")]
use api::*;

pub use manager::*;

pub fn support_api() -> bool {
    cfg_if::cfg_if! {
      if #[cfg(feature = "api")] {
        true
      } else {
        false
      }
    }
}

pub fn support_http_reporter() -> bool {
    cfg_if::cfg_if! {
      if #[cfg(feature = "reporter-http")] {
        true
      } else {
        false
      }
    }
}
