mod progress;
mod redact;
mod status;
mod update;

pub use progress::*;
pub use redact::*;
pub use status::*;
pub use update::*;
