mod waiter;

pub use waiter::*;
