//! Bounded retry with randomized backoff.

mod controller;
mod types;

pub use controller::RetryController;
pub use types::*;
