//! 取消与超时

pub mod controller;
pub mod timeout;

pub use controller::{AbortController, AbortSignal};
pub use timeout::with_timeout;
