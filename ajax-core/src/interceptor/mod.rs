pub mod traits;
pub mod chain;

pub use traits::{RequestInterceptor, ResponseInterceptor, NoOpInterceptor};
pub use chain::{InterceptorChain, InterceptorHandle, Interceptors, run_request_chain, run_response_chain};
