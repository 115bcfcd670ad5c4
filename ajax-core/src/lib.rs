//! 带请求去重、超时取消和拦截器的 Ajax 客户端
//!
//! ```no_run
//! use ajax_core::{Ajax, AjaxConfig, AjaxOptions, HttpMethod};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), ajax_core::OperationError> {
//! let ajax = Ajax::new(AjaxOptions {
//!     base_url: Some("https://api.example.com".into()),
//!     ..Default::default()
//! });
//!
//! let users = ajax
//!     .ajax(
//!         AjaxConfig::new("/users")
//!             .method(HttpMethod::Get)
//!             .data(json!({"page": 1})),
//!     )
//!     .await?;
//! println!("{users}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cancel;
pub mod client;
pub mod error;
pub mod fingerprint;
pub mod interceptor;
pub mod message;
pub mod request;
pub mod transport;
pub mod types;

pub use cache::{AjaxFuture, AjaxResult, CachePolicy};
pub use cancel::{AbortController, AbortSignal};
pub use client::{AbortResult, Ajax, AjaxBuilder, ClientState};
pub use error::{ErrorCause, ErrorKind, OperationError, TransportError};
pub use fingerprint::fingerprint;
pub use interceptor::{
    InterceptorHandle, NoOpInterceptor, RequestInterceptor, ResponseInterceptor,
};
pub use message::{LogSink, MessageSink};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::{
    AjaxConfig, AjaxExOptions, AjaxOptions, CacheMode, Credentials, FilePart, FormData, FormValue,
    HttpMethod, RawResponse, RequestData, RequestMode, RequestSpec, ResponseBody,
};
