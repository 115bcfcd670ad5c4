pub mod config;
pub mod data;
pub mod http;

pub use config::{AjaxConfig, AjaxExOptions, AjaxOptions, RequestSpec};
pub use data::{FilePart, FormData, FormValue, RawResponse, RequestData, ResponseBody};
pub use http::{CacheMode, Credentials, HttpMethod, RequestMode};
