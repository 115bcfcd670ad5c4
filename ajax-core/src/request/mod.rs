pub mod builder;
pub mod invoke;

pub use builder::{RequestBuilder, append_query, build_body, encode_uri, resolve_url};
pub use invoke::invoke;
