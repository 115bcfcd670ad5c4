//! 传输层
//!
//! [`Transport`] 是唯一真正发出网络请求的地方，默认实现基于 reqwest。
//! 测试或特殊环境下可以换成自己的实现。

pub mod client;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

use crate::cancel::AbortSignal;
use crate::error::TransportError;
use crate::types::{
    CacheMode, Credentials, FormData, HttpMethod, RawResponse, RequestMode, ResponseBody,
};

pub use client::ReqwestTransport;

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Text(String),
    Form(FormData),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Text(text) => text.is_empty(),
            RequestBody::Form(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// 已经完全解析好的请求
///
/// `credentials` 与 `mode` 原样带给传输层，是否生效由具体实现决定。
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub credentials: Credentials,
    pub mode: RequestMode,
    pub cache: Option<CacheMode>,
}

/// 传输层返回的响应，响应体已经读完
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    /// 状态码在 200..300 之间
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"))
    }

    /// 成功响应：先尝试按 JSON 解析，失败就返回文本
    pub fn parse_body(&self) -> ResponseBody {
        let text = self.text();
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// 失败响应：content-type 是 JSON 才解析，否则返回文本
    pub fn parse_error_body(&self) -> ResponseBody {
        if self.is_json() {
            self.parse_body()
        } else {
            ResponseBody::Text(self.text())
        }
    }

    pub fn into_raw(self) -> RawResponse {
        RawResponse {
            status: self.status,
            status_text: self.status_text,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// 网络请求能力
///
/// 实现必须监听传入的取消信号，信号触发后尽快返回 [`TransportError::Aborted`]。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn response(content_type: Option<&'static str>, body: &'static str) -> TransportResponse {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        TransportResponse {
            status: 200,
            status_text: "OK".into(),
            url: "http://localhost/".into(),
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_parse_body_falls_back_to_text() {
        let json = response(None, "{\"id\":1}").parse_body();
        assert_eq!(json.as_json().unwrap()["id"], 1);

        let text = response(None, "hello").parse_body();
        assert_eq!(text.as_text(), Some("hello"));

        let empty = response(None, "").parse_body();
        assert_eq!(empty.as_text(), Some(""));
    }

    #[test]
    fn test_parse_error_body_respects_content_type() {
        let json = response(Some("application/json; charset=utf-8"), "{\"msg\":\"bad\"}");
        assert!(json.parse_error_body().as_json().is_some());

        let text = response(Some("text/plain"), "{\"msg\":\"bad\"}");
        assert!(text.parse_error_body().as_text().is_some());
    }

    #[test]
    fn test_ok_range() {
        let mut res = response(None, "");
        assert!(res.ok());
        res.status = 304;
        assert!(!res.ok());
        res.status = 299;
        assert!(res.ok());
    }
}
