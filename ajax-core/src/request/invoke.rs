use std::sync::Arc;

use crate::cancel::AbortSignal;
use crate::error::OperationError;
use crate::message::{MessageSink, show_message};
use crate::request::RequestBuilder;
use crate::transport::Transport;
use crate::types::{RequestSpec, ResponseBody};

/// 发出请求并把结果统一成 [`ResponseBody`] 或 [`OperationError`]
///
/// - 传输层失败 → `Network`，被取消的请求不提示
/// - 非 2xx 且不在忽略列表 → `Http`，携带状态码和错误内容
/// - 在忽略列表里的失败状态 → 原始响应
/// - `is_use_origin` → 原始响应，否则按 JSON/文本解析
pub async fn invoke(
    transport: &dyn Transport,
    sink: &dyn MessageSink,
    spec: Arc<RequestSpec>,
    signal: AbortSignal,
) -> Result<ResponseBody, OperationError> {
    let request = RequestBuilder::prepare(&spec);
    log::debug!("{} {}", request.method, request.url);

    let response = match transport.send(request, signal).await {
        Ok(response) => response,
        Err(e) => {
            if e.is_abort() {
                log::debug!("Request to {} aborted", spec.url);
            } else {
                show_message(sink, &spec, &e.to_string());
            }
            return Err(OperationError::network(spec, e));
        }
    };

    if !response.ok() {
        if !spec.ignore.contains(&response.status) {
            let status = response.status;
            if spec.is_use_origin {
                let message = response.status_text.clone();
                return Err(OperationError::http(
                    spec,
                    status,
                    message,
                    ResponseBody::Raw(response.into_raw()),
                ));
            }
            let body = response.parse_error_body();
            let mut message = body.to_string();
            if message.is_empty() {
                message = response.status_text.clone();
            }
            show_message(sink, &spec, &message);
            if !spec.is_no_alert {
                sink.handle_error_response(status, &response.status_text);
            }
            return Err(OperationError::http(spec, status, message, body));
        }
        log::debug!("Ignoring status {} for {}", response.status, spec.url);
        return Ok(ResponseBody::Raw(response.into_raw()));
    }

    if spec.is_use_origin {
        return Ok(ResponseBody::Raw(response.into_raw()));
    }
    Ok(response.parse_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::AbortController;
    use crate::error::{ErrorKind, TransportError};
    use crate::transport::{TransportRequest, TransportResponse};
    use crate::types::{AjaxConfig, AjaxOptions};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
    use std::sync::Mutex;

    /// 固定返回一个结果的传输层
    struct Fixed {
        status: u16,
        content_type: Option<&'static str>,
        body: &'static str,
        fail: Option<fn() -> TransportError>,
    }

    #[async_trait]
    impl Transport for Fixed {
        async fn send(
            &self,
            request: TransportRequest,
            _signal: AbortSignal,
        ) -> Result<TransportResponse, TransportError> {
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            let mut headers = HeaderMap::new();
            if let Some(content_type) = self.content_type {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            Ok(TransportResponse {
                status: self.status,
                status_text: "Status".into(),
                url: request.url,
                headers,
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    fn fixed(status: u16, content_type: Option<&'static str>, body: &'static str) -> Fixed {
        Fixed { status, content_type, body, fail: None }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl MessageSink for Collect {
        fn handle_message(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_owned());
        }
    }

    async fn run(transport: Fixed, config: AjaxConfig, sink: &Collect) -> Result<ResponseBody, OperationError> {
        let spec = Arc::new(RequestSpec::merge(config, &AjaxOptions::default()));
        invoke(&transport, sink, spec, AbortController::new().signal()).await
    }

    #[tokio::test]
    async fn test_success_parses_json_or_text() {
        let sink = Collect::default();
        let json = run(fixed(200, None, "{\"id\":1}"), AjaxConfig::new("/a"), &sink).await.unwrap();
        assert_eq!(json.as_json().unwrap()["id"], 1);

        let text = run(fixed(200, None, "plain"), AjaxConfig::new("/a"), &sink).await.unwrap();
        assert_eq!(text.as_text(), Some("plain"));
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_body() {
        let sink = Collect::default();
        let error = run(
            fixed(500, Some("application/json"), "{\"msg\":\"down\"}"),
            AjaxConfig::new("/a"),
            &sink,
        )
        .await
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Http);
        assert_eq!(error.status(), Some(500));
        assert_eq!(error.body().unwrap().as_json().unwrap()["msg"], "down");
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_without_body_uses_status_text() {
        let sink = Collect::default();
        let error = run(fixed(404, None, ""), AjaxConfig::new("/a"), &sink).await.unwrap_err();
        assert_eq!(error.message(), "Status");
        assert_eq!(*sink.0.lock().unwrap(), vec!["Status"]);
    }

    #[tokio::test]
    async fn test_ignored_status_resolves_with_raw_response() {
        let sink = Collect::default();
        let body = run(fixed(401, None, "login"), AjaxConfig::new("/a").ignore([401]), &sink)
            .await
            .unwrap();

        let raw = body.as_raw().unwrap();
        assert_eq!(raw.status, 401);
        assert_eq!(raw.text(), "login");
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_use_origin_returns_raw() {
        let sink = Collect::default();
        let ok = run(fixed(200, None, "{}"), AjaxConfig::new("/a").use_origin(true), &sink)
            .await
            .unwrap();
        assert!(ok.as_raw().is_some());

        let err = run(fixed(502, None, "bad"), AjaxConfig::new("/a").use_origin(true), &sink)
            .await
            .unwrap_err();
        assert!(err.body().unwrap().as_raw().is_some());
    }

    #[tokio::test]
    async fn test_network_failure_alerts_but_abort_does_not() {
        let sink = Collect::default();
        let mut failing = fixed(200, None, "");
        failing.fail = Some(|| TransportError::Failed(anyhow::anyhow!("connection reset")));
        let error = run(failing, AjaxConfig::new("/a"), &sink).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Network);
        assert_eq!(*sink.0.lock().unwrap(), vec!["connection reset"]);

        let mut aborted = fixed(200, None, "");
        aborted.fail = Some(|| TransportError::Aborted);
        let error = run(aborted, AjaxConfig::new("/a"), &sink).await.unwrap_err();
        assert!(error.is_abort());
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_alert_suppresses_messages() {
        let sink = Collect::default();
        let _ = run(fixed(500, None, "down"), AjaxConfig::new("/a").no_alert(true), &sink).await;
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
