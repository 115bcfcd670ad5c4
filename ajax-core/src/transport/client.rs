use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use reqwest::multipart::{Form, Part};

use crate::cancel::AbortSignal;
use crate::error::TransportError;
use crate::transport::{RequestBody, Transport, TransportRequest, TransportResponse};
use crate::types::{FormData, FormValue};

/// 基于 reqwest 的默认传输层
///
/// 超时由上层统一控制，这里不再设置 reqwest 自己的超时。
/// `credentials` 和 `mode` 是浏览器概念，原生环境下直接忽略。
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义的 reqwest 客户端（代理、TLS 等在这里配置）
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: TransportRequest) -> anyhow::Result<reqwest::RequestBuilder> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .with_context(|| format!("invalid method {}", request.method))?;

        let mut headers = request.headers;
        if let Some(value) = request.cache.and_then(|cache| cache.cache_control()) {
            if !headers.contains_key(CACHE_CONTROL) {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static(value));
            }
        }

        let builder = self.client.request(method, &request.url).headers(headers);
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Text(text) => builder.body(text),
            RequestBody::Form(form) => builder.multipart(multipart_form(form)?),
        };
        Ok(builder)
    }
}

fn multipart_form(form: FormData) -> anyhow::Result<Form> {
    let mut multipart = Form::new();
    for (name, value) in form.entries().iter().cloned() {
        multipart = match value {
            FormValue::Text(text) => multipart.text(name, text),
            FormValue::File(file) => {
                let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name);
                if let Some(content_type) = file.content_type {
                    part = part
                        .mime_str(&content_type)
                        .with_context(|| format!("invalid content type {content_type:?}"))?;
                }
                multipart.part(name, part)
            }
        };
    }
    Ok(multipart)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError> {
        if signal.is_aborted() {
            return Err(TransportError::Aborted);
        }

        let builder = self.build(request)?;
        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let url = response.url().to_string();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(TransportResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_owned(),
                url,
                headers,
                body,
            })
        };

        tokio::select! {
            biased;
            _ = signal.aborted() => Err(TransportError::Aborted),
            result = exchange => result.map_err(|e| TransportError::Failed(e.into())),
        }
    }
}
