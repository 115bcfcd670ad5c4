use std::sync::Arc;

use thiserror::Error;

use crate::types::{RequestSpec, ResponseBody};

/// 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 网络异常（包括被取消的请求）
    Network,
    /// 超时
    Timeout,
    /// 状态码不在 2xx 且不在忽略列表里
    Http,
    /// 调用 `stop_ajax` 之后发起的请求
    Stopped,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Http => "http",
            ErrorKind::Stopped => "stop",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 传输层错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("The operation was aborted")]
    Aborted,
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl TransportError {
    pub fn is_abort(&self) -> bool {
        matches!(self, TransportError::Aborted)
    }
}

/// 错误的原始原因
#[derive(Debug, Clone, Error)]
pub enum ErrorCause {
    #[error(transparent)]
    Transport(Arc<TransportError>),
    #[error("response body: {0}")]
    Body(ResponseBody),
}

/// 所有失败路径统一的错误结构
///
/// 实现了 `Clone`，去重缓存里的同一个结果可以交给每一个等待者。
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct OperationError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    spec: Arc<RequestSpec>,
    #[source]
    cause: Option<ErrorCause>,
}

impl OperationError {
    pub(crate) fn network(spec: Arc<RequestSpec>, error: TransportError) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: error.to_string(),
            status: None,
            spec,
            cause: Some(ErrorCause::Transport(Arc::new(error))),
        }
    }

    pub(crate) fn timeout(spec: Arc<RequestSpec>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: spec.timeout_error_message.clone(),
            status: Some(spec.timeout_error_status),
            spec,
            cause: None,
        }
    }

    pub(crate) fn http(spec: Arc<RequestSpec>, status: u16, message: String, body: ResponseBody) -> Self {
        Self {
            kind: ErrorKind::Http,
            message,
            status: Some(status),
            spec,
            cause: Some(ErrorCause::Body(body)),
        }
    }

    pub(crate) fn stopped(spec: Arc<RequestSpec>) -> Self {
        Self {
            kind: ErrorKind::Stopped,
            message: spec.stopped_error_message.clone(),
            status: None,
            spec,
            cause: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// 出错请求的完整配置
    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// HTTP 错误时服务端返回的内容
    pub fn body(&self) -> Option<&ResponseBody> {
        match &self.cause {
            Some(ErrorCause::Body(body)) => Some(body),
            _ => None,
        }
    }

    /// 是否由主动取消引起
    pub fn is_abort(&self) -> bool {
        matches!(&self.cause, Some(ErrorCause::Transport(e)) if e.is_abort())
    }
}
