use std::future::Future;
use std::time::Duration;

use crate::cancel::AbortController;
use crate::error::OperationError;

/// 给一个可取消的操作加上超时
///
/// 操作与定时器赛跑：
/// - 定时器先到：触发 `controller` 的取消，返回 `on_timeout` 生成的错误
/// - 操作先完成：定时器随之丢弃，不会触发取消
///
/// `timeout` 为 `None` 时不设定时器。外部自己传了取消信号时 `controller`
/// 为 `None`，超时只结束等待，不负责取消。
pub async fn with_timeout<T, F, E>(
    operation: F,
    timeout: Option<Duration>,
    controller: Option<&AbortController>,
    on_timeout: E,
) -> Result<T, OperationError>
where
    F: Future<Output = Result<T, OperationError>>,
    E: FnOnce() -> OperationError,
{
    let Some(timeout) = timeout else {
        return operation.await;
    };

    tokio::select! {
        biased;
        result = operation => result,
        _ = tokio::time::sleep(timeout) => {
            if let Some(controller) = controller {
                controller.abort();
            }
            Err(on_timeout())
        }
    }
}
