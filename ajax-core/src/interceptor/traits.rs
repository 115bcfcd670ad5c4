use async_trait::async_trait;

use crate::error::OperationError;
use crate::types::{RequestSpec, ResponseBody};

/// 请求拦截器
///
/// 在请求发出前同步执行，可以直接修改合并后的请求配置。
/// 返回错误时会调用同一个拦截器的 [`on_error`](RequestInterceptor::on_error)，
/// 然后继续执行后面的拦截器，请求照常发出。
pub trait RequestInterceptor: Send + Sync {
    /// 请求前处理
    fn on_request(&self, spec: &mut RequestSpec) -> anyhow::Result<()>;

    /// `on_request` 失败时的回调
    fn on_error(&self, error: &anyhow::Error) {
        let _ = error;
    }
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut RequestSpec) -> anyhow::Result<()> + Send + Sync,
{
    fn on_request(&self, spec: &mut RequestSpec) -> anyhow::Result<()> {
        self(spec)
    }
}

/// 响应拦截器
///
/// 按注册顺序串行执行：上一个拦截器的结果（成功或失败）交给下一个拦截器的
/// 对应方法。默认实现原样透传。
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// 响应成功时处理
    async fn on_response(&self, body: ResponseBody) -> Result<ResponseBody, OperationError> {
        Ok(body)
    }

    /// 请求失败时处理，返回 `Ok` 可以把失败转成成功
    async fn on_error(&self, error: OperationError) -> Result<ResponseBody, OperationError> {
        Err(error)
    }
}

/// 空拦截器实现，用于测试和默认情况
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpInterceptor;

impl RequestInterceptor for NoOpInterceptor {
    fn on_request(&self, _spec: &mut RequestSpec) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ResponseInterceptor for NoOpInterceptor {}
