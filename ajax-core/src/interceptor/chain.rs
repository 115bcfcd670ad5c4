use std::sync::{Arc, RwLock};

use crate::error::OperationError;
use crate::interceptor::traits::{RequestInterceptor, ResponseInterceptor};
use crate::types::{RequestSpec, ResponseBody};

/// 注册拦截器时返回的句柄，用于之后 `eject`
///
/// 句柄就是注册时的序号，移除后留下空位，不会被复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorHandle(usize);

impl InterceptorHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 拦截器链
///
/// 拦截器用 `Arc` 共享，执行前先拍一份快照，移除拦截器不会影响已经发出的请求。
pub struct InterceptorChain<I: ?Sized> {
    slots: RwLock<Vec<Option<Arc<I>>>>,
}

impl<I: ?Sized> InterceptorChain<I> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }

    /// 追加拦截器，返回句柄
    pub fn register(&self, interceptor: Arc<I>) -> InterceptorHandle {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots.push(Some(interceptor));
        InterceptorHandle(slots.len() - 1)
    }

    /// 移除拦截器，句柄无效或已经移除过时返回 `false`
    pub fn eject(&self, handle: InterceptorHandle) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots
            .get_mut(handle.0)
            .and_then(Option::take)
            .is_some()
    }

    /// 当前生效的拦截器数量
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按注册顺序拍一份快照
    pub fn snapshot(&self) -> Vec<Arc<I>> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.iter().flatten().cloned().collect()
    }
}

impl<I: ?Sized> Default for InterceptorChain<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// 客户端持有的两条拦截器链
#[derive(Default)]
pub struct Interceptors {
    pub request: InterceptorChain<dyn RequestInterceptor>,
    pub response: InterceptorChain<dyn ResponseInterceptor>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 依次执行请求拦截器
///
/// 某个拦截器出错时交给它自己的 `on_error`，然后继续执行后面的拦截器。
pub fn run_request_chain(chain: &[Arc<dyn RequestInterceptor>], spec: &mut RequestSpec) {
    for interceptor in chain {
        if let Err(e) = interceptor.on_request(spec) {
            log::warn!("Request interceptor failed for {}: {e:#}", spec.url);
            interceptor.on_error(&e);
        }
    }
}

/// 依次执行响应拦截器
///
/// 相当于对结果做一次从左到右的折叠：成功走 `on_response`，失败走 `on_error`，
/// 返回值交给下一个拦截器。
pub async fn run_response_chain(
    chain: &[Arc<dyn ResponseInterceptor>],
    mut result: Result<ResponseBody, OperationError>,
) -> Result<ResponseBody, OperationError> {
    for interceptor in chain {
        result = match result {
            Ok(body) => interceptor.on_response(body).await,
            Err(error) => interceptor.on_error(error).await,
        };
    }
    result
}
