use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::runtime::Handle;

use crate::cache::{AjaxFuture, CacheEntry, CachePolicy, DedupCache, Dispatch, settled, spawn_shared};
use crate::cancel::{AbortController, with_timeout};
use crate::error::{OperationError, TransportError};
use crate::fingerprint::fingerprint;
use crate::interceptor::{Interceptors, run_request_chain, run_response_chain};
use crate::message::{LogSink, MessageSink};
use crate::request::invoke;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{AjaxConfig, AjaxExOptions, AjaxOptions, HttpMethod, RequestData, RequestSpec};

/// 客户端状态，只能从 `Active` 变为 `Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Active,
    Stopped,
}

/// 可以手动取消的请求
#[derive(Clone)]
pub struct AbortResult {
    pub response: AjaxFuture,
    controller: Option<AbortController>,
}

impl AbortResult {
    /// 取消请求；外部传了取消信号或请求已被拦下时没有效果
    pub fn abort(&self) {
        if let Some(controller) = &self.controller {
            controller.abort();
        }
    }
}

struct AjaxInner {
    defaults: AjaxOptions,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn MessageSink>,
    interceptors: Interceptors,
    cache: DedupCache,
    state: Mutex<ClientState>,
    runtime: Option<Handle>,
}

/// Ajax 客户端
///
/// 每个实例有自己的默认配置、拦截器和去重缓存。`clone` 出来的句柄共享这些状态。
///
/// 请求在构建时所在的 tokio 运行时（或 [`AjaxBuilder::with_runtime`] 指定的运行时）上执行，
/// 返回的 future 可以在任意执行器上等待。构建时和调用时都没有运行时的话，请求直接以
/// `Network` 错误结束。
///
/// 一次调用依次经过：
/// 1. 合并配置
/// 2. 停止检查
/// 3. 请求拦截器
/// 4. 去重缓存
/// 5. 超时控制下发出请求
/// 6. 响应拦截器
#[derive(Clone)]
pub struct Ajax {
    inner: Arc<AjaxInner>,
}

impl Ajax {
    /// 用默认的 reqwest 传输层和日志提示创建客户端
    pub fn new(defaults: AjaxOptions) -> Self {
        AjaxBuilder::new(defaults).build()
    }

    pub fn builder(defaults: AjaxOptions) -> AjaxBuilder {
        AjaxBuilder::new(defaults)
    }

    pub fn defaults(&self) -> &AjaxOptions {
        &self.inner.defaults
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// 停止之后，除了 `is_out_stop` 的请求，其他请求直接失败
    pub fn stop_ajax(&self) {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner()) = ClientState::Stopped;
        log::debug!("Ajax stopped");
    }

    pub fn is_ajax_stopped(&self) -> bool {
        self.state() == ClientState::Stopped
    }

    pub fn state(&self) -> ClientState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 取消缓存中所有进行中的请求，`is_out_stop` 的请求除外
    pub fn abort_all(&self) {
        for entry in self.inner.cache.entries() {
            if !entry.spec.is_out_stop {
                entry.abort();
            }
        }
    }

    /// 发起请求
    pub fn ajax(&self, config: AjaxConfig) -> AjaxFuture {
        self.dispatch(config).response
    }

    /// 发起请求，同时返回取消方法
    pub fn ajax_abort_result(&self, config: AjaxConfig) -> AbortResult {
        self.dispatch(config)
    }

    /// GET 请求，`options` 可以是 [`AjaxOptions`]，也可以是带 `query`/`signal` 的 [`AjaxExOptions`]
    pub fn get(
        &self,
        url: &str,
        data: Option<RequestData>,
        options: impl Into<AjaxExOptions>,
    ) -> AjaxFuture {
        self.ajax(options.into().into_config(url, HttpMethod::Get, data))
    }

    pub fn get_abort_result(
        &self,
        url: &str,
        data: Option<RequestData>,
        options: impl Into<AjaxExOptions>,
    ) -> AbortResult {
        self.ajax_abort_result(options.into().into_config(url, HttpMethod::Get, data))
    }

    pub fn post(
        &self,
        url: &str,
        data: Option<RequestData>,
        options: impl Into<AjaxExOptions>,
    ) -> AjaxFuture {
        self.ajax(options.into().into_config(url, HttpMethod::Post, data))
    }

    pub fn post_abort_result(
        &self,
        url: &str,
        data: Option<RequestData>,
        options: impl Into<AjaxExOptions>,
    ) -> AbortResult {
        self.ajax_abort_result(options.into().into_config(url, HttpMethod::Post, data))
    }

    /// 去重缓存中的条目数
    pub fn cached_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// 清空去重缓存，进行中的请求不受影响
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// 按指纹移除缓存，主要用于 `cache_timeout` 为负数的请求
    pub fn evict(&self, fingerprint: &str) -> bool {
        self.inner.cache.evict(fingerprint).is_some()
    }

    fn dispatch(&self, config: AjaxConfig) -> AbortResult {
        let mut spec = RequestSpec::merge(config, &self.inner.defaults);

        if self.is_ajax_stopped() && !spec.is_out_stop {
            log::debug!("Ajax stopped, rejecting {}", spec.url);
            let error = OperationError::stopped(Arc::new(spec));
            return AbortResult {
                response: settled(Err(error)),
                controller: None,
            };
        }

        let Some(runtime) = self.runtime() else {
            log::warn!("No tokio runtime available for {}", spec.url);
            let cause = anyhow::anyhow!("no tokio runtime available to run the request");
            let error = OperationError::network(Arc::new(spec), TransportError::Failed(cause));
            return AbortResult {
                response: settled(Err(error)),
                controller: None,
            };
        };

        let request_chain = self.inner.interceptors.request.snapshot();
        run_request_chain(&request_chain, &mut spec);

        let policy = CachePolicy::from_cache_timeout(spec.cache_timeout);
        if policy == CachePolicy::Bypass {
            let Dispatch {
                future,
                controller,
                spec,
            } = self.core(spec);
            return AbortResult {
                response: spawn_shared(&runtime, spec, future),
                controller,
            };
        }

        let key = fingerprint(&spec);
        let CacheEntry {
            result, controller, ..
        } = self.inner.cache.dedupe(key, policy, &runtime, || self.core(spec));
        AbortResult {
            response: result,
            controller,
        }
    }

    fn runtime(&self) -> Option<Handle> {
        self.inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
    }

    /// 超时控制 + 发请求 + 响应拦截器
    fn core(&self, mut spec: RequestSpec) -> Dispatch {
        let (controller, signal) = match spec.signal.clone() {
            Some(signal) => (None, signal),
            None => {
                let controller = AbortController::new();
                let signal = controller.signal();
                spec.signal = Some(signal.clone());
                (Some(controller), signal)
            }
        };
        let spec = Arc::new(spec);
        let response_chain = self.inner.interceptors.response.snapshot();

        let transport = self.inner.transport.clone();
        let sink = self.inner.sink.clone();
        let timer_controller = controller.clone();
        let request_spec = spec.clone();
        let future = async move {
            let timeout_spec = request_spec.clone();
            let result = with_timeout(
                invoke(transport.as_ref(), sink.as_ref(), request_spec.clone(), signal),
                request_spec.timeout,
                timer_controller.as_ref(),
                || OperationError::timeout(timeout_spec),
            )
            .await;
            run_response_chain(&response_chain, result).await
        }
        .boxed();

        Dispatch {
            future,
            controller,
            spec,
        }
    }
}

/// 客户端构建器，可以替换传输层和错误提示
pub struct AjaxBuilder {
    defaults: AjaxOptions,
    transport: Option<Arc<dyn Transport>>,
    sink: Option<Arc<dyn MessageSink>>,
    runtime: Option<Handle>,
}

impl AjaxBuilder {
    pub fn new(defaults: AjaxOptions) -> Self {
        Self {
            defaults,
            transport: None,
            sink: None,
            runtime: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_message_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 指定执行请求的运行时，默认取构建时所在的运行时
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Ajax {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(LogSink));
        Ajax {
            inner: Arc::new(AjaxInner {
                defaults: self.defaults,
                transport,
                sink,
                interceptors: Interceptors::new(),
                cache: DedupCache::new(),
                state: Mutex::new(ClientState::Active),
                runtime: self.runtime.or_else(|| Handle::try_current().ok()),
            }),
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
