use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::runtime::Handle;

use crate::cancel::AbortController;
use crate::error::{OperationError, TransportError};
use crate::types::{RequestSpec, ResponseBody};

/// 一次请求的最终结果
pub type AjaxResult = Result<ResponseBody, OperationError>;

/// 可以被多个调用方同时等待的请求结果
pub type AjaxFuture = Shared<BoxFuture<'static, AjaxResult>>;

/// 去重缓存的清除策略，由 `cache_timeout` 决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// `0`：不去重，每次都发请求
    Bypass,
    /// 未设置：请求结束立即清除
    EvictOnSettle,
    /// 正数：请求结束后延迟清除
    EvictAfter(Duration),
    /// 负数：永不自动清除
    Retain,
}

impl CachePolicy {
    pub fn from_cache_timeout(cache_timeout: Option<i64>) -> Self {
        match cache_timeout {
            None => CachePolicy::EvictOnSettle,
            Some(0) => CachePolicy::Bypass,
            Some(ms) if ms < 0 => CachePolicy::Retain,
            Some(ms) => CachePolicy::EvictAfter(Duration::from_millis(ms.unsigned_abs())),
        }
    }
}

/// 待执行的请求：结果 future、取消控制器、请求配置
pub struct Dispatch {
    pub future: BoxFuture<'static, AjaxResult>,
    pub controller: Option<AbortController>,
    pub spec: Arc<RequestSpec>,
}

/// 缓存中的一项
#[derive(Clone)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub result: AjaxFuture,
    pub controller: Option<AbortController>,
    pub spec: Arc<RequestSpec>,
}

impl CacheEntry {
    /// 取消该项对应的请求；外部传入取消信号的请求没有控制器，调用无效果
    pub fn abort(&self) {
        if let Some(controller) = &self.controller {
            controller.abort();
        }
    }
}

/// 请求去重缓存
///
/// 同一指纹同一时间只有一个请求在执行，重复的调用拿到同一个共享结果。
/// 检查与插入在同一把锁内完成，中间没有 await；清除时按指纹查找，
/// 不比较是不是当初插入的那一项。
#[derive(Clone, Default)]
pub struct DedupCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 命中缓存直接返回已有项，否则调用 `produce` 发起请求，在 `runtime` 上执行并缓存
    ///
    /// `produce` 在锁内调用，不能再访问缓存本身。
    pub fn dedupe<F>(
        &self,
        fingerprint: String,
        policy: CachePolicy,
        runtime: &Handle,
        produce: F,
    ) -> CacheEntry
    where
        F: FnOnce() -> Dispatch,
    {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(&fingerprint) {
            log::debug!("read from cache : {fingerprint:?}");
            return entry.clone();
        }

        let Dispatch {
            future,
            controller,
            spec,
        } = produce();
        let cache = self.clone();
        let key = fingerprint.clone();
        let result = spawn_shared(runtime, spec.clone(), async move {
            let result = future.await;
            cache.schedule_eviction(key, policy);
            result
        });

        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            result,
            controller,
            spec,
        };
        entries.insert(fingerprint, entry.clone());
        entry
    }

    /// 按策略清除缓存项
    pub fn schedule_eviction(&self, fingerprint: String, policy: CachePolicy) {
        match policy {
            CachePolicy::Bypass | CachePolicy::EvictOnSettle => {
                self.evict(&fingerprint);
            }
            CachePolicy::EvictAfter(delay) => {
                let cache = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    cache.evict(&fingerprint);
                });
            }
            CachePolicy::Retain => {}
        }
    }

    /// 按指纹移除
    pub fn evict(&self, fingerprint: &str) -> Option<CacheEntry> {
        self.lock().remove(fingerprint)
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.lock().contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// 当前所有缓存项的快照
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.lock().values().cloned().collect()
    }
}

/// 立即把请求交给 `runtime` 执行，返回可共享的结果
///
/// 即使所有调用方都不再等待，请求也会执行完并按策略清除缓存。
/// 返回的 future 可以在任意执行器上等待。
pub fn spawn_shared<Fut>(runtime: &Handle, spec: Arc<RequestSpec>, future: Fut) -> AjaxFuture
where
    Fut: std::future::Future<Output = AjaxResult> + Send + 'static,
{
    let handle = runtime.spawn(future);
    async move {
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(OperationError::network(
                spec,
                TransportError::Failed(anyhow::anyhow!("request task failed: {e}")),
            )),
        }
    }
    .boxed()
    .shared()
}

/// 已经有结果的共享 future
pub fn settled(result: AjaxResult) -> AjaxFuture {
    futures::future::ready(result).boxed().shared()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AjaxConfig, AjaxOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn spec() -> Arc<RequestSpec> {
        Arc::new(RequestSpec::merge(AjaxConfig::new("/users"), &AjaxOptions::default()))
    }

    fn dispatch<F>(future: F) -> Dispatch
    where
        F: std::future::Future<Output = AjaxResult> + Send + 'static,
    {
        Dispatch {
            future: future.boxed(),
            controller: Some(AbortController::new()),
            spec: spec(),
        }
    }

    #[test]
    fn test_policy_from_cache_timeout() {
        assert_eq!(CachePolicy::from_cache_timeout(None), CachePolicy::EvictOnSettle);
        assert_eq!(CachePolicy::from_cache_timeout(Some(0)), CachePolicy::Bypass);
        assert_eq!(CachePolicy::from_cache_timeout(Some(-1)), CachePolicy::Retain);
        assert_eq!(
            CachePolicy::from_cache_timeout(Some(250)),
            CachePolicy::EvictAfter(Duration::from_millis(250))
        );
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_execution() {
        let cache = DedupCache::new();
        let produced = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<()>();
        let mut rx = Some(rx);

        let mut entries = Vec::new();
        for _ in 0..3 {
            let produced = produced.clone();
            let rx = rx.take();
            entries.push(cache.dedupe("key".into(), CachePolicy::EvictOnSettle, &Handle::current(), || {
                produced.fetch_add(1, Ordering::SeqCst);
                let rx = rx.expect("produce runs once");
                dispatch(async move {
                    let _ = rx.await;
                    Ok(ResponseBody::Text("shared".into()))
                })
            }));
        }

        assert_eq!(produced.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        tx.send(()).unwrap();
        for entry in entries {
            assert_eq!(entry.result.await.unwrap().as_text(), Some("shared"));
        }
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_evicted_too() {
        let cache = DedupCache::new();
        let entry = cache.dedupe("key".into(), CachePolicy::EvictOnSettle, &Handle::current(), || {
            dispatch(async { Err(OperationError::timeout(spec())) })
        });

        assert!(entry.result.await.is_err());
        assert!(!cache.contains("key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_eviction() {
        let cache = DedupCache::new();
        let entry = cache.dedupe(
            "key".into(),
            CachePolicy::EvictAfter(Duration::from_millis(500)),
            &Handle::current(),
            || dispatch(async { Ok(ResponseBody::Text("v".into())) }),
        );
        entry.result.await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.contains("key"));

        // 窗口期内的重复调用直接拿到缓存结果
        let again = cache.dedupe("key".into(), CachePolicy::EvictOnSettle, &Handle::current(), || {
            panic!("should be served from cache")
        });
        assert_eq!(again.result.await.unwrap().as_text(), Some("v"));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!cache.contains("key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retained_entry_stays_until_cleared() {
        let cache = DedupCache::new();
        let entry = cache.dedupe("key".into(), CachePolicy::Retain, &Handle::current(), || {
            dispatch(async { Ok(ResponseBody::Text("v".into())) })
        });
        entry.result.await.unwrap();

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(cache.contains("key"));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_eviction_is_by_fingerprint() {
        let cache = DedupCache::new();
        let (tx, rx) = oneshot::channel::<()>();
        let first = cache.dedupe("key".into(), CachePolicy::EvictOnSettle, &Handle::current(), || {
            dispatch(async move {
                let _ = rx.await;
                Ok(ResponseBody::Text("first".into()))
            })
        });

        // 中途被替换：手动移除后重新发起同一指纹的请求
        cache.evict("key");
        let second = cache.dedupe("key".into(), CachePolicy::Retain, &Handle::current(), || {
            dispatch(futures::future::pending())
        });
        assert!(cache.contains("key"));

        // 第一个请求结束时按指纹清除，连同替换后的那一项
        tx.send(()).unwrap();
        first.result.await.unwrap();
        assert!(!cache.contains("key"));
        second.abort();
    }

    #[tokio::test]
    async fn test_dropped_callers_still_evict() {
        let cache = DedupCache::new();
        let entry = cache.dedupe("key".into(), CachePolicy::EvictOnSettle, &Handle::current(), || {
            dispatch(async {
                tokio::task::yield_now().await;
                Ok(ResponseBody::Text("v".into()))
            })
        });
        drop(entry);

        for _ in 0..10 {
            if cache.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(cache.is_empty());
    }
}
