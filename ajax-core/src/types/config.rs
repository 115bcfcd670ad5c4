use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::cancel::AbortSignal;
use crate::types::data::RequestData;
use crate::types::http::{CacheMode, Credentials, HttpMethod, RequestMode};

/// 默认超时时间：2 分钟
pub const DEFAULT_TIMEOUT_MS: u64 = 1000 * 60 * 2;
pub const DEFAULT_TIMEOUT_ERROR_MESSAGE: &str = "timeout";
pub const DEFAULT_TIMEOUT_ERROR_STATUS: u16 = 504;
pub const DEFAULT_STOPPED_ERROR_MESSAGE: &str = "Ajax has been stopped! ";
pub const DEFAULT_PUT_AND_POST_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// 可选配置项
///
/// 同一个结构既用作客户端级别的默认值，也用作单次请求的覆盖值。
/// 合并规则见 [`RequestSpec::merge`]。支持从 JSON/TOML 反序列化，
/// 键名与 fetch 风格保持一致（`baseURL`、`cacheTimeout`、`isOutStop`……）。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AjaxOptions {
    pub method: Option<HttpMethod>,
    #[serde(rename = "baseURL", alias = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(skip)]
    pub headers: Option<HeaderMap>,
    /// 超时时间（毫秒）
    ///
    /// 不设置时使用客户端默认值，客户端也没设置时为 2 分钟，合并后总会有定时器。
    /// 需要完全不设定时器的请求，在请求拦截器里把 [`RequestSpec::timeout`] 设为 `None`。
    pub timeout: Option<u64>,
    pub timeout_error_message: Option<String>,
    pub timeout_error_status: Option<u16>,
    pub stopped_error_message: Option<String>,
    pub credentials: Option<Credentials>,
    pub mode: Option<RequestMode>,
    pub cache: Option<CacheMode>,
    /// 这些状态码即使不是 2xx 也不当作错误
    pub ignore: Option<Vec<u16>>,
    /// 是否上传文件
    pub is_file: Option<bool>,
    /// 出错时不提示
    pub is_no_alert: Option<bool>,
    /// 直接返回原始响应，不解析
    pub is_use_origin: Option<bool>,
    /// GET 请求的参数是否编码
    pub is_encode_url: Option<bool>,
    /// 不受 `stop_ajax` 影响
    pub is_out_stop: Option<bool>,
    /// 去重缓存时间（毫秒）
    ///
    /// - `0`：不去重
    /// - 不设置：请求结束立即清除
    /// - 正数：请求结束后再保留这么久
    /// - 负数：永不清除
    pub cache_timeout: Option<i64>,
    pub default_put_and_post_content_type: Option<String>,
}

impl AjaxOptions {
    /// 用 `other` 填充当前为 `None` 的字段
    pub fn fill_from(&mut self, other: AjaxOptions) {
        let AjaxOptions {
            method,
            base_url,
            headers,
            timeout,
            timeout_error_message,
            timeout_error_status,
            stopped_error_message,
            credentials,
            mode,
            cache,
            ignore,
            is_file,
            is_no_alert,
            is_use_origin,
            is_encode_url,
            is_out_stop,
            cache_timeout,
            default_put_and_post_content_type,
        } = other;

        self.method = self.method.or(method);
        self.base_url = self.base_url.take().or(base_url);
        self.timeout = self.timeout.or(timeout);
        self.timeout_error_message = self.timeout_error_message.take().or(timeout_error_message);
        self.timeout_error_status = self.timeout_error_status.or(timeout_error_status);
        self.stopped_error_message = self.stopped_error_message.take().or(stopped_error_message);
        self.credentials = self.credentials.or(credentials);
        self.mode = self.mode.or(mode);
        self.cache = self.cache.or(cache);
        self.ignore = self.ignore.take().or(ignore);
        self.is_file = self.is_file.or(is_file);
        self.is_no_alert = self.is_no_alert.or(is_no_alert);
        self.is_use_origin = self.is_use_origin.or(is_use_origin);
        self.is_encode_url = self.is_encode_url.or(is_encode_url);
        self.is_out_stop = self.is_out_stop.or(is_out_stop);
        self.cache_timeout = self.cache_timeout.or(cache_timeout);
        self.default_put_and_post_content_type = self
            .default_put_and_post_content_type
            .take()
            .or(default_put_and_post_content_type);

        self.headers = match (self.headers.take(), headers) {
            (Some(own), Some(fallback)) => Some(merge_headers(fallback, &own)),
            (own, fallback) => own.or(fallback),
        };
    }
}

/// 按名称合并请求头：`overrides` 里出现的名称整体替换 `base` 中的同名项，多值请求头保留全部取值
fn merge_headers(mut base: HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    for name in overrides.keys() {
        base.remove(name);
    }
    for (name, value) in overrides.iter() {
        base.append(name.clone(), value.clone());
    }
    base
}

/// 单次请求的配置，只有 `url` 是必填的
#[derive(Debug, Clone, Default)]
pub struct AjaxConfig {
    pub url: String,
    pub data: Option<RequestData>,
    pub query: Option<RequestData>,
    /// 想自己控制取消时传入；传了就不会再创建内部的取消控制器
    pub signal: Option<AbortSignal>,
    pub options: AjaxOptions,
}

impl AjaxConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.options.method = Some(method);
        self
    }

    pub fn data(mut self, data: impl Into<RequestData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn query(mut self, query: impl Into<RequestData>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// 批量设置可选项
    ///
    /// 只填充还没有设置过的字段，之前通过 `method`、`timeout`、`header`
    /// 等方法设置的值保留；请求头按名称合并，已有的同名请求头保留。
    pub fn options(mut self, options: AjaxOptions) -> Self {
        self.options.fill_from(options);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    /// 添加请求头，名称或取值不合法时忽略并记录警告
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.options
                    .headers
                    .get_or_insert_with(HeaderMap::new)
                    .insert(name, value);
            }
            Err(e) => log::warn!("Ignoring invalid header {name:?}: {e}"),
        }
        self
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.options.timeout = Some(timeout_ms);
        self
    }

    pub fn cache_timeout(mut self, cache_timeout_ms: i64) -> Self {
        self.options.cache_timeout = Some(cache_timeout_ms);
        self
    }

    pub fn ignore(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.options.ignore = Some(statuses.into_iter().collect());
        self
    }

    pub fn out_stop(mut self, is_out_stop: bool) -> Self {
        self.options.is_out_stop = Some(is_out_stop);
        self
    }

    pub fn no_alert(mut self, is_no_alert: bool) -> Self {
        self.options.is_no_alert = Some(is_no_alert);
        self
    }

    pub fn use_origin(mut self, is_use_origin: bool) -> Self {
        self.options.is_use_origin = Some(is_use_origin);
        self
    }

    pub fn file(mut self, is_file: bool) -> Self {
        self.options.is_file = Some(is_file);
        self
    }

    pub fn encode_url(mut self, is_encode_url: bool) -> Self {
        self.options.is_encode_url = Some(is_encode_url);
        self
    }
}

/// `get`/`post` 等快捷方法的附加配置：URL 和数据之外的部分
#[derive(Debug, Clone, Default)]
pub struct AjaxExOptions {
    pub query: Option<RequestData>,
    pub signal: Option<AbortSignal>,
    pub options: AjaxOptions,
}

impl AjaxExOptions {
    /// 拼成完整的请求配置，`method` 覆盖可选项里的请求方法
    pub fn into_config(
        self,
        url: impl Into<String>,
        method: HttpMethod,
        data: Option<RequestData>,
    ) -> AjaxConfig {
        let AjaxExOptions {
            query,
            signal,
            mut options,
        } = self;
        options.method = Some(method);
        AjaxConfig {
            url: url.into(),
            data,
            query,
            signal,
            options,
        }
    }
}

impl From<AjaxOptions> for AjaxExOptions {
    fn from(options: AjaxOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }
}

/// 合并后的完整请求描述
///
/// 只在请求拦截器阶段可变，交给传输层之后就放进 `Arc` 里只读共享。
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: String,
    pub method: HttpMethod,
    pub base_url: Option<String>,
    pub headers: HeaderMap,
    pub data: Option<RequestData>,
    pub query: Option<RequestData>,
    /// 合并后总有值；请求拦截器可以改成 `None` 来关闭超时
    pub timeout: Option<Duration>,
    pub timeout_error_message: String,
    pub timeout_error_status: u16,
    pub stopped_error_message: String,
    pub credentials: Credentials,
    pub mode: RequestMode,
    pub cache: Option<CacheMode>,
    pub ignore: Vec<u16>,
    pub is_file: bool,
    pub is_no_alert: bool,
    pub is_use_origin: bool,
    pub is_encode_url: bool,
    pub is_out_stop: bool,
    pub cache_timeout: Option<i64>,
    pub default_put_and_post_content_type: String,
    pub signal: Option<AbortSignal>,
}

impl RequestSpec {
    /// 合并单次请求配置与客户端默认值
    ///
    /// 逐字段取值：单次配置 > 客户端默认值 > 内置默认值。
    /// 请求头按名称合并，同名时单次配置覆盖默认值。
    pub fn merge(config: AjaxConfig, defaults: &AjaxOptions) -> Self {
        let AjaxConfig {
            url,
            data,
            query,
            signal,
            options,
        } = config;

        let mut headers = defaults.headers.clone().unwrap_or_default();
        if let Some(call_headers) = &options.headers {
            headers = merge_headers(headers, call_headers);
        }

        Self {
            url,
            method: options.method.or(defaults.method).unwrap_or_default(),
            base_url: options.base_url.or_else(|| defaults.base_url.clone()),
            headers,
            data,
            query,
            timeout: Some(Duration::from_millis(
                options
                    .timeout
                    .or(defaults.timeout)
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            )),
            timeout_error_message: options
                .timeout_error_message
                .or_else(|| defaults.timeout_error_message.clone())
                .unwrap_or_else(|| DEFAULT_TIMEOUT_ERROR_MESSAGE.to_owned()),
            timeout_error_status: options
                .timeout_error_status
                .or(defaults.timeout_error_status)
                .unwrap_or(DEFAULT_TIMEOUT_ERROR_STATUS),
            stopped_error_message: options
                .stopped_error_message
                .or_else(|| defaults.stopped_error_message.clone())
                .unwrap_or_else(|| DEFAULT_STOPPED_ERROR_MESSAGE.to_owned()),
            credentials: options
                .credentials
                .or(defaults.credentials)
                .unwrap_or_default(),
            mode: options.mode.or(defaults.mode).unwrap_or_default(),
            cache: options.cache.or(defaults.cache),
            ignore: options
                .ignore
                .or_else(|| defaults.ignore.clone())
                .unwrap_or_default(),
            is_file: flag(options.is_file, defaults.is_file),
            is_no_alert: flag(options.is_no_alert, defaults.is_no_alert),
            is_use_origin: flag(options.is_use_origin, defaults.is_use_origin),
            is_encode_url: flag(options.is_encode_url, defaults.is_encode_url),
            is_out_stop: flag(options.is_out_stop, defaults.is_out_stop),
            cache_timeout: options.cache_timeout.or(defaults.cache_timeout),
            default_put_and_post_content_type: options
                .default_put_and_post_content_type
                .or_else(|| defaults.default_put_and_post_content_type.clone())
                .unwrap_or_else(|| DEFAULT_PUT_AND_POST_CONTENT_TYPE.to_owned()),
            signal,
        }
    }

    /// 在拦截器里设置请求头
    pub fn set_header(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// 按名称读取请求头（大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

fn flag(call: Option<bool>, default: Option<bool>) -> bool {
    call.or(default).unwrap_or(false)
}

fn parse_header(name: &str, value: &str) -> anyhow::Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())?;
    let value = HeaderValue::from_str(value)?;
    Ok((name, value))
}
