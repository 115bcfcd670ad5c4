use serde::{Deserialize, Serialize};

/// HTTP 方法枚举
///
/// 反序列化时大小写均可（`"get"` / `"GET"`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[serde(alias = "GET")]
    Get,
    #[serde(alias = "DELETE")]
    Delete,
    #[serde(alias = "HEAD")]
    Head,
    #[serde(alias = "OPTIONS")]
    Options,
    #[default]
    #[serde(alias = "POST")]
    Post,
    #[serde(alias = "PUT")]
    Put,
    #[serde(alias = "PATCH")]
    Patch,
    #[serde(alias = "PURGE")]
    Purge,
    #[serde(alias = "LINK")]
    Link,
    #[serde(alias = "UNLINK")]
    Unlink,
}

impl HttpMethod {
    /// 返回HTTP方法的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Purge => "PURGE",
            HttpMethod::Link => "LINK",
            HttpMethod::Unlink => "UNLINK",
        }
    }

    /// GET 族方法不能携带请求体，数据只能拼到查询参数里
    pub fn is_get_family(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }

    /// 只有 POST 和 PUT 会补默认的 content-type
    pub fn wants_default_content_type(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// cookie 发送策略
///
/// - `Omit`：不发送 cookie
/// - `SameOrigin`：只在同源请求时发送
/// - `Include`：同源、跨域都发送
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    #[default]
    Include,
    SameOrigin,
}

impl Credentials {
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::Omit => "omit",
            Credentials::Include => "include",
            Credentials::SameOrigin => "same-origin",
        }
    }
}

/// 跨域模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::SameOrigin => "same-origin",
            RequestMode::Cors => "cors",
            RequestMode::NoCors => "no-cors",
        }
    }
}

/// HTTP 缓存模式（对应 fetch 的 `cache` 选项）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl CacheMode {
    /// 需要绕过 HTTP 缓存时，返回对应的 `Cache-Control` 请求头取值
    pub fn cache_control(&self) -> Option<&'static str> {
        match self {
            CacheMode::NoStore => Some("no-store"),
            CacheMode::Reload | CacheMode::NoCache => Some("no-cache"),
            CacheMode::Default | CacheMode::ForceCache | CacheMode::OnlyIfCached => None,
        }
    }
}
