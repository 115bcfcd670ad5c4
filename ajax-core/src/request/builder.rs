use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde_json::Value;

use crate::transport::{RequestBody, TransportRequest};
use crate::types::{FormData, FormValue, RequestData, RequestSpec};
use crate::types::data::display_value;

/// 请求构建器
///
/// 负责把合并后的 [`RequestSpec`] 变成传输层能直接发送的请求：URL 拼接、
/// 查询参数、请求体和默认请求头。
pub struct RequestBuilder;

impl RequestBuilder {
    /// 生成最终请求
    ///
    /// GET 族请求没有请求体，`data` 拼到查询参数里；其他请求把 `query`
    /// 拼到 URL 上，`data` 作为请求体。
    pub fn prepare(spec: &RequestSpec) -> TransportRequest {
        let mut url = resolve_url(&spec.url, spec.base_url.as_deref());
        let mut headers = spec.headers.clone();

        let body = if spec.method.is_get_family() {
            if let Some(data) = &spec.data {
                url = append_query(&url, data, spec.is_encode_url);
            }
            RequestBody::Empty
        } else {
            if let Some(query) = &spec.query {
                url = append_query(&url, query, spec.is_encode_url);
            }
            let body = build_body(spec.data.as_ref(), spec.is_file);
            // FormData 由传输层自己生成 boundary，不能设置 content-type
            if matches!(body, RequestBody::Text(_))
                && !body.is_empty()
                && spec.method.wants_default_content_type()
                && !headers.contains_key(CONTENT_TYPE)
            {
                match HeaderValue::from_str(&spec.default_put_and_post_content_type) {
                    Ok(value) => {
                        headers.insert(CONTENT_TYPE, value);
                    }
                    Err(e) => log::warn!(
                        "Invalid default content type {:?}: {e}",
                        spec.default_put_and_post_content_type
                    ),
                }
            }
            body
        };

        TransportRequest {
            url,
            method: spec.method,
            headers,
            body,
            credentials: spec.credentials,
            mode: spec.mode,
            cache: spec.cache,
        }
    }
}

/// 拼接 `baseURL` 与路径
///
/// 带协议的绝对地址不拼接；两者之间只保留一个 `/`。
pub fn resolve_url(url: &str, base_url: Option<&str>) -> String {
    let Some(base_url) = base_url.filter(|base| !base.is_empty()) else {
        return url.to_owned();
    };
    if has_scheme(url) {
        return url.to_owned();
    }
    let mut resolved = base_url.to_owned();
    if !resolved.ends_with('/') {
        resolved.push('/');
    }
    resolved.push_str(url.strip_prefix('/').unwrap_or(url));
    resolved
}

fn has_scheme(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && rest.starts_with("//")
}

/// 把数据拼成查询参数追加到 URL 上
///
/// 对象按插入顺序拼成 `key=value&key=value`；字符串原样追加。
/// URL 里还没有 `?` 时用 `?` 连接，否则用 `&`。
pub fn append_query(url: &str, data: &RequestData, encode: bool) -> String {
    let query = match data {
        RequestData::Json(Value::Object(map)) => {
            join_pairs(map.iter().map(|(key, value)| (key.clone(), display_value(value))))
        }
        RequestData::Json(Value::Array(items)) => join_pairs(
            items
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), display_value(value))),
        ),
        RequestData::Json(Value::Null) => String::new(),
        RequestData::Json(Value::Bool(false)) => String::new(),
        RequestData::Json(Value::Number(number)) if number.as_f64() == Some(0.0) => String::new(),
        RequestData::Json(other) => return with_separator(url, &display_value(other)),
        RequestData::Text(text) => return with_separator(url, text),
        RequestData::Form(form) => join_pairs(form_pairs(form)),
    };
    if query.is_empty() {
        return url.to_owned();
    }
    // 与服务端约定：编码两次，服务端解码两次
    let query = if encode {
        encode_uri(&encode_uri(&query))
    } else {
        query
    };
    with_separator(url, &query)
}

fn join_pairs(pairs: impl Iterator<Item = (String, String)>) -> String {
    pairs
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn form_pairs(form: &FormData) -> impl Iterator<Item = (String, String)> + '_ {
    form.entries().iter().filter_map(|(name, value)| match value {
        FormValue::Text(text) => Some((name.clone(), text.clone())),
        FormValue::File(_) => None,
    })
}

fn with_separator(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_owned();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// 与浏览器 `encodeURI` 一致的编码：保留 URI 保留字符和非转义字符，
/// 其余字节按 UTF-8 编码成 `%XX`。
pub fn encode_uri(input: &str) -> String {
    const KEEP: &[u8] = b";,/?:@&=+$-_.!~*'()#";
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || KEEP.contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// 生成请求体
///
/// - FormData 原样传递
/// - 文件上传模式下对象转成 multipart 表单
/// - 其他 JSON 序列化成字符串，文本原样发送
pub fn build_body(data: Option<&RequestData>, is_file: bool) -> RequestBody {
    match data {
        None => RequestBody::Empty,
        Some(RequestData::Form(form)) => RequestBody::Form(form.clone()),
        Some(RequestData::Text(text)) => RequestBody::Text(text.clone()),
        Some(RequestData::Json(Value::Null)) => RequestBody::Empty,
        Some(RequestData::Json(Value::Object(map))) if is_file => {
            RequestBody::Form(FormData::from_json_object(map))
        }
        Some(RequestData::Json(Value::String(text))) => RequestBody::Text(text.clone()),
        Some(RequestData::Json(value)) => RequestBody::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AjaxConfig, AjaxOptions, FilePart, HttpMethod};
    use serde_json::json;

    fn prepare(config: AjaxConfig) -> TransportRequest {
        RequestBuilder::prepare(&RequestSpec::merge(config, &AjaxOptions::default()))
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url("/users", None), "/users");
        assert_eq!(resolve_url("/users", Some("")), "/users");
        assert_eq!(resolve_url("/users", Some("/api")), "/api/users");
        assert_eq!(resolve_url("users", Some("/api/")), "/api/users");
        assert_eq!(resolve_url("/users", Some("/api/")), "/api/users");
        assert_eq!(resolve_url("https://other.host/x", Some("/api")), "https://other.host/x");
        assert_eq!(resolve_url("ws://other.host/x", Some("/api")), "ws://other.host/x");
        assert_eq!(resolve_url("httpbin/x", Some("/api")), "/api/httpbin/x");
    }

    #[test]
    fn test_get_data_becomes_query_in_insertion_order() {
        let request = prepare(
            AjaxConfig::new("/users")
                .method(HttpMethod::Get)
                .data(json!({"zeta": 1, "alpha": "a", "flag": true})),
        );
        assert_eq!(request.url, "/users?zeta=1&alpha=a&flag=true");
        assert_eq!(request.body, RequestBody::Empty);
        assert!(!request.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_get_query_appends_with_ampersand() {
        let request = prepare(
            AjaxConfig::new("/users?page=1")
                .method(HttpMethod::Get)
                .data(json!({"size": 20})),
        );
        assert_eq!(request.url, "/users?page=1&size=20");
    }

    #[test]
    fn test_get_text_data_is_appended_verbatim() {
        let request = prepare(AjaxConfig::new("/users").method(HttpMethod::Get).data("a=1&b=2"));
        assert_eq!(request.url, "/users?a=1&b=2");
    }

    #[test]
    fn test_get_empty_object_leaves_url_alone() {
        let request = prepare(AjaxConfig::new("/users").method(HttpMethod::Get).data(json!({})));
        assert_eq!(request.url, "/users");
    }

    #[test]
    fn test_encode_url_encodes_twice() {
        let request = prepare(
            AjaxConfig::new("/search")
                .method(HttpMethod::Get)
                .data(json!({"q": "天 鹅"}))
                .encode_url(true),
        );
        assert_eq!(request.url, format!("/search?{}", encode_uri(&encode_uri("q=天 鹅"))));
        assert!(request.url.contains("%25E5"));
    }

    #[test]
    fn test_encode_uri_keeps_reserved_characters() {
        assert_eq!(encode_uri("a=1&b=x y"), "a=1&b=x%20y");
        assert_eq!(encode_uri("/path?x=#frag"), "/path?x=#frag");
        assert_eq!(encode_uri("é"), "%C3%A9");
    }

    #[test]
    fn test_post_json_sets_default_content_type() {
        let request = prepare(AjaxConfig::new("/users").data(json!({"id": 1})));
        assert_eq!(request.body.as_text(), Some("{\"id\":1}"));
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/json; charset=UTF-8"
        );
    }

    #[test]
    fn test_existing_content_type_is_kept_case_insensitively() {
        let request = prepare(
            AjaxConfig::new("/users")
                .header("Content-Type", "text/plain")
                .data("raw"),
        );
        assert_eq!(request.headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_patch_and_delete_get_no_default_content_type() {
        let patch = prepare(AjaxConfig::new("/users").method(HttpMethod::Patch).data(json!({"id": 1})));
        assert!(!patch.headers.contains_key(CONTENT_TYPE));
        assert_eq!(patch.body.as_text(), Some("{\"id\":1}"));
    }

    #[test]
    fn test_non_get_query_goes_to_url() {
        let request = prepare(
            AjaxConfig::new("/users")
                .query(json!({"page": 2}))
                .data(json!({"id": 1})),
        );
        assert_eq!(request.url, "/users?page=2");
        assert_eq!(request.body.as_text(), Some("{\"id\":1}"));
    }

    #[test]
    fn test_file_mode_builds_form() {
        let request = prepare(
            AjaxConfig::new("/upload")
                .data(json!({"name": "x", "files": ["a", "b"]}))
                .file(true),
        );
        let RequestBody::Form(form) = &request.body else {
            panic!("expected a form body");
        };
        assert_eq!(form.len(), 3);
        assert!(!request.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_form_data_is_passed_through() {
        let mut form = FormData::new();
        form.append_file("file", FilePart::new("a.txt", "hello"));
        let request = prepare(AjaxConfig::new("/upload").data(form.clone()));
        assert_eq!(request.body, RequestBody::Form(form));
    }

    #[test]
    fn test_empty_text_body_gets_no_content_type() {
        let request = prepare(AjaxConfig::new("/users").data(""));
        assert!(request.body.is_empty());
        assert!(!request.headers.contains_key(CONTENT_TYPE));
    }
}
