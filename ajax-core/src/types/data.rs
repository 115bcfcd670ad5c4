use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 请求数据
///
/// JSON 对象保持插入顺序（`serde_json` 开启了 `preserve_order`），
/// 拼接查询参数时的顺序与构造时一致。
#[derive(Debug, Clone, PartialEq)]
pub enum RequestData {
    Json(Value),
    Text(String),
    Form(FormData),
}

impl RequestData {
    /// 把任意可序列化的值转成 JSON 数据
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(RequestData::Json(serde_json::to_value(value)?))
    }

    /// 是否等价于“没有数据”（空字符串、`null`）
    pub fn is_empty(&self) -> bool {
        match self {
            RequestData::Json(Value::Null) => true,
            RequestData::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        RequestData::Json(value)
    }
}

impl From<String> for RequestData {
    fn from(value: String) -> Self {
        RequestData::Text(value)
    }
}

impl From<&str> for RequestData {
    fn from(value: &str) -> Self {
        RequestData::Text(value.to_owned())
    }
}

impl From<FormData> for RequestData {
    fn from(value: FormData) -> Self {
        RequestData::Form(value)
    }
}

/// 上传的文件
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePart {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File(FilePart),
}

/// multipart 表单，字段按追加顺序发送，同名字段可以出现多次
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((name.into(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: impl Into<String>, file: FilePart) {
        self.entries.push((name.into(), FormValue::File(file)));
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 文件上传模式下把 JSON 对象转成表单
    ///
    /// `files` 字段如果是数组，每个元素单独追加一次。
    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        let mut form = FormData::new();
        for (key, value) in object {
            match value {
                Value::Array(items) if key == "files" => {
                    for item in items {
                        form.append(key.as_str(), display_value(item));
                    }
                }
                other => form.append(key.as_str(), display_value(other)),
            }
        }
        form
    }
}

/// 按字符串拼接的规则把 JSON 值转成文本：字符串不带引号，
/// 数组用逗号连接，对象统一显示为 `[object Object]`。
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

/// 未经解析的原始响应
///
/// 响应体已经完整读入内存，可以被多个等待者共享。
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// 状态码在 200..300 之间
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 按名称读取响应头（大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// 请求成功后的结果
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Raw(RawResponse),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawResponse> {
        match self {
            ResponseBody::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    /// 反序列化成业务类型
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match self {
            ResponseBody::Json(value) => T::deserialize(value),
            ResponseBody::Text(text) => serde_json::from_str(text),
            ResponseBody::Raw(raw) => raw.json(),
        }
    }
}

impl std::fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Json(value) => write!(f, "{value}"),
            ResponseBody::Text(text) => f.write_str(text),
            ResponseBody::Raw(raw) => write!(f, "<raw response {} from {}>", raw.status, raw.url),
        }
    }
}
