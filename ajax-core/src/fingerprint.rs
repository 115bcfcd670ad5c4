//! 请求指纹
//!
//! 把请求中决定“是不是同一个请求”的字段拼成一个字符串，作为去重缓存的键。
//! 只求确定、无碰撞，不是加密哈希。

use serde_json::Value;

use crate::types::{FormValue, RequestData, RequestSpec};

const SEPARATOR: char = '\u{1f}';

/// 计算请求指纹：`baseURL`、`url`、方法、序列化后的数据
///
/// 没有 `baseURL` 或没有数据时对应部分按空字符串处理。
pub fn fingerprint(spec: &RequestSpec) -> String {
    let mut key = String::with_capacity(spec.url.len() + 16);
    key.push_str(spec.base_url.as_deref().unwrap_or(""));
    key.push(SEPARATOR);
    key.push_str(&spec.url);
    key.push(SEPARATOR);
    key.push_str(spec.method.as_str());
    key.push(SEPARATOR);
    if let Some(data) = spec.data.as_ref().filter(|data| !data.is_empty()) {
        key.push_str(&serialize_data(data));
    }
    key
}

fn serialize_data(data: &RequestData) -> String {
    match data {
        RequestData::Json(value) => value.to_string(),
        RequestData::Text(text) => Value::String(text.clone()).to_string(),
        RequestData::Form(form) => {
            let fields: Vec<Value> = form
                .entries()
                .iter()
                .map(|(name, value)| {
                    let value = match value {
                        FormValue::Text(text) => text.clone(),
                        FormValue::File(file) => format!("file:{}:{}", file.file_name, file.bytes.len()),
                    };
                    Value::Array(vec![Value::String(name.clone()), Value::String(value)])
                })
                .collect();
            Value::Array(fields).to_string()
        }
    }
}
