use crate::types::RequestSpec;

/// 错误提示的出口
///
/// 默认实现写到日志，界面程序可以换成弹窗、toast 之类。
pub trait MessageSink: Send + Sync {
    /// 展示一条错误消息
    fn handle_message(&self, message: &str);

    /// 处理 2xx 之外、且不在忽略列表里的响应，一般可以在这里做跳转
    fn handle_error_response(&self, status: u16, status_text: &str) {
        log::error!("HTTP error, status = {status}, statusText = {status_text}");
    }
}

/// 默认实现，写到 `log::error!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn handle_message(&self, message: &str) {
        log::error!("{message}");
    }
}

/// 按配置决定是否提示：`is_no_alert` 的请求不提示
pub(crate) fn show_message(sink: &dyn MessageSink, spec: &RequestSpec, message: &str) {
    if spec.is_no_alert {
        return;
    }
    if message.is_empty() {
        sink.handle_message("No message available");
    } else {
        sink.handle_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AjaxConfig, AjaxOptions};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl MessageSink for Collect {
        fn handle_message(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_owned());
        }
    }

    #[test]
    fn test_show_message_respects_no_alert() {
        let sink = Collect::default();
        let loud = RequestSpec::merge(AjaxConfig::new("/a"), &AjaxOptions::default());
        let quiet = RequestSpec::merge(AjaxConfig::new("/a").no_alert(true), &AjaxOptions::default());

        show_message(&sink, &loud, "boom");
        show_message(&sink, &quiet, "hidden");
        show_message(&sink, &loud, "");

        assert_eq!(*sink.0.lock().unwrap(), vec!["boom", "No message available"]);
    }
}
