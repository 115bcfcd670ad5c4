use std::sync::Arc;

use ajax_core::{
    Ajax, AjaxConfig, AjaxOptions, ErrorKind, HttpMethod, OperationError, RequestSpec,
    ResponseBody, ResponseInterceptor,
};
use async_trait::async_trait;

/// 日志拦截器：记录响应
struct LoggingInterceptor;

#[async_trait]
impl ResponseInterceptor for LoggingInterceptor {
    async fn on_response(&self, body: ResponseBody) -> Result<ResponseBody, OperationError> {
        println!("📝 LoggingInterceptor: 响应内容长度 {}", body.to_string().len());
        Ok(body)
    }

    async fn on_error(&self, error: OperationError) -> Result<ResponseBody, OperationError> {
        println!("📝 LoggingInterceptor: 请求失败 {}", error);
        Err(error)
    }
}

/// 404 时返回空数组
struct NotFoundFallback;

#[async_trait]
impl ResponseInterceptor for NotFoundFallback {
    async fn on_error(&self, error: OperationError) -> Result<ResponseBody, OperationError> {
        if error.kind() == ErrorKind::Http && error.status() == Some(404) {
            return Ok(ResponseBody::Json(serde_json::json!([])));
        }
        Err(error)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=== Ajax Interceptor Usage Example ===\n");

    let ajax = Ajax::new(AjaxOptions {
        base_url: Some("https://jsonplaceholder.typicode.com".into()),
        ..Default::default()
    });

    // 认证拦截器：闭包形式
    let auth = ajax.interceptors().request.register(Arc::new(
        |spec: &mut RequestSpec| -> anyhow::Result<()> {
            println!("🔐 AuthInterceptor: 添加认证头部");
            spec.set_header("Authorization", "Bearer demo-token-12345")
        },
    ));
    ajax.interceptors().response.register(Arc::new(LoggingInterceptor));
    ajax.interceptors().response.register(Arc::new(NotFoundFallback));

    println!("1. 带认证头的请求");
    match ajax
        .ajax(AjaxConfig::new("/users/1").method(HttpMethod::Get))
        .await
    {
        Ok(body) => println!("   ✅ {}\n", body),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    println!("2. 404 被拦截器转成空数组");
    match ajax
        .ajax(
            AjaxConfig::new("/missing")
                .method(HttpMethod::Get)
                .no_alert(true),
        )
        .await
    {
        Ok(body) => println!("   ✅ {}\n", body),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    println!("3. 移除认证拦截器之后");
    ajax.interceptors().request.eject(auth);
    match ajax
        .ajax(AjaxConfig::new("/users/2").method(HttpMethod::Get))
        .await
    {
        Ok(body) => println!("   ✅ {}\n", body),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    Ok(())
}
