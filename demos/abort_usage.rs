use std::time::Duration;

use ajax_core::{AbortController, Ajax, AjaxConfig, AjaxExOptions, AjaxOptions, HttpMethod};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=== Ajax Abort & Timeout Example ===\n");

    let ajax = Ajax::new(AjaxOptions {
        base_url: Some("https://httpbin.org".into()),
        ..Default::default()
    });

    // 示例1：超时
    println!("1. 超时请求");
    let result = ajax
        .ajax(
            AjaxConfig::new("/delay/5")
                .options(AjaxOptions {
                    timeout_error_message: Some("服务器响应太慢".into()),
                    ..Default::default()
                })
                .method(HttpMethod::Get)
                .timeout(1000),
        )
        .await;
    match result {
        Ok(_) => println!("   ✅ 请求完成\n"),
        Err(e) => println!("   ⏱️ {} (status = {:?})\n", e.message(), e.status()),
    }

    // 示例2：手动取消
    println!("2. 手动取消");
    let result = ajax.get_abort_result("/delay/3", None, AjaxOptions::default());
    tokio::time::sleep(Duration::from_millis(200)).await;
    result.abort();
    match result.response.await {
        Ok(_) => println!("   ✅ 请求完成\n"),
        Err(e) => println!("   🛑 已取消: {}\n", e.is_abort()),
    }

    // 示例3：外部取消信号
    println!("3. 外部取消信号");
    let controller = AbortController::new();
    let response = ajax.get(
        "/delay/3",
        None,
        AjaxExOptions {
            signal: Some(controller.signal()),
            ..Default::default()
        },
    );
    controller.abort();
    if let Err(e) = response.await {
        println!("   🛑 {}\n", e);
    }

    // 示例4：停止之后只有 is_out_stop 的请求能发出
    println!("4. 停止 Ajax");
    ajax.stop_ajax();
    match ajax.ajax(AjaxConfig::new("/get").method(HttpMethod::Get)).await {
        Ok(_) => println!("   ✅ 请求完成"),
        Err(e) => println!("   🚫 {}", e),
    }
    match ajax
        .ajax(AjaxConfig::new("/get").method(HttpMethod::Get).out_stop(true))
        .await
    {
        Ok(_) => println!("   ✅ out_stop 请求完成\n"),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    Ok(())
}
