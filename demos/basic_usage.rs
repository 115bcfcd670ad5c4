use ajax_core::{Ajax, AjaxConfig, AjaxOptions, HttpMethod, RequestData};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// 用户数据结构
#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

/// 创建用户请求
#[derive(Serialize)]
struct CreateUserRequest {
    name: String,
    email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("=== Ajax Basic Usage Example ===\n");

    let ajax = Ajax::new(AjaxOptions {
        base_url: Some("https://jsonplaceholder.typicode.com".into()),
        timeout: Some(10_000),
        ..Default::default()
    });

    // 示例1：GET 请求，data 会拼到查询参数里
    println!("1. 获取用户");
    match ajax
        .get("/users", Some(json!({"id": 1}).into()), AjaxOptions::default())
        .await
    {
        Ok(body) => {
            let users: Vec<User> = body.deserialize()?;
            println!("   ✅ 获取 {} 个用户\n", users.len());
        }
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    // 示例2：同一时间的相同请求只发一次
    println!("2. 并发相同请求");
    let config = || AjaxConfig::new("/users/1").method(HttpMethod::Get);
    let first = ajax.ajax(config());
    let second = ajax.ajax(config());
    println!("   缓存条目数: {}", ajax.cached_len());
    let (first, second) = tokio::join!(first, second);
    if let (Ok(first), Ok(second)) = (first, second) {
        println!("   ✅ 两次拿到相同结果: {}\n", first.to_string() == second.to_string());
    }

    // 示例3：POST 请求，默认带 JSON content-type
    println!("3. 创建新用户...");
    let new_user = CreateUserRequest {
        name: "张三".to_string(),
        email: "zhangsan@example.com".to_string(),
    };
    match ajax
        .post("/users", Some(RequestData::json(&new_user)?), AjaxOptions::default())
        .await
    {
        Ok(body) => println!("   ✅ 创建结果: {}\n", body),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    // 示例4：错误状态
    println!("4. 请求不存在的资源");
    match ajax
        .ajax(
            AjaxConfig::new("/not-found")
                .method(HttpMethod::Get)
                .no_alert(true),
        )
        .await
    {
        Ok(body) => println!("   ✅ {}\n", body),
        Err(e) => println!("   ❌ {} (status = {:?})\n", e, e.status()),
    }

    println!("🎉 所有示例运行完成！");

    Ok(())
}
