use ajax_core::{Ajax, AjaxOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://jsonplaceholder.typicode.com/todos".to_string());

    let ajax = Ajax::new(AjaxOptions::default());
    log::info!("GET {url}");

    let body = ajax
        .get(&url, Some(json!({"_limit": 3}).into()), AjaxOptions::default())
        .await?;
    println!("{body}");

    Ok(())
}
