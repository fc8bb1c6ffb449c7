use herald_common::{ClientConfig, HttpController, MockResource, Query, Worker};
use herald_macro::worker;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Profile {
    email: String,
    display_name: String,
    level: u32,
}

#[worker(request = Query, response = Profile)]
struct ProfileWorker;

impl Worker for ProfileWorker {
    fn hold_request(&mut self, _request: Query) {}

    fn start(&mut self) {
        println!("🚀 请求用户资料");
    }

    fn progress(&mut self, ratio: f32) {
        println!("   进度 {:.0}%", ratio * 100.0);
    }

    fn execute(&mut self, profile: Profile) {
        println!(
            "👤 {} <{}>，等级 {}",
            profile.display_name, profile.email, profile.level
        );
    }

    fn error_processing(&mut self, status: u16, message: String) {
        println!("❌ ({status}) {message}");
    }
}

/// 纯文本响应
#[worker(key = "StatusWorker", request = Query, response = String, format = text)]
struct StatusWorker;

impl Worker for StatusWorker {
    fn hold_request(&mut self, _request: Query) {}

    fn start(&mut self) {}

    fn progress(&mut self, _ratio: f32) {}

    fn execute(&mut self, status: String) {
        println!("📡 服务状态: {}", status.trim());
    }

    fn error_processing(&mut self, status: u16, message: String) {
        println!("❌ ({status}) {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ClientConfig::new("http://api.test/")
        .with_assets_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
        .with_data_dir(std::env::temp_dir().join("herald-file-demo"));
    let http = HttpController::new(config)?;

    let report = http.mocks().configure(MockResource::File, "mocks.json").await;
    println!("mock 模式: {:?}，共 {} 条", report.mode, report.entries);

    let api = http.anonymous();
    api.get("profile", Query::new(), ProfileWorker).await;
    api.get("status", Query::new(), StatusWorker).await;

    // 缺失的清单会退回到无 mock 状态
    let report = http.mocks().configure(MockResource::File, "missing.json").await;
    println!("mock 模式: {:?}", report.mode);

    Ok(())
}
