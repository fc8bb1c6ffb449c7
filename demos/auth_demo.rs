use herald_common::{
    ClientConfig, HttpController, JsonFileStore, MockResource, Query, Token, Worker,
};
use herald_macro::worker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 登录与注册的请求体
#[derive(Debug, Clone, Serialize)]
struct AuthDto {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct TokenDto {
    #[serde(rename = "Token")]
    token: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationDto {
    email: String,
}

#[derive(Debug, Deserialize)]
struct ProfileDto {
    email: String,
}

#[worker(request = AuthDto, response = TokenDto)]
#[derive(Default)]
struct AuthWorker {
    token: Option<String>,
}

impl Worker for AuthWorker {
    fn hold_request(&mut self, request: AuthDto) {
        log::debug!("Signing in as {}", request.email);
    }

    fn start(&mut self) {}

    fn progress(&mut self, ratio: f32) {
        log::debug!("Sign in progress {:.0}%", ratio * 100.0);
    }

    fn execute(&mut self, response: TokenDto) {
        println!("🔑 Token: {}", response.token);
        self.token = Some(response.token);
    }

    fn error_processing(&mut self, status: u16, message: String) {
        println!("❌ 登录失败 ({status}): {message}");
    }
}

#[worker(key = "RegistrationWorker", request = AuthDto, response = RegistrationDto)]
#[derive(Default)]
struct RegistrationWorker {
    email: Option<String>,
}

impl Worker for RegistrationWorker {
    fn hold_request(&mut self, _request: AuthDto) {}

    fn start(&mut self) {}

    fn progress(&mut self, _ratio: f32) {}

    fn execute(&mut self, response: RegistrationDto) {
        println!("📝 已注册: {}", response.email);
        self.email = Some(response.email);
    }

    fn error_processing(&mut self, status: u16, message: String) {
        println!("❌ 注册失败 ({status}): {message}");
    }
}

#[worker(request = Query, response = ProfileDto)]
#[derive(Default)]
struct ProfileWorker;

impl Worker for ProfileWorker {
    fn hold_request(&mut self, _request: Query) {}

    fn start(&mut self) {}

    fn progress(&mut self, _ratio: f32) {}

    fn execute(&mut self, response: ProfileDto) {
        println!("👤 当前用户: {}", response.email);
    }

    fn error_processing(&mut self, status: u16, message: String) {
        println!("❌ 获取用户失败 ({status}): {message}");
    }
}

/// 登录、注册与登出
struct AuthController {
    http: HttpController,
}

impl AuthController {
    async fn sign_in(&self, login: &str, password: &str) -> anyhow::Result<bool> {
        let param = AuthDto {
            email: login.to_string(),
            password: password.to_string(),
        };
        let worker = self
            .http
            .anonymous()
            .post("auth/login", Some(param), AuthWorker::default())
            .await;

        match worker.token {
            Some(token) => {
                self.http.tokens().set(Some(Token::new(token)))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sign_up(&self, login: &str, password: &str) -> Option<String> {
        let param = AuthDto {
            email: login.to_string(),
            password: password.to_string(),
        };
        self.http
            .anonymous()
            .post("auth/register", Some(param), RegistrationWorker::default())
            .await
            .email
    }

    fn sign_out(&self) -> anyhow::Result<()> {
        self.http.tokens().set(None)
    }

    async fn profile(&self) {
        self.http
            .authorized()
            .get("auth/me", Query::new(), ProfileWorker)
            .await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let data_dir = std::env::temp_dir().join("herald-auth-demo");
    let config = ClientConfig::new("http://api.test/").with_data_dir(&data_dir);
    let store = JsonFileStore::open(data_dir.join("prefs.json"))?;
    let http = HttpController::builder(config).store(Arc::new(store)).build()?;

    println!("=== 内存 mock ===");
    http.mocks().configure(MockResource::Memory, "").await;
    http.mocks().put("AuthWorker", r#"{"Token":"demo-token"}"#);
    http.mocks()
        .put("POST:auth/register", r#"{"email":"new@user.test"}"#);
    http.mocks().put("GET:auth/me", r#"{"email":"a@b.com"}"#);
    for (key, value) in http.mocks().entries() {
        println!("  {key} => {value}");
    }

    let auth = AuthController { http: http.clone() };

    println!("\n=== 注册 ===");
    auth.sign_up("new@user.test", "secret").await;

    println!("\n=== 登录 ===");
    if auth.sign_in("a@b.com", "x").await? {
        println!("✅ 令牌已保存: {:?}", http.tokens().get().map(|token| token.token));
    }
    auth.profile().await;

    println!("\n=== 后台请求 ===");
    let dispatcher = http.authorized();
    let handle = tokio::spawn(async move {
        dispatcher
            .get("auth/me", Query::new(), ProfileWorker)
            .await
    });
    handle.await?;

    println!("\n=== 登出 ===");
    auth.sign_out()?;
    println!("令牌: {:?}", http.tokens().get());

    http.mocks().put("GET:auth/me", "null");
    auth.profile().await;

    Ok(())
}
