#![allow(dead_code)]

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

/// A server process bound to a free port with its own data directory.
/// The process is killed when this is dropped.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub data_dir: TempDir,
    child: Child,
}

impl TestServer {
    fn spawn(backend: &str, data_dir: TempDir) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let database_url = format!("sqlite://{}", data_dir.path().join("inventory.db").display());

        let child = Command::new(env!("CARGO_BIN_EXE_inventory-tracker"))
            .env("APP_ENV", "development")
            .env("INVENTORY_HOST", "127.0.0.1")
            .env("INVENTORY_PORT", port.to_string())
            .env("STORAGE_BACKEND", backend)
            .env("DATABASE_URL", database_url)
            .env("DATA_DIR", data_dir.path())
            .env("JWT_SECRET", "integration-test-secret")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            data_dir,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Server on the SQLite backend.
pub async fn spawn_server() -> Result<TestServer> {
    spawn_with_data("sqlite", tempfile::tempdir()?).await
}

/// Server on the JSON backend reading from `data_dir`.
pub async fn spawn_with_data(backend: &str, data_dir: TempDir) -> Result<TestServer> {
    let server = TestServer::spawn(backend, data_dir)?;
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

pub fn write_json(dir: &Path, file: &str, value: &Value) -> Result<()> {
    std::fs::write(dir.join(file), serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub async fn register(server: &TestServer, username: &str, password: &str) -> Result<reqwest::Response> {
    let res = reqwest::Client::new()
        .post(server.url("/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
            "confirm": password
        }))
        .send()
        .await?;
    Ok(res)
}

/// Register `username` and return a bearer token for it.
pub async fn login_new_user(server: &TestServer, username: &str) -> Result<String> {
    let res = register(server, username, "correct horse").await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let res = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "username": username, "password": "correct horse" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("login response has no token")
}

/// `name=value` part of the first Set-Cookie header.
pub fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}
