use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use reqwest::StatusCode;

use crate::core::{NewUser, User, UserUpdate};

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_retries: u32,
    pub retry_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_retries: 5,
            retry_interval: Duration::from_millis(200),
        }
    }
}

/// Typed client for the registry's REST surface.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Connect and verify the server answers its health probe.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(&config.base_url);
        client.health().await?;
        Ok(client)
    }

    pub async fn connect_with_retry(config: ClientConfig) -> Result<Self> {
        let mut retries = config.connect_retries;
        loop {
            match Self::connect(config.clone()).await {
                Ok(client) => return Ok(client),
                Err(e) if retries == 0 => {
                    return Err(e.context("failed to connect after retries"));
                }
                Err(_) => {
                    tokio::time::sleep(config.retry_interval).await;
                    retries -= 1;
                }
            }
        }
    }

    pub async fn health(&self) -> Result<()> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("health check failed")?;
        ensure!(
            resp.status() == StatusCode::OK,
            "unexpected health status {}",
            resp.status()
        );
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let resp = self
            .http
            .get(format!("{}/api/users", self.base_url))
            .send()
            .await
            .context("list_users request failed")?;
        expect_json(resp).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        let resp = self
            .http
            .get(format!("{}/api/users/{}", self.base_url, id))
            .send()
            .await
            .context("get_user request failed")?;
        expect_json(resp).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        let resp = self
            .http
            .post(format!("{}/api/users", self.base_url))
            .json(user)
            .send()
            .await
            .context("create_user request failed")?;
        expect_json(resp).await
    }

    pub async fn update_user(&self, id: i64, patch: &UserUpdate) -> Result<User> {
        let resp = self
            .http
            .put(format!("{}/api/users/{}", self.base_url, id))
            .json(patch)
            .send()
            .await
            .context("update_user request failed")?;
        expect_json(resp).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/api/users/{}", self.base_url, id))
            .send()
            .await
            .context("delete_user request failed")?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(api_error(resp).await)
    }
}

async fn expect_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    if resp.status().is_success() {
        resp.json::<T>().await.context("failed to decode response body")
    } else {
        Err(api_error(resp).await)
    }
}

/// Surface the server's error tag and message; the tag (e.g. `NOT_FOUND`)
/// is stable and suitable for matching.
async fn api_error(resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => anyhow!("{} ({}): {}", status, body.error, body.message),
        Err(_) => anyhow!("request failed with status {}", status),
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}
