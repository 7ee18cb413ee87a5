use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
    pub environment: String,
    pub openai_enabled: bool,
}

/// Body of `GET /test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResponse {
    pub message: String,
    pub timestamp: String,
    pub ip: Option<String>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
    pub origin: Option<String>,
    pub openai_enabled: bool,
}

pub struct ServerClient {
    client: Client,
    base_url: String,
}

impl ServerClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured reqwest client (custom user agent, proxies, ...).
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the liveness document.
    pub async fn health(&self) -> Result<HealthResponse, Box<dyn std::error::Error>> {
        self.get_json("/health").await
    }

    /// Fetch the connectivity diagnostics, optionally sending an `Origin` header.
    pub async fn connectivity_test(
        &self,
        origin: Option<&str>,
    ) -> Result<TestResponse, Box<dyn std::error::Error>> {
        let mut request = self.client.get(format!("{}/test", self.base_url));
        if let Some(origin) = origin {
            request = request.header("Origin", origin);
        }
        let resp = request.send().await?;
        Self::decode(resp).await
    }

    /// Perform a raw GET against any path on the server.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let resp = self.get(path).await?;
        Self::decode(resp).await
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        resp: Response,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Server returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str::<T>(&text)?)
    }
}
