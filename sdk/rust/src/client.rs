use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub id: String,
    pub name: String,
    pub api_key: String, // Only returned here; keep it somewhere safe
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityInfo {
    pub id: String,
    pub name: String,
    pub created_at: u64,
}

pub struct KeygateClient {
    client: Client,
    base_url: String,
    api_key_header: String,
}

impl KeygateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key_header: "X-API-Key".to_string(),
        }
    }

    /// Provision a new identity and receive its API key.
    pub async fn provision(&self, name: &str) -> Result<ProvisionResponse, Box<dyn std::error::Error>> {
        let resp = self.client
            .post(format!("{}/api/v1/users", self.base_url))
            .json(&ProvisionRequest { name: name.to_string() })
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Gateway returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str::<ProvisionResponse>(&text)?)
    }

    /// GET a path with the key in the key header.
    pub async fn get_with_key(&self, path: &str, api_key: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header(self.api_key_header.as_str(), api_key)
            .send()
            .await
    }

    /// GET a path with the key as a bearer token.
    pub async fn get_with_bearer(&self, path: &str, api_key: &str) -> Result<Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(api_key)
            .send()
            .await
    }

    /// Fetch the identity behind `api_key`.
    pub async fn whoami(&self, api_key: &str) -> Result<IdentityInfo, Box<dyn std::error::Error>> {
        let resp = self.get_with_key("/api/v1/me", api_key).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Gateway returned error status {}", status).into());
        }
        Ok(resp.json::<IdentityInfo>().await?)
    }
}
