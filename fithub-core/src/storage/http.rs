//! Remote backend talking to a fithub key-value server over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::backend::RemoteBackend;
use super::error::BackendError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `PUT /kv/{key}` and response of `GET /kv/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueBody {
    pub value: String,
}

/// Response of `GET /kv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysBody {
    pub keys: Vec<String>,
}

/// Remote backend for the fithub server.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Builds an HTTP URL for a given path.
    fn build_url(&self, path: &str) -> String {
        let base_url = if !self.server_url.starts_with("http://")
            && !self.server_url.starts_with("https://")
        {
            format!("http://{}", self.server_url)
        } else {
            self.server_url.clone()
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    fn key_url(&self, key: &str) -> String {
        self.build_url(&format!("/kv/{}", key))
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

fn http_error(e: reqwest::Error) -> BackendError {
    BackendError::Remote(e.to_string())
}

fn status_error(status: StatusCode) -> BackendError {
    BackendError::Remote(format!("Server returned status {}", status))
}

#[async_trait]
impl RemoteBackend for HttpRemote {
    async fn probe(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(self.build_url("/health"))
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "Health check returned status {}",
                response.status()
            )));
        }

        // The health endpoint is public, so also check the key is accepted.
        let response = self
            .client
            .get(self.build_url("/kv"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "Server rejected credentials with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        let response = self
            .client
            .get(self.key_url(key))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(http_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let body: ValueBody = response.json().await.map_err(http_error)?;
        Ok(Some(body.value))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .put(self.key_url(key))
            .header("Authorization", self.auth_header())
            .json(&ValueBody {
                value: value.to_string(),
            })
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.key_url(key))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(status_error(response.status()));
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.build_url("/kv"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let body: KeysBody = response.json().await.map_err(http_error)?;
        Ok(body.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_http() {
        let remote = HttpRemote::new("http://localhost:8080", "key");
        assert_eq!(remote.build_url("/health"), "http://localhost:8080/health");
    }

    #[test]
    fn test_build_url_trailing_slash() {
        let remote = HttpRemote::new("https://fit.example.com/", "key");
        assert_eq!(
            remote.key_url("workouts"),
            "https://fit.example.com/kv/workouts"
        );
    }

    #[test]
    fn test_build_url_bare_host() {
        let remote = HttpRemote::new("localhost:8080", "key");
        assert_eq!(remote.build_url("/kv"), "http://localhost:8080/kv");
    }

    #[tokio::test]
    async fn test_probe_unreachable_server() {
        // Port 9 (discard) is not expected to run an HTTP server
        let remote = HttpRemote::new("http://127.0.0.1:9", "key");
        let err = remote.probe().await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
