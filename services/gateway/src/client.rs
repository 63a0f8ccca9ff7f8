//! Client for the session authority's HTTP API

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Remote operations the edge needs from the session authority
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Ask the authority whether the raw `Authorization` value is valid
    async fn verify_token(&self, authorization: &str) -> GatewayResult<bool>;

    /// Revoke the session behind the raw `Authorization` value
    async fn logout(&self, authorization: &str) -> GatewayResult<()>;
}

#[derive(Deserialize)]
struct VerifyResponse {
    valid: bool,
}

/// [`AuthClient`] speaking JSON over HTTP
#[derive(Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    /// Create a client for the authority at `base_url`, every call bounded by `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn verify_token(&self, authorization: &str) -> GatewayResult<bool> {
        let response = self
            .client
            .post(format!("{}/auth/verify", self.base_url))
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Upstream(format!(
                "verify returned {}",
                response.status()
            )));
        }

        let body: VerifyResponse = response.json().await?;
        debug!("Authority verdict: {}", body.valid);
        Ok(body.valid)
    }

    async fn logout(&self, authorization: &str) -> GatewayResult<()> {
        let response = self
            .client
            .post(format!("{}/auth/logout", self.base_url))
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
            status => Err(GatewayError::Upstream(format!("logout returned {}", status))),
        }
    }
}
