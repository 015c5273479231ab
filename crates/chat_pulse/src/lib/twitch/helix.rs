use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::{
    twitch::StatusSource,
    types::{HelixResponse, HelixStream, HelixUser, TokenResponse},
};

/// Minimal Twitch Helix client: user and stream lookups plus a single
/// client-credentials token refresh.
pub struct HelixClient {
    client: Client,
    client_id: String,
    client_secret: Option<String>,
    access_token: RwLock<Option<String>>,
    base_url: String,
    auth_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HelixError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No access token available and no client secret to request one")]
    MissingCredentials,
}

impl HelixClient {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            client_id: client_id.into(),
            client_secret: None,
            access_token: RwLock::new(None),
            base_url: "https://api.twitch.tv/helix".into(),
            auth_url: "https://id.twitch.tv/oauth2/token".into(),
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = RwLock::new(Some(token.into()));
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Requests a new app access token with the client-credentials grant and
    /// keeps it for subsequent requests.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<String, HelixError> {
        let secret = self
            .client_secret
            .as_deref()
            .ok_or(HelixError::MissingCredentials)?;

        let resp = self
            .client
            .post(&self.auth_url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", secret),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to request access token"))?;

        let token = Self::parse::<TokenResponse>(resp).await?.access_token;
        *self.access_token.write().await = Some(token.clone());
        tracing::info!("Refreshed Helix access token");

        Ok(token)
    }

    async fn token(&self) -> Result<String, HelixError> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_token().await
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response, HelixError> {
        let token = self.token().await?;
        let resp = request
            .bearer_auth(token)
            .header("Client-Id", &self.client_id)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;
        Ok(resp)
    }

    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, HelixError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(HelixError::Api { status, message });
        }
        Ok(resp.json::<T>().await?)
    }

    async fn first<T: DeserializeOwned>(
        &self,
        path: &str,
        query: (&str, &str),
    ) -> Result<Option<T>, HelixError> {
        let request = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .query(&[query]);
        let resp = self.authorized(request).await?;
        let body = Self::parse::<HelixResponse<T>>(resp).await?;
        Ok(body.data.into_iter().next())
    }
}

impl StatusSource for HelixClient {
    type Error = HelixError;

    async fn lookup_user(&self, login: &str) -> Result<Option<HelixUser>, Self::Error> {
        self.first("users", ("login", login)).await
    }

    async fn lookup_stream(&self, user_id: &str) -> Result<Option<HelixStream>, Self::Error> {
        self.first("streams", ("user_id", user_id)).await
    }
}
