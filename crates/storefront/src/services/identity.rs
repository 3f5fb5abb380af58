//! Identity provider client.
//!
//! The browser signs in against the managed identity provider and hands the
//! resulting access token to `POST /api/auth/session`. The token is verified
//! here by asking the provider who it belongs to.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use pampa_core::UserId;

use crate::config::StorefrontConfig;

/// Errors that can occur when verifying an access token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider does not recognise the token.
    #[error("invalid or expired access token")]
    InvalidToken,

    /// The provider answered with an unexpected status.
    #[error("identity provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client setup failed.
    #[error("identity client configuration error: {0}")]
    Config(String),
}

/// A user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for the identity provider's user endpoint.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    user_url: Url,
}

impl IdentityClient {
    /// Create an identity client from the managed backend configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot carry a path.
    pub fn new(config: &StorefrontConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        let mut apikey = HeaderValue::from_str(config.supabase.service_role_key.expose_secret())
            .map_err(|e| IdentityError::Config(e.to_string()))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.gateway_timeout)
            .build()?;

        let mut user_url = config.supabase.url.clone();
        user_url
            .path_segments_mut()
            .map_err(|()| IdentityError::Config("SUPABASE_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["auth", "v1", "user"]);

        Ok(Self { client, user_url })
    }

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] for unknown or expired tokens,
    /// and other variants when the provider cannot be reached.
    #[tracing::instrument(skip_all)]
    pub async fn verify_access_token(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| IdentityError::InvalidToken)?;
        bearer.set_sensitive(true);

        let response = self
            .client
            .get(self.user_url.clone())
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(IdentityError::InvalidToken);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: IdentityUser = response.json().await?;
        tracing::debug!(user_id = %user.id, "Access token verified");
        Ok(user)
    }
}
