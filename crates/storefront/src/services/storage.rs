//! Object storage client for product images.
//!
//! Uploads go to `{bucket}/{product_id}/{filename}` with upsert enabled, so
//! re-uploading a file with the same name replaces it. The public URL of an
//! object is deterministic and needs no extra round trip.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use pampa_core::ProductId;

use crate::config::StorefrontConfig;

/// Errors that can occur when talking to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage rejected the upload.
    #[error("storage error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The object path cannot be expressed as a URL.
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    /// Service key contains characters not allowed in a header.
    #[error("invalid service key: {0}")]
    InvalidKey(String),
}

/// Object storage client bound to one bucket.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: Url,
    bucket: String,
}

impl StorageClient {
    /// Create a storage client from the managed backend configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, StorageError> {
        let key = config.supabase.service_role_key.expose_secret();
        let mut headers = HeaderMap::new();

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let mut apikey =
            HeaderValue::from_str(key).map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.gateway_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase.url.clone(),
            bucket: config.supabase.storage_bucket.clone(),
        })
    }

    /// Upload one image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns error if the file name is unusable, the request fails, or
    /// storage rejects the object.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn upload_product_image(
        &self,
        product_id: &ProductId,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let filename = sanitize_filename(filename)?;
        let upload_url = self.object_url(&["object"], product_id, &filename)?;

        let response = self
            .client
            .post(upload_url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "Image upload rejected");
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        self.public_url(product_id, &filename)
    }

    /// Public URL of an uploaded product image.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] if the base URL cannot carry a path.
    pub fn public_url(&self, product_id: &ProductId, filename: &str) -> Result<String, StorageError> {
        self.object_url(&["object", "public"], product_id, filename)
            .map(String::from)
    }

    fn object_url(
        &self,
        prefix: &[&str],
        product_id: &ProductId,
        filename: &str,
    ) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidPath(self.base_url.to_string()))?
            .pop_if_empty()
            .push("storage")
            .push("v1")
            .extend(prefix)
            .push(&self.bucket)
            .push(product_id.as_str())
            .push(filename);
        Ok(url)
    }
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_filename(filename: &str) -> Result<String, StorageError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(StorageError::InvalidPath(format!(
            "unusable file name '{filename}'"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::config::SupabaseConfig;

    fn client(base: &str) -> StorageClient {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/pampa"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            supabase: SupabaseConfig {
                url: Url::parse(base).unwrap(),
                service_role_key: SecretString::from("k3y-Zq81"),
                storage_bucket: "produtos".to_string(),
            },
            gateway_timeout: Duration::from_secs(5),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        StorageClient::new(&config).unwrap()
    }

    #[test]
    fn test_public_url_layout() {
        let storage = client("https://abcd.supabase.co");
        let url = storage
            .public_url(&ProductId::parse("PP742").unwrap(), "frente.jpg")
            .unwrap();
        assert_eq!(
            url,
            "https://abcd.supabase.co/storage/v1/object/public/produtos/PP742/frente.jpg"
        );
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let storage = client("https://abcd.supabase.co/");
        let url = storage
            .public_url(&ProductId::parse("PP742").unwrap(), "boina azul.png")
            .unwrap();
        assert!(url.ends_with("/PP742/boina%20azul.png"));
    }

    #[test]
    fn test_sanitize_filename_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\fotos\\bota.jpg").unwrap(), "bota.jpg");
        assert!(sanitize_filename("fotos/").is_err());
        assert!(sanitize_filename("..").is_err());
    }
}
