//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::gateway::Gateway;
use crate::services::identity::{IdentityClient, IdentityError};
use crate::services::storage::{StorageClient, StorageError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// data gateway, the managed backend clients and configuration.
pub struct AppState<G> {
    inner: Arc<AppStateInner<G>>,
}

struct AppStateInner<G> {
    config: StorefrontConfig,
    gateway: G,
    storage: StorageClient,
    identity: IdentityClient,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: Gateway> AppState<G> {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage or identity client cannot be built.
    pub fn new(config: StorefrontConfig, gateway: G) -> Result<Self, StateError> {
        let storage = StorageClient::new(&config)?;
        let identity = IdentityClient::new(&config)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                storage,
                identity,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the data gateway.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    /// Get a reference to the object storage client.
    #[must_use]
    pub fn storage(&self) -> &StorageClient {
        &self.inner.storage
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }
}
