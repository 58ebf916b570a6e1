//! Fetch interception.
//!
//! Each intercepted request is classified once and dispatched to exactly one
//! strategy:
//!
//! | request            | strategy                                             |
//! |--------------------|------------------------------------------------------|
//! | non-GET            | network only, errors returned to the caller          |
//! | `UserData`         | network only, offline response on transport failure  |
//! | `DynamicCacheable` | network first, dynamic partition as fallback         |
//! | `StaticAsset`      | cache first, stored in the dynamic partition on miss |
//! | `Unclassified`     | cache first, passed through on miss                  |
//!
//! Cache writes happen in the background and their failures are only logged.

use std::sync::Arc;

use pantry_core::{
    CacheStore, Classification, ClassificationRules, Error, OfflineResponder, PartitionKind, Request, Response,
};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::fetch::Transport;
use crate::worker::background::BackgroundTasks;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Offline,
}

/// The single response produced for an intercepted request.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    pub classification: Classification,
}

/// Cloning shares the routing, so every clone follows [`FetchEngine::route_to`].
#[derive(Clone)]
pub struct FetchEngine {
    store: Arc<RwLock<CacheStore>>,
    transport: Arc<dyn Transport>,
    rules: ClassificationRules,
    offline: OfflineResponder,
    background: BackgroundTasks,
}

impl FetchEngine {
    pub fn new(
        store: CacheStore, transport: Arc<dyn Transport>, rules: ClassificationRules, offline: OfflineResponder,
        background: BackgroundTasks,
    ) -> Self {
        Self { store: Arc::new(RwLock::new(store)), transport, rules, offline, background }
    }

    /// The partition pair requests are currently served from.
    pub async fn store(&self) -> CacheStore {
        self.store.read().await.clone()
    }

    /// Serve from and write to `store` from now on.
    pub async fn route_to(&self, store: CacheStore) {
        let mut current = self.store.write().await;
        tracing::info!(
            from = %current.names().dynamic_name,
            to = %store.names().dynamic_name,
            "fetch engine rerouted"
        );
        *current = store;
    }

    /// Produce exactly one response for `request`.
    ///
    /// # Errors
    ///
    /// Only non-GET requests can fail, with `Error::TransportFailure` or
    /// `Error::FetchTooLarge`; every GET failure becomes an offline response.
    pub async fn handle(&self, request: Request) -> Result<FetchOutcome, Error> {
        if !request.is_get() {
            tracing::debug!(method = %request.method, path = request.url.path(), "bypassing cache for non-GET");
            let response = self.transport.fetch(&request).await?;
            return Ok(FetchOutcome { response, source: ResponseSource::Network, classification: Classification::UserData });
        }

        let store = self.store().await;
        let classification = self.rules.classify(&request.method, &request.url);
        let (response, source) = match classification {
            Classification::UserData => self.network_only(&store, &request).await,
            Classification::DynamicCacheable => self.network_first(&store, &request).await,
            Classification::StaticAsset | Classification::Unclassified => {
                self.cache_first(&store, &request, classification).await
            }
        };

        Ok(FetchOutcome { response, source, classification })
    }

    async fn network_only(&self, store: &CacheStore, request: &Request) -> (Response, ResponseSource) {
        tracing::debug!(path = request.url.path(), "bypassing cache for user data");
        match self.transport.fetch(request).await {
            Ok(response) => {
                if response.header("x-no-cache").is_some() {
                    tracing::debug!(path = request.url.path(), "server confirmed no-cache for user data");
                }
                (response, ResponseSource::Network)
            }
            Err(e) => {
                tracing::info!(path = request.url.path(), error = %e, "network failed for user data, serving offline response");
                (self.offline.respond(store, request).await, ResponseSource::Offline)
            }
        }
    }

    async fn network_first(&self, store: &CacheStore, request: &Request) -> (Response, ResponseSource) {
        match self.transport.fetch(request).await {
            Ok(response) => {
                if response.status == 200 {
                    self.store_in_background(store, request, &response).await;
                }
                (response, ResponseSource::Network)
            }
            Err(e) => {
                tracing::info!(path = request.url.path(), error = %e, "network failed, trying dynamic partition");
                match store.lookup(PartitionKind::Dynamic, request).await {
                    Ok(Some(cached)) => (cached, ResponseSource::Cache),
                    Ok(None) => (self.offline.respond(store, request).await, ResponseSource::Offline),
                    Err(e) => {
                        tracing::warn!(path = request.url.path(), error = %e, "cache lookup failed");
                        (self.offline.respond(store, request).await, ResponseSource::Offline)
                    }
                }
            }
        }
    }

    async fn cache_first(
        &self, store: &CacheStore, request: &Request, classification: Classification,
    ) -> (Response, ResponseSource) {
        match store.lookup_any(request).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %request.url, "serving from cache");
                return (cached, ResponseSource::Cache);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, going to network"),
        }

        let response = match self.transport.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "fetch failed");
                return (self.offline.respond(store, request).await, ResponseSource::Offline);
            }
        };

        if response.is_cacheable()
            && (classification == Classification::StaticAsset
                || self.rules.is_cacheable_resource(&request.method, &request.url))
        {
            self.store_in_background(store, request, &response).await;
        }

        (response, ResponseSource::Network)
    }

    async fn store_in_background(&self, store: &CacheStore, request: &Request, response: &Response) {
        let store = store.clone();
        let request = request.clone();
        let response = response.clone();
        self.background
            .spawn(async move {
                if let Err(e) = store.store(PartitionKind::Dynamic, &request, &response).await {
                    tracing::warn!(url = %request.url, error = %e, "cache put failed");
                }
            })
            .await;
    }
}
