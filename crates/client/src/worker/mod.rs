//! The worker: one dispatcher method per host event.
//!
//! A [`Worker`] owns one version's cache pair, its lifecycle state and the
//! fetch engine. Hosts feed it events (`install`, `activate`, `fetch`,
//! `message`, `push`, `notification_click`) and act on what it returns.

pub mod background;
pub mod lifecycle;
pub mod messages;

use std::sync::Arc;

use chrono::Utc;
use pantry_core::cache::PartitionInfo;
use pantry_core::{
    AppConfig, CacheDb, CacheStore, ClassificationRules, Error, OfflineResponder, PartitionNames, Request,
};
use tokio::sync::Mutex;
use url::Url;

use crate::engine::{FetchEngine, FetchOutcome};
use crate::fetch::{Transport, resolve};
use crate::push::{self, ClickOutcome, Notification, WindowClient};

pub use background::BackgroundTasks;
pub use lifecycle::{Phase, WorkerState};
pub use messages::{ControlMessage, MessageReply};

pub struct Worker {
    origin: Url,
    cache_version: String,
    user_cache_patterns: Vec<String>,
    precache: Vec<Url>,
    store: CacheStore,
    transport: Arc<dyn Transport>,
    engine: FetchEngine,
    state: Mutex<WorkerState>,
    background: BackgroundTasks,
}

impl Worker {
    /// Build a worker for the version described by `config`.
    ///
    /// The version recorded by the last successful activation stays active
    /// until this worker activates.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin, a precache URL or the
    /// fallback page cannot be resolved, or a storage error reading the
    /// active version.
    pub async fn new(config: &AppConfig, db: CacheDb, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let precache = config
            .precache_urls
            .iter()
            .map(|u| resolve(u, &origin).map_err(|e| Error::InvalidUrl(format!("{u}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        let fallback = resolve(&config.fallback_page, &origin)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.fallback_page)))?;

        let store = CacheStore::new(db, PartitionNames::for_version(&config.cache_version));
        let previous = store.active_version().await?;
        let background = BackgroundTasks::new();

        // Requests go to the active version's pair until this one activates.
        let controlling = match store.active_cache_version().await? {
            Some(active) if active != config.cache_version => store.with_names(PartitionNames::for_version(&active)),
            _ => store.clone(),
        };

        let engine = FetchEngine::new(
            controlling,
            transport.clone(),
            ClassificationRules::from_config(config),
            OfflineResponder::new(fallback),
            background.clone(),
        );

        tracing::info!(
            version = %config.version_id(),
            previous = previous.as_deref().unwrap_or("none"),
            "worker created"
        );

        Ok(Self {
            origin,
            cache_version: config.cache_version.clone(),
            user_cache_patterns: config.user_cache_patterns.clone(),
            precache,
            store,
            transport,
            engine,
            state: Mutex::new(WorkerState::new(config.version_id(), previous)),
            background,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn precache_urls(&self) -> &[Url] {
        &self.precache
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    pub async fn state(&self) -> WorkerState {
        self.state.lock().await.clone()
    }

    pub async fn partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.store.partitions().await
    }

    /// Install, then activate straight away if skip-waiting was signalled.
    pub async fn start(&self) -> Result<(), Error> {
        self.install().await?;
        if self.state.lock().await.skip_waiting {
            self.activate().await?;
        }
        Ok(())
    }

    /// Prime the static partition. Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// `Error::PrimingFailed` if any manifest URL cannot be fetched or answers
    /// with a non-2xx status. Nothing is written in that case and the worker
    /// becomes redundant.
    pub async fn install(&self) -> Result<usize, Error> {
        self.state.lock().await.begin_install()?;

        match self.populate_static().await {
            Ok(count) => {
                self.state.lock().await.install_succeeded()?;
                tracing::info!(entries = count, partition = %self.store.names().static_name, "install complete");
                Ok(count)
            }
            Err(e) => {
                self.state.lock().await.install_failed()?;
                tracing::error!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn populate_static(&self) -> Result<usize, Error> {
        let mut batch = Vec::with_capacity(self.precache.len());

        for url in &self.precache {
            let request = Request::get(url.clone());
            let response = self
                .transport
                .fetch(&request)
                .await
                .map_err(|e| Error::PrimingFailed { url: url.to_string(), reason: e.to_string() })?;

            if !(200..300).contains(&response.status) {
                return Err(Error::PrimingFailed {
                    url: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            tracing::debug!(url = %url, status = response.status, "fetched precache entry");
            batch.push((request, response));
        }

        self.store.prime_static(&batch).await
    }

    /// Evict every partition outside this version's pair and take control of
    /// request handling. Returns the deleted partition names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let version = {
            let mut state = self.state.lock().await;
            state.begin_activate()?;
            state.version.clone()
        };

        let result = async {
            let deleted = self.store.evict_stale().await?;
            self.store.set_active_version(&version, &self.cache_version).await?;
            Ok::<_, Error>(deleted)
        }
        .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(deleted) => {
                state.activated()?;
                self.engine.route_to(self.store.clone()).await;
                tracing::info!(version = %version, evicted = deleted.len(), "worker activated");
                Ok(deleted)
            }
            Err(e) => {
                state.activation_failed()?;
                tracing::error!(version = %version, error = %e, "activation failed");
                Err(e)
            }
        }
    }

    /// Intercept one request.
    pub async fn fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        self.engine.handle(request).await
    }

    pub async fn message(&self, message: ControlMessage) -> Result<MessageReply, Error> {
        match message {
            ControlMessage::SkipWaiting => {
                let ready = self.state.lock().await.request_skip_waiting();
                if ready {
                    self.activate().await?;
                }
                let phase = self.state.lock().await.phase;
                Ok(MessageReply::SkipWaiting { activated: ready, phase })
            }
            ControlMessage::GetVersion => {
                let version = self.state.lock().await.active_version().map(str::to_string);
                Ok(MessageReply::Version { version, kind: self.cache_version.clone() })
            }
            ControlMessage::ClearUserCache => {
                let deleted = self.store.clear_matching(&self.user_cache_patterns).await?;
                Ok(MessageReply::ClearUserCache { deleted })
            }
            ControlMessage::Unknown => {
                tracing::debug!("ignoring unknown control message");
                Ok(MessageReply::Ignored)
            }
        }
    }

    pub fn push(&self, data: Option<&[u8]>) -> Notification {
        push::handle_push(data, Utc::now())
    }

    pub fn notification_click(
        &self, action: Option<&str>, data_url: Option<&str>, windows: &[WindowClient],
    ) -> ClickOutcome {
        push::handle_click(action, data_url, windows)
    }
}
