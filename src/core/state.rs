use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::storage::StorageService;

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
    started_at: Instant,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState { settings, db, redis, storage, started_at: Instant::now() }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    /// `None` when S3 is not configured; cover uploads answer 503.
    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.inner.storage.as_ref()
    }

    pub(crate) fn uptime_seconds(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
