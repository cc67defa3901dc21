//! Key-value storage for pending passcodes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::models::OtpRecord;

/// Mapping from email to its pending [`OtpRecord`].
///
/// Implementations must make each call atomic on its own; callers compose
/// calls without holding a lock across them.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn get(&self, email: &str) -> Result<Option<OtpRecord>>;

    /// Insert or overwrite the record keyed by `record.email`.
    async fn put(&self, record: OtpRecord) -> Result<()>;

    async fn remove(&self, email: &str) -> Result<Option<OtpRecord>>;

    /// Drop every record expired at `now`, returning how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    async fn len(&self) -> Result<usize>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryOtpStore {
    records: RwLock<HashMap<String, OtpRecord>>,
}

impl MemoryOtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn get(&self, email: &str) -> Result<Option<OtpRecord>> {
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn put(&self, record: OtpRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.email.clone(), record);
        Ok(())
    }

    async fn remove(&self, email: &str) -> Result<Option<OtpRecord>> {
        Ok(self.records.write().await.remove(email))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok(before - records.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
