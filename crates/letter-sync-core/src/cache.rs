//! Cached query results and their invalidation.
//!
//! Keys are the canonical REST resource paths. Each mutation kind declares
//! the exact set of keys it makes stale in `Mutation::invalidates`.

use std::fmt;
use std::future::Future;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::model::{Document, DocumentId, DriveDocument};

/// Identity of one cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `GET /api/documents`
    AllDocuments,
    /// `GET /api/documents/{id}`
    Document(DocumentId),
    /// `GET /api/documents/drive/list`
    DriveListing,
}

impl CacheKey {
    /// Resource path this key caches; also the path it is fetched from.
    pub fn path(&self) -> String {
        match self {
            CacheKey::AllDocuments => "/api/documents".to_string(),
            CacheKey::Document(id) => format!("/api/documents/{}", id),
            CacheKey::DriveListing => "/api/documents/drive/list".to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Value held for a key. Each key accepts exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Documents(Vec<Document>),
    Document(Document),
    DriveListing(Vec<DriveDocument>),
}

impl CachedValue {
    fn fits(&self, key: &CacheKey) -> bool {
        match (key, self) {
            (CacheKey::AllDocuments, CachedValue::Documents(_)) => true,
            (CacheKey::Document(id), CachedValue::Document(doc)) => doc.id == *id,
            (CacheKey::DriveListing, CachedValue::DriveListing(_)) => true,
            _ => false,
        }
    }

    pub fn into_documents(self) -> Option<Vec<Document>> {
        match self {
            CachedValue::Documents(docs) => Some(docs),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            CachedValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn into_drive_listing(self) -> Option<Vec<DriveDocument>> {
        match self {
            CachedValue::DriveListing(docs) => Some(docs),
            _ => None,
        }
    }
}

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never fetched (or the only fetches failed).
    Missing,
    /// A fetch is in flight and no value has landed yet.
    Loading,
    Fresh,
    /// Holds a value that must be re-fetched before it is served.
    Stale,
}

#[derive(Debug, Default)]
struct Entry {
    value: Option<CachedValue>,
    stale: bool,
    in_flight: usize,
    /// Bumped by every invalidation.
    epoch: u64,
}

/// Mutation kinds and the cache keys each one invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create,
    Update(DocumentId),
    Delete(DocumentId),
    Export(DocumentId),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Create => "create",
            Mutation::Update(_) => "update",
            Mutation::Delete(_) => "delete",
            Mutation::Export(_) => "export",
        }
    }

    pub fn invalidates(&self) -> Vec<CacheKey> {
        match *self {
            Mutation::Create => vec![CacheKey::AllDocuments],
            Mutation::Update(id) => vec![CacheKey::AllDocuments, CacheKey::Document(id)],
            Mutation::Delete(_) => vec![CacheKey::AllDocuments],
            Mutation::Export(id) => vec![
                CacheKey::AllDocuments,
                CacheKey::DriveListing,
                CacheKey::Document(id),
            ],
        }
    }
}

/// Cache of query results, shared by handing out an `Arc<QueryCache>`.
///
/// A fetch that completes after its key was invalidated still stores its
/// value, but the entry stays stale so the next read fetches again.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<CacheKey, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &CacheKey) -> EntryState {
        match self.entries.get(key) {
            None => EntryState::Missing,
            Some(entry) => match (&entry.value, entry.stale) {
                (Some(_), false) => EntryState::Fresh,
                (Some(_), true) => EntryState::Stale,
                (None, _) if entry.in_flight > 0 => EntryState::Loading,
                (None, _) => EntryState::Missing,
            },
        }
    }

    /// Last stored value for `key`, fresh or not.
    pub fn peek(&self, key: &CacheKey) -> Option<CachedValue> {
        self.entries.get(key).and_then(|e| e.value.clone())
    }

    /// Whether any fetch for `key` is in flight, including a refresh of a
    /// stale value. See `state` for "no data yet".
    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.in_flight > 0)
    }

    /// Serve a fresh value for `key`, or run `fetch` and store its result.
    ///
    /// A failed fetch leaves the entry as it was.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> Result<CachedValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue>>,
    {
        if let Some(entry) = self.entries.get(&key) {
            if let (Some(value), false) = (&entry.value, entry.stale) {
                debug!("Cache hit for {}", key);
                return Ok(value.clone());
            }
        }

        let (epoch, guard) = {
            let mut entry = self.entries.entry(key).or_default();
            entry.in_flight += 1;
            (
                entry.epoch,
                InFlight {
                    entries: &self.entries,
                    key,
                },
            )
        };
        debug!("Cache miss for {}, fetching", key);

        let result = fetch().await;
        // Release before taking the entry again; the guard locks the same shard.
        drop(guard);

        let mut entry = self.entries.entry(key).or_default();

        let value = result?;
        if !value.fits(&key) {
            return Err(SyncError::Decode(format!(
                "fetched value does not belong to {}",
                key
            )));
        }

        if entry.epoch == epoch {
            entry.stale = false;
        } else {
            debug!("{} was invalidated during fetch, keeping it stale", key);
        }
        entry.value = Some(value.clone());
        Ok(value)
    }

    /// Mark `keys` stale. Nothing is re-fetched until the next read.
    pub fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            if let Some(mut entry) = self.entries.get_mut(key) {
                entry.stale = true;
                entry.epoch += 1;
            }
            debug!("Invalidated {}", key);
        }
    }

    /// Invalidate every key declared for `mutation`; returns those keys.
    pub fn invalidate_for(&self, mutation: Mutation) -> Vec<CacheKey> {
        let keys = mutation.invalidates();
        self.invalidate(&keys);
        keys
    }
}

/// Counts one fetch as in flight until dropped, so a caller that abandons
/// `get_or_fetch` mid-fetch does not leave the entry loading.
struct InFlight<'a> {
    entries: &'a DashMap<CacheKey, Entry>,
    key: CacheKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(mut entry) = self.entries.get_mut(&self.key) {
            entry.in_flight = entry.in_flight.saturating_sub(1);
        }
    }
}
