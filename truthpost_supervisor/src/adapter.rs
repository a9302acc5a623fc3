//! Entity store adapter.
//!
//! The core never owns persistence. It sees the store as a flat
//! `(kind, id) -> document` map with load and upsert; documents are the
//! JSON encoding of a `truthpost_core::Entity`.
//!
//! - `MemoryStore` is the in-process implementation with snapshot/restore.
//! - `Staged` buffers one event's writes so a failed handler leaves no trace.

use std::collections::BTreeMap;

use thiserror::Error;
use truthpost_core::Entity;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Load-by-id / upsert primitives over raw documents.
pub trait EntityStore {
    fn get_doc(&self, kind: &str, id: &str) -> Result<Option<String>, StoreError>;

    fn put_doc(&mut self, kind: &str, id: &str, doc: String) -> Result<(), StoreError>;
}

/// Typed access on top of any `EntityStore`, trait objects included.
pub trait StoreExt: EntityStore {
    fn load<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        match self.get_doc(E::KIND, id)? {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    fn exists<E: Entity>(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.get_doc(E::KIND, id)?.is_some())
    }

    fn upsert<E: Entity>(&mut self, entity: &E) -> Result<(), StoreError> {
        let doc = serde_json::to_string(entity)?;
        self.put_doc(E::KIND, entity.id(), doc)
    }
}

impl<T: EntityStore + ?Sized> StoreExt for T {}

type DocKey = (String, String);

/// Snapshot of a `MemoryStore` for storage-agnostic persistence.
///
/// Entries are `(kind, id, document)` sorted by kind then id.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoreSnapshot {
    pub entries: Vec<(String, String, String)>,
}

/// Counters returned by restore operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RestoreStats {
    /// Number of documents applied from the snapshot.
    pub applied: usize,
    /// Number of existing documents that were overwritten.
    pub overwritten: usize,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    docs: BTreeMap<DocKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of stored documents of one entity kind.
    pub fn count<E: Entity>(&self) -> usize {
        self.docs.keys().filter(|(kind, _)| kind == E::KIND).count()
    }

    /// Export every document. Ordering is deterministic.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            entries: self
                .docs
                .iter()
                .map(|((kind, id), doc)| (kind.clone(), id.clone(), doc.clone()))
                .collect(),
        }
    }

    /// Replace the whole content with a snapshot.
    pub fn restore(&mut self, snap: StoreSnapshot) -> RestoreStats {
        self.docs.clear();
        self.restore_merge(snap)
    }

    /// Merge a snapshot into the current content; snapshot entries win.
    pub fn restore_merge(&mut self, snap: StoreSnapshot) -> RestoreStats {
        let mut stats = RestoreStats::default();
        for (kind, id, doc) in snap.entries {
            if self.docs.insert((kind, id), doc).is_some() {
                stats.overwritten += 1;
            }
            stats.applied += 1;
        }
        stats
    }
}

impl EntityStore for MemoryStore {
    fn get_doc(&self, kind: &str, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.docs.get(&(kind.to_string(), id.to_string())).cloned())
    }

    fn put_doc(&mut self, kind: &str, id: &str, doc: String) -> Result<(), StoreError> {
        self.docs.insert((kind.to_string(), id.to_string()), doc);
        Ok(())
    }
}

/// Write overlay for a single event.
///
/// Reads fall through to the underlying store unless the overlay already holds
/// a newer version. Nothing reaches the underlying store until `commit`.
pub struct Staged<'a> {
    base: &'a dyn EntityStore,
    writes: BTreeMap<DocKey, String>,
}

impl<'a> Staged<'a> {
    pub fn new(base: &'a dyn EntityStore) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Detach the buffered writes so they can be applied to the base store.
    pub fn into_writes(self) -> Vec<(String, String, String)> {
        self.writes
            .into_iter()
            .map(|((kind, id), doc)| (kind, id, doc))
            .collect()
    }
}

impl EntityStore for Staged<'_> {
    fn get_doc(&self, kind: &str, id: &str) -> Result<Option<String>, StoreError> {
        match self.writes.get(&(kind.to_string(), id.to_string())) {
            Some(doc) => Ok(Some(doc.clone())),
            None => self.base.get_doc(kind, id),
        }
    }

    fn put_doc(&mut self, kind: &str, id: &str, doc: String) -> Result<(), StoreError> {
        self.writes.insert((kind.to_string(), id.to_string()), doc);
        Ok(())
    }
}

/// Apply detached writes to a store.
pub fn commit(
    store: &mut dyn EntityStore,
    writes: Vec<(String, String, String)>,
) -> Result<(), StoreError> {
    for (kind, id, doc) in writes {
        store.put_doc(&kind, &id, doc)?;
    }
    Ok(())
}
