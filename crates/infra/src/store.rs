//! Keyed record store used for master data, orders and purchase orders.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use forgeplan_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(String),

    #[error("record {0} already exists")]
    Duplicate(String),

    /// A writer panicked while holding the lock.
    #[error("store unavailable")]
    Unavailable,
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => DomainError::not_found(key),
            StoreError::Duplicate(key) => DomainError::duplicate(key),
            StoreError::Unavailable => DomainError::invariant("store unavailable"),
        }
    }
}

/// Keyed store abstraction.
///
/// `list` returns records in insertion order; `upsert` of an existing key
/// keeps its position.
pub trait KeyedStore<K, V>: Send + Sync {
    /// Insert a new record, failing with `Duplicate` if the key exists.
    fn add(&self, key: K, value: V) -> Result<(), StoreError>;
    fn upsert(&self, key: K, value: V) -> Result<(), StoreError>;
    fn get(&self, key: &K) -> Result<V, StoreError>;
    fn remove(&self, key: &K) -> Result<V, StoreError>;
    fn list(&self) -> Vec<V>;
    fn contains(&self, key: &K) -> bool;
}

impl<K, V, S> KeyedStore<K, V> for Arc<S>
where
    S: KeyedStore<K, V> + ?Sized,
{
    fn add(&self, key: K, value: V) -> Result<(), StoreError> {
        (**self).add(key, value)
    }

    fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        (**self).upsert(key, value)
    }

    fn get(&self, key: &K) -> Result<V, StoreError> {
        (**self).get(key)
    }

    fn remove(&self, key: &K) -> Result<V, StoreError> {
        (**self).remove(key)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }

    fn contains(&self, key: &K) -> bool {
        (**self).contains(key)
    }
}

#[derive(Debug)]
struct Entries<K, V> {
    index: HashMap<K, usize>,
    records: Vec<(K, V)>,
}

impl<K: Clone + Eq + Hash, V> Entries<K, V> {
    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, (key, _))| (key.clone(), pos))
            .collect();
    }
}

/// In-memory store for tests/dev and the single-process service.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    inner: RwLock<Entries<K, V>>,
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Entries {
                index: HashMap::new(),
                records: Vec::new(),
            }),
        }
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedStore<K, V> for InMemoryStore<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn add(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut entries = self.inner.write().map_err(|_| StoreError::Unavailable)?;
        if entries.index.contains_key(&key) {
            return Err(StoreError::Duplicate(key.to_string()));
        }
        let pos = entries.records.len();
        entries.index.insert(key.clone(), pos);
        entries.records.push((key, value));
        Ok(())
    }

    fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut entries = self.inner.write().map_err(|_| StoreError::Unavailable)?;
        match entries.index.get(&key).copied() {
            Some(pos) => entries.records[pos].1 = value,
            None => {
                let pos = entries.records.len();
                entries.index.insert(key.clone(), pos);
                entries.records.push((key, value));
            }
        }
        Ok(())
    }

    fn get(&self, key: &K) -> Result<V, StoreError> {
        let entries = self.inner.read().map_err(|_| StoreError::Unavailable)?;
        entries
            .index
            .get(key)
            .map(|pos| entries.records[*pos].1.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn remove(&self, key: &K) -> Result<V, StoreError> {
        let mut entries = self.inner.write().map_err(|_| StoreError::Unavailable)?;
        let pos = entries
            .index
            .get(key)
            .copied()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let (_, value) = entries.records.remove(pos);
        entries.reindex();
        Ok(value)
    }

    fn list(&self) -> Vec<V> {
        match self.inner.read() {
            Ok(entries) => entries.records.iter().map(|(_, v)| v.clone()).collect(),
            Err(_) => vec![],
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.inner
            .read()
            .map(|entries| entries.index.contains_key(key))
            .unwrap_or(false)
    }
}
