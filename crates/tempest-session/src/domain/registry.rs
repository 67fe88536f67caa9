//! Identity registry: stable identifier → last observed value.
//!
//! A fresh registry is installed on every connect and disconnect, so entries
//! never leak from one session into the next.

use crate::error::{SessionError, SessionResult};
use crate::ports::outbound::Identity;
use dashmap::DashMap;
use std::hash::Hash;

/// Concurrent cache of lookup results keyed by a stable identifier.
///
/// Last write wins. The default key (empty string for `String`) is never
/// stored.
#[derive(Debug)]
pub struct IdentityRegistry<K, V>
where
    K: Eq + Hash,
{
    store: DashMap<K, V>,
}

impl<K, V> Default for IdentityRegistry<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            store: DashMap::new(),
        }
    }
}

impl<K, V> IdentityRegistry<K, V>
where
    K: Eq + Hash + Clone + Default,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`. Same as [`rebind`](Self::rebind).
    pub fn bind(&self, key: K, value: V) -> Option<V> {
        self.rebind(key, value)
    }

    /// Store `value` under `key`, replacing any previous binding.
    ///
    /// Returns the replaced value. A default key is ignored.
    pub fn rebind(&self, key: K, value: V) -> Option<V> {
        if key == K::default() {
            return None;
        }
        self.store.insert(key, value)
    }

    /// Current binding for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.store.get(key).map(|entry| entry.value().clone())
    }

    /// Remove the binding for `key`, returning it.
    pub fn delete(&self, key: &K) -> Option<V> {
        self.store.remove(key).map(|(_, value)| value)
    }

    /// Visit entries in unspecified order until `visit` returns `false`.
    pub fn iterate<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for entry in self.store.iter() {
            if !visit(entry.key(), entry.value()) {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<V> IdentityRegistry<String, V>
where
    V: Identity + Clone,
{
    /// Store `value` under its own stable identifier and return that
    /// identifier.
    pub fn bind_identity(&self, value: V) -> SessionResult<String> {
        let id = value
            .stable_id()
            .filter(|id| !id.is_empty())
            .ok_or(SessionError::IdentifierUnavailable)?;
        self.store.insert(id.clone(), value);
        Ok(id)
    }
}
