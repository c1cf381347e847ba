//! Named resource storage with find-or-create semantics
//!
//! Every resource kind lives in a [`ResourceStorage`]: a slot map of entries
//! indexed by a unique name. An entry may exist before its payload does. It
//! is then "not ready" and becomes ready the first time a load call supplies
//! source data that initializes successfully.
//!
//! Handles ([`ResourceRef`]) are cheap clones of a shared token. The storage
//! keeps one clone per entry, so [`ResourceRef::ref_count`] reports how many
//! outside holders are left and unreferenced entries can be collected.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use crate::assets::AssetError;

new_key_type! {
    /// Slot of a cache entry
    pub struct ResourceKey;
}

/// Outcome of a load call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Entry already existed and was ready, or no initialization happened
    Found,
    /// New entry created without a payload
    CreatedDefault,
    /// Entry initialized from the supplied data
    CreatedFromData,
    /// Entry exists but is still waiting for data
    Pending,
}

#[derive(Debug)]
struct Token {
    name: String,
}

/// Shared handle to a cached resource
pub struct ResourceRef<T> {
    key: ResourceKey,
    token: Arc<Token>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ResourceRef<T> {
    /// Cache name
    pub fn name(&self) -> &str {
        &self.token.name
    }

    /// Slot key inside the owning storage
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// Number of live handles outside the cache, this one included
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.token).saturating_sub(1)
    }
}

impl<T> Clone for ResourceRef<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            token: Arc::clone(&self.token),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ResourceRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Arc::ptr_eq(&self.token, &other.token)
    }
}

impl<T> Eq for ResourceRef<T> {}

impl<T> fmt::Debug for ResourceRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("name", &self.token.name)
            .field("key", &self.key)
            .finish()
    }
}

struct Entry<T> {
    token: Arc<Token>,
    payload: Option<T>,
}

/// Cache of one resource kind
pub struct ResourceStorage<T> {
    kind: &'static str,
    entries: SlotMap<ResourceKey, Entry<T>>,
    by_name: HashMap<String, ResourceKey>,
}

impl<T> ResourceStorage<T> {
    /// Empty cache; `kind` labels log lines
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: SlotMap::with_key(),
            by_name: HashMap::new(),
        }
    }

    fn make_ref(key: ResourceKey, entry: &Entry<T>) -> ResourceRef<T> {
        ResourceRef {
            key,
            token: Arc::clone(&entry.token),
            _marker: PhantomData,
        }
    }

    /// Handle to an existing entry
    pub fn find_by_name(&self, name: &str) -> Option<ResourceRef<T>> {
        let key = *self.by_name.get(name)?;
        self.entries.get(key).map(|e| Self::make_ref(key, e))
    }

    /// Handle to the entry called `name`, creating an empty one if needed
    pub fn find_or_create(&mut self, name: &str) -> (ResourceRef<T>, bool) {
        if let Some(found) = self.find_by_name(name) {
            return (found, false);
        }
        let entry = Entry {
            token: Arc::new(Token { name: name.to_string() }),
            payload: None,
        };
        let key = self.entries.insert(entry);
        self.by_name.insert(name.to_string(), key);
        (Self::make_ref(key, &self.entries[key]), true)
    }

    /// Find-or-create, then initialize from `source` if the entry is not ready
    ///
    /// A failing `source` is logged and leaves the entry not ready.
    pub fn load_with<F>(&mut self, name: &str, source: Option<F>) -> (ResourceRef<T>, LoadStatus)
    where
        F: FnOnce() -> Result<T, AssetError>,
    {
        let (handle, created) = self.find_or_create(name);
        let ready = self.is_ready(&handle);

        let status = match (ready, source) {
            (true, _) => LoadStatus::Found,
            (false, None) if created => LoadStatus::CreatedDefault,
            (false, None) => LoadStatus::Pending,
            (false, Some(init)) => match init() {
                Ok(payload) => {
                    self.install(&handle, payload);
                    LoadStatus::CreatedFromData
                }
                Err(e) => {
                    log::error!("Failed to initialize {} '{name}': {e}", self.kind);
                    if created {
                        LoadStatus::CreatedDefault
                    } else {
                        LoadStatus::Pending
                    }
                }
            },
        };
        (handle, status)
    }

    /// Set the payload of an entry, replacing any previous one
    pub fn install(&mut self, handle: &ResourceRef<T>, payload: T) -> bool {
        match self.entries.get_mut(handle.key) {
            Some(entry) => {
                entry.payload = Some(payload);
                log::debug!("{} '{}' is ready", self.kind, handle.name());
                true
            }
            None => false,
        }
    }

    /// Payload, if the entry is ready
    pub fn get(&self, handle: &ResourceRef<T>) -> Option<&T> {
        self.entries.get(handle.key)?.payload.as_ref()
    }

    /// Mutable payload, if the entry is ready
    pub fn get_mut(&mut self, handle: &ResourceRef<T>) -> Option<&mut T> {
        self.entries.get_mut(handle.key)?.payload.as_mut()
    }

    /// Whether the entry holds a payload
    pub fn is_ready(&self, handle: &ResourceRef<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still waiting for data
    pub fn num_not_ready(&self) -> usize {
        self.entries.values().filter(|e| e.payload.is_none()).count()
    }

    /// Names of all entries
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.token.name.as_str())
    }

    /// Drop entries no outside handle refers to; returns how many
    pub fn collect_unreferenced(&mut self) -> usize {
        let dead: Vec<ResourceKey> = self
            .entries
            .iter()
            .filter(|(_, e)| Arc::strong_count(&e.token) == 1)
            .map(|(k, _)| k)
            .collect();
        for key in &dead {
            if let Some(entry) = self.entries.remove(*key) {
                self.by_name.remove(&entry.token.name);
            }
        }
        dead.len()
    }

    /// Log every entry still held outside the cache, then empty it
    pub fn release(&mut self) {
        let outstanding: Vec<_> = self
            .entries
            .values()
            .filter(|e| Arc::strong_count(&e.token) > 1)
            .collect();
        if !outstanding.is_empty() {
            log::error!("---------REMAINING {}S--------", self.kind.to_uppercase());
            for entry in &outstanding {
                log::error!("{} ({} refs)", entry.token.name, Arc::strong_count(&entry.token) - 1);
            }
            log::error!("-----------------------------");
        }
        self.entries.clear();
        self.by_name.clear();
    }
}
