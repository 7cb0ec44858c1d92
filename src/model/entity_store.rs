use std::collections::BTreeMap;

use derive_more::Display;

/// A key of an entity in an [`EntityStore`].
///
/// Keys are allocated in increasing order and never reused, so iteration order is insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("#{_0}")]
pub struct EntityKey(u64);

/// An arena of entities addressed by [`EntityKey`].
#[derive(Clone, Debug)]
pub struct EntityStore<T> {
    entities: BTreeMap<EntityKey, T>,
    next_key: u64,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_key: 0,
        }
    }

    /// Insert an entity under a fresh key.
    pub fn insert(&mut self, entity: T) -> EntityKey {
        let key = EntityKey(self.next_key);
        self.next_key += 1;
        self.entities.insert(key, entity);
        key
    }

    /// Remove the entity at `key`.
    pub fn remove(&mut self, key: EntityKey) -> Option<T> {
        self.entities.remove(&key)
    }

    /// Get the entity at `key`.
    #[must_use]
    pub fn get(&self, key: EntityKey) -> Option<&T> {
        self.entities.get(&key)
    }

    /// Get the entity at `key` mutably.
    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut T> {
        self.entities.get_mut(&key)
    }

    /// The number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over keys and entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &T)> {
        self.entities.iter().map(|(key, entity)| (*key, entity))
    }

    /// Iterate mutably over keys and entities in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityKey, &mut T)> {
        self.entities.iter_mut().map(|(key, entity)| (*key, entity))
    }

    /// Iterate over entities in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entities.values()
    }

    /// Iterate mutably over entities in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entities.values_mut()
    }

    /// The keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<EntityKey> {
        self.entities.keys().copied().collect()
    }

    /// The key of the first entity matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<EntityKey> {
        self.iter()
            .find(|(_, entity)| predicate(entity))
            .map(|(key, _)| key)
    }

    /// Keep only the entities matching `predicate`.
    pub fn retain(&mut self, mut predicate: impl FnMut(&mut T) -> bool) {
        self.entities.retain(|_, entity| predicate(entity));
    }

    /// Remove and return the entities matching `predicate`, in insertion order.
    pub fn take_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let keys: Vec<EntityKey> = self
            .iter()
            .filter(|(_, entity)| predicate(entity))
            .map(|(key, _)| key)
            .collect();
        keys.into_iter()
            .filter_map(|key| self.entities.remove(&key))
            .collect()
    }
}
