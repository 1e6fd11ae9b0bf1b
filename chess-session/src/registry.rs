use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A `key -> connection` map with per-key synchronisation (spec §4.9: "no
/// global lock"). `register` replaces any prior entry, which is exactly the
/// reconnection behaviour the spec calls for.
pub struct Registry<K, C> {
    connections: DashMap<K, Arc<C>>,
}

impl<K, C> Default for Registry<K, C>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Registry { connections: DashMap::new() }
    }
}

impl<K, C> Registry<K, C>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: K, connection: Arc<C>) {
        self.connections.insert(key, connection);
    }

    pub fn unregister(&self, key: K) {
        self.connections.remove(&key);
    }

    pub fn get(&self, key: K) -> Option<Arc<C>> {
        self.connections.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// `gameId -> set of (userId, connection)`, used for spectators where many
/// connections share one key (spec §4.9).
pub struct GroupRegistry<K, M, C> {
    groups: DashMap<K, DashMap<M, Arc<C>>>,
}

impl<K, M, C> Default for GroupRegistry<K, M, C>
where
    K: Eq + Hash,
    M: Eq + Hash,
{
    fn default() -> Self {
        GroupRegistry { groups: DashMap::new() }
    }
}

impl<K, M, C> GroupRegistry<K, M, C>
where
    K: Eq + Hash + Copy,
    M: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: K, member: M, connection: Arc<C>) {
        if !self.groups.contains_key(&key) {
            self.groups.insert(key, DashMap::new());
        }
        if let Some(group) = self.groups.get(&key) {
            group.insert(member, connection);
        }
    }

    pub fn unregister(&self, key: K, member: M) {
        if let Some(group) = self.groups.get(&key) {
            group.remove(&member);
        }
    }

    /// Removes the whole group, e.g. once a game ends and every spectator
    /// connection has been closed.
    pub fn remove_group(&self, key: K) {
        self.groups.remove(&key);
    }

    pub fn members(&self, key: K) -> Vec<(M, Arc<C>)> {
        match self.groups.get(&key) {
            Some(group) => group.iter().map(|entry| (*entry.key(), Arc::clone(entry.value()))).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_replaces_prior_entry_for_the_same_key() {
        let registry: Registry<u32, &'static str> = Registry::new();
        registry.register(1, Arc::new("first"));
        registry.register(1, Arc::new("second"));
        assert_eq!(registry.len(), 1);
        assert_eq!(*registry.get(1).unwrap(), "second");
    }

    #[test]
    fn unregister_removes_the_entry() {
        let registry: Registry<u32, &'static str> = Registry::new();
        registry.register(1, Arc::new("conn"));
        registry.unregister(1);
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn group_registry_tracks_multiple_members_per_key() {
        let registry: GroupRegistry<u32, u32, &'static str> = GroupRegistry::new();
        registry.register(1, 10, Arc::new("spectator-a"));
        registry.register(1, 20, Arc::new("spectator-b"));
        assert_eq!(registry.members(1).len(), 2);

        registry.unregister(1, 10);
        assert_eq!(registry.members(1).len(), 1);

        registry.remove_group(1);
        assert!(registry.members(1).is_empty());
    }
}
