use std::collections::HashMap;

use crate::resource::ResourceKey;

/// Readonly overrides set during this session.
///
/// Nothing here is persisted; entries are added and removed one resource at
/// a time.
#[derive(Debug, Default)]
pub struct SessionReadonlyOverrides {
    entries: HashMap<ResourceKey, bool>,
}

impl SessionReadonlyOverrides {
    /// Creates an empty override map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The override for a resource, if any.
    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<bool> {
        self.entries.get(key).copied()
    }

    /// Sets the override for a resource. Returns the previous value.
    pub fn set(&mut self, key: ResourceKey, readonly: bool) -> Option<bool> {
        self.entries.insert(key, readonly)
    }

    /// Removes the override for a resource. Returns the removed value.
    pub fn reset(&mut self, key: &ResourceKey) -> Option<bool> {
        self.entries.remove(key)
    }

    /// Number of resources with an override.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{IdentityService, PathIdentity, Resource};

    #[test]
    fn set_get_reset() {
        let id = PathIdentity::case_sensitive();
        let key = id.key(&Resource::file("/a"));
        let mut overrides = SessionReadonlyOverrides::new();

        assert_eq!(overrides.get(&key), None);
        assert_eq!(overrides.set(key.clone(), true), None);
        assert_eq!(overrides.set(key.clone(), false), Some(true));
        assert_eq!(overrides.get(&key), Some(false));
        assert_eq!(overrides.reset(&key), Some(false));
        assert_eq!(overrides.reset(&key), None);
        assert!(overrides.is_empty());
    }
}
