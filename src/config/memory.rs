//! In-memory configuration backend.
//!
//! Holds a global layer, per-language override layers and per-folder layers.
//! Intended for embedding, tests and benches.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};

use crate::config::traits::{ConfigurationOverrides, ConfigurationService};
use crate::error::ConfigurationError;
use crate::resource::{IdentityService, PathIdentity, Resource};

type Layer = BTreeMap<String, Value>;

fn lock_err(context: &'static str) -> ConfigurationError {
    ConfigurationError::Backend {
        message: format!("poisoned lock: {context}"),
    }
}

#[derive(Debug, Default)]
struct ConfigState {
    global: Layer,
    languages: HashMap<String, Layer>,
    folders: Vec<(Resource, Layer)>,
    extension_languages: HashMap<String, String>,
    locked_keys: HashSet<String>,
}

/// Layered settings store.
///
/// Lookup precedence, lowest first: global, `[language]` override, folder
/// settings (deeper folders win over their ancestors).
pub struct MemoryConfiguration {
    identity: Arc<dyn IdentityService>,
    state: RwLock<ConfigState>,
}

impl Default for MemoryConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfiguration").finish_non_exhaustive()
    }
}

impl MemoryConfiguration {
    /// Creates an empty store with case-sensitive folder matching.
    #[must_use]
    pub fn new() -> Self {
        Self::with_identity(Arc::new(PathIdentity::case_sensitive()))
    }

    /// Creates an empty store that matches folder layers with `identity`.
    #[must_use]
    pub fn with_identity(identity: Arc<dyn IdentityService>) -> Self {
        Self {
            identity,
            state: RwLock::new(ConfigState::default()),
        }
    }

    /// Sets a global value. `Value::Null` removes it.
    pub fn set(&self, key: &str, value: Value) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        put(&mut state.global, key, value);
    }

    /// Sets a value inside a `[language]` override block.
    pub fn set_for_language(&self, language: &str, key: &str, value: Value) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        put(state.languages.entry(language.to_string()).or_default(), key, value);
    }

    /// Sets a value for every resource at or below `folder`.
    pub fn set_for_folder(&self, folder: &Resource, key: &str, value: Value) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let existing = state
            .folders
            .iter()
            .position(|(f, _)| self.identity.is_equal(f, folder));
        let idx = match existing {
            Some(idx) => idx,
            None => {
                state.folders.push((folder.clone(), Layer::new()));
                state.folders.len() - 1
            }
        };
        put(&mut state.folders[idx].1, key, value);
    }

    /// Associates a file extension with a language so resource lookups pick
    /// up that language's override block.
    pub fn register_extension(&self, extension: &str, language: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .extension_languages
            .insert(extension.to_ascii_lowercase(), language.to_string());
    }

    /// Makes `key` reject writes through [`ConfigurationService::update_value`].
    pub fn lock_key(&self, key: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.locked_keys.insert(key.to_string());
    }

    fn merged(&self, state: &ConfigState, overrides: &ConfigurationOverrides<'_>) -> Layer {
        let mut merged = state.global.clone();

        let language = overrides.override_identifier.map(str::to_string).or_else(|| {
            overrides
                .resource
                .and_then(Resource::extension)
                .and_then(|ext| state.extension_languages.get(&ext.to_ascii_lowercase()).cloned())
        });
        if let Some(layer) = language.as_deref().and_then(|l| state.languages.get(l)) {
            merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Some(resource) = overrides.resource {
            let mut folders: Vec<&(Resource, Layer)> = state
                .folders
                .iter()
                .filter(|(folder, _)| self.identity.is_equal_or_parent(resource, folder))
                .collect();
            folders.sort_by_key(|(folder, _)| folder.path.len());
            for (_, layer) in folders {
                merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }

        merged
    }
}

fn put(layer: &mut Layer, key: &str, value: Value) {
    if value.is_null() {
        layer.remove(key);
    } else {
        layer.insert(key.to_string(), value);
    }
}

impl ConfigurationService for MemoryConfiguration {
    fn get_value(&self, section: &str, overrides: &ConfigurationOverrides<'_>) -> Option<Value> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let merged = self.merged(&state, overrides);

        if let Some(value) = merged.get(section) {
            return Some(value.clone());
        }

        let prefix = format!("{section}.");
        let children: Map<String, Value> = merged
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(prefix.as_str()).map(|rest| (rest.to_string(), v.clone())))
            .collect();
        if children.is_empty() {
            None
        } else {
            Some(Value::Object(children))
        }
    }

    fn update_value(&self, key: &str, value: Value) -> Result<(), ConfigurationError> {
        let mut state = self.state.write().map_err(|_| lock_err("configuration"))?;
        if state.locked_keys.contains(key) {
            return Err(ConfigurationError::NotWritable {
                key: key.to_string(),
            });
        }
        put(&mut state.global, key, value);
        Ok(())
    }
}
