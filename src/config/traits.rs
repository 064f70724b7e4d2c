use serde_json::Value;

use crate::error::ConfigurationError;
use crate::resource::Resource;

/// Scope for a configuration lookup.
///
/// Without a resource or language the lookup returns the global value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationOverrides<'a> {
    /// Resource whose folder-level settings apply.
    pub resource: Option<&'a Resource>,
    /// Language identifier whose `[language]` override block applies.
    pub override_identifier: Option<&'a str>,
}

impl<'a> ConfigurationOverrides<'a> {
    /// Global scope.
    #[must_use]
    pub const fn global() -> Self {
        Self {
            resource: None,
            override_identifier: None,
        }
    }

    /// Scope of a single resource.
    #[must_use]
    pub const fn for_resource(resource: &'a Resource) -> Self {
        Self {
            resource: Some(resource),
            override_identifier: None,
        }
    }

    /// Adds a language override identifier.
    #[must_use]
    pub const fn with_language(mut self, language: &'a str) -> Self {
        self.override_identifier = Some(language);
        self
    }
}

/// Read/write access to layered settings.
///
/// Implementations merge the global layer with resource and language
/// overrides; this crate only consumes the merged result.
pub trait ConfigurationService: Send + Sync {
    /// Returns the merged value of `section` (a key like `files` or
    /// `files.autoSave`), or `None` if nothing is set.
    fn get_value(&self, section: &str, overrides: &ConfigurationOverrides<'_>) -> Option<Value>;

    /// Persists a global value. `Value::Null` removes the setting.
    fn update_value(&self, key: &str, value: Value) -> Result<(), ConfigurationError>;
}

/// Notification that a set of setting keys changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationChange {
    keys: Vec<String>,
}

impl ConfigurationChange {
    /// Creates a change notification for the given keys.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// The changed keys.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns true if `section` or anything nested in it (or a parent of
    /// it) changed.
    #[must_use]
    pub fn affects(&self, section: &str) -> bool {
        self.keys.iter().any(|key| {
            key == section || is_nested(key, section) || is_nested(section, key)
        })
    }
}

fn is_nested(child: &str, parent: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('.'))
}
