//! Glob matchers for `files.readonlyInclude` / `files.readonlyExclude`.

use std::collections::BTreeMap;
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde_json::Value;

use crate::config::{ConfigurationChange, ConfigurationOverrides, ConfigurationService};
use crate::error::ValidationError;
use crate::host::WorkspaceContext;
use crate::resource::Resource;

/// Resolves whether a resource matches a pattern set.
pub trait GlobMatcher {
    /// Returns true if `resource` matches any pattern.
    fn matches(&self, resource: &Resource) -> bool;
}

/// A compiled set of glob patterns matched against paths.
///
/// `*` does not cross `/`; `**` does.
#[derive(Debug, Clone)]
pub struct GlobPatternMatcher {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Default for GlobPatternMatcher {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

impl GlobPatternMatcher {
    /// Compiles `patterns`, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidGlobPattern` for a pattern that does
    /// not parse.
    pub fn try_new<I, S>(patterns: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            builder.add(compile(pattern)?);
        }
        let set = builder.build().map_err(|e| ValidationError::InvalidGlobPattern {
            pattern: patterns.join(","),
            reason: e.to_string(),
        })?;
        Ok(Self { patterns, set })
    }

    /// Compiles the enabled entries of a `{ pattern: true }` setting.
    /// Invalid patterns are logged and skipped.
    #[must_use]
    pub fn from_setting(setting: Option<&BTreeMap<String, Value>>) -> Self {
        let enabled = setting
            .into_iter()
            .flatten()
            .filter(|(_, enabled)| enabled.as_bool() == Some(true))
            .map(|(pattern, _)| pattern.clone());

        let mut patterns = Vec::new();
        let mut builder = GlobSetBuilder::new();
        for pattern in enabled {
            match compile(&pattern) {
                Ok(glob) => {
                    builder.add(glob);
                    patterns.push(pattern);
                }
                Err(err) => tracing::warn!(%err, "skipping readonly glob pattern"),
            }
        }

        match builder.build() {
            Ok(set) => Self { patterns, set },
            Err(err) => {
                tracing::warn!(%err, "failed to build readonly glob set");
                Self::default()
            }
        }
    }

    /// The compiled patterns.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if no pattern is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if `path` matches any pattern.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        !self.is_empty() && self.set.is_match(path)
    }
}

fn compile(pattern: &str) -> Result<globset::Glob, ValidationError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ValidationError::InvalidGlobPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

/// Glob matcher bound to a setting key.
///
/// Each workspace folder gets the patterns resolved for that folder, so a
/// folder-level value replaces the global one inside it. Resources outside
/// every folder use the global patterns. Patterns are matched against the
/// absolute path and, inside a folder, the folder-relative path.
pub struct ConfiguredGlobMatcher {
    key: &'static str,
    workspace: Arc<dyn WorkspaceContext>,
    global: GlobPatternMatcher,
    folders: Vec<(Resource, GlobPatternMatcher)>,
}

impl std::fmt::Debug for ConfiguredGlobMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredGlobMatcher")
            .field("key", &self.key)
            .field("patterns", &self.global.patterns())
            .field("folders", &self.folders.len())
            .finish_non_exhaustive()
    }
}

impl ConfiguredGlobMatcher {
    /// Builds a matcher from the current value of `key`.
    #[must_use]
    pub fn new(key: &'static str, config: &dyn ConfigurationService, workspace: Arc<dyn WorkspaceContext>) -> Self {
        let folders = read_folder_patterns(key, config, workspace.as_ref());
        Self {
            key,
            workspace,
            global: read_patterns(key, config, &ConfigurationOverrides::global()),
            folders,
        }
    }

    /// The setting key this matcher follows.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Rebuilds the pattern sets if `change` affects the key. Returns true if
    /// any compiled pattern set differs afterwards.
    pub fn on_configuration_change(&mut self, change: &ConfigurationChange, config: &dyn ConfigurationService) -> bool {
        if !change.affects(self.key) {
            return false;
        }
        let global = read_patterns(self.key, config, &ConfigurationOverrides::global());
        let folders = read_folder_patterns(self.key, config, self.workspace.as_ref());

        let changed = global.patterns() != self.global.patterns()
            || folders.len() != self.folders.len()
            || folders
                .iter()
                .zip(&self.folders)
                .any(|((next_folder, next), (folder, current))| {
                    next_folder != folder || next.patterns() != current.patterns()
                });
        self.global = global;
        self.folders = folders;
        changed
    }

    fn matcher_for(&self, folder: Option<&Resource>) -> &GlobPatternMatcher {
        folder
            .and_then(|folder| self.folders.iter().find(|(f, _)| f == folder))
            .map_or(&self.global, |(_, matcher)| matcher)
    }
}

impl GlobMatcher for ConfiguredGlobMatcher {
    fn matches(&self, resource: &Resource) -> bool {
        let folder = self.workspace.containing_folder(resource);
        let matcher = self.matcher_for(folder.as_ref());
        if matcher.is_empty() {
            return false;
        }
        if matcher.matches_path(&resource.path) {
            return true;
        }
        self.workspace
            .relative_path(resource)
            .is_some_and(|relative| matcher.matches_path(&relative))
    }
}

fn read_patterns(
    key: &str,
    config: &dyn ConfigurationService,
    overrides: &ConfigurationOverrides<'_>,
) -> GlobPatternMatcher {
    let value = config.get_value(key, overrides);
    let setting: Option<BTreeMap<String, Value>> = value.and_then(|v| serde_json::from_value(v).ok());
    GlobPatternMatcher::from_setting(setting.as_ref())
}

fn read_folder_patterns(
    key: &str,
    config: &dyn ConfigurationService,
    workspace: &dyn WorkspaceContext,
) -> Vec<(Resource, GlobPatternMatcher)> {
    workspace
        .folders()
        .into_iter()
        .map(|folder| {
            let matcher = read_patterns(key, config, &ConfigurationOverrides::for_resource(&folder));
            (folder, matcher)
        })
        .collect()
}
