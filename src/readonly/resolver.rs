use std::sync::Arc;

use crate::config::{keys, ConfigurationChange, ConfigurationService};
use crate::host::{FileService, FileStat, WorkspaceContext};
use crate::resource::{IdentityService, Resource};

use super::glob::{ConfiguredGlobMatcher, GlobMatcher};
use super::session::SessionReadonlyOverrides;
use super::{ReadonlyDecision, ReadonlySource};

pub(crate) const PROVIDER_READONLY_MESSAGE: &str = "The file system of this file is read-only.";
pub(crate) const SESSION_READONLY_MESSAGE: &str = "The file was set read-only in this session.";
pub(crate) const CONFIGURED_READONLY_MESSAGE: &str = "The file was set read-only via the files.readonlyInclude setting.";
pub(crate) const FILE_LOCKED_MESSAGE: &str = "The file is write-protected by its permissions.";
pub(crate) const FILE_READONLY_MESSAGE: &str = "The file is read-only.";

/// Readonly status resolution.
///
/// Rules are checked in a fixed order and the first match wins:
///
/// 1. provider capability
/// 2. session override (either way)
/// 3. protected locations (user data home, workspace configuration file)
///    are always writable
/// 4. `files.readonlyInclude` unless `files.readonlyExclude` also matches
/// 5. permission lock, when `files.readonlyFromPermissions` is on
/// 6. file system readonly flag
pub struct ReadonlyResolver {
    identity: Arc<dyn IdentityService>,
    files: Arc<dyn FileService>,
    workspace: Arc<dyn WorkspaceContext>,
    user_roaming_data_home: Option<Resource>,
    include: ConfiguredGlobMatcher,
    exclude: ConfiguredGlobMatcher,
    session: SessionReadonlyOverrides,
    from_permissions: bool,
}

impl std::fmt::Debug for ReadonlyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadonlyResolver")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("session", &self.session)
            .field("from_permissions", &self.from_permissions)
            .finish_non_exhaustive()
    }
}

impl ReadonlyResolver {
    /// Creates a resolver reading glob patterns from `config`.
    /// `files.readonlyFromPermissions` starts off; the service sets it.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        files: Arc<dyn FileService>,
        workspace: Arc<dyn WorkspaceContext>,
        config: &dyn ConfigurationService,
        user_roaming_data_home: Option<Resource>,
    ) -> Self {
        let include = ConfiguredGlobMatcher::new(keys::READONLY_INCLUDE, config, Arc::clone(&workspace));
        let exclude = ConfiguredGlobMatcher::new(keys::READONLY_EXCLUDE, config, Arc::clone(&workspace));
        Self {
            identity,
            files,
            workspace,
            user_roaming_data_home,
            include,
            exclude,
            session: SessionReadonlyOverrides::new(),
            from_permissions: false,
        }
    }

    /// Resolves the readonly status of `resource`. `stat` is optional file
    /// metadata; without it the permission and file system rules never
    /// match.
    #[must_use]
    pub fn is_readonly(&self, resource: &Resource, stat: Option<&FileStat>) -> ReadonlyDecision {
        if let Some(caps) = self.files.provider_capabilities(&resource.scheme) {
            if caps.readonly {
                let message = caps
                    .readonly_message
                    .unwrap_or_else(|| PROVIDER_READONLY_MESSAGE.to_string());
                return ReadonlyDecision::readonly(ReadonlySource::Provider, message);
            }
        }

        match self.session.get(&self.identity.key(resource)) {
            Some(true) => return ReadonlyDecision::readonly(ReadonlySource::Session, SESSION_READONLY_MESSAGE),
            Some(false) => return ReadonlyDecision::Writable,
            None => {}
        }

        if self.is_protected(resource) {
            return ReadonlyDecision::Writable;
        }

        if self.include.matches(resource) {
            if self.exclude.matches(resource) {
                return ReadonlyDecision::Writable;
            }
            return ReadonlyDecision::readonly(ReadonlySource::Configured, CONFIGURED_READONLY_MESSAGE);
        }

        if let Some(stat) = stat {
            if self.from_permissions && stat.locked {
                return ReadonlyDecision::readonly(ReadonlySource::FileLocked, FILE_LOCKED_MESSAGE);
            }
            if stat.readonly {
                return ReadonlyDecision::readonly(ReadonlySource::FileReadonly, FILE_READONLY_MESSAGE);
            }
        }

        ReadonlyDecision::Writable
    }

    fn is_protected(&self, resource: &Resource) -> bool {
        let in_user_home = self
            .user_roaming_data_home
            .as_ref()
            .is_some_and(|home| self.identity.is_equal_or_parent(resource, home));
        if in_user_home {
            return true;
        }
        self.workspace
            .configuration_file()
            .is_some_and(|config| self.identity.is_equal(resource, &config))
    }

    /// The session override for a resource, if any.
    #[must_use]
    pub fn session_override(&self, resource: &Resource) -> Option<bool> {
        self.session.get(&self.identity.key(resource))
    }

    /// Sets a session override.
    pub fn set_session_override(&mut self, resource: &Resource, readonly: bool) {
        self.session.set(self.identity.key(resource), readonly);
    }

    /// Removes a session override.
    pub fn reset_session_override(&mut self, resource: &Resource) {
        self.session.reset(&self.identity.key(resource));
    }

    /// Whether permission-locked files are treated as readonly.
    #[must_use]
    pub const fn from_permissions(&self) -> bool {
        self.from_permissions
    }

    /// Updates the permission flag. Returns true if it changed.
    pub(crate) fn set_from_permissions(&mut self, value: bool) -> bool {
        let changed = self.from_permissions != value;
        self.from_permissions = value;
        changed
    }

    /// Rebuilds include/exclude patterns affected by `change`. Returns true
    /// if either pattern set changed.
    pub(crate) fn on_configuration_change(&mut self, change: &ConfigurationChange, config: &dyn ConfigurationService) -> bool {
        let include_changed = self.include.on_configuration_change(change, config);
        let exclude_changed = self.exclude.on_configuration_change(change, config);
        include_changed || exclude_changed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::MemoryConfiguration;
    use crate::host::{MemoryFileService, ProviderCapabilities, StaticWorkspace};
    use crate::resource::PathIdentity;

    struct Fixture {
        config: MemoryConfiguration,
        files: Arc<MemoryFileService>,
        workspace: Arc<StaticWorkspace>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: MemoryConfiguration::new(),
                files: Arc::new(MemoryFileService::new()),
                workspace: Arc::new(
                    StaticWorkspace::new(vec![Resource::file("/work")])
                        .with_configuration(Resource::file("/work/.editor/workspace.json")),
                ),
            }
        }

        fn resolver(&self) -> ReadonlyResolver {
            ReadonlyResolver::new(
                Arc::new(PathIdentity::case_sensitive()),
                self.files.clone(),
                self.workspace.clone(),
                &self.config,
                Some(Resource::file("/home/u/.config/editor")),
            )
        }
    }

    #[test]
    fn writable_by_default() {
        let fx = Fixture::new();
        assert_eq!(fx.resolver().is_readonly(&Resource::file("/work/a.rs"), None), ReadonlyDecision::Writable);
    }

    #[test]
    fn provider_beats_session_override() {
        let fx = Fixture::new();
        fx.files.register_provider("git", ProviderCapabilities::readonly(None));
        let mut resolver = fx.resolver();
        let r = Resource::new("git", "", "/work/a.rs");
        resolver.set_session_override(&r, false);

        let decision = resolver.is_readonly(&r, None);
        assert_eq!(decision.source(), Some(ReadonlySource::Provider));
        assert_eq!(decision.message(), Some(PROVIDER_READONLY_MESSAGE));
    }

    #[test]
    fn provider_message_is_used_when_present() {
        let fx = Fixture::new();
        fx.files
            .register_provider("zip", ProviderCapabilities::readonly(Some("archive".to_string())));
        let decision = fx.resolver().is_readonly(&Resource::new("zip", "", "/a.zip/x"), None);
        assert_eq!(decision.message(), Some("archive"));
    }

    #[test]
    fn session_false_beats_configured_readonly() {
        let fx = Fixture::new();
        fx.config.set(keys::READONLY_INCLUDE, json!({ "**/*.rs": true }));
        let mut resolver = fx.resolver();
        let r = Resource::file("/work/a.rs");
        assert_eq!(resolver.is_readonly(&r, None).source(), Some(ReadonlySource::Configured));

        resolver.set_session_override(&r, false);
        assert_eq!(resolver.is_readonly(&r, None), ReadonlyDecision::Writable);

        resolver.reset_session_override(&r);
        assert_eq!(resolver.is_readonly(&r, None).source(), Some(ReadonlySource::Configured));
    }

    #[test]
    fn exclude_wins_over_include_and_stops_resolution() {
        let fx = Fixture::new();
        fx.config.set(keys::READONLY_INCLUDE, json!({ "**/*.rs": true }));
        fx.config.set(keys::READONLY_EXCLUDE, json!({ "**/main.rs": true }));
        let resolver = fx.resolver();
        let r = Resource::file("/work/main.rs");
        let stat = FileStat::new(r.clone()).with_readonly(true);
        assert_eq!(resolver.is_readonly(&r, Some(&stat)), ReadonlyDecision::Writable);
    }

    #[test]
    fn protected_locations_are_writable() {
        let fx = Fixture::new();
        fx.config.set(keys::READONLY_INCLUDE, json!({ "**": true }));
        let resolver = fx.resolver();
        assert_eq!(
            resolver.is_readonly(&Resource::file("/home/u/.config/editor/settings.json"), None),
            ReadonlyDecision::Writable
        );
        assert_eq!(
            resolver.is_readonly(&Resource::file("/work/.editor/workspace.json"), None),
            ReadonlyDecision::Writable
        );
        assert!(resolver.is_readonly(&Resource::file("/work/other.json"), None).is_readonly());
    }

    #[test]
    fn lock_requires_permission_flag() {
        let fx = Fixture::new();
        let mut resolver = fx.resolver();
        let r = Resource::file("/work/a.rs");
        let stat = FileStat::new(r.clone()).with_locked(true);
        assert_eq!(resolver.is_readonly(&r, Some(&stat)), ReadonlyDecision::Writable);

        assert!(resolver.set_from_permissions(true));
        assert!(!resolver.set_from_permissions(true));
        assert_eq!(resolver.is_readonly(&r, Some(&stat)).source(), Some(ReadonlySource::FileLocked));
    }

    #[test]
    fn lock_beats_file_readonly_flag() {
        let fx = Fixture::new();
        let mut resolver = fx.resolver();
        resolver.set_from_permissions(true);
        let r = Resource::file("/work/a.rs");
        let stat = FileStat::new(r.clone()).with_locked(true).with_readonly(true);
        assert_eq!(resolver.is_readonly(&r, Some(&stat)).source(), Some(ReadonlySource::FileLocked));

        let stat = FileStat::new(r.clone()).with_readonly(true);
        assert_eq!(resolver.is_readonly(&r, Some(&stat)).source(), Some(ReadonlySource::FileReadonly));
    }
}
