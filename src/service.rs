//! The files configuration service.
//!
//! Owns every piece of derived state (global auto-save configuration, the
//! per-resource auto-save cache, hot exit, file associations, the readonly
//! permission flag and session overrides) and recomputes it synchronously
//! whenever the host reports a change to the `files` settings.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::autosave::{
    compute_auto_save_configuration, decide_auto_save_mode, AutoSaveConfiguration, AutoSaveDecision,
    AutoSaveDefaults, AutoSaveMode, AutoSaveSetting, LruCache, ResourceScope,
};
use crate::config::{
    keys, ConfigurationChange, ConfigurationOverrides, ConfigurationService, FilesPolicyConfig,
    RawFilesConfiguration, FILES_SECTION,
};
use crate::error::PolicyResult;
use crate::events::{ContextFlag, EventEmitter, ReadonlyChange};
use crate::hot_exit::HotExitConfiguration;
use crate::host::{FileService, FileStat, MarkerService, WorkspaceContext};
use crate::readonly::{ReadonlyDecision, ReadonlyResolver, ReadonlyUpdate};
use crate::resource::{IdentityService, Resource, ResourceKey};

/// Context key of the short-delay flag.
pub const AUTO_SAVE_AFTER_SHORT_DELAY_CONTEXT: &str = "autoSaveAfterShortDelayContext";

const SAVE_CONFLICT_OVERWRITE: &str = "overwriteFileOnDisk";

/// Collaborators the service reads from.
#[derive(Clone)]
pub struct ServiceHost {
    /// Settings backend.
    pub config: Arc<dyn ConfigurationService>,
    /// File system providers and metadata.
    pub files: Arc<dyn FileService>,
    /// Diagnostics.
    pub markers: Arc<dyn MarkerService>,
    /// Workspace membership.
    pub workspace: Arc<dyn WorkspaceContext>,
    /// Resource identity.
    pub identity: Arc<dyn IdentityService>,
}

impl std::fmt::Debug for ServiceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHost").finish_non_exhaustive()
    }
}

type DisabledCounts = Rc<RefCell<HashMap<ResourceKey, usize>>>;

/// Resolves effective auto-save and readonly policy per resource.
///
/// Single-threaded: the service is driven from the thread that delivers
/// configuration and save events. Event streams may be consumed elsewhere.
pub struct FilesConfigurationService {
    defaults: AutoSaveDefaults,
    host: ServiceHost,

    global_auto_save: AutoSaveConfiguration,
    auto_save_cache: RefCell<LruCache<ResourceKey, AutoSaveConfiguration>>,
    auto_save_disabled: DisabledCounts,
    short_delay_context: ContextFlag,

    readonly: ReadonlyResolver,
    hot_exit: HotExitConfiguration,
    files_associations: Option<BTreeMap<String, String>>,

    auto_save_changed: EventEmitter<AutoSaveConfiguration>,
    files_association_changed: EventEmitter<Option<BTreeMap<String, String>>>,
    readonly_changed: EventEmitter<ReadonlyChange>,
    auto_save_disabled_changed: Rc<EventEmitter<Resource>>,
}

impl std::fmt::Debug for FilesConfigurationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesConfigurationService")
            .field("global_auto_save", &self.global_auto_save)
            .field("hot_exit", &self.hot_exit)
            .field("readonly", &self.readonly)
            .finish_non_exhaustive()
    }
}

impl FilesConfigurationService {
    /// Creates the service from the current settings snapshot. No events
    /// are raised during construction.
    #[must_use]
    pub fn new(policy: FilesPolicyConfig, host: ServiceHost) -> Self {
        let defaults = AutoSaveDefaults::from_config(&policy);
        let readonly = ReadonlyResolver::new(
            Arc::clone(&host.identity),
            Arc::clone(&host.files),
            Arc::clone(&host.workspace),
            host.config.as_ref(),
            policy.user_roaming_data_home.clone(),
        );

        let mut service = Self {
            defaults,
            host,
            global_auto_save: AutoSaveConfiguration::off(),
            auto_save_cache: RefCell::new(LruCache::new(policy.auto_save_cache_capacity)),
            auto_save_disabled: Rc::new(RefCell::new(HashMap::new())),
            short_delay_context: ContextFlag::new(AUTO_SAVE_AFTER_SHORT_DELAY_CONTEXT, false),
            readonly,
            hot_exit: HotExitConfiguration::default(),
            files_associations: None,
            auto_save_changed: EventEmitter::new("auto_save_configuration_changed"),
            files_association_changed: EventEmitter::new("files_association_changed"),
            readonly_changed: EventEmitter::new("readonly_changed"),
            auto_save_disabled_changed: Rc::new(EventEmitter::new("auto_save_disabled_changed")),
        };

        let raw = service.read_files_configuration(None);
        service.apply_files_configuration(&raw, false);
        service
    }

    // ─── configuration changes ───────────────────────────────────────────

    /// Handles a settings change reported by the host.
    pub fn on_did_change_configuration(&mut self, change: &ConfigurationChange) {
        if change.affects(FILES_SECTION) {
            let raw = self.read_files_configuration(None);
            self.apply_files_configuration(&raw, true);
        }

        if self.readonly.on_configuration_change(change, self.host.config.as_ref()) {
            tracing::debug!("readonly glob patterns changed");
            self.readonly_changed.fire(&ReadonlyChange::global());
        }
    }

    /// Handles a change of file system provider registrations or
    /// capabilities for `scheme`.
    pub fn on_did_change_provider_capabilities(&self, scheme: &str) {
        tracing::debug!(scheme, "file system provider capabilities changed");
        self.readonly_changed.fire(&ReadonlyChange::global());
    }

    fn read_files_configuration(&self, resource: Option<&Resource>) -> RawFilesConfiguration {
        let overrides = resource.map_or_else(ConfigurationOverrides::global, ConfigurationOverrides::for_resource);
        RawFilesConfiguration::from_value(self.host.config.get_value(FILES_SECTION, &overrides))
    }

    fn apply_files_configuration(&mut self, raw: &RawFilesConfiguration, from_event: bool) {
        // Auto save. Per-resource entries may inherit from the global
        // value, so the whole cache goes.
        self.global_auto_save = compute_auto_save_configuration(raw, &self.defaults, None);
        self.auto_save_cache.borrow_mut().clear();
        tracing::debug!(
            mode = %self.global_auto_save.mode,
            delay_ms = ?self.global_auto_save.delay_ms,
            "recomputed global auto-save configuration"
        );

        let short = self.auto_save_mode(None) == AutoSaveMode::AfterShortDelay;
        self.short_delay_context.set(short);

        if from_event {
            self.auto_save_changed.fire(&self.global_auto_save);
        }

        // File associations
        if raw.associations != self.files_associations {
            self.files_associations.clone_from(&raw.associations);
            if from_event {
                self.files_association_changed.fire(&self.files_associations);
            }
        }

        // Hot exit
        self.hot_exit = HotExitConfiguration::from_setting(raw.hot_exit.as_deref());

        // Readonly from permissions
        let from_permissions = raw.readonly_from_permissions == Some(true);
        if self.readonly.set_from_permissions(from_permissions) && from_event {
            self.readonly_changed.fire(&ReadonlyChange::global());
        }
    }

    // ─── auto save ───────────────────────────────────────────────────────

    /// Effective auto-save configuration for a resource, or the global one
    /// when `resource` is `None`.
    #[must_use]
    pub fn auto_save_configuration(&self, resource: Option<&Resource>) -> AutoSaveConfiguration {
        let Some(resource) = resource else {
            return self.global_auto_save;
        };

        let key = self.host.identity.key(resource);
        if let Some(cached) = self.auto_save_cache.borrow_mut().get(&key) {
            return *cached;
        }

        let raw = self.read_files_configuration(Some(resource));
        let inside_workspace = || self.host.workspace.is_inside_workspace(resource);
        let config = compute_auto_save_configuration(&raw, &self.defaults, Some(&inside_workspace));
        self.auto_save_cache.borrow_mut().put(key, config);
        config
    }

    /// Effective auto-save mode with the reason when it is off.
    #[must_use]
    pub fn auto_save_decision(&self, resource: Option<&Resource>) -> AutoSaveDecision {
        let config = self.auto_save_configuration(resource);
        let Some(resource) = resource else {
            return decide_auto_save_mode(&config, self.defaults.delay_ms, None);
        };

        let has_errors = || self.host.markers.count_errors(resource, 1) > 0;
        let scope = ResourceScope {
            disabled: self.is_auto_save_disabled(resource),
            has_errors: &has_errors,
        };
        decide_auto_save_mode(&config, self.defaults.delay_ms, Some(scope))
    }

    /// Effective auto-save mode.
    #[must_use]
    pub fn auto_save_mode(&self, resource: Option<&Resource>) -> AutoSaveMode {
        self.auto_save_decision(resource).mode
    }

    /// Returns true if the resource (or the global scope) auto-saves after a
    /// short delay.
    #[must_use]
    pub fn has_short_auto_save_delay(&self, resource: Option<&Resource>) -> bool {
        if resource.is_some_and(|r| self.is_auto_save_disabled(r)) {
            return false;
        }
        self.auto_save_configuration(resource).is_short_delay == Some(true)
    }

    /// Flips `files.autoSave` between `off` and `afterDelay`. Any active
    /// mode turns off; off (or an unrecognized value) turns into
    /// `afterDelay`.
    ///
    /// # Errors
    ///
    /// Returns the configuration backend's error if the write fails.
    pub fn toggle_auto_save(&self) -> PolicyResult<()> {
        let current = compute_auto_save_configuration(&self.read_files_configuration(None), &self.defaults, None);
        let next = match current.mode {
            AutoSaveSetting::AfterDelay | AutoSaveSetting::OnFocusChange | AutoSaveSetting::OnWindowChange => {
                AutoSaveSetting::Off
            }
            AutoSaveSetting::Off => AutoSaveSetting::AfterDelay,
        };
        tracing::debug!(from = %current.mode, to = %next, "toggling auto save");
        self.host
            .config
            .update_value(keys::AUTO_SAVE, Value::String(next.as_str().to_string()))?;
        Ok(())
    }

    /// Turns auto-save off for `resource` until the returned guard (and any
    /// other guard for the same resource) is dropped.
    #[must_use = "auto save is re-enabled when the guard is dropped"]
    pub fn disable_auto_save(&self, resource: &Resource) -> AutoSaveDisabledGuard {
        let key = self.host.identity.key(resource);
        let previous = {
            let mut counts = self.auto_save_disabled.borrow_mut();
            let count = counts.entry(key.clone()).or_insert(0);
            *count += 1;
            *count - 1
        };
        if previous == 0 {
            self.auto_save_disabled_changed.fire(resource);
        }

        AutoSaveDisabledGuard {
            resource: resource.clone(),
            key,
            counts: Rc::clone(&self.auto_save_disabled),
            changed: Rc::clone(&self.auto_save_disabled_changed),
        }
    }

    /// Returns true if a live guard disables auto-save for `resource`.
    #[must_use]
    pub fn is_auto_save_disabled(&self, resource: &Resource) -> bool {
        self.auto_save_disabled
            .borrow()
            .contains_key(&self.host.identity.key(resource))
    }

    // ─── readonly ────────────────────────────────────────────────────────

    /// Effective readonly status. `stat` is optional file metadata.
    #[must_use]
    pub fn is_readonly(&self, resource: &Resource, stat: Option<&FileStat>) -> ReadonlyDecision {
        self.readonly.is_readonly(resource, stat)
    }

    /// Applies a session override change and always raises readonly-changed,
    /// even when nothing changed.
    ///
    /// `Toggle` resolves file metadata first; a failed lookup is logged and
    /// the toggle proceeds without metadata.
    pub fn update_readonly(&mut self, resource: &Resource, update: ReadonlyUpdate) {
        let value = match update {
            ReadonlyUpdate::Set(value) => Some(value),
            ReadonlyUpdate::Reset => None,
            ReadonlyUpdate::Toggle => {
                let stat = match self.host.files.resolve_metadata(resource) {
                    Ok(stat) => Some(stat),
                    Err(err) => {
                        tracing::warn!(%err, %resource, "metadata unavailable, toggling readonly without it");
                        None
                    }
                };
                Some(!self.readonly.is_readonly(resource, stat.as_ref()).is_readonly())
            }
        };

        match value {
            Some(readonly) => self.readonly.set_session_override(resource, readonly),
            None => self.readonly.reset_session_override(resource),
        }

        self.readonly_changed.fire(&ReadonlyChange::resource(resource.clone()));
    }

    /// The session override of a resource, if any.
    #[must_use]
    pub fn session_readonly_override(&self, resource: &Resource) -> Option<bool> {
        self.readonly.session_override(resource)
    }

    /// Whether `files.readonlyFromPermissions` is on.
    #[must_use]
    pub const fn readonly_from_permissions(&self) -> bool {
        self.readonly.from_permissions()
    }

    // ─── hot exit, associations, save conflicts ──────────────────────────

    /// The normalized `files.hotExit` value.
    #[must_use]
    pub const fn hot_exit_configuration(&self) -> HotExitConfiguration {
        self.hot_exit
    }

    /// Hot exit is on and the workspace is not transient.
    #[must_use]
    pub fn is_hot_exit_enabled(&self) -> bool {
        !self.host.workspace.is_transient() && self.hot_exit != HotExitConfiguration::Off
    }

    /// The current `files.associations` mapping.
    #[must_use]
    pub fn files_associations(&self) -> Option<&BTreeMap<String, String>> {
        self.files_associations.as_ref()
    }

    /// Returns true unless `files.saveConflictResolution` resolves to
    /// `overwriteFileOnDisk` for this resource and language.
    #[must_use]
    pub fn prevent_save_conflicts(&self, resource: &Resource, language_id: Option<&str>) -> bool {
        let mut overrides = ConfigurationOverrides::for_resource(resource);
        if let Some(language) = language_id {
            overrides = overrides.with_language(language);
        }
        let value = self.host.config.get_value(keys::SAVE_CONFLICT_RESOLUTION, &overrides);
        value.as_ref().and_then(Value::as_str) != Some(SAVE_CONFLICT_OVERWRITE)
    }

    // ─── events ──────────────────────────────────────────────────────────

    /// Fires with the new global configuration after a `files` change.
    #[must_use]
    pub const fn on_did_change_auto_save_configuration(&self) -> &EventEmitter<AutoSaveConfiguration> {
        &self.auto_save_changed
    }

    /// Fires with the new mapping when `files.associations` changes.
    #[must_use]
    pub const fn on_did_change_files_association(&self) -> &EventEmitter<Option<BTreeMap<String, String>>> {
        &self.files_association_changed
    }

    /// Fires when readonly status may have changed.
    #[must_use]
    pub const fn on_did_change_readonly(&self) -> &EventEmitter<ReadonlyChange> {
        &self.readonly_changed
    }

    /// Fires when auto-save becomes disabled or re-enabled for a resource.
    #[must_use]
    pub fn on_did_change_auto_save_disabled(&self) -> &EventEmitter<Resource> {
        &self.auto_save_disabled_changed
    }

    /// Short-delay flag of the global scope.
    #[must_use]
    pub const fn short_delay_context(&self) -> &ContextFlag {
        &self.short_delay_context
    }
}

/// Keeps auto-save disabled for a resource while alive.
pub struct AutoSaveDisabledGuard {
    resource: Resource,
    key: ResourceKey,
    counts: DisabledCounts,
    changed: Rc<EventEmitter<Resource>>,
}

impl AutoSaveDisabledGuard {
    /// The resource this guard disables auto-save for.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }
}

impl std::fmt::Debug for AutoSaveDisabledGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSaveDisabledGuard")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl Drop for AutoSaveDisabledGuard {
    fn drop(&mut self) {
        let released = {
            let mut counts = self.counts.borrow_mut();
            match counts.get_mut(&self.key) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    false
                }
                Some(_) => {
                    counts.remove(&self.key);
                    true
                }
                None => false,
            }
        };
        if released {
            self.changed.fire(&self.resource);
        }
    }
}
