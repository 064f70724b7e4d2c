//! Auto-save policy.
//!
//! [`compute_auto_save_configuration`] turns the raw `files` settings of a
//! scope into an [`AutoSaveConfiguration`] with its derived flags, and
//! [`decide_auto_save_mode`] reduces that to the [`AutoSaveMode`] the save
//! machinery acts on.

mod cache;
mod resolver;

pub use cache::LruCache;
pub use resolver::{compute_auto_save_configuration, decide_auto_save_mode, AutoSaveDefaults, ResourceScope};

use std::fmt;

use serde::{Deserialize, Serialize};

/// The configured auto-save setting (`files.autoSave`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoSaveSetting {
    /// Never auto-save.
    Off,
    /// Save after `files.autoSaveDelay` milliseconds.
    AfterDelay,
    /// Save when the editor loses focus.
    OnFocusChange,
    /// Save when the window loses focus.
    OnWindowChange,
}

impl AutoSaveSetting {
    /// Parses a setting value. Unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(Self::Off),
            "afterDelay" => Some(Self::AfterDelay),
            "onFocusChange" => Some(Self::OnFocusChange),
            "onWindowChange" => Some(Self::OnWindowChange),
            _ => None,
        }
    }

    /// The setting value as written in settings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::AfterDelay => "afterDelay",
            Self::OnFocusChange => "onFocusChange",
            Self::OnWindowChange => "onWindowChange",
        }
    }
}

impl fmt::Display for AutoSaveSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective auto-save configuration of a scope.
///
/// `delay_ms` is set iff `mode` is `AfterDelay`. The derived flags
/// (`is_out_of_workspace`, `is_short_delay`) are recomputed on every
/// resolution and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveConfiguration {
    /// Configured mode.
    pub mode: AutoSaveSetting,
    /// Effective delay for `AfterDelay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    /// `files.autoSaveWorkspaceFilesOnly` was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_files_only: Option<bool>,
    /// `files.autoSaveWhenNoErrors` was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_no_errors: Option<bool>,
    /// The resource lies outside every workspace folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_out_of_workspace: Option<bool>,
    /// The delay qualifies for the short-delay fast path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_short_delay: Option<bool>,
}

impl AutoSaveConfiguration {
    /// Configuration with auto-save off and nothing else set.
    #[must_use]
    pub const fn off() -> Self {
        Self {
            mode: AutoSaveSetting::Off,
            delay_ms: None,
            workspace_files_only: None,
            when_no_errors: None,
            is_out_of_workspace: None,
            is_short_delay: None,
        }
    }
}

impl Default for AutoSaveConfiguration {
    fn default() -> Self {
        Self::off()
    }
}

/// What the save machinery should do for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoSaveMode {
    /// No auto-save.
    Off,
    /// Save after a delay at or below the default delay.
    AfterShortDelay,
    /// Save after a longer delay, or when errors may extend the wait.
    AfterLongDelay,
    /// Save on editor focus change.
    OnFocusChange,
    /// Save on window focus change.
    OnWindowChange,
}

/// Why auto-save is off for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoSaveDisabledReason {
    /// `files.autoSave` is off, unset or unrecognized.
    Settings,
    /// Workspace-files-only is on and the resource is outside the workspace.
    OutOfWorkspace,
    /// When-no-errors is on and the resource has error diagnostics.
    Errors,
    /// Auto-save was disabled for this resource at runtime.
    DisabledForResource,
}

/// Resolved auto-save mode with the reason when it is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveDecision {
    /// Effective mode.
    pub mode: AutoSaveMode,
    /// Set iff `mode` is `Off`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<AutoSaveDisabledReason>,
}

impl AutoSaveDecision {
    pub(crate) const fn on(mode: AutoSaveMode) -> Self {
        Self { mode, reason: None }
    }

    pub(crate) const fn off(reason: AutoSaveDisabledReason) -> Self {
        Self {
            mode: AutoSaveMode::Off,
            reason: Some(reason),
        }
    }
}
