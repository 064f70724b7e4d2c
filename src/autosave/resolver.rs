use crate::config::{FilesPolicyConfig, RawFilesConfiguration};

use super::{AutoSaveConfiguration, AutoSaveDecision, AutoSaveDisabledReason, AutoSaveMode, AutoSaveSetting};

/// Platform defaults applied when settings are unset or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveDefaults {
    /// Mode used when `files.autoSave` is unset.
    pub mode: AutoSaveSetting,
    /// Delay used when `files.autoSaveDelay` is unset or invalid. Also the
    /// inclusive upper bound of a short delay.
    pub delay_ms: u64,
}

impl AutoSaveDefaults {
    /// Derives defaults from the service configuration: web hosts default to
    /// `afterDelay`, everything else to `off`.
    #[must_use]
    pub fn from_config(config: &FilesPolicyConfig) -> Self {
        Self {
            mode: if config.web {
                AutoSaveSetting::AfterDelay
            } else {
                AutoSaveSetting::Off
            },
            delay_ms: config.default_auto_save_delay_ms,
        }
    }
}

/// Resource-specific inputs of a mode decision.
#[derive(Clone, Copy)]
pub struct ResourceScope<'a> {
    /// Auto-save was disabled at runtime for the resource.
    pub disabled: bool,
    /// Returns true if the resource has at least one error diagnostic.
    /// Only called when `when_no_errors` is set.
    pub has_errors: &'a dyn Fn() -> bool,
}

impl std::fmt::Debug for ResourceScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceScope")
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Computes the effective auto-save configuration of a scope.
///
/// `inside_workspace` is `None` for the global scope. For a resource it
/// answers whether the resource lies inside an open workspace folder and is
/// only consulted when `files.autoSaveWorkspaceFilesOnly` is on.
#[must_use]
pub fn compute_auto_save_configuration(
    raw: &RawFilesConfiguration,
    defaults: &AutoSaveDefaults,
    inside_workspace: Option<&dyn Fn() -> bool>,
) -> AutoSaveConfiguration {
    let mut config = AutoSaveConfiguration::off();

    config.mode = match raw.auto_save.as_deref() {
        None => defaults.mode,
        Some(value) => AutoSaveSetting::parse(value).unwrap_or(AutoSaveSetting::Off),
    };

    if config.mode == AutoSaveSetting::AfterDelay {
        let delay = effective_delay(raw.auto_save_delay, defaults.delay_ms);
        config.delay_ms = Some(delay);
        config.is_short_delay = Some(delay <= defaults.delay_ms);
    }

    if raw.auto_save_workspace_files_only == Some(true) {
        config.workspace_files_only = Some(true);
        if let Some(inside) = inside_workspace {
            if !inside() {
                config.is_out_of_workspace = Some(true);
                config.is_short_delay = None;
            }
        }
    }

    // Errors can show up after a save was scheduled, so an error-gated save
    // never counts as short.
    if raw.auto_save_when_no_errors == Some(true) {
        config.when_no_errors = Some(true);
        config.is_short_delay = None;
    }

    config
}

// Fractions round up so a delay just above the default never counts as
// short.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn effective_delay(configured: Option<f64>, default_ms: u64) -> u64 {
    match configured {
        Some(ms) if ms.is_finite() && ms >= 0.0 => ms.ceil() as u64,
        _ => default_ms,
    }
}

/// Reduces a configuration to the mode the save machinery acts on.
///
/// `scope` is `None` for the global scope, in which case resource checks
/// (runtime disable, workspace membership, diagnostics) are skipped.
#[must_use]
pub fn decide_auto_save_mode(
    config: &AutoSaveConfiguration,
    default_delay_ms: u64,
    scope: Option<ResourceScope<'_>>,
) -> AutoSaveDecision {
    if scope.is_some_and(|s| s.disabled) {
        return AutoSaveDecision::off(AutoSaveDisabledReason::DisabledForResource);
    }

    if config.mode == AutoSaveSetting::Off {
        return AutoSaveDecision::off(AutoSaveDisabledReason::Settings);
    }

    let when_no_errors = config.when_no_errors == Some(true);

    if let Some(scope) = scope {
        if config.workspace_files_only == Some(true) && config.is_out_of_workspace == Some(true) {
            return AutoSaveDecision::off(AutoSaveDisabledReason::OutOfWorkspace);
        }
        if when_no_errors && (scope.has_errors)() {
            return AutoSaveDecision::off(AutoSaveDisabledReason::Errors);
        }
    }

    match config.mode {
        AutoSaveSetting::Off => AutoSaveDecision::off(AutoSaveDisabledReason::Settings),
        AutoSaveSetting::AfterDelay => {
            let short = config.delay_ms.is_some_and(|d| d <= default_delay_ms) && !when_no_errors;
            AutoSaveDecision::on(if short {
                AutoSaveMode::AfterShortDelay
            } else {
                AutoSaveMode::AfterLongDelay
            })
        }
        AutoSaveSetting::OnFocusChange => AutoSaveDecision::on(AutoSaveMode::OnFocusChange),
        AutoSaveSetting::OnWindowChange => AutoSaveDecision::on(AutoSaveMode::OnWindowChange),
    }
}
