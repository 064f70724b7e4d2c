//! Configuration access.
//!
//! The crate reads settings through the [`ConfigurationService`] trait and
//! never owns their storage. Hosts deliver change notifications by calling
//! [`crate::FilesConfigurationService::on_did_change_configuration`] with a
//! [`ConfigurationChange`].

mod files;
mod memory;
mod traits;

pub use files::{keys, RawFilesConfiguration, FILES_SECTION};
pub use memory::MemoryConfiguration;
pub use traits::{ConfigurationChange, ConfigurationOverrides, ConfigurationService};

use crate::resource::Resource;

/// Default delay for `afterDelay` auto-save, in milliseconds.
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u64 = 1000;

/// Default capacity of the per-resource auto-save cache.
pub const DEFAULT_AUTO_SAVE_CACHE_CAPACITY: usize = 1000;

/// Process-level settings of the policy service itself.
#[derive(Debug, Clone)]
pub struct FilesPolicyConfig {
    /// Running in a web context. Switches the default auto-save mode to
    /// `afterDelay`.
    pub web: bool,
    /// Maximum number of per-resource auto-save entries kept in the cache.
    pub auto_save_cache_capacity: usize,
    /// Delay used when `files.autoSaveDelay` is unset or invalid, and the
    /// upper bound (inclusive) for a short delay.
    pub default_auto_save_delay_ms: u64,
    /// The user's roaming data/config home. Resources below it are never
    /// made readonly by settings.
    pub user_roaming_data_home: Option<Resource>,
}

impl Default for FilesPolicyConfig {
    fn default() -> Self {
        Self {
            web: false,
            auto_save_cache_capacity: DEFAULT_AUTO_SAVE_CACHE_CAPACITY,
            default_auto_save_delay_ms: DEFAULT_AUTO_SAVE_DELAY_MS,
            user_roaming_data_home: None,
        }
    }
}

impl FilesPolicyConfig {
    /// Defaults for a web host.
    #[must_use]
    pub fn web() -> Self {
        Self {
            web: true,
            ..Self::default()
        }
    }
}
