use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Settings section read by this crate.
pub const FILES_SECTION: &str = "files";

/// Fully qualified setting keys.
#[allow(missing_docs)]
pub mod keys {
    pub const AUTO_SAVE: &str = "files.autoSave";
    pub const AUTO_SAVE_DELAY: &str = "files.autoSaveDelay";
    pub const AUTO_SAVE_WORKSPACE_FILES_ONLY: &str = "files.autoSaveWorkspaceFilesOnly";
    pub const AUTO_SAVE_WHEN_NO_ERRORS: &str = "files.autoSaveWhenNoErrors";
    pub const HOT_EXIT: &str = "files.hotExit";
    pub const READONLY_INCLUDE: &str = "files.readonlyInclude";
    pub const READONLY_EXCLUDE: &str = "files.readonlyExclude";
    pub const READONLY_FROM_PERMISSIONS: &str = "files.readonlyFromPermissions";
    pub const ASSOCIATIONS: &str = "files.associations";
    pub const SAVE_CONFLICT_RESOLUTION: &str = "files.saveConflictResolution";
}

/// The `files` settings section as written by the user.
///
/// Each field decodes independently: a field with the wrong JSON type is
/// treated as unset instead of failing the whole section.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilesConfiguration {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auto_save_delay: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auto_save_workspace_files_only: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auto_save_when_no_errors: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub hot_exit: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub readonly_include: Option<BTreeMap<String, Value>>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub readonly_exclude: Option<BTreeMap<String, Value>>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub readonly_from_permissions: Option<bool>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub associations: Option<BTreeMap<String, String>>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub save_conflict_resolution: Option<String>,
}

impl RawFilesConfiguration {
    /// Decodes the `files` section. Anything that is not an object yields
    /// the empty configuration.
    #[must_use]
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
