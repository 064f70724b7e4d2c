//! Collaborator traits.
//!
//! The policy service only needs narrow capabilities from its host: file
//! system provider flags and metadata, diagnostics, and workspace
//! membership. Implementations decide where that information comes from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FileServiceError;
use crate::resource::Resource;

/// Capabilities of the file system provider serving a scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// The whole provider is read-only.
    pub readonly: bool,
    /// Provider-supplied explanation shown for read-only resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly_message: Option<String>,
}

impl ProviderCapabilities {
    /// A writable provider.
    #[must_use]
    pub const fn writable() -> Self {
        Self {
            readonly: false,
            readonly_message: None,
        }
    }

    /// A read-only provider with an optional message.
    #[must_use]
    pub fn readonly(message: Option<String>) -> Self {
        Self {
            readonly: true,
            readonly_message: message,
        }
    }
}

/// Metadata of a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// The resource this metadata describes.
    pub resource: Resource,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<DateTime<Utc>>,
    /// The file system marks this file read-only.
    pub readonly: bool,
    /// The file is write-protected by permissions and can only be written
    /// by unlocking it.
    pub locked: bool,
}

impl FileStat {
    /// Metadata with no flags set.
    #[must_use]
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            size: 0,
            mtime: None,
            readonly: false,
            locked: false,
        }
    }

    /// Sets the `readonly` flag.
    #[must_use]
    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Sets the `locked` flag.
    #[must_use]
    pub const fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }
}

/// File system access.
pub trait FileService: Send + Sync {
    /// Capabilities of the provider registered for `scheme`, if any.
    fn provider_capabilities(&self, scheme: &str) -> Option<ProviderCapabilities>;

    /// Resolves metadata for a resource.
    fn resolve_metadata(&self, resource: &Resource) -> Result<FileStat, FileServiceError>;
}

/// Diagnostics access.
pub trait MarkerService: Send + Sync {
    /// Number of error-severity diagnostics for `resource`, counting at most
    /// `take`.
    fn count_errors(&self, resource: &Resource, take: usize) -> usize;
}

/// Workspace membership.
pub trait WorkspaceContext: Send + Sync {
    /// Returns true if `resource` is inside any open workspace folder.
    fn is_inside_workspace(&self, resource: &Resource) -> bool;

    /// The workspace's own configuration file, if it has one.
    fn configuration_file(&self) -> Option<Resource>;

    /// The workspace is transient (discarded on close).
    fn is_transient(&self) -> bool;

    /// Path of `resource` relative to the workspace folder containing it.
    fn relative_path(&self, resource: &Resource) -> Option<String>;

    /// The open workspace folders.
    fn folders(&self) -> Vec<Resource>;

    /// The innermost workspace folder containing `resource`.
    fn containing_folder(&self, resource: &Resource) -> Option<Resource>;
}
