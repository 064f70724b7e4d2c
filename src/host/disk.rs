//! Local disk file service.
//!
//! Serves the `file` scheme from `std::fs`. A file whose owner write bit is
//! cleared is reported as `locked`; the disk never reports per-file
//! `readonly`.

use std::io::ErrorKind;

use chrono::{DateTime, Utc};

use crate::error::FileServiceError;
use crate::host::traits::{FileService, FileStat, ProviderCapabilities};
use crate::resource::{Resource, FILE_SCHEME};

/// File service for resources on the local disk.
#[derive(Debug, Clone, Default)]
pub struct DiskFileService {
    capabilities: ProviderCapabilities,
}

impl DiskFileService {
    /// A writable disk provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A disk provider that reports itself entirely read-only, e.g. for a
    /// read-only mount.
    #[must_use]
    pub fn read_only(message: Option<String>) -> Self {
        Self {
            capabilities: ProviderCapabilities::readonly(message),
        }
    }
}

impl FileService for DiskFileService {
    fn provider_capabilities(&self, scheme: &str) -> Option<ProviderCapabilities> {
        (scheme == FILE_SCHEME).then(|| self.capabilities.clone())
    }

    fn resolve_metadata(&self, resource: &Resource) -> Result<FileStat, FileServiceError> {
        if resource.scheme != FILE_SCHEME {
            return Err(FileServiceError::NoProvider {
                scheme: resource.scheme.clone(),
            });
        }

        let metadata = std::fs::metadata(&resource.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => FileServiceError::NotFound {
                resource: resource.to_string(),
            },
            _ => FileServiceError::Io {
                resource: resource.to_string(),
                source,
            },
        })?;

        let mtime = metadata.modified().ok().map(DateTime::<Utc>::from);

        Ok(FileStat {
            resource: resource.clone(),
            size: metadata.len(),
            mtime,
            readonly: false,
            locked: is_write_protected(&metadata.permissions()),
        })
    }
}

#[cfg(unix)]
fn is_write_protected(permissions: &std::fs::Permissions) -> bool {
    use std::os::unix::fs::PermissionsExt;
    permissions.mode() & 0o200 == 0
}

#[cfg(not(unix))]
fn is_write_protected(permissions: &std::fs::Permissions) -> bool {
    permissions.readonly()
}
