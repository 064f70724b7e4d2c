//! In-memory collaborators.
//!
//! Thread-safe implementations of the host traits for embedding and tests.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::FileServiceError;
use crate::host::traits::{FileService, FileStat, MarkerService, ProviderCapabilities, WorkspaceContext};
use crate::resource::{IdentityService, PathIdentity, Resource, ResourceKey};

/// File service backed by maps of providers and stats.
///
/// Stats are keyed by resource identity, so lookups follow the same
/// equality rules as the rest of the host.
pub struct MemoryFileService {
    identity: Arc<dyn IdentityService>,
    providers: RwLock<HashMap<String, ProviderCapabilities>>,
    stats: RwLock<HashMap<ResourceKey, FileStat>>,
}

impl Default for MemoryFileService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryFileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFileService")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

impl MemoryFileService {
    /// Creates a service with a writable `file` provider and case-sensitive
    /// paths.
    #[must_use]
    pub fn new() -> Self {
        Self::with_identity(Arc::new(PathIdentity::case_sensitive()))
    }

    /// Creates a service with a writable `file` provider that keys stats
    /// with `identity`.
    #[must_use]
    pub fn with_identity(identity: Arc<dyn IdentityService>) -> Self {
        let service = Self {
            identity,
            providers: RwLock::new(HashMap::new()),
            stats: RwLock::new(HashMap::new()),
        };
        service.register_provider(crate::resource::FILE_SCHEME, ProviderCapabilities::writable());
        service
    }

    /// Registers or replaces the provider for `scheme`.
    pub fn register_provider(&self, scheme: &str, capabilities: ProviderCapabilities) {
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scheme.to_string(), capabilities);
    }

    /// Stores metadata returned by `resolve_metadata`.
    pub fn insert_stat(&self, stat: FileStat) {
        let key = self.identity.key(&stat.resource);
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, stat);
    }

    /// Forgets metadata for a resource.
    pub fn remove_stat(&self, resource: &Resource) {
        let key = self.identity.key(resource);
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

impl FileService for MemoryFileService {
    fn provider_capabilities(&self, scheme: &str) -> Option<ProviderCapabilities> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(scheme)
            .cloned()
    }

    fn resolve_metadata(&self, resource: &Resource) -> Result<FileStat, FileServiceError> {
        if self.provider_capabilities(&resource.scheme).is_none() {
            return Err(FileServiceError::NoProvider {
                scheme: resource.scheme.clone(),
            });
        }
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.identity.key(resource))
            .cloned()
            .ok_or_else(|| FileServiceError::NotFound {
                resource: resource.to_string(),
            })
    }
}

/// Marker service backed by per-resource error counts.
pub struct MemoryMarkerService {
    identity: Arc<dyn IdentityService>,
    errors: RwLock<HashMap<ResourceKey, usize>>,
}

impl Default for MemoryMarkerService {
    fn default() -> Self {
        Self::new(Arc::new(PathIdentity::case_sensitive()))
    }
}

impl std::fmt::Debug for MemoryMarkerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMarkerService").finish_non_exhaustive()
    }
}

impl MemoryMarkerService {
    /// Creates an empty marker service.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self {
            identity,
            errors: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the error count of a resource. Zero clears it.
    pub fn set_errors(&self, resource: &Resource, count: usize) {
        let key = self.identity.key(resource);
        let mut errors = self.errors.write().unwrap_or_else(PoisonError::into_inner);
        if count == 0 {
            errors.remove(&key);
        } else {
            errors.insert(key, count);
        }
    }
}

impl MarkerService for MemoryMarkerService {
    fn count_errors(&self, resource: &Resource, take: usize) -> usize {
        let key = self.identity.key(resource);
        self.errors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
            .unwrap_or(0)
            .min(take)
    }
}

/// Fixed set of workspace folders.
pub struct StaticWorkspace {
    identity: Arc<dyn IdentityService>,
    folders: Vec<Resource>,
    configuration: Option<Resource>,
    transient: bool,
}

impl std::fmt::Debug for StaticWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticWorkspace")
            .field("folders", &self.folders)
            .field("configuration", &self.configuration)
            .field("transient", &self.transient)
            .finish_non_exhaustive()
    }
}

impl StaticWorkspace {
    /// A workspace made of `folders`, compared with case-sensitive paths.
    #[must_use]
    pub fn new(folders: Vec<Resource>) -> Self {
        Self::with_identity(folders, Arc::new(PathIdentity::case_sensitive()))
    }

    /// A workspace made of `folders`, compared with `identity`.
    #[must_use]
    pub fn with_identity(folders: Vec<Resource>, identity: Arc<dyn IdentityService>) -> Self {
        Self {
            identity,
            folders,
            configuration: None,
            transient: false,
        }
    }

    /// An empty window with no folders.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Sets the workspace configuration file.
    #[must_use]
    pub fn with_configuration(mut self, configuration: Resource) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Marks the workspace transient.
    #[must_use]
    pub const fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    fn innermost_folder(&self, resource: &Resource) -> Option<&Resource> {
        self.folders
            .iter()
            .filter(|folder| self.identity.is_equal_or_parent(resource, folder))
            .max_by_key(|folder| folder.path.len())
    }
}

impl WorkspaceContext for StaticWorkspace {
    fn is_inside_workspace(&self, resource: &Resource) -> bool {
        self.innermost_folder(resource).is_some()
    }

    fn configuration_file(&self) -> Option<Resource> {
        self.configuration.clone()
    }

    fn is_transient(&self) -> bool {
        self.transient
    }

    fn relative_path(&self, resource: &Resource) -> Option<String> {
        let folder = self.innermost_folder(resource)?;
        let base = folder.path.trim_end_matches('/');
        let rest = resource.path.get(base.len()..)?;
        Some(rest.trim_start_matches('/').to_string())
    }

    fn folders(&self) -> Vec<Resource> {
        self.folders.clone()
    }

    fn containing_folder(&self, resource: &Resource) -> Option<Resource> {
        self.innermost_folder(resource).cloned()
    }
}
