//! # filepolicy - per-resource save and readonly policy
//!
//! Resolves, for any resource an editor has open, whether and how it is
//! auto-saved, whether it may be written, whether unsaved state survives
//! exit, and how save conflicts are handled. Policy is layered: global
//! settings, language overrides, folder overrides, runtime session
//! overrides and file system facts all take part.
//!
//! ## Core Concepts
//!
//! - **Resource**: a `scheme://authority/path` identifier, compared through
//!   an [`IdentityService`]
//! - **Auto-save configuration**: the raw `files.autoSave*` settings of a
//!   scope plus derived flags, cached per resource
//! - **Readonly decision**: writable, or readonly with the source that
//!   decided it
//! - **Events**: the service raises change notifications that callers
//!   consume as callbacks or bounded streams
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use filepolicy::{
//!     AutoSaveMode, FilesConfigurationService, FilesPolicyConfig, MemoryConfiguration,
//!     MemoryFileService, MemoryMarkerService, PathIdentity, Resource, ServiceHost, StaticWorkspace,
//! };
//!
//! let identity = Arc::new(PathIdentity::case_sensitive());
//! let config = Arc::new(MemoryConfiguration::new());
//! config.set("files.autoSave", serde_json::json!("afterDelay"));
//!
//! let service = FilesConfigurationService::new(
//!     FilesPolicyConfig::default(),
//!     ServiceHost {
//!         config,
//!         files: Arc::new(MemoryFileService::new()),
//!         markers: Arc::new(MemoryMarkerService::new(identity.clone())),
//!         workspace: Arc::new(StaticWorkspace::new(vec![Resource::file("/work")])),
//!         identity,
//!     },
//! );
//!
//! let readme = Resource::file("/work/README.md");
//! assert_eq!(service.auto_save_mode(Some(&readme)), AutoSaveMode::AfterShortDelay);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod resource;

// Settings and host collaborators
pub mod config;
pub mod host;

// Policy
pub mod autosave;
pub mod hot_exit;
pub mod readonly;

// Service surface
pub mod events;
pub mod service;

pub use autosave::{
    AutoSaveConfiguration, AutoSaveDecision, AutoSaveDisabledReason, AutoSaveMode, AutoSaveSetting, LruCache,
};
pub use config::{
    ConfigurationChange, ConfigurationOverrides, ConfigurationService, FilesPolicyConfig, MemoryConfiguration,
    RawFilesConfiguration,
};
pub use error::{
    ConfigurationError, FileServiceError, PolicyError, PolicyResult, StreamError, ValidationError,
};
pub use events::{ContextFlag, EventEmitter, EventStream, ReadonlyChange, SubscriptionId};
pub use host::{
    DiskFileService, FileService, FileStat, MarkerService, MemoryFileService, MemoryMarkerService,
    ProviderCapabilities, StaticWorkspace, WorkspaceContext,
};
pub use hot_exit::HotExitConfiguration;
pub use readonly::{ReadonlyDecision, ReadonlySource, ReadonlyUpdate};
pub use resource::{IdentityService, PathIdentity, Resource, ResourceKey};
pub use service::{AutoSaveDisabledGuard, FilesConfigurationService, ServiceHost};
