//! Host collaborators consumed by the policy service.

mod disk;
mod memory;
mod traits;

pub use disk::DiskFileService;
pub use memory::{MemoryFileService, MemoryMarkerService, StaticWorkspace};
pub use traits::{FileService, FileStat, MarkerService, ProviderCapabilities, WorkspaceContext};
