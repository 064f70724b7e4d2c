use std::path::Path;
use std::sync::Arc;

use filepolicy::{
    ConfigurationChange, DiskFileService, FileService, FilesConfigurationService, FilesPolicyConfig,
    IdentityService, MemoryConfiguration, MemoryMarkerService, PathIdentity, ReadonlyDecision, ReadonlySource,
    ReadonlyUpdate, Resource, ServiceHost, StaticWorkspace,
};
use serde_json::json;

fn service_for(root: &Path, config: Arc<MemoryConfiguration>, disk: DiskFileService) -> FilesConfigurationService {
    let identity: Arc<dyn IdentityService> = Arc::new(PathIdentity::case_sensitive());
    FilesConfigurationService::new(
        FilesPolicyConfig::default(),
        ServiceHost {
            config,
            files: Arc::new(disk),
            markers: Arc::new(MemoryMarkerService::new(identity.clone())),
            workspace: Arc::new(StaticWorkspace::new(vec![Resource::file(root.to_string_lossy())])),
            identity,
        },
    )
}

fn write_protect(path: &Path) {
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(path, perms).unwrap();
}

#[test]
fn locked_file_is_readonly_only_with_permission_setting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.txt");
    std::fs::write(&path, b"data").unwrap();
    write_protect(&path);

    let config = Arc::new(MemoryConfiguration::new());
    let disk = DiskFileService::new();
    let mut service = service_for(dir.path(), config.clone(), disk.clone());
    let resource = Resource::file(path.to_string_lossy());
    let stat = disk.resolve_metadata(&resource).unwrap();
    assert!(stat.locked);

    assert_eq!(service.is_readonly(&resource, Some(&stat)), ReadonlyDecision::Writable);

    config.set("files.readonlyFromPermissions", json!(true));
    service.on_did_change_configuration(&ConfigurationChange::new(["files.readonlyFromPermissions"]));
    assert_eq!(
        service.is_readonly(&resource, Some(&stat)).source(),
        Some(ReadonlySource::FileLocked)
    );
}

#[test]
fn toggle_reads_permissions_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.txt");
    std::fs::write(&path, b"data").unwrap();
    write_protect(&path);

    let config = Arc::new(MemoryConfiguration::new());
    config.set("files.readonlyFromPermissions", json!(true));
    let mut service = service_for(dir.path(), config, DiskFileService::new());
    let resource = Resource::file(path.to_string_lossy());

    // Locked on disk, so the toggle unlocks it for the session.
    service.update_readonly(&resource, ReadonlyUpdate::Toggle);
    assert_eq!(service.session_readonly_override(&resource), Some(false));
}

#[test]
fn toggle_on_missing_file_proceeds_without_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(MemoryConfiguration::new());
    let mut service = service_for(dir.path(), config, DiskFileService::new());
    let resource = Resource::file(dir.path().join("gone.txt").to_string_lossy());

    service.update_readonly(&resource, ReadonlyUpdate::Toggle);
    assert_eq!(service.session_readonly_override(&resource), Some(true));
}

#[test]
fn read_only_mount_beats_session_override() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(MemoryConfiguration::new());
    let mut service = service_for(dir.path(), config, DiskFileService::read_only(None));
    let resource = Resource::file(dir.path().join("a.txt").to_string_lossy());

    service.update_readonly(&resource, ReadonlyUpdate::Set(false));
    assert_eq!(
        service.is_readonly(&resource, None).source(),
        Some(ReadonlySource::Provider)
    );
}
