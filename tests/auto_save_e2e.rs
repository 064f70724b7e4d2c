use std::sync::Arc;

use filepolicy::{
    AutoSaveDisabledReason, AutoSaveMode, AutoSaveSetting, ConfigurationChange, ConfigurationOverrides,
    ConfigurationService, FilesConfigurationService, FilesPolicyConfig, IdentityService, MemoryConfiguration,
    MemoryFileService, MemoryMarkerService, PathIdentity, Resource, ServiceHost, StaticWorkspace,
};
use serde_json::{json, Value};

struct Harness {
    config: Arc<MemoryConfiguration>,
    markers: Arc<MemoryMarkerService>,
    service: FilesConfigurationService,
}

fn harness_with(policy: FilesPolicyConfig, seed: impl FnOnce(&MemoryConfiguration)) -> Harness {
    let identity: Arc<dyn IdentityService> = Arc::new(PathIdentity::case_sensitive());
    let config = Arc::new(MemoryConfiguration::new());
    seed(&config);
    let markers = Arc::new(MemoryMarkerService::new(identity.clone()));

    let service = FilesConfigurationService::new(
        policy,
        ServiceHost {
            config: config.clone(),
            files: Arc::new(MemoryFileService::new()),
            markers: markers.clone(),
            workspace: Arc::new(StaticWorkspace::new(vec![Resource::file("/work")])),
            identity,
        },
    );
    Harness {
        config,
        markers,
        service,
    }
}

fn harness(seed: impl FnOnce(&MemoryConfiguration)) -> Harness {
    harness_with(FilesPolicyConfig::default(), seed)
}

fn global_value(config: &MemoryConfiguration, key: &str) -> Option<Value> {
    config.get_value(key, &ConfigurationOverrides::global())
}

fn files_changed(key: &str) -> ConfigurationChange {
    ConfigurationChange::new([key])
}

#[test]
fn unset_auto_save_uses_platform_default() {
    let desktop = harness(|_| {});
    assert_eq!(desktop.service.auto_save_mode(None), AutoSaveMode::Off);
    assert!(!desktop.service.short_delay_context().get());

    let web = harness_with(FilesPolicyConfig::web(), |_| {});
    assert_eq!(web.service.auto_save_mode(None), AutoSaveMode::AfterShortDelay);
    assert_eq!(web.service.auto_save_configuration(None).delay_ms, Some(1000));
    assert!(web.service.short_delay_context().get());
}

#[test]
fn negative_or_non_numeric_delay_falls_back_to_default() {
    for delay in [json!(-5), json!("soon"), json!(null)] {
        let h = harness(|c| {
            c.set("files.autoSave", json!("afterDelay"));
            c.set("files.autoSaveDelay", delay);
        });
        let config = h.service.auto_save_configuration(None);
        assert_eq!(config.delay_ms, Some(1000));
        assert_eq!(config.is_short_delay, Some(true));
    }
}

#[test]
fn delay_at_default_is_short_and_above_is_long() {
    let h = harness(|c| {
        c.set("files.autoSave", json!("afterDelay"));
        c.set("files.autoSaveDelay", json!(1000));
    });
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterShortDelay);

    let h = harness(|c| {
        c.set("files.autoSave", json!("afterDelay"));
        c.set("files.autoSaveDelay", json!(1001));
    });
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterLongDelay);
    assert!(!h.service.has_short_auto_save_delay(None));

    let h = harness(|c| {
        c.set("files.autoSave", json!("afterDelay"));
        c.set("files.autoSaveDelay", json!(1000.5));
    });
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterLongDelay);
    assert!(!h.service.short_delay_context().get());
}

#[test]
fn when_no_errors_forces_long_delay_at_boundary() {
    let h = harness(|c| {
        c.set("files.autoSave", json!("afterDelay"));
        c.set("files.autoSaveDelay", json!(1000));
        c.set("files.autoSaveWhenNoErrors", json!(true));
    });
    let r = Resource::file("/work/src/main.rs");
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterLongDelay);
    assert_eq!(h.service.auto_save_mode(Some(&r)), AutoSaveMode::AfterLongDelay);
    assert_eq!(h.service.auto_save_configuration(Some(&r)).is_short_delay, None);
}

#[test]
fn errors_turn_auto_save_off_for_that_resource() {
    let h = harness(|c| {
        c.set("files.autoSave", json!("onFocusChange"));
        c.set("files.autoSaveWhenNoErrors", json!(true));
    });
    let broken = Resource::file("/work/broken.rs");
    let clean = Resource::file("/work/clean.rs");
    h.markers.set_errors(&broken, 3);

    let decision = h.service.auto_save_decision(Some(&broken));
    assert_eq!(decision.mode, AutoSaveMode::Off);
    assert_eq!(decision.reason, Some(AutoSaveDisabledReason::Errors));
    assert_eq!(h.service.auto_save_mode(Some(&clean)), AutoSaveMode::OnFocusChange);

    // Diagnostics are read live, not cached.
    h.markers.set_errors(&broken, 0);
    assert_eq!(h.service.auto_save_mode(Some(&broken)), AutoSaveMode::OnFocusChange);
}

#[test]
fn workspace_files_only_turns_off_outside_the_workspace() {
    let h = harness(|c| {
        c.set("files.autoSave", json!("afterDelay"));
        c.set("files.autoSaveDelay", json!(10));
        c.set("files.autoSaveWorkspaceFilesOnly", json!(true));
    });
    let outside = Resource::file("/tmp/scratch.txt");
    let inside = Resource::file("/work/notes.txt");

    let config = h.service.auto_save_configuration(Some(&outside));
    assert_eq!(config.is_out_of_workspace, Some(true));
    assert_eq!(config.is_short_delay, None);

    let decision = h.service.auto_save_decision(Some(&outside));
    assert_eq!(decision.mode, AutoSaveMode::Off);
    assert_eq!(decision.reason, Some(AutoSaveDisabledReason::OutOfWorkspace));
    assert_eq!(h.service.auto_save_mode(Some(&inside)), AutoSaveMode::AfterShortDelay);
}

#[test]
fn resource_scope_honours_language_and_folder_overrides() {
    let h = harness(|c| {
        c.set("files.autoSave", json!("afterDelay"));
        c.register_extension("md", "markdown");
        c.set_for_language("markdown", "files.autoSave", json!("onWindowChange"));
        c.set_for_folder(&Resource::file("/work/generated"), "files.autoSave", json!("off"));
    });

    let doc = Resource::file("/work/README.md");
    let generated = Resource::file("/work/generated/out.rs");
    let source = Resource::file("/work/lib.rs");

    assert_eq!(h.service.auto_save_mode(Some(&doc)), AutoSaveMode::OnWindowChange);
    assert_eq!(h.service.auto_save_mode(Some(&source)), AutoSaveMode::AfterShortDelay);
    let decision = h.service.auto_save_decision(Some(&generated));
    assert_eq!(decision.reason, Some(AutoSaveDisabledReason::Settings));
}

#[test]
fn files_change_recomputes_cached_entries() {
    let mut h = harness(|c| c.set("files.autoSave", json!("afterDelay")));
    let r = Resource::file("/work/a.rs");
    assert_eq!(h.service.auto_save_mode(Some(&r)), AutoSaveMode::AfterShortDelay);

    // A value change without a change event keeps serving the cache.
    h.config.set("files.autoSaveDelay", json!(5000));
    assert_eq!(h.service.auto_save_mode(Some(&r)), AutoSaveMode::AfterShortDelay);

    h.service.on_did_change_configuration(&files_changed("files.autoSaveDelay"));
    assert_eq!(h.service.auto_save_mode(Some(&r)), AutoSaveMode::AfterLongDelay);
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterLongDelay);
}

#[test]
fn auto_save_changed_fires_only_from_change_events() {
    let mut h = harness(|c| c.set("files.autoSave", json!("afterDelay")));
    let stream = h.service.on_did_change_auto_save_configuration().subscribe_stream(8);
    assert!(stream.try_recv().is_none());

    h.config.set("files.autoSave", json!("onWindowChange"));
    h.service.on_did_change_configuration(&files_changed("files.autoSave"));
    let event = stream.try_recv().expect("auto-save change event");
    assert_eq!(event.mode, AutoSaveSetting::OnWindowChange);

    // Any files change raises, even with identical values.
    h.service.on_did_change_configuration(&files_changed("files.hotExit"));
    assert_eq!(stream.drain().len(), 1);
}

#[test]
fn short_delay_context_tracks_global_mode() {
    let mut h = harness(|c| c.set("files.autoSave", json!("afterDelay")));
    let flips = h.service.short_delay_context().on_did_change().subscribe_stream(8);
    assert!(h.service.short_delay_context().get());

    h.config.set("files.autoSaveDelay", json!(3000));
    h.service.on_did_change_configuration(&files_changed("files.autoSaveDelay"));
    assert!(!h.service.short_delay_context().get());

    h.config.set("files.autoSaveDelay", json!(500));
    h.service.on_did_change_configuration(&files_changed("files.autoSaveDelay"));
    assert!(h.service.short_delay_context().get());
    assert_eq!(flips.drain(), vec![false, true]);
}

#[test]
fn toggle_flips_between_off_and_after_delay() {
    let mut h = harness(|c| c.set("files.autoSave", json!("onFocusChange")));

    h.service.toggle_auto_save().unwrap();
    assert_eq!(global_value(&h.config, "files.autoSave"), Some(json!("off")));
    h.service.on_did_change_configuration(&files_changed("files.autoSave"));
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::Off);

    h.service.toggle_auto_save().unwrap();
    assert_eq!(global_value(&h.config, "files.autoSave"), Some(json!("afterDelay")));
    h.service.on_did_change_configuration(&files_changed("files.autoSave"));
    assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterShortDelay);
}

#[test]
fn toggle_from_unrecognized_value_enables() {
    let h = harness(|c| c.set("files.autoSave", json!("sometimes")));
    h.service.toggle_auto_save().unwrap();
    assert_eq!(global_value(&h.config, "files.autoSave"), Some(json!("afterDelay")));
}

#[test]
fn toggle_surfaces_write_failures() {
    let h = harness(|c| c.lock_key("files.autoSave"));
    let err = h.service.toggle_auto_save().unwrap_err();
    assert!(err.is_configuration());
    assert!(!err.is_retryable());
}

#[test]
fn disabled_resource_is_off_until_guard_drops() {
    let h = harness(|c| c.set("files.autoSave", json!("afterDelay")));
    let r = Resource::file("/work/a.rs");
    let events = h.service.on_did_change_auto_save_disabled().subscribe_stream(8);

    {
        let guard = h.service.disable_auto_save(&r);
        assert_eq!(guard.resource(), &r);
        let decision = h.service.auto_save_decision(Some(&r));
        assert_eq!(decision.reason, Some(AutoSaveDisabledReason::DisabledForResource));
        assert!(!h.service.has_short_auto_save_delay(Some(&r)));
        // Global scope is unaffected.
        assert_eq!(h.service.auto_save_mode(None), AutoSaveMode::AfterShortDelay);
    }

    assert_eq!(h.service.auto_save_mode(Some(&r)), AutoSaveMode::AfterShortDelay);
    assert!(h.service.has_short_auto_save_delay(Some(&r)));
    assert_eq!(events.drain().len(), 2);
}
