use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use filepolicy::{
    ConfigurationChange, FilesConfigurationService, FilesPolicyConfig, IdentityService, MemoryConfiguration,
    MemoryFileService, MemoryMarkerService, PathIdentity, Resource, ServiceHost, StaticWorkspace,
};
use serde_json::json;

fn make_service() -> (FilesConfigurationService, Vec<Resource>) {
    let identity: Arc<dyn IdentityService> = Arc::new(PathIdentity::case_sensitive());
    let config = Arc::new(MemoryConfiguration::new());
    config.set("files.autoSave", json!("afterDelay"));
    config.set("files.autoSaveDelay", json!(500));
    config.set("files.autoSaveWhenNoErrors", json!(false));
    config.set("files.readonlyInclude", json!({ "**/vendor/**": true, "**/*.lock": true }));
    config.register_extension("md", "markdown");
    config.set_for_language("markdown", "files.autoSave", json!("onFocusChange"));

    let service = FilesConfigurationService::new(
        FilesPolicyConfig::default(),
        ServiceHost {
            config,
            files: Arc::new(MemoryFileService::new()),
            markers: Arc::new(MemoryMarkerService::new(identity.clone())),
            workspace: Arc::new(StaticWorkspace::new(vec![Resource::file("/work")])),
            identity,
        },
    );

    // 256 resources so the hot path stays inside the cache capacity.
    let resources = (0..256u32)
        .map(|i| {
            let ext = if i % 4 == 0 { "md" } else { "rs" };
            Resource::file(format!("/work/src/module_{i}.{ext}"))
        })
        .collect();
    (service, resources)
}

fn bench_auto_save_mode_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_save");
    group.throughput(Throughput::Elements(1));

    group.bench_function("mode_cached", |b| {
        let (service, resources) = make_service();
        for r in &resources {
            black_box(service.auto_save_mode(Some(r)));
        }
        let mut i = 0usize;
        b.iter(|| {
            let r = &resources[i % resources.len()];
            i += 1;
            black_box(service.auto_save_mode(Some(r)))
        });
    });

    group.bench_function("mode_after_invalidation", |b| {
        // Each sample starts from a cleared cache; setup is excluded.
        b.iter_custom(|iters| {
            let (mut service, resources) = make_service();
            service.on_did_change_configuration(&ConfigurationChange::new(["files.autoSave"]));
            let start = Instant::now();
            for n in 0..iters {
                let idx = usize::try_from(n).unwrap_or(0) % resources.len();
                black_box(service.auto_save_mode(Some(&resources[idx])));
            }
            start.elapsed()
        });
    });

    group.finish();
}

fn bench_readonly(c: &mut Criterion) {
    c.bench_function("readonly/is_readonly_globs", |b| {
        let (service, resources) = make_service();
        let vendored = Resource::file("/work/vendor/dep/lib.rs");
        let mut i = 0usize;
        b.iter(|| {
            i += 1;
            let r = if i % 2 == 0 {
                &vendored
            } else {
                &resources[i % resources.len()]
            };
            black_box(service.is_readonly(r, None))
        });
    });
}

criterion_group!(resolve, bench_auto_save_mode_cached, bench_readonly);
criterion_main!(resolve);
