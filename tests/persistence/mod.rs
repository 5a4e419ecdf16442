use std::fs;
use std::sync::Arc;

use conftree::config::MountConfig;
use conftree::ConfigHandle;
use conftree::ConfigKey;
use conftree::ConfigRoot;
use conftree::Depth;
use conftree::RegistryConfig;
use parking_lot::Mutex;
use tempfile::tempdir;

#[test]
fn ini_stack_writes_to_first_file_and_reads_through() {
    let dir = tempdir().unwrap();
    let user = dir.path().join("user.ini");
    let defaults = dir.path().join("defaults.ini");
    fs::write(&defaults, "[net]\nmtu = 1500\nhost = default\n").unwrap();

    let config = RegistryConfig {
        mounts: vec![MountConfig::new(
            "/app",
            format!("list:ini:{} readonly:ini:{}", user.display(), defaults.display()),
        )],
        ..Default::default()
    }
    .validate()
    .unwrap();
    let root = ConfigRoot::from_config(&config).unwrap();
    let app = root.at("app");

    assert_eq!(app.child("net/mtu").get(), Some("1500".to_string()));
    app.child("net/host").set(Some("edge-1")).unwrap();
    assert_eq!(app.child("net/host").get(), Some("edge-1".to_string()));

    app.commit(Depth::Infinite).unwrap();
    assert_eq!(fs::read_to_string(&user).unwrap(), "[net]\nhost = edge-1\n");
    assert_eq!(
        fs::read_to_string(&defaults).unwrap(),
        "[net]\nmtu = 1500\nhost = default\n"
    );
}

#[test]
fn refresh_discards_uncommitted_edits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sys.ini");
    fs::write(&path, "[core]\nlevel = 1\n").unwrap();

    let root = ConfigRoot::new();
    root.at("sys").mount(&format!("ini:{}", path.display()), true).unwrap();

    root.at("sys/core/level").set(Some("9")).unwrap();
    root.at("sys").refresh(Depth::Infinite).unwrap();

    assert_eq!(root.at("sys/core/level").get_int(0), 1);
}

#[test]
fn unmount_with_commit_persists_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.ini");

    let root = ConfigRoot::new();
    root.at("cfg").mount(&format!("ini:{}", path.display()), true).unwrap();
    root.at("cfg/main/name").set(Some("box")).unwrap();
    root.at("cfg").unmount(true).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[main]\nname = box\n");
    assert_eq!(root.at("cfg/main/name").get(), None);
}

#[test]
fn teardown_commit_is_configurable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("late.ini");

    let mut config = RegistryConfig::default();
    config.teardown.commit_on_drop = true;
    config.mounts.push(MountConfig::new("/", format!("ini:{}", path.display())));
    let root = ConfigRoot::from_config(&config).unwrap();
    root.at("s/k").set(Some("v")).unwrap();
    assert!(!path.exists());

    drop(root);

    assert_eq!(fs::read_to_string(&path).unwrap(), "[s]\nk = v\n");
}

#[test]
fn watches_follow_writes_across_mounts() {
    let root = ConfigRoot::new();
    root.handle().mount("temp:", false).unwrap();
    root.at("sys").mount("temp:", false).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    root.handle()
        .add_watch(
            Depth::Infinite,
            Arc::new(move |h: &ConfigHandle| seen_clone.lock().push(h.full_key().clone())),
        )
        .unwrap();

    root.at("a").set(Some("1")).unwrap();
    root.at("sys/b").set(Some("2")).unwrap();

    assert_eq!(*seen.lock(), vec![ConfigKey::new("a"), ConfigKey::new("sys/b")]);
}

#[test]
fn dump_lists_mounted_values() {
    let root = ConfigRoot::new();
    root.handle().mount("temp:", false).unwrap();
    root.at("z").set(Some("last")).unwrap();
    root.at("m/n").set(Some("mid")).unwrap();

    let mut out = Vec::new();
    root.handle().dump(&mut out, false).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "m/n = mid\nz = last\n");
}
