use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::test_utils::full_keys;
use crate::test_utils::mem_root;
use crate::ConfigRoot;
use crate::NullGenerator;

#[test]
fn test_parent_and_key_navigation() {
    let root = mem_root(&[]);
    let handle = root.at("a/b/c");

    assert_eq!(handle.parent().full_key(), &ConfigKey::new("a/b"));
    assert_eq!(handle.key(), ConfigKey::new("c"));
    assert_eq!(handle.root().full_key(), &ConfigKey::root());
    assert_eq!(root.handle().parent(), root.handle());
    assert_eq!(handle.parent().child("c"), handle);
}

#[test]
fn test_handles_compare_by_root_and_key() {
    let first = mem_root(&[]);
    let second = mem_root(&[]);

    assert_eq!(first.at("a/B"), first.at("A/b"));
    assert_ne!(first.at("a"), second.at("a"));
    assert_ne!(first.at("a"), ConfigHandle::null());
    assert_eq!(ConfigHandle::null(), ConfigHandle::default());
}

#[test]
fn test_null_handle_behaves_like_null_generator() {
    let handle = ConfigHandle::null().child("a");

    assert!(handle.is_null());
    assert_eq!(handle.get(), None);
    assert!(!handle.exists());
    assert!(!handle.has_children());
    assert!(matches!(handle.set(Some("1")), Err(Error::Rejected { .. })));
    assert!(handle.commit(Depth::Infinite).is_err());
    assert!(handle.which_mount().is_none());
    assert_eq!(handle.iter().count(), 0);
}

#[test]
fn test_set_get_and_remove_round_trip() {
    let root = mem_root(&[]);
    let handle = root.at("net/eth0/ip");

    handle.set(Some("10.0.0.1")).unwrap();
    assert_eq!(handle.get(), Some("10.0.0.1".to_string()));
    assert!(root.at("net").has_children());

    root.at("net").remove().unwrap();
    assert!(!handle.exists());
    assert!(!root.at("net").exists());
}

#[test]
fn test_get_or_and_get_int() {
    let root = mem_root(&[
        ("num", " 42 "),
        ("neg", "-7"),
        ("yes", "Yes"),
        ("off", "OFF"),
        ("junk", "12abc"),
    ]);

    assert_eq!(root.at("missing").get_or("dflt"), "dflt");
    assert_eq!(root.at("num").get_or("dflt"), " 42 ");
    assert_eq!(root.at("num").get_int(0), 42);
    assert_eq!(root.at("neg").get_int(0), -7);
    assert_eq!(root.at("yes").get_int(0), 1);
    assert_eq!(root.at("off").get_int(5), 0);
    assert_eq!(root.at("junk").get_int(5), 5);
    assert_eq!(root.at("missing").get_int(9), 9);

    root.at("counter").set_int(17).unwrap();
    assert_eq!(root.at("counter").get(), Some("17".to_string()));
}

#[test]
fn test_zap_keeps_key_and_value() {
    let root = mem_root(&[("k", "v"), ("k/a", "1"), ("k/b/c", "2")]);

    root.at("k").zap().unwrap();

    assert_eq!(root.at("k").get(), Some("v".to_string()));
    assert!(!root.at("k").has_children());
}

#[test]
fn test_mount_through_handle() {
    let root = ConfigRoot::new();
    let sys = root.at("sys");

    sys.mount("temp:", true).unwrap();
    sys.child("ro").mount_generator(Box::new(NullGenerator::new()), false).unwrap();

    assert!(sys.is_mount_point());
    assert!(!root.at("sys/x").is_mount_point());
    assert_eq!(sys.mounts().len(), 1);
    let (_, mount_point) = root.at("sys/ro/deep").which_mount().unwrap();
    assert_eq!(mount_point, ConfigKey::new("sys/ro"));

    sys.child("a").set(Some("1")).unwrap();
    assert!(sys.child("ro/a").set(Some("1")).is_err());

    sys.child("ro").unmount(false).unwrap();
    sys.child("ro/a").set(Some("1")).unwrap();
    assert_eq!(root.at("sys/ro/a").get(), Some("1".to_string()));
}

#[test]
fn test_watch_fires_synchronously_on_set() {
    let root = mem_root(&[]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let id = root
        .at("net")
        .add_watch(
            Depth::Infinite,
            Arc::new(move |h: &ConfigHandle| {
                seen_clone.lock().push((h.full_key().to_string(), h.get()));
            }),
        )
        .unwrap();

    root.at("net/eth0").set(Some("up")).unwrap();
    root.at("sys").set(Some("x")).unwrap();
    root.at("net/eth0").remove().unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            ("net/eth0".to_string(), Some("up".to_string())),
            ("net/eth0".to_string(), None),
        ]
    );

    assert!(root.handle().del_watch(id));
    root.at("net/eth0").set(Some("down")).unwrap();
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn test_rejected_write_does_not_notify() {
    let root = ConfigRoot::new();
    root.handle().mount("null:", false).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    root.handle()
        .add_watch(
            Depth::Infinite,
            Arc::new(move |_: &ConfigHandle| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    assert!(root.at("a").set(Some("1")).is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_callback_can_write_to_registry() {
    let root = mem_root(&[]);
    let mirror = root.at("mirror");
    root.at("src")
        .add_watch(
            Depth::Zero,
            Arc::new(move |h: &ConfigHandle| {
                let _ = mirror.set(h.get().as_deref());
            }),
        )
        .unwrap();

    root.at("src").set(Some("copied")).unwrap();

    assert_eq!(root.at("mirror").get(), Some("copied".to_string()));
}

#[test]
fn test_dump_writes_sorted_pre_order() {
    let root = mem_root(&[("b/y", "2"), ("a", "1"), ("b/x", "3")]);

    let mut out = Vec::new();
    root.handle().dump(&mut out, false).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a = 1\nb/x = 3\nb/y = 2\n");

    let mut everything = Vec::new();
    root.handle().dump(&mut everything, true).unwrap();
    assert_eq!(
        String::from_utf8(everything).unwrap(),
        "a = 1\nb = \nb/x = 3\nb/y = 2\n"
    );
}

#[test]
fn test_iterator_shortcuts() {
    let root = mem_root(&[("n/eth0/ip", "1"), ("n/eth1/ip", "2"), ("n/eth0/mtu", "3")]);
    let n = root.at("n");

    assert_eq!(full_keys(n.sorted_iter()), vec!["n/eth0", "n/eth1"]);
    assert_eq!(full_keys(n.sorted_xiter("*/ip")), vec!["n/eth0/ip", "n/eth1/ip"]);
    assert_eq!(n.recursive_iter(Depth::Infinite).count(), 5);
}
