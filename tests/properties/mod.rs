use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use conftree::ConfigKey;
use conftree::ConfigRoot;
use conftree::Depth;
use conftree::Error;
use conftree::Generator;
use conftree::KeyIter;
use conftree::ListGenerator;
use conftree::MemGenerator;
use conftree::Result;

use crate::commons::full_keys;
use crate::commons::key;
use crate::commons::mem;
use crate::commons::writable_root;
use crate::enable_logger;

#[test]
fn parent_strips_last_segment_and_is_idempotent_at_root() {
    let root = writable_root(&[]);

    for path in ["a", "a/b", "a/b/c", "x/Y/z/w"] {
        let handle = root.at(path);
        let expected = handle.full_key().parent();
        assert_eq!(handle.parent().full_key(), &expected);
        assert_eq!(handle.parent().full_key().segment_count(), handle.full_key().segment_count() - 1);
    }

    let top = root.handle();
    assert_eq!(top.parent(), top);
    assert_eq!(top.parent().parent(), top);
}

#[test]
fn set_then_get_round_trips() {
    let root = writable_root(&[]);

    for (path, value) in [("a", "1"), ("a/b", "two"), ("deep/er/key", "x y z")] {
        root.at(path).set(Some(value)).unwrap();
        assert_eq!(root.at(path).get(), Some(value.to_string()));
    }
}

#[test]
fn deleting_a_key_removes_its_descendants() {
    let root = writable_root(&[("k", "v"), ("k/a", "1"), ("k/a/b", "2"), ("other", "3")]);

    root.at("k").set(None).unwrap();

    assert!(!root.at("k").exists());
    assert!(!root.at("k/a").exists());
    assert!(!root.at("k/a/b").exists());
    assert!(root.at("other").exists());
}

#[test]
fn list_priority_and_removal() {
    let a = mem(&[("x", "1")]);
    let b = mem(&[("x", "2")]);
    let list = ListGenerator::new(vec![a.clone(), b.clone()]);

    assert_eq!(list.get(&key("x")), Some("1".to_string()));

    assert!(list.remove_generator(&a));
    assert_eq!(list.get(&key("x")), Some("2".to_string()));
    assert_eq!(b.get(&key("x")), Some("2".to_string()));
}

#[test]
fn list_merges_children_in_priority_order() {
    let a = mem(&[("k/a", ""), ("k/b", "")]);
    let b = mem(&[("k/b", ""), ("k/c", "")]);
    let root = ConfigRoot::new();
    root.mount(&ConfigKey::root(), Box::new(ListGenerator::new(vec![a, b])), false)
        .unwrap();

    let children = full_keys(root.at("k").iter());
    assert_eq!(children, vec!["k/a", "k/b", "k/c"]);
}

#[test]
fn innermost_mount_wins() {
    enable_logger();
    let g = mem(&[("cpu", "from-g"), ("net/eth0", "from-g")]);
    let h = mem(&[("eth0", "from-h")]);
    let root = ConfigRoot::new();
    root.mount_shared(&key("/sys"), g, false).unwrap();
    root.mount_shared(&key("/sys/net"), h, false).unwrap();

    assert_eq!(root.at("/sys/net/eth0").get(), Some("from-h".to_string()));
    assert_eq!(root.at("/sys/cpu").get(), Some("from-g".to_string()));
}

#[test]
fn recursive_depth_bounds() {
    let root = writable_root(&[("a/b/c", "1"), ("a/d", "2"), ("e", "3")]);

    let one = full_keys(root.handle().recursive_iter(Depth::OneLevel));
    assert_eq!(one, vec!["a", "e"]);

    let all = full_keys(root.handle().recursive_iter(Depth::Infinite));
    assert_eq!(all, vec!["a", "a/b", "a/b/c", "a/d", "e"]);
}

#[test]
fn wildcard_pattern_matches_exact_set() {
    let root = writable_root(&[("eth0/ip", "1"), ("eth0/mtu", "2"), ("eth1/ip", "3")]);

    let matched = full_keys(root.handle().xiter("*/ip"));
    assert_eq!(matched, vec!["eth0/ip", "eth1/ip"]);
}

/// Reports its children in a different order on every call
struct Rotating {
    names: Vec<&'static str>,
    calls: AtomicUsize,
}

impl Generator for Rotating {
    fn get(
        &self,
        _key: &ConfigKey,
    ) -> Option<String> {
        None
    }

    fn set(
        &self,
        key: &ConfigKey,
        _value: Option<String>,
    ) -> Result<()> {
        Err(Error::Rejected {
            key: key.clone(),
            reason: "read-only".into(),
        })
    }

    fn exists(
        &self,
        key: &ConfigKey,
    ) -> bool {
        key.segment_count() <= 1
    }

    fn has_children(
        &self,
        key: &ConfigKey,
    ) -> bool {
        key.is_empty()
    }

    fn iterate_children(
        &self,
        key: &ConfigKey,
    ) -> KeyIter {
        if !key.is_empty() {
            return Box::new(std::iter::empty());
        }
        let mut names: Vec<ConfigKey> = self.names.iter().map(|n| ConfigKey::new(n)).collect();
        let shift = self.calls.fetch_add(1, Ordering::SeqCst) % names.len();
        names.rotate_left(shift);
        Box::new(names.into_iter())
    }

    fn commit(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        Ok(())
    }

    fn refresh(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        Ok(())
    }

    fn is_ok(&self) -> bool {
        true
    }
}

#[test]
fn sorted_iteration_is_deterministic() {
    let root = ConfigRoot::new();
    root.mount(
        &ConfigKey::root(),
        Box::new(Rotating {
            names: vec!["m", "z", "a", "k"],
            calls: AtomicUsize::new(0),
        }),
        false,
    )
    .unwrap();

    let first = full_keys(root.handle().sorted_iter());
    for _ in 0..5 {
        assert_eq!(full_keys(root.handle().sorted_iter()), first);
    }
    assert_eq!(first, vec!["a", "k", "m", "z"]);
}

/// Counts sync calls and optionally fails them
struct Probe {
    fail: bool,
    commits: Arc<AtomicUsize>,
}

impl Generator for Probe {
    fn get(
        &self,
        _key: &ConfigKey,
    ) -> Option<String> {
        None
    }

    fn set(
        &self,
        _key: &ConfigKey,
        _value: Option<String>,
    ) -> Result<()> {
        Ok(())
    }

    fn exists(
        &self,
        _key: &ConfigKey,
    ) -> bool {
        false
    }

    fn has_children(
        &self,
        _key: &ConfigKey,
    ) -> bool {
        false
    }

    fn iterate_children(
        &self,
        _key: &ConfigKey,
    ) -> KeyIter {
        Box::new(std::iter::empty())
    }

    fn commit(
        &self,
        key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Rejected {
                key: key.clone(),
                reason: "backing store offline".into(),
            });
        }
        Ok(())
    }

    fn refresh(
        &self,
        _key: &ConfigKey,
        _depth: Depth,
    ) -> Result<()> {
        Ok(())
    }

    fn is_ok(&self) -> bool {
        true
    }
}

#[test]
fn subtree_commit_reaches_every_mount_despite_failure() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let root = ConfigRoot::new();
    root.mount(
        &key("svc/a"),
        Box::new(Probe {
            fail: true,
            commits: first.clone(),
        }),
        false,
    )
    .unwrap();
    root.mount(
        &key("svc/b"),
        Box::new(Probe {
            fail: false,
            commits: second.clone(),
        }),
        false,
    )
    .unwrap();

    let result = root.at("svc").commit(Depth::Infinite);

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    match result {
        Err(Error::Sync(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures.failures()[0].mount_point, key("svc/a"));
        }
        other => panic!("expected aggregated failure, got {:?}", other),
    }
}

#[test]
fn unmounted_key_reads_as_null() {
    let root = ConfigRoot::new();
    root.mount_shared(&key("only"), Arc::new(MemGenerator::new()), false).unwrap();

    let outside = root.at("elsewhere/key");
    assert_eq!(outside.get(), None);
    assert!(!outside.exists());
    assert!(matches!(outside.set(Some("v")), Err(Error::Rejected { .. })));
}
