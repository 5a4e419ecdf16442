use std::sync::Arc;

use conftree::ConfigHandle;
use conftree::ConfigKey;
use conftree::ConfigRoot;
use conftree::Generator;
use conftree::MemGenerator;

pub fn key(path: &str) -> ConfigKey {
    ConfigKey::new(path)
}

pub fn mem(pairs: &[(&str, &str)]) -> Arc<dyn Generator> {
    Arc::new(MemGenerator::from_pairs(pairs.iter().copied()))
}

/// Registry with a writable in-memory tree at `/`
pub fn writable_root(pairs: &[(&str, &str)]) -> ConfigRoot {
    let root = ConfigRoot::new();
    root.mount(
        &ConfigKey::root(),
        Box::new(MemGenerator::from_pairs(pairs.iter().copied())),
        true,
    )
    .expect("mount root tree");
    root
}

pub fn full_keys<I: Iterator<Item = ConfigHandle>>(iter: I) -> Vec<String> {
    iter.map(|h| h.full_key().to_string()).collect()
}
