use std::sync::Arc;

use crate::ConfigHandle;
use crate::ConfigKey;
use crate::ConfigRoot;
use crate::Generator;
use crate::MemGenerator;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Child names reported directly by a generator, in its own order
pub fn children_of<G: Generator + ?Sized>(
    generator: &G,
    key: &str,
) -> Vec<String> {
    generator.iterate_children(&ConfigKey::new(key)).map(|k| k.to_string()).collect()
}

/// Full keys produced by a handle iterator
pub fn full_keys<I: Iterator<Item = ConfigHandle>>(iter: I) -> Vec<String> {
    iter.map(|h| h.full_key().to_string()).collect()
}

/// In-memory generator pre-populated with `pairs`
pub fn mem_generator(pairs: &[(&str, &str)]) -> Arc<dyn Generator> {
    Arc::new(MemGenerator::from_pairs(pairs.iter().copied()))
}

/// A root with one in-memory generator at `/` holding `pairs`
pub fn mem_root(pairs: &[(&str, &str)]) -> ConfigRoot {
    let root = ConfigRoot::new();
    root.mount(&ConfigKey::root(), Box::new(MemGenerator::from_pairs(pairs.iter().copied())), false)
        .expect("mount in-memory generator");
    root
}
