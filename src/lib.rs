//! # conftree
//!
//! A hierarchical, virtualized configuration registry. One key tree is
//! served by interchangeable backends ("generators") mounted anywhere in
//! it, behind a single read/write/iterate/watch API.
//!
//! ```ignore
//! let root = ConfigRoot::new();
//! root.handle().mount("temp:", true)?;
//! root.at("/sys/net").mount("ini:/etc/net.ini", true)?;
//!
//! root.at("/sys/net/eth0/ip").set(Some("10.0.0.1"))?;
//! for handle in root.handle().sorted_xiter("sys/net/*/ip") {
//!     println!("{} = {}", handle.full_key(), handle.get_or(""));
//! }
//! root.handle().commit(Depth::Infinite)?;
//! ```

mod constants;
mod errors;
mod generator;
mod handle;
mod key;
mod root;

pub mod config;
pub mod iter;
pub mod utils;
pub mod watch;

pub use constants::*;
pub use errors::*;
pub use generator::*;
pub use handle::*;
pub use key::*;
pub use root::*;

pub use crate::config::RegistryConfig;
pub use watch::WatchCallback;
pub use watch::WatchId;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
