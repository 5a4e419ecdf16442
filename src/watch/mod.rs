//! Change notification for registry keys
//!
//! A watch is a `(key, depth, callback)` registration. Whenever a write made
//! through the registry lands inside the region `depth` describes below
//! `key`, the callback runs.
//!
//! # Delivery
//!
//! - Synchronous: callbacks run on the thread that performed the `set`,
//!   after the generator accepted it and before `set` returns
//! - At least once per change; no ordering guarantee across unrelated keys
//! - Deleting a key also reaches watches registered *below* it, since the
//!   whole subtree went away
//! - Changes made directly on a generator (not through the registry) are not
//!   observed
//!
//! # Registration
//!
//! Every registration gets its own [`WatchId`]. Identical registrations are
//! independent and each must be cancelled on its own.
//!
//! # Thread Safety
//!
//! The registry is a `DashMap`; matching callbacks are collected first and
//! invoked after every shard lock is released, so a callback may register,
//! cancel, read or write freely.

mod manager;


pub use manager::WatchCallback;
pub use manager::WatchId;
pub use manager::WatchManager;

pub use crate::config::WatchConfig;
