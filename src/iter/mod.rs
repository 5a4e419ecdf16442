//! Traversal over handles
//!
//! - [`ChildIter`]: direct children of one handle
//! - [`RecursiveIter`]: pre-order descendants bounded by a [`Depth`](crate::Depth)
//! - [`PatternIter`]: children matching one literal or `*` segment
//! - [`WildcardIter`]: descendants matching a multi-segment pattern
//! - [`Sorted`]: buffers any of the above and yields it in key order
//!
//! Recursive and wildcard traversal keep an explicit stack of child
//! iterators instead of recursing, so tree depth never grows the call
//! stack. Abandoning an iterator early needs no cleanup.

mod child;
mod pattern;
mod recursive;
mod sorted;


pub use child::ChildIter;
pub use pattern::PatternIter;
pub use pattern::WildcardIter;
pub use recursive::RecursiveIter;
pub use sorted::Sorted;
