use super::ChildIter;
use crate::ConfigHandle;
use crate::Depth;

/// Depth-first, pre-order traversal below a handle.
///
/// `Depth::Zero` yields nothing, `Depth::OneLevel` the direct children and
/// `Depth::Infinite` every descendant exactly once. The starting handle
/// itself is never yielded.
pub struct RecursiveIter {
    depth: Depth,
    /// One open child iterator per level being walked
    stack: Vec<ChildIter>,
}

impl RecursiveIter {
    pub fn new(
        top: ConfigHandle,
        depth: Depth,
    ) -> Self {
        let stack = match depth {
            Depth::Zero => Vec::new(),
            Depth::OneLevel | Depth::Infinite => vec![ChildIter::new(top)],
        };
        Self { depth, stack }
    }
}

impl Iterator for RecursiveIter {
    type Item = ConfigHandle;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(level) = self.stack.last_mut() {
            match level.next() {
                Some(handle) => {
                    if self.depth == Depth::Infinite {
                        self.stack.push(ChildIter::new(handle.clone()));
                    }
                    return Some(handle);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
