use std::cmp::Ordering;

use crate::ConfigHandle;

/// Materializes another handle iterator and yields its items sorted.
///
/// The default order compares full keys segment by segment, which is also
/// a pre-order walk of the tree. Every item is buffered before the first
/// one is returned.
pub struct Sorted {
    items: std::vec::IntoIter<ConfigHandle>,
}

impl Sorted {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = ConfigHandle>,
    {
        Self::sorted_by(iter, |a, b| a.full_key().cmp(b.full_key()))
    }

    /// Sorts with a caller-supplied comparator
    pub fn sorted_by<I, F>(
        iter: I,
        compare: F,
    ) -> Self
    where
        I: Iterator<Item = ConfigHandle>,
        F: FnMut(&ConfigHandle, &ConfigHandle) -> Ordering,
    {
        let mut items: Vec<ConfigHandle> = iter.collect();
        items.sort_by(compare);
        Self {
            items: items.into_iter(),
        }
    }
}

impl Iterator for Sorted {
    type Item = ConfigHandle;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for Sorted {}
