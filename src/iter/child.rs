use crate::ConfigHandle;
use crate::KeyIter;

/// Direct children of a handle, in the order the generators report them.
///
/// Names are fetched once on construction; create a new iterator to start
/// over.
pub struct ChildIter {
    parent: ConfigHandle,
    names: KeyIter,
}

impl ChildIter {
    pub fn new(parent: ConfigHandle) -> Self {
        let names = parent.child_names();
        Self { parent, names }
    }

    pub fn parent(&self) -> &ConfigHandle {
        &self.parent
    }
}

impl Iterator for ChildIter {
    type Item = ConfigHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;
        Some(self.parent.child(name))
    }
}
