use super::ChildIter;
use crate::ConfigHandle;
use crate::ConfigKey;

/// Children of a handle matching one segment, literal or `*`.
///
/// A wildcard yields every child. A literal yields at most the one child
/// it names, and only if that child exists.
pub struct PatternIter {
    inner: PatternSource,
}

enum PatternSource {
    Any(ChildIter),
    Literal(Option<ConfigHandle>),
}

impl PatternIter {
    /// `segment` must be a single-segment key
    pub fn new(
        parent: ConfigHandle,
        segment: &ConfigKey,
    ) -> Self {
        let inner = if segment.segment_count() == 1 && segment.is_wildcard_segment(0) {
            PatternSource::Any(ChildIter::new(parent))
        } else {
            let child = parent.child(segment);
            let present = child.exists() || child.has_children();
            PatternSource::Literal(present.then_some(child))
        };
        Self { inner }
    }
}

impl Iterator for PatternIter {
    type Item = ConfigHandle;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            PatternSource::Any(children) => children.next(),
            PatternSource::Literal(child) => child.take(),
        }
    }
}

/// Descendants matching a multi-segment pattern such as `*/ip`.
///
/// Each pattern segment is matched by one [`PatternIter`]; every match at
/// segment `i` opens a matcher for segment `i + 1` below it. A pattern with
/// no segments matches nothing.
pub struct WildcardIter {
    pattern: ConfigKey,
    /// Open matchers; the matcher at index `i` handles pattern segment `i`
    stack: Vec<PatternIter>,
}

impl WildcardIter {
    pub fn new(
        top: ConfigHandle,
        pattern: ConfigKey,
    ) -> Self {
        let stack = if pattern.is_empty() {
            Vec::new()
        } else {
            vec![PatternIter::new(top, &pattern.first())]
        };
        Self { pattern, stack }
    }
}

impl Iterator for WildcardIter {
    type Item = ConfigHandle;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(matcher) = self.stack.last_mut() {
            match matcher.next() {
                Some(handle) => {
                    let level = self.stack.len();
                    if level == self.pattern.segment_count() {
                        return Some(handle);
                    }
                    let segment = ConfigKey::new(self.pattern.segment(level));
                    self.stack.push(PatternIter::new(handle, &segment));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
