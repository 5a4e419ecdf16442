//! Structured registry paths.
//!
//! A [`ConfigKey`] is an ordered sequence of segments; the empty sequence is
//! the root. Parsing splits on `/` and drops empty segments, so `"/a//b/"`
//! and `"a/b"` are the same key. Segment content compares ASCII
//! case-insensitively, while concatenation and decomposition are purely
//! structural and never touch a generator.


use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::KEY_SEPARATOR;
use crate::WILDCARD_SEGMENT;

#[derive(Clone, Default)]
pub struct ConfigKey {
    segments: Vec<String>,
}

impl ConfigKey {
    /// The root key (zero segments)
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a `/`-separated path
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split(KEY_SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Builds a key from already-split segments; empty segments are dropped
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// The single-segment wildcard key `*`
    pub fn any() -> Self {
        Self {
            segments: vec![WILDCARD_SEGMENT.to_string()],
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// True for the root key
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns segment `i`.
    ///
    /// # Panics
    /// Panics if `i >= segment_count()`.
    pub fn segment(
        &self,
        i: usize,
    ) -> &str {
        assert!(
            i < self.segments.len(),
            "segment index {} out of range for key '{}' with {} segment(s)",
            i,
            self,
            self.segments.len()
        );
        &self.segments[i]
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Removes the last segment; the root is its own parent
    pub fn parent(&self) -> ConfigKey {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// The final segment as a key of its own (the root for the root)
    pub fn last(&self) -> ConfigKey {
        Self {
            segments: self.segments.last().cloned().into_iter().collect(),
        }
    }

    /// The first segment as a key of its own (the root for the root)
    pub fn first(&self) -> ConfigKey {
        Self {
            segments: self.segments.first().cloned().into_iter().collect(),
        }
    }

    /// The first `n` segments (clamped)
    pub fn first_n(
        &self,
        n: usize,
    ) -> ConfigKey {
        Self {
            segments: self.segments.iter().take(n).cloned().collect(),
        }
    }

    /// Everything after the first `n` segments (clamped)
    pub fn remove_first(
        &self,
        n: usize,
    ) -> ConfigKey {
        Self {
            segments: self.segments.iter().skip(n).cloned().collect(),
        }
    }

    /// Returns `self ++ other` without modifying either key
    pub fn concat(
        &self,
        other: &ConfigKey,
    ) -> ConfigKey {
        let mut segments = Vec::with_capacity(self.segments.len() + other.segments.len());
        segments.extend(self.segments.iter().cloned());
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn is_wildcard_segment(
        &self,
        i: usize,
    ) -> bool {
        self.segment(i) == WILDCARD_SEGMENT
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| s == WILDCARD_SEGMENT)
    }

    /// True if `self` equals `other` or is one of its ancestors
    pub fn is_prefix_of(
        &self,
        other: &ConfigKey,
    ) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// `self` with the leading `prefix` removed, if `prefix` covers it
    pub fn strip_prefix(
        &self,
        prefix: &ConfigKey,
    ) -> Option<ConfigKey> {
        if prefix.is_prefix_of(self) {
            Some(self.remove_first(prefix.segment_count()))
        } else {
            None
        }
    }
}

fn cmp_segment(
    a: &str,
    b: &str,
) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

impl PartialEq for ConfigKey {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.segments.len() == other.segments.len() && self.is_prefix_of(other)
    }
}

impl Eq for ConfigKey {}

impl Hash for ConfigKey {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        state.write_usize(self.segments.len());
        for segment in &self.segments {
            for b in segment.bytes() {
                state.write_u8(b.to_ascii_lowercase());
            }
            state.write_u8(0xff);
        }
    }
}

impl Ord for ConfigKey {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        for (a, b) in self.segments.iter().zip(other.segments.iter()) {
            match cmp_segment(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.segments.len().cmp(&other.segments.len())
    }
}

impl PartialOrd for ConfigKey {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.segments.join(KEY_SEPARATOR))
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "ConfigKey({:?})", self.to_string())
    }
}

impl From<&str> for ConfigKey {
    fn from(path: &str) -> Self {
        ConfigKey::new(path)
    }
}

impl From<String> for ConfigKey {
    fn from(path: String) -> Self {
        ConfigKey::new(&path)
    }
}

impl From<&String> for ConfigKey {
    fn from(path: &String) -> Self {
        ConfigKey::new(path)
    }
}

impl From<&ConfigKey> for ConfigKey {
    fn from(key: &ConfigKey) -> Self {
        key.clone()
    }
}

impl FromStr for ConfigKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ConfigKey::new(s))
    }
}

impl Serialize for ConfigKey {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ConfigKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Ok(ConfigKey::new(&path))
    }
}
