//! Interface name normalization
//!
//! Neighbors frequently advertise composite port identifiers such as
//! `spine01-swp12`. Stripping the neighbor's own name yields the token the
//! neighbor reports for the same interface in its own dump.

use std::collections::BTreeSet;

/// Separator between a device name and its port in composite identifiers.
pub const NAME_SEPARATOR: char = '-';

/// Set of device names the normalizer may strip.
#[derive(Debug, Clone, Default)]
pub struct KnownDevices {
    names: BTreeSet<String>,
}

impl KnownDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device name. Empty names are ignored.
    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.names.insert(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Longest known name that `candidate` starts with, followed by the
    /// separator.
    pub fn longest_prefix_of(&self, candidate: &str) -> Option<&str> {
        self.names
            .iter()
            .filter(|name| {
                candidate.len() > name.len()
                    && candidate.starts_with(name.as_str())
                    && candidate[name.len()..].starts_with(NAME_SEPARATOR)
            })
            .max_by_key(|name| name.len())
            .map(String::as_str)
    }

    /// Normalizes `candidate` against this set. See [`normalize_interface_name`].
    pub fn normalize<'a>(&self, candidate: &'a str) -> &'a str {
        normalize_interface_name(candidate, self)
    }
}

impl<S: Into<String>> FromIterator<S> for KnownDevices {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut known = Self::new();
        for name in iter {
            known.insert(name);
        }
        known
    }
}

impl<S: Into<String>> Extend<S> for KnownDevices {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

/// Strips the longest `<device>-` prefix of a known device from `candidate`.
///
/// Returns the input unchanged when no known name matches. When several names
/// match (`leaf1` and `leaf1-a`), the longest one wins.
pub fn normalize_interface_name<'a>(candidate: &'a str, known: &KnownDevices) -> &'a str {
    match known.longest_prefix_of(candidate) {
        Some(name) => &candidate[name.len() + NAME_SEPARATOR.len_utf8()..],
        None => candidate,
    }
}
