//! Ordered OpenStreetMap tag sets.
//!
//! Tags keep the order in which the source element listed them. Lookups are
//! by exact key; a missing key is `None`, never an empty string.

/// An ordered list of key/value tags attached to a way or relation.
///
/// # Examples
/// ```
/// use waterareas_core::TagSet;
///
/// let tags = TagSet::from_pairs([("natural", "water"), ("name", "Lake X")]);
/// assert_eq!(tags.get("name"), Some("Lake X"));
/// assert!(tags.has("natural", "water"));
/// assert_eq!(tags.get("water"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    /// Create an empty tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Collect borrowed key/value pairs into an owned tag set.
    ///
    /// Later duplicates of a key are kept but never returned by [`TagSet::get`],
    /// which always answers with the first occurrence.
    pub fn from_pairs<'a, T>(pairs: T) -> Self
    where
        T: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs.into_iter().collect()
    }

    /// Append a tag.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Return the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Return true when `key` is present with exactly `value`.
    #[must_use]
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    /// Interpret `key` as a yes/no flag.
    ///
    /// Returns `None` when the key is absent, `Some(false)` for `no` or `0`,
    /// and `Some(true)` for any other value.
    ///
    /// # Examples
    /// ```
    /// use waterareas_core::TagSet;
    ///
    /// let tags = TagSet::from_pairs([("salt", "yes"), ("tidal", "0")]);
    /// assert_eq!(tags.flag("salt"), Some(true));
    /// assert_eq!(tags.flag("tidal"), Some(false));
    /// assert_eq!(tags.flag("maritime"), None);
    /// ```
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(|value| !matches!(value, "no" | "0"))
    }

    /// Iterate over the tags in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of tags, counting duplicates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true when no tags are present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return a copy without any tag stored under `key`.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        self.iter().filter(|(candidate, _)| *candidate != key).collect()
    }

    /// Return true when both sets hold the same tags, in any order.
    ///
    /// # Examples
    /// ```
    /// use waterareas_core::TagSet;
    ///
    /// let lake = TagSet::from_pairs([("natural", "water"), ("name", "Mere")]);
    /// let same = TagSet::from_pairs([("name", "Mere"), ("natural", "water")]);
    /// assert!(lake.same_tags(&same));
    /// assert!(!lake.same_tags(&TagSet::from_pairs([("natural", "water")])));
    /// ```
    #[must_use]
    pub fn same_tags(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.has(key, value))
    }

    /// Keep only the tags that `other` carries with the same value.
    pub fn retain_common(&mut self, other: &Self) {
        self.entries
            .retain(|(key, value)| other.has(key.as_str(), value.as_str()));
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
        }
    }
}

impl FromIterator<(String, String)> for TagSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
