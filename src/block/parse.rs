//! Decoding `% KEY: VALUE` records from a validation block.

use std::collections::HashMap;

use tracing::warn;

/// Keys that describe the block's own structure rather than the document.
const EXCLUDED_KEYS: [&str; 3] = [
    "=== VALIDATION BLOCK ===",
    "=== END VALIDATION BLOCK ===",
    "HASH_ENDPOINT",
];

/// Key of the single field returned when a block cannot be decoded.
pub const DECODE_ERROR_KEY: &str = "error";

/// Value of the single field returned when a block cannot be decoded.
pub const DECODE_ERROR_MESSAGE: &str = "failed to decode validation block";

/// Metadata fields parsed from a validation block, in first-seen order.
///
/// Inserting a key that already exists replaces its value in place.
/// Lookups and inserts are O(1), so parsing stays linear in the block size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFields {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl MetadataFields {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The diagnostic mapping used when a block cannot be decoded.
    pub fn decode_failure() -> Self {
        let mut fields = Self::new();
        fields.insert(DECODE_ERROR_KEY, DECODE_ERROR_MESSAGE);
        fields
    }

    /// Inserts or overwrites a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.entries[pos].1.as_str())
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates fields in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

#[cfg(feature = "protocol")]
impl serde::Serialize for MetadataFields {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Parses a validation block into metadata fields.
///
/// Equivalent to [`parse_block_with_limit`] with
/// [`DEFAULT_MAX_BLOCK_LEN`](crate::config::DEFAULT_MAX_BLOCK_LEN).
pub fn parse_block(block: &[u8]) -> MetadataFields {
    parse_block_with_limit(block, crate::config::DEFAULT_MAX_BLOCK_LEN)
}

/// Parses a validation block into metadata fields.
///
/// The bytes are decoded as UTF-8 with invalid sequences replaced. Every
/// line that starts with `%` (after trimming) becomes a field: the text up
/// to the first `:` is the key, the rest is the value, both trimmed. Lines
/// without a `:` become a key with an empty value. The block's own marker
/// lines and the routing endpoint key are skipped.
///
/// This never fails. A block longer than `max_len` bytes yields
/// [`MetadataFields::decode_failure`] instead of its fields.
///
/// # Example
///
/// ```
/// use docseal::parse_block;
///
/// let fields = parse_block(b"% === VALIDATION BLOCK ===\n% ENTITY: Acme\r\n% FLAG\n");
/// assert_eq!(fields.get("ENTITY"), Some("Acme"));
/// assert_eq!(fields.get("FLAG"), Some(""));
/// assert_eq!(fields.len(), 2);
/// ```
#[tracing::instrument(skip(block), fields(block_len = block.len()))]
pub fn parse_block_with_limit(block: &[u8], max_len: usize) -> MetadataFields {
    if block.len() > max_len {
        warn!(max_len, "validation block too large to decode");
        return MetadataFields::decode_failure();
    }

    let text = String::from_utf8_lossy(block);
    let mut fields = MetadataFields::new();

    for line in text.lines() {
        let Some(content) = line.trim().strip_prefix('%') else {
            continue;
        };
        let content = content.trim();

        let (key, value) = match content.split_once(':') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (content, ""),
        };

        if EXCLUDED_KEYS.contains(&key) {
            continue;
        }
        fields.insert(key, value);
    }

    fields
}
