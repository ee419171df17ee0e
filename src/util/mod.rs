//! Internal byte helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use std::ops::Range;

use bytes::Bytes;

/// Finds the first occurrence of `needle` in `haystack` at or after `from`.
///
/// An empty needle matches at `from`, even past the end. Candidates
/// are pre-filtered on the first needle byte before the full comparison;
/// no candidate starts past `haystack.len() - needle.len()`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let Some((&first, rest)) = needle.split_first() else {
        return Some(from);
    };
    if from > haystack.len() || haystack.len() - from < needle.len() {
        return None;
    }

    let last_start = haystack.len() - needle.len();
    let mut i = from;
    while i <= last_start {
        let pos = haystack[i..=last_start].iter().position(|&b| b == first)?;
        i += pos;
        if &haystack[i + 1..i + needle.len()] == rest {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Returns `data` with `range` removed.
///
/// Removing an empty prefix or suffix is zero-copy; otherwise the two
/// surviving halves are copied into one new allocation.
pub(crate) fn splice_out(data: &Bytes, range: Range<usize>) -> Bytes {
    if range.start == 0 {
        return data.slice(range.end..);
    }
    if range.end == data.len() {
        return data.slice(..range.start);
    }
    let mut combined = Vec::with_capacity(data.len() - range.len());
    combined.extend_from_slice(&data[..range.start]);
    combined.extend_from_slice(&data[range.end..]);
    Bytes::from(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_subslice() {
        let hay = b"abcabcabd";
        assert_eq!(find_subslice(hay, b"abd", 0), Some(6));
        assert_eq!(find_subslice(hay, b"abc", 1), Some(3));
        assert_eq!(find_subslice(hay, b"abx", 0), None);
        assert_eq!(find_subslice(hay, b"abcabcabdx", 0), None);
    }

    #[test]
    fn test_find_subslice_empty_needle() {
        assert_eq!(find_subslice(b"abc", b"", 2), Some(2));
        assert_eq!(find_subslice(b"abc", b"", 3), Some(3));
        assert_eq!(find_subslice(b"abc", b"", 4), Some(4));
        assert_eq!(find_subslice(b"", b"", 9), Some(9));
        assert_eq!(find_subslice(b"abc", b"c", 4), None);
    }

    #[test]
    fn test_find_subslice_at_tail() {
        assert_eq!(find_subslice(b"xxxab", b"ab", 0), Some(3));
        assert_eq!(find_subslice(b"xxxab", b"ab", 4), None);
        assert_eq!(find_subslice(b"xxxab", b"b", 4), Some(4));
    }

    #[test]
    fn test_splice_out() {
        let data = Bytes::from_static(b"0123456789");
        assert_eq!(&splice_out(&data, 2..5)[..], b"0156789");
        assert_eq!(&splice_out(&data, 0..3)[..], b"3456789");
        assert_eq!(&splice_out(&data, 7..10)[..], b"0123456");
        assert!(splice_out(&data, 0..10).is_empty());
    }
}
