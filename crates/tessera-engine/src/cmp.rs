//! Key and data comparators.
//!
//! Every tree carries one comparator for keys and one for data items
//! (the latter only matters for dup-sort trees). Comparators are a closed
//! enum rather than function pointers so the tree registry stays plain
//! data and trivially `Send + Sync`.

use std::cmp::Ordering;

/// Ordering rule for keys or data items within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Little-endian unsigned integer order, width-agnostic.
    Unsigned,
    /// Plain lexicographic byte order.
    Lexical,
    /// Lexicographic order over the reversed byte sequence.
    Reverse,
    /// Row-blob order: the ordering used for whole serialized rows stored
    /// as data items of a primary tree. Rows compare by length, then
    /// bytes, which is total and stable for opaque blobs.
    RowBlob,
}

impl Comparator {
    /// Compares two byte strings under this rule.
    #[must_use]
    pub fn cmp(self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            Self::Unsigned => cmp_unsigned(a, b),
            Self::Lexical => a.cmp(b),
            Self::Reverse => a.iter().rev().cmp(b.iter().rev()),
            Self::RowBlob => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        }
    }
}

/// Compares little-endian unsigned integers of possibly different widths.
fn cmp_unsigned(a: &[u8], b: &[u8]) -> Ordering {
    let sig = |s: &[u8]| s.len() - s.iter().rev().take_while(|&&x| x == 0).count();
    let (la, lb) = (sig(a), sig(b));
    if la != lb {
        return la.cmp(&lb);
    }
    // Equal significant width: most significant byte is last.
    a[..la].iter().rev().cmp(b[..lb].iter().rev())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_order() {
        let one = 1u64.to_le_bytes();
        let two = 2u64.to_le_bytes();
        let big = 0x0100_0000_0000_0000u64.to_le_bytes();
        assert_eq!(Comparator::Unsigned.cmp(&one, &two), Ordering::Less);
        assert_eq!(Comparator::Unsigned.cmp(&big, &two), Ordering::Greater);
        assert_eq!(Comparator::Unsigned.cmp(&one, &one), Ordering::Equal);
    }

    #[test]
    fn test_unsigned_mixed_width() {
        // 2-byte and 8-byte encodings of the same value compare equal.
        let narrow = 300u16.to_le_bytes();
        let wide = 300u64.to_le_bytes();
        assert_eq!(Comparator::Unsigned.cmp(&narrow, &wide), Ordering::Equal);
    }

    #[test]
    fn test_lexical_order() {
        assert_eq!(Comparator::Lexical.cmp(b"abc", b"abd"), Ordering::Less);
        assert_eq!(Comparator::Lexical.cmp(b"ab", b"abc"), Ordering::Less);
    }

    #[test]
    fn test_reverse_order() {
        // "ba" reversed is "ab", "ab" reversed is "ba".
        assert_eq!(Comparator::Reverse.cmp(b"ba", b"ab"), Ordering::Less);
        assert_eq!(Comparator::Reverse.cmp(b"xa", b"xb"), Ordering::Less);
        assert_eq!(Comparator::Reverse.cmp(b"a", b"a"), Ordering::Equal);
    }

    #[test]
    fn test_row_blob_total() {
        assert_eq!(Comparator::RowBlob.cmp(b"zz", b"aaa"), Ordering::Less);
        assert_eq!(Comparator::RowBlob.cmp(b"abc", b"abd"), Ordering::Less);
    }
}
