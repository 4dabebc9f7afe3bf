use crate::constants::{BLOCK_MASK, BLOCK_SIZE, CODE_POINT_MAX};
use crate::CodePointTrie;

/// A maximal contiguous run of code points sharing one (optionally
/// filtered) value, as produced by [`CodePointTrie`]'s range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePointRange {
    pub start: u32,
    pub end: u32,
    pub value: u32,
}

impl CodePointRange {
    /// Number of code points covered by this range.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

#[inline]
fn apply(filter: Option<&dyn Fn(u32) -> u32>, raw: u32) -> u32 {
    match filter {
        Some(f) => f(raw),
        None => raw,
    }
}

impl CodePointTrie {
    /// The maximal range starting at `start` over which the (optionally
    /// filtered) value is constant.
    ///
    /// Returns `None` if `start` is outside `0..=0x10FFFF`. Callers iterate
    /// the whole domain by re-seeding with `prev.end + 1`; see
    /// [`CodePointTrie::ranges`] for a ready-made iterator.
    pub fn get_range(&self, start: i32, filter: Option<&dyn Fn(u32) -> u32>) -> Option<CodePointRange> {
        if start < 0 || start as u32 > CODE_POINT_MAX {
            return None;
        }
        let start = start as u32;

        if start >= self.high_start {
            return Some(CodePointRange {
                start,
                end: CODE_POINT_MAX,
                value: apply(filter, self.high_value),
            });
        }

        let value = apply(filter, self.data.get(self.data_index(start)));
        let mut cp = start;
        let mut end = start;

        loop {
            let block_start = cp & !BLOCK_MASK;
            let block_cp_limit = (block_start + BLOCK_SIZE).min(self.high_start);
            let data_index = self.data_index(cp);
            let run_len = block_cp_limit - cp;

            let mut mismatched = false;
            for step in 0..run_len {
                let raw = self.data.get(data_index as usize + step as usize);
                if apply(filter, raw) != value {
                    mismatched = true;
                    break;
                }
                end = cp + step;
            }
            if mismatched {
                return Some(CodePointRange { start, end, value });
            }

            let next_cp = block_start + BLOCK_SIZE;
            if next_cp > CODE_POINT_MAX {
                return Some(CodePointRange { start, end, value });
            }
            if next_cp >= self.high_start {
                if apply(filter, self.high_value) == value {
                    return Some(CodePointRange {
                        start,
                        end: CODE_POINT_MAX,
                        value,
                    });
                }
                return Some(CodePointRange { start, end, value });
            }
            cp = next_cp;
        }
    }

    /// A restartable iterator over maximal ranges, starting at code point 0.
    pub fn ranges(&self) -> Ranges<'_> {
        Ranges {
            trie: self,
            filter: None,
            next_start: Some(0),
        }
    }

    /// Like [`CodePointTrie::ranges`], but mapping every raw value through
    /// `filter` before testing equality.
    pub fn ranges_with_filter<'a>(&'a self, filter: &'a dyn Fn(u32) -> u32) -> Ranges<'a> {
        Ranges {
            trie: self,
            filter: Some(filter),
            next_start: Some(0),
        }
    }
}

/// Lazy, restartable iterator over [`CodePointRange`]s, covering the whole
/// domain in ascending order with no gaps or overlaps.
#[derive(Clone)]
pub struct Ranges<'a> {
    trie: &'a CodePointTrie,
    filter: Option<&'a dyn Fn(u32) -> u32>,
    next_start: Option<u32>,
}

impl<'a> Iterator for Ranges<'a> {
    type Item = CodePointRange;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        let range = self.trie.get_range(start as i32, self.filter)?;
        self.next_start = if range.end == CODE_POINT_MAX {
            None
        } else {
            Some(range.end + 1)
        };
        Some(range)
    }
}

impl core::iter::FusedIterator for Ranges<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodePointTrieBuilder, TrieType, ValueWidth};

    #[test]
    fn empty_trie_yields_single_range() {
        let b = CodePointTrieBuilder::new(0x1234, 0xBAD);
        let trie = b.build(TrieType::Fast, ValueWidth::Bits32).unwrap();
        let range = trie.get_range(0, None).unwrap();
        assert_eq!(range, CodePointRange { start: 0, end: CODE_POINT_MAX, value: 0x1234 });
    }

    #[test]
    fn range_partitioning_is_exhaustive_and_disjoint() {
        let mut b = CodePointTrieBuilder::new(0, 0xBAD);
        b.set_range(0x40, 0x7F, 7).unwrap();
        b.set_range(0xD800, 0xDFFF, 5).unwrap();
        let trie = b.build(TrieType::Fast, ValueWidth::Bits16).unwrap();

        let ranges: Vec<_> = trie.ranges().collect();
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, CODE_POINT_MAX);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
            assert_ne!(pair[0].value, pair[1].value);
        }
        for r in &ranges {
            for cp in [r.start, r.end] {
                assert_eq!(trie.get(cp as i32), r.value);
            }
        }
    }

    #[test]
    fn three_ranges_for_single_inserted_block() {
        let mut b = CodePointTrieBuilder::new(0, 0xBAD);
        b.set_range(0x40, 0x7F, 7).unwrap();
        let trie = b.build(TrieType::Fast, ValueWidth::Bits16).unwrap();
        let ranges: Vec<_> = trie.ranges().take(3).collect();
        assert_eq!(ranges[0], CodePointRange { start: 0, end: 0x3F, value: 0 });
        assert_eq!(ranges[1], CodePointRange { start: 0x40, end: 0x7F, value: 7 });
        assert_eq!(ranges[2].start, 0x80);
        assert_eq!(ranges[2].value, 0);
    }

    #[test]
    fn filter_maps_values_before_comparison() {
        let mut b = CodePointTrieBuilder::new(0, 0);
        b.set(0x10, 1).unwrap();
        b.set(0x11, 2).unwrap();
        let trie = b.build(TrieType::Fast, ValueWidth::Bits8).unwrap();

        let to_bool = |v: u32| -> u32 { (v != 0) as u32 };
        let range = trie.get_range(0x10, Some(&to_bool)).unwrap();
        assert_eq!(range, CodePointRange { start: 0x10, end: 0x11, value: 1 });
    }
}
