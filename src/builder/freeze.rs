//! The block-compaction pipeline that turns a [`CodePointTrieBuilder`] into
//! an immutable [`CodePointTrie`].
//!
//! Three passes over the builder's flat `data`, each only as expensive as it
//! needs to be thanks to the builder's `touched` hint:
//!
//! 1. validate every stored value fits the target [`ValueWidth`];
//! 2. shrink `high_start` as far as the uniform tail allows;
//! 3. compact `[0, high_start)` into 64-entry blocks, deduplicating
//!    identical blocks and reusing overlapping suffixes of already-emitted
//!    data, then build the `index1`/`index2`/`index3` chain over the result.
//!
//! Compaction always scans blocks in ascending code point order and always
//! prefers the first (leftmost), largest match it finds, so the same
//! builder contents freeze to byte-identical output every time.

use indexmap::IndexMap;
use itertools::Itertools;

use super::CodePointTrieBuilder;
use crate::{
    constants::{
        BLOCK_SHIFT, BLOCK_SIZE, CODE_POINT_LIMIT, HIGH_START_GRANULARITY, INDEX_2_BLOCK_LEN,
        INDEX_3_18BIT_PACKED_FLAG, INDEX_3_BLOCK_LEN, INDEX_3_NULL_MARKER, INDEX_3_OFFSET_MASK,
        SHIFT_1,
    },
    value_width::{TrieData, ValueWidth},
    CodePointTrie, Error, Result, TrieType,
};

pub(super) fn freeze(
    builder: &CodePointTrieBuilder,
    trie_type: TrieType,
    value_width: ValueWidth,
) -> Result<CodePointTrie> {
    validate_value_width(builder, value_width)?;

    let (high_start, high_value) = find_high_start(builder, trie_type);
    let compacted = compact_data(builder, high_start);

    let fast_limit = trie_type.fast_limit();
    let fast_blocks = (fast_limit / BLOCK_SIZE) as usize;
    let mut index = Vec::with_capacity(fast_blocks + 16);
    for &offset in &compacted.block_offsets[..fast_blocks] {
        index.push(to_u16(offset)?);
    }

    let index3_null_offset = if high_start > fast_limit {
        build_slow_index(&mut index, fast_blocks, fast_limit, high_start, &compacted)?
    } else {
        None
    };

    if index.len() > u16::MAX as usize {
        return Err(Error::Internal("index exceeds maximum representable length"));
    }

    let mut data_values = compacted.data;
    data_values.push(high_value);
    data_values.push(builder.error_value());
    if data_values.len() > u16::MAX as usize {
        return Err(Error::Internal("data exceeds maximum representable length"));
    }

    let mut data = TrieData::with_capacity(value_width, data_values.len());
    for value in data_values {
        data.push(value);
    }

    let data_null_offset = if index3_null_offset.is_some() {
        compacted.null_offset
    } else {
        None
    };

    Ok(CodePointTrie {
        trie_type,
        index,
        data,
        high_start,
        high_value,
        error_value: builder.error_value(),
        index3_null_offset,
        data_null_offset,
    })
}

fn to_u16(value: u32) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::Internal("offset exceeds 16-bit index capacity"))
}

/// Like [`to_u16`], but also rejects positions that would collide with the
/// 18-bit-packed flag bit (`0x8000`) or with [`INDEX_3_NULL_MARKER`]: every
/// `index3` entry (an `i3_block` value in the runtime's lookup) must leave
/// that bit free for the packed/unpacked tag, and a packed tag is
/// `pos | 0x8000`, so `pos` must also stay below `0x7FFF` — otherwise a
/// packed tag at `0x7FFF | 0x8000 == 0xFFFF` would be indistinguishable from
/// the null-span marker at runtime.
fn to_span_pos(value: u32) -> Result<u16> {
    if value >= INDEX_3_OFFSET_MASK as u32 {
        return Err(Error::Internal(
            "index3 span position exceeds the 15-bit addressable range",
        ));
    }
    Ok(value as u16)
}

/// `true` if every code point in `start..end` maps to `value`, using the
/// builder's `touched` blocks to skip the scan entirely when `value` is the
/// builder's initial value and the whole span was never written to.
fn span_equals(builder: &CodePointTrieBuilder, start: u32, end: u32, value: u32) -> bool {
    if value == builder.initial_value() {
        let first_block = (start >> BLOCK_SHIFT) as usize;
        let last_block = ((end - 1) >> BLOCK_SHIFT) as usize;
        if (first_block..=last_block).all(|b| !builder.block_is_touched(b)) {
            return true;
        }
    }
    builder.data()[start as usize..end as usize]
        .iter()
        .all(|&v| v == value)
}

fn validate_value_width(builder: &CodePointTrieBuilder, value_width: ValueWidth) -> Result<()> {
    if !value_width.fits(builder.initial_value()) {
        return Err(Error::ValueTooLarge {
            value: builder.initial_value(),
            width: value_width,
        });
    }
    if !value_width.fits(builder.error_value()) {
        return Err(Error::ValueTooLarge {
            value: builder.error_value(),
            width: value_width,
        });
    }
    for block in 0..builder.block_count() {
        if !builder.block_is_touched(block) {
            continue;
        }
        let start = block * BLOCK_SIZE as usize;
        for &value in &builder.data()[start..start + BLOCK_SIZE as usize] {
            if !value_width.fits(value) {
                return Err(Error::ValueTooLarge { value, width: value_width });
            }
        }
    }
    Ok(())
}

/// Scan the uniform tail top-down, never shrinking below `trie_type`'s fast
/// limit: spec.md's bounded-data-length invariant requires a real (if
/// small) null block to always exist below `high_start`.
fn find_high_start(builder: &CodePointTrieBuilder, trie_type: TrieType) -> (u32, u32) {
    let fast_limit = trie_type.fast_limit();
    let mut high_start = CODE_POINT_LIMIT;
    let high_value = builder.data()[(CODE_POINT_LIMIT - 1) as usize];

    while high_start > fast_limit {
        let candidate = high_start - HIGH_START_GRANULARITY;
        if span_equals(builder, candidate, high_start, high_value) {
            high_start = candidate;
        } else {
            break;
        }
    }

    (high_start, high_value)
}

struct Compacted {
    data: Vec<u32>,
    block_offsets: Vec<u32>,
    /// Offset of the first block found to be entirely `initial_value`, if
    /// any such block exists below `high_start`.
    null_offset: Option<u32>,
}

/// Compact `[0, high_start)` into 64-entry blocks, left to right, reusing
/// an exact-content match if one was already emitted, otherwise the longest
/// suffix-of-already-emitted/prefix-of-this-block overlap.
fn compact_data(builder: &CodePointTrieBuilder, high_start: u32) -> Compacted {
    let num_blocks = (high_start / BLOCK_SIZE) as usize;
    let mut data: Vec<u32> = Vec::new();
    let mut block_offsets = Vec::with_capacity(num_blocks);
    let mut dedup: IndexMap<Vec<u32>, u32> = IndexMap::new();
    let mut null_offset = None;
    let initial_value = builder.initial_value();

    for b in 0..num_blocks {
        let start = b * BLOCK_SIZE as usize;
        let block = &builder.data()[start..start + BLOCK_SIZE as usize];

        if let Some(&offset) = dedup.get(block) {
            block_offsets.push(offset);
            continue;
        }

        let max_overlap = core::cmp::min(BLOCK_SIZE as usize - 1, data.len());
        let mut overlap = 0;
        for n in (1..=max_overlap).rev() {
            if data[data.len() - n..] == block[..n] {
                overlap = n;
                break;
            }
        }

        let start_pos = (data.len() - overlap) as u32;
        data.extend_from_slice(&block[overlap..]);
        block_offsets.push(start_pos);
        dedup.insert(block.to_vec(), start_pos);

        if null_offset.is_none() && block.iter().all(|&v| v == initial_value) {
            null_offset = Some(start_pos);
        }
    }

    Compacted { data, block_offsets, null_offset }
}

/// Build the `index1`/`index2`/`index3` chain over `[fast_limit, high_start)`
/// and append it to `index` (which already holds the fast index). Returns
/// the shared null-span marker, if one was used.
///
/// `index1` entries are reserved as placeholders up front (`index1_pos`)
/// so their fixed offset (`fast_blocks`) matches the lookup formula, then
/// patched in place once each bucket's `index2` group position is known.
fn build_slow_index(
    index: &mut Vec<u16>,
    fast_blocks: usize,
    fast_limit: u32,
    high_start: u32,
    compacted: &Compacted,
) -> Result<Option<u16>> {
    let i1_min = fast_limit >> SHIFT_1;
    let i1_max = (high_start - 1) >> SHIFT_1;
    let i1_count = (i1_max - i1_min + 1) as usize;
    let index1_pos = index.len();
    debug_assert_eq!(index1_pos, fast_blocks);
    index.extend(core::iter::repeat(0u16).take(i1_count));

    let num_blocks = compacted.block_offsets.len();
    let blocks_per_bucket = ((1u32 << SHIFT_1) / BLOCK_SIZE) as usize;

    let mut null_marker: Option<u16> = None;
    let mut packed_dedup: IndexMap<[u32; 8], u16> = IndexMap::new();
    let mut unpacked_dedup: IndexMap<[u32; 8], u16> = IndexMap::new();
    let mut group_dedup: IndexMap<Vec<u16>, u16> = IndexMap::new();

    for (k, i1) in (i1_min..=i1_max).enumerate() {
        let bucket_base = i1 as usize * blocks_per_bucket;
        let mut entries = Vec::with_capacity(INDEX_2_BLOCK_LEN as usize);

        // A bucket covers up to `blocks_per_bucket` compaction blocks, which
        // may run past `num_blocks` near `high_start`'s boundary (padded
        // with unreachable zero offsets); group them 8-at-a-time into the
        // spans `index3` addresses.
        let bucket_offsets = (0..blocks_per_bucket).map(|j| {
            let block_index = bucket_base + j;
            if block_index < num_blocks {
                compacted.block_offsets[block_index]
            } else {
                0
            }
        });
        let span_chunks = bucket_offsets.chunks(INDEX_3_BLOCK_LEN as usize);

        for span_chunk in &span_chunks {
            let mut span = [0u32; INDEX_3_BLOCK_LEN as usize];
            for (slot, value) in span.iter_mut().zip(span_chunk) {
                *slot = value;
            }

            let is_null_span =
                matches!(compacted.null_offset, Some(off) if span.iter().all(|&v| v == off));

            let entry = if is_null_span {
                *null_marker.get_or_insert(INDEX_3_NULL_MARKER)
            } else if span.iter().any(|&v| v > 0xFFFF) {
                encode_packed_span(index, &mut packed_dedup, span)?
            } else if let Some(&pos) = unpacked_dedup.get(&span) {
                pos
            } else {
                let pos = to_span_pos(index.len() as u32)?;
                index.extend(span.iter().map(|&v| v as u16));
                unpacked_dedup.insert(span, pos);
                pos
            };

            entries.push(entry);
        }

        let group_pos = if let Some(&pos) = group_dedup.get(&entries) {
            pos
        } else {
            let pos = to_u16(index.len() as u32)?;
            index.extend_from_slice(&entries);
            group_dedup.insert(entries, pos);
            pos
        };

        index[index1_pos + k] = group_pos;
    }

    Ok(null_marker)
}

fn encode_packed_span(
    index: &mut Vec<u16>,
    dedup: &mut IndexMap<[u32; 8], u16>,
    span: [u32; 8],
) -> Result<u16> {
    if let Some(&pos) = dedup.get(&span) {
        return Ok(pos);
    }
    if span.iter().any(|&v| v > 0x3_FFFF) {
        return Err(Error::Internal("data offset exceeds 18-bit packed range"));
    }

    let pos = to_span_pos(index.len() as u32)?;
    index.extend(span.iter().map(|&v| v as u16));
    let mut high_slot = 0u16;
    for (j, &v) in span.iter().enumerate() {
        high_slot |= (((v >> 16) & 0x3) as u16) << (j * 2);
    }
    index.push(high_slot);

    let tagged = pos | INDEX_3_18BIT_PACKED_FLAG;
    dedup.insert(span, tagged);
    Ok(tagged)
}

#[cfg(test)]
mod tests {
    use crate::{CodePointTrieBuilder, Error, TrieType, ValueWidth};

    #[test]
    fn value_too_large_for_width_is_rejected() {
        let mut b = CodePointTrieBuilder::new(0, 0);
        b.set(0x41, 0x1_0000).unwrap();
        let err = b.build(TrieType::Fast, ValueWidth::Bits16).unwrap_err();
        assert!(matches!(err, Error::ValueTooLarge { value: 0x1_0000, .. }));
    }

    #[test]
    fn error_value_outside_width_is_rejected_even_if_unused() {
        let b = CodePointTrieBuilder::new(0, 0x1_0000);
        let err = b.build(TrieType::Fast, ValueWidth::Bits16).unwrap_err();
        assert!(matches!(err, Error::ValueTooLarge { value: 0x1_0000, .. }));
    }

    #[test]
    fn freezing_twice_is_deterministic() {
        let mut b = CodePointTrieBuilder::new(0, 0xBAD);
        b.set_range(0x40, 0x17F, 7).unwrap();
        b.set_range(0x3_0000, 0x3_1FFF, 11).unwrap();
        b.set(0xA_0000, 42).unwrap();

        let first = b.build(TrieType::Fast, ValueWidth::Bits32).unwrap();
        let second = b.build(TrieType::Fast, ValueWidth::Bits32).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_identical_blocks_share_one_data_offset() {
        let mut b = CodePointTrieBuilder::new(0, 0xBAD);
        // Two identical 64-entry regions far enough apart that only exact
        // block dedup (not suffix/prefix overlap) can unify them.
        b.set_range(0x40, 0x7F, 5).unwrap();
        b.set_range(0x4000, 0x403F, 5).unwrap();
        let trie = b.build(TrieType::Fast, ValueWidth::Bits16).unwrap();
        assert_eq!(trie.get(0x40), 5);
        assert_eq!(trie.get(0x4000), 5);
        // One null block (64) + one shared `5` block (64) + two terminal
        // entries: without dedup this would be 64 + 64 + 64 + 2 (a separate
        // block for each `5` range).
        assert_eq!(trie.data.len(), 64 + 64 + 2);
    }

    #[test]
    fn uniform_trie_keeps_high_start_at_fast_limit() {
        let b = CodePointTrieBuilder::new(3, 0xBAD);
        let trie = b.build(TrieType::Fast, ValueWidth::Bits8).unwrap();
        assert_eq!(trie.high_start(), TrieType::Fast.fast_limit());
        assert_eq!(trie.high_value(), 3);
        // Every block collapses into the single shared null/all-same block,
        // plus the two terminal entries: spec.md §8 invariant #7.
        assert_eq!(trie.data.len(), 64 + 2);
    }

    #[test]
    fn overlapping_blocks_share_a_suffix_prefix() {
        // Two adjacent 64-entry blocks whose second half equals the next
        // block's first half: compaction should emit 64 + 32 data entries
        // for them (plus the null block and terminals), not 128.
        let mut b = CodePointTrieBuilder::new(0, 0xBAD);
        b.set_range(0x40, 0x7F, 1).unwrap(); // block at 0x40..0x80, all `1`
        b.set_range(0x80, 0x9F, 1).unwrap(); // first half of next block also `1`
        b.set_range(0xA0, 0xBF, 2).unwrap(); // second half distinct
        let trie = b.build(TrieType::Fast, ValueWidth::Bits8).unwrap();

        assert_eq!(trie.get(0x3F), 0);
        assert_eq!(trie.get(0x40), 1);
        assert_eq!(trie.get(0x7F), 1);
        assert_eq!(trie.get(0x80), 1);
        assert_eq!(trie.get(0x9F), 1);
        assert_eq!(trie.get(0xA0), 2);
        assert_eq!(trie.get(0xBF), 2);
        assert_eq!(trie.get(0xC0), 0);

        // null block (64) + first block (64) + second block's non-overlapping
        // tail (32) + two terminal entries: 162, not 64 + 64 + 64 + 2 = 194.
        assert_eq!(trie.data.len(), 64 + 64 + 32 + 2);
    }
}
