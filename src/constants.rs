//! Structural constants shared by the runtime trie and the builder.
//!
//! These match the widely deployed two-stage CodePointTrie layout (see the
//! crate's top-level docs): block size 64, fast limits 0x10000/0x1000. Per
//! spec.md §9, these are not configuration — varying them would require a
//! new binary format version.

/// The highest valid Unicode code point.
pub const CODE_POINT_MAX: u32 = 0x10FFFF;

/// One past the highest valid Unicode code point; the size of the builder's
/// flat `data` array.
pub const CODE_POINT_LIMIT: u32 = 0x11_0000;

/// The number of data entries per compaction block, and the unit the fast
/// index addresses directly.
pub const BLOCK_SIZE: u32 = 64;
pub(crate) const BLOCK_SHIFT: u32 = 6;
pub(crate) const BLOCK_MASK: u32 = BLOCK_SIZE - 1;

/// Fast-path limit for [`crate::TrieType::Fast`]: code points below this
/// resolve with a single index lookup.
pub const FAST_TYPE_LIMIT: u32 = 0x1_0000;

/// Fast-path limit for [`crate::TrieType::Small`].
pub const SMALL_TYPE_LIMIT: u32 = 0x1000;

/// Granularity `highStart` is aligned to during the top-down tail scan.
pub(crate) const HIGH_START_GRANULARITY: u32 = 0x1000;

/// Shift used to compute the index1 bucket (`cp >> 14`).
pub(crate) const SHIFT_1: u32 = 14;
/// Shift used to compute the index2 entry (`cp >> 9`).
pub(crate) const SHIFT_2: u32 = 9;
/// Shift used to compute the index3 entry (`cp >> 6`).
pub(crate) const SHIFT_3: u32 = 6;

/// Number of index3 entries grouped under one index2 entry.
pub(crate) const INDEX_2_BLOCK_LEN: u32 = 1 << (SHIFT_1 - SHIFT_2);
/// Number of data-block offsets grouped under one index3 entry.
pub(crate) const INDEX_3_BLOCK_LEN: u32 = 1 << (SHIFT_2 - SHIFT_3);

/// High bit of a stored `index3` reference, marking the 18-bit packed form.
pub(crate) const INDEX_3_18BIT_PACKED_FLAG: u16 = 0x8000;
/// Mask recovering the in-`index` position of a packed or unpacked span.
pub(crate) const INDEX_3_OFFSET_MASK: u16 = 0x7FFF;

/// Sentinel written to the `index3NullOffset` header field when the trie
/// has no shared null index3 span.
pub const INDEX_3_NULL_OFFSET_SENTINEL: u16 = 0x7FFF;

/// In-memory marker stored as an index2 entry to mean "this span is the
/// shared null span". `0xFFFF` is never a real unpacked position (`index`'s
/// length is itself stored as a `u16`, spec.md §6, so every real position is
/// strictly less than `index.len() <= 0xFFFF`) and never a real packed tag
/// either: `build_slow_index`'s `to_span_pos` caps real span positions below
/// `INDEX_3_OFFSET_MASK` (`0x7FFF`), so the highest possible packed tag is
/// `0x7FFE | INDEX_3_18BIT_PACKED_FLAG == 0xFFFE`, one below this marker.
pub(crate) const INDEX_3_NULL_MARKER: u16 = 0xFFFF;

/// Binary format signature, the ASCII bytes "Tri3" read big-endian.
pub const SIGNATURE: u32 = 0x5472_6933;

/// Size in bytes of the fixed binary header.
pub const HEADER_LEN: usize = 16;
