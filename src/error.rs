use crate::ValueWidth;

/// Everything that can go wrong when using a [`crate::CodePointTrie`] or
/// [`crate::CodePointTrieBuilder`].
///
/// The runtime lookup path (`get`, `get_range`) never produces one of these:
/// out-of-range code points resolve to the trie's `errorValue` instead, by
/// design (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A code point (or range endpoint) fell outside `0..=0x10FFFF`, or a
    /// `setRange` call had `start > end`.
    #[error("code point {0:#x} is outside 0..=0x10FFFF")]
    OutOfRange(i64),

    /// A value assigned in the builder does not fit in the target
    /// [`ValueWidth`] at freeze time.
    #[error("value {value:#x} does not fit in {width:?}")]
    ValueTooLarge { value: u32, width: ValueWidth },

    /// The serialized byte stream is malformed: wrong signature, an unknown
    /// `ValueWidth`/`TrieType` code, truncated input, or internally
    /// inconsistent lengths.
    #[error("invalid trie format: {0}")]
    InvalidFormat(&'static str),

    /// A compaction invariant was violated. This indicates a bug in the
    /// freeze pipeline rather than bad input; the builder that produced it
    /// is left untouched.
    #[error("internal trie builder invariant violated: {0}")]
    Internal(&'static str),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
