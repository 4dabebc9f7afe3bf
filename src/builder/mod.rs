//! The mutable builder and its block-sharing freeze pipeline.

mod freeze;

use bitvec::prelude::{self as bv, BitVec};

use crate::{
    constants::{BLOCK_SHIFT, BLOCK_SIZE, CODE_POINT_LIMIT, CODE_POINT_MAX},
    value_width::ValueWidth,
    CodePointTrie, Error, Result, TrieType,
};

/// A flat, mutable, append-friendly map from every Unicode code point to a
/// `u32` value, later compacted into a [`CodePointTrie`] by [`Self::build`].
///
/// Internally this is simply a `Vec` of one `u32` per code point
/// (`0x110000` entries); the space/time tradeoffs of the frozen format only
/// materialize at [`Self::build`] time.
#[derive(Debug, Clone)]
pub struct CodePointTrieBuilder {
    data: Vec<u32>,
    /// One bit per 64-code-point block: set once any code point in that
    /// block has been assigned a value other than `initial_value`. A clear
    /// bit is a cheap, exact proof that the whole block still equals
    /// `initial_value`, which `build` uses to skip scanning most of the
    /// domain while validating value widths and finding `high_start`.
    touched: BitVec<bv::LittleEndian, u64>,
    initial_value: u32,
    error_value: u32,
}

impl CodePointTrieBuilder {
    /// Create a builder where every code point initially maps to
    /// `initial_value`.
    ///
    /// `error_value` is only observable through [`CodePointTrie::get`] for
    /// out-of-range inputs; it never needs to be `set` and is never scanned
    /// during normal use.
    pub fn new(initial_value: u32, error_value: u32) -> Self {
        CodePointTrieBuilder {
            data: vec![initial_value; CODE_POINT_LIMIT as usize],
            touched: core::iter::repeat(false)
                .take((CODE_POINT_LIMIT >> BLOCK_SHIFT) as usize)
                .collect(),
            initial_value,
            error_value,
        }
    }

    /// The value every code point was initialized with.
    pub fn initial_value(&self) -> u32 {
        self.initial_value
    }

    /// The value looked up for out-of-range inputs.
    pub fn error_value(&self) -> u32 {
        self.error_value
    }

    /// The value currently assigned to `cp`.
    ///
    /// Returns `error_value` for `cp` outside `0..=0x10FFFF`, mirroring
    /// [`CodePointTrie::get`].
    pub fn get(&self, cp: i32) -> u32 {
        if cp < 0 || cp as u32 > CODE_POINT_MAX {
            return self.error_value;
        }
        self.data[cp as usize]
    }

    /// Assign `value` to a single code point.
    pub fn set(&mut self, cp: i32, value: u32) -> Result<()> {
        let cp = Self::checked_code_point(cp)?;
        self.data[cp as usize] = value;
        if value != self.initial_value {
            self.touched.set((cp >> BLOCK_SHIFT) as usize, true);
        }
        Ok(())
    }

    /// Assign `value` to every code point in `start..=end`.
    pub fn set_range(&mut self, start: i32, end: i32, value: u32) -> Result<()> {
        let start = Self::checked_code_point(start)?;
        let end = Self::checked_code_point(end)?;
        if start > end {
            return Err(Error::OutOfRange(start as i64));
        }
        for cp in start..=end {
            self.data[cp as usize] = value;
        }
        if value != self.initial_value {
            let first_block = start >> BLOCK_SHIFT;
            let last_block = end >> BLOCK_SHIFT;
            for block in first_block..=last_block {
                self.touched.set(block as usize, true);
            }
        }
        Ok(())
    }

    /// Reset every code point back to its initial value.
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|v| *v = self.initial_value);
        self.touched = core::iter::repeat(false).take(self.touched.len()).collect();
    }

    /// Compact this builder's contents into an immutable [`CodePointTrie`].
    ///
    /// Leaves the builder unchanged, whether this succeeds or fails, so the
    /// same builder can be frozen with different [`TrieType`]/
    /// [`ValueWidth`] combinations.
    pub fn build(&self, trie_type: TrieType, value_width: ValueWidth) -> Result<CodePointTrie> {
        freeze::freeze(self, trie_type, value_width)
    }

    fn checked_code_point(cp: i32) -> Result<u32> {
        if cp < 0 || cp as u32 > CODE_POINT_MAX {
            return Err(Error::OutOfRange(cp as i64));
        }
        Ok(cp as u32)
    }

    pub(crate) fn data(&self) -> &[u32] {
        &self.data
    }

    pub(crate) fn block_is_touched(&self, block: usize) -> bool {
        self.touched[block]
    }

    pub(crate) fn block_count(&self) -> usize {
        (CODE_POINT_LIMIT / BLOCK_SIZE) as usize
    }
}
