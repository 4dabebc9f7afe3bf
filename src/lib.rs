#![deny(unsafe_code, rust_2018_idioms)]
#![warn(missing_debug_implementations)]

//! Code Point Trie
//!
//! A compact, immutable map from every Unicode code point (`0..=0x10FFFF`)
//! to an application-defined value, plus a mutable builder that compacts
//! itself down into that immutable form.
//!
//! Modeled on the two-stage trie layout used by ICU's `UCPTrie`/
//! `CodePointTrie`: a flat array gives O(1) lookup for the fast-path range
//! (the Basic Multilingual Plane, by default), and a three-level index
//! (`index1`/`index2`/`index3`) covers the rest, with a further fast path
//! collapsing any uniform tail above `high_start` to a single stored value.
//!
//! # Features
//!
//! - `builder`: adds [`CodePointTrieBuilder`], the mutable builder and its
//!   block-compaction freeze pipeline.
//! - `serde-io`: adds binary (de)serialization of a frozen
//!   [`CodePointTrie`] (see [`CodePointTrie::serialize`] /
//!   [`CodePointTrie::deserialize`]).
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "builder")] {
//! use codepoint_trie::{CodePointTrieBuilder, TrieType, ValueWidth};
//!
//! let mut builder = CodePointTrieBuilder::new(/* initial */ 0, /* error */ 0xFFFF);
//! builder.set_range('A' as i32, 'Z' as i32, 1).unwrap();
//!
//! let trie = builder.build(TrieType::Fast, ValueWidth::Bits8).unwrap();
//! assert_eq!(trie.get('Q' as i32), 1);
//! assert_eq!(trie.get('q' as i32), 0);
//! # }
//! ```

mod constants;
mod error;
mod trie_type;
mod value_width;

mod runtime;

#[cfg(feature = "builder")]
mod builder;

pub use crate::{
    error::{Error, Result},
    runtime::{CodePointRange, CodePointTrie, Ranges},
    trie_type::TrieType,
    value_width::ValueWidth,
};

#[cfg(feature = "builder")]
pub use crate::builder::CodePointTrieBuilder;
