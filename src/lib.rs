//! A fixed-length bitset packed into 64-bit words, written in pure Rust.
//! `no_std` with `alloc`, no `unsafe`.
//!
//! [`Bitset`] is the main struct in this library. Its [features](#features)
//! are listed below.
//!
//! # Examples
//! ```
//! use packed_bitset::Bitset;
//!
//! let mut a = Bitset::new(8);
//! a.set(&[1, 4, 7])?;
//! let mut b = Bitset::new(8);
//! b.set(&[1, 2, 4, 6])?;
//!
//! let both = a.intersect(&b)?;
//! assert_eq!(both.set_positions(), [1, 4]);
//! assert_eq!(a.hamming_distance(&b)?, 3);
//!
//! let packed = a.pack();
//! assert_eq!(Bitset::unpack(&packed)?, a);
//! # Ok::<(), packed_bitset::BitsetError>(())
//! ```
//!
//! # Features
//!
//! - Size fixed at construction, bits stored in `u64` words
//! - Checked indexed access: `get`, `set_bit`, `set`, `clear`, `is_set`,
//!   `is_clear`
//! - Set algebra, both pure and in place, failing on a size mismatch:
//!   - `intersect`, `union`, `xor`, `difference`, `complement`
//!   - `intersect_with`, `union_with`, `xor_with`, `difference_with`
//!   - operator forms `&`, `|`, `^`, `-`, `!` and their assign variants
//! - Word-wise `cardinality` and `hamming_distance`
//! - Iteration over all bits (`iter()`) or set positions (`iter_ones()`),
//!   plus rank queries `nth_set_position` and `set_positions_slice`
//! - `'0'`/`'1'` string conversion and a compact byte encoding via
//!   `pack`/`unpack`
//! - Optional `serde` support behind the `serde` feature

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod bitset;
mod error;

pub use bitset::{Bitset, Init, Iter, IterOnes, SetBits, WORD_BITS, Word, word_count};
pub use error::{BitsetError, Result};
