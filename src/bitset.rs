use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Debug, Display, Formatter};
use core::iter::FusedIterator;
use core::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Sub, SubAssign,
};
use core::str::FromStr;

use log::{debug, trace};

use crate::error::{BitsetError, Result};

/// Storage unit of a [`Bitset`].
pub type Word = u64;

/// Number of bits held by a single [`Word`].
pub const WORD_BITS: usize = Word::BITS as usize;

/// Width of the padding-count header that prefixes a packed bitset.
pub(crate) const HEADER_BITS: usize = 3;

/// Computes the number of words needed to store `bit_count` bits.
///
/// # Examples
/// ```
/// use packed_bitset::word_count;
///
/// assert_eq!(word_count(0), 0);
/// assert_eq!(word_count(64), 1);
/// assert_eq!(word_count(65), 2);
/// ```
pub const fn word_count(bit_count: usize) -> usize {
    bit_count.div_ceil(WORD_BITS)
}

/// Number of zero bits appended by [`Bitset::pack`] so that the header, the
/// data and the padding fill whole bytes.
pub(crate) const fn padding_bits(bit_count: usize) -> usize {
    (8 - (bit_count % 8 + HEADER_BITS) % 8) % 8
}

/// Mask of the bits of the last word that lie below `bit_count`.
pub(crate) const fn tail_mask(bit_count: usize) -> Word {
    let bits_in_last = bit_count % WORD_BITS;
    if bits_in_last == 0 {
        !0
    } else {
        (1 << bits_in_last) - 1
    }
}

#[inline]
fn set_stream_bit(bytes: &mut [u8], pos: usize) {
    bytes[pos / 8] |= 0x80 >> (pos % 8);
}

#[inline]
fn stream_bit(bytes: &[u8], pos: usize) -> bool {
    bytes[pos / 8] & (0x80 >> (pos % 8)) != 0
}

/// Resolves a possibly negative rank against `len` items.
fn resolve_rank(rank: isize, len: usize) -> Option<usize> {
    if rank >= 0 {
        let rank = rank.unsigned_abs();
        (rank < len).then_some(rank)
    } else {
        len.checked_sub(rank.unsigned_abs())
    }
}

/// A fixed-length sequence of bits packed into 64-bit words.
///
/// Bit `i` lives in word `i / 64` at bit position `i % 64`. Bits of the last
/// word beyond [`size`](Bitset::size) are always zero.
///
/// # Examples
/// ```
/// use packed_bitset::Bitset;
///
/// let mut bs = Bitset::new(8);
/// bs.set(&[1, 4, 7])?;
/// assert_eq!(bs.to_string(), "01001001");
/// assert_eq!(bs.cardinality(), 3);
/// # Ok::<(), packed_bitset::BitsetError>(())
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawBitset", into = "RawBitset"))]
pub struct Bitset {
    size: usize,
    words: Vec<Word>,
}

/// A single constructor argument accepted by [`Bitset::from_args`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Init {
    /// An all-zero bitset of the given size.
    Size(usize),
    /// One bit per value, `true` meaning set.
    Values(Vec<bool>),
}

/// Result of the [`Bitset::each_set`] argument-shape dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetBits {
    /// A list of set positions, either all of them or a slice.
    Positions(Vec<usize>),
    /// The position of a single set bit.
    Position(usize),
}

impl Bitset {
    /// Creates a new bitset of `size` bits, all unset.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::new(73);
    /// assert_eq!(bs.size(), 73);
    /// assert!(bs.is_empty());
    /// ```
    pub fn new(size: usize) -> Self {
        Self {
            size,
            words: vec![0; word_count(size)],
        }
    }

    /// Builds a bitset from a constructor argument list.
    ///
    /// Exactly one argument is accepted: either a size or a sequence of
    /// values.
    ///
    /// # Errors
    /// Returns [`BitsetError::InvalidArgument`] if `args` is empty or holds
    /// more than one argument.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::{Bitset, BitsetError, Init};
    ///
    /// let bs = Bitset::from_args(&[Init::Values(vec![false, false, true, true])])?;
    /// assert_eq!(bs.to_string(), "0011");
    /// assert!(matches!(Bitset::from_args(&[]), Err(BitsetError::InvalidArgument(_))));
    /// # Ok::<(), BitsetError>(())
    /// ```
    pub fn from_args(args: &[Init]) -> Result<Self> {
        match args {
            [] => Err(BitsetError::InvalidArgument(
                "expected a size or a sequence of values",
            )),
            [Init::Size(size)] => Ok(Self::new(*size)),
            [Init::Values(values)] => Ok(Self::from_bools(values)),
            _ => Err(BitsetError::InvalidArgument(
                "expected exactly one constructor argument",
            )),
        }
    }

    /// Constructs a bitset from a boolean slice, where `true` means set.
    ///
    /// The size of the bitset is the length of the slice. Mapping other
    /// value types to booleans is up to the caller.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bools(&[true, false, true, false]);
    /// assert_eq!(bs.cardinality(), 2);
    /// ```
    pub fn from_bools(bits: &[bool]) -> Self {
        bits.iter().copied().collect()
    }

    /// Constructs a bitset from a string of `'0'` and `'1'` characters.
    ///
    /// The leftmost character is index 0 and the size is the byte length of
    /// the string. Any byte other than `'1'` is read as an unset bit; use
    /// [`str::parse`] for a strict conversion.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bit_str("10101");
    /// assert!(bs.is_set(&[0, 2, 4])?);
    /// assert_eq!(Bitset::from_bit_str("1x1").to_string(), "101");
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn from_bit_str(bits: &str) -> Self {
        bits.bytes().map(|byte| byte == b'1').collect()
    }

    /// Reconstructs a bitset from its raw storage words.
    ///
    /// This is the inverse of [`as_words`](Bitset::as_words).
    ///
    /// # Errors
    /// Returns [`BitsetError::InvalidArgument`] if `words` does not hold
    /// exactly [`word_count`]`(size)` words or has bits set beyond `size`.
    pub fn from_words(size: usize, words: Vec<Word>) -> Result<Self> {
        if words.len() != word_count(size) {
            debug!(
                "rejecting {} raw words for a bitset of {size} bits",
                words.len()
            );
            return Err(BitsetError::InvalidArgument(
                "word count does not match bitset size",
            ));
        }
        if let Some(last) = words.last() {
            if last & !tail_mask(size) != 0 {
                debug!("rejecting raw words with bits set beyond size {size}");
                return Err(BitsetError::InvalidArgument(
                    "raw words have bits set beyond bitset size",
                ));
            }
        }
        Ok(Self { size, words })
    }

    /// Returns the number of bits in the bitset.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the raw storage words, least significant bit first.
    #[inline]
    pub fn as_words(&self) -> &[Word] {
        &self.words
    }

    #[inline]
    fn idxs(idx: usize) -> (usize, usize) {
        (idx / WORD_BITS, idx % WORD_BITS)
    }

    #[inline]
    fn check_index(&self, idx: usize) -> Result<()> {
        if idx >= self.size {
            return Err(BitsetError::IndexOutOfRange {
                index: idx,
                size: self.size,
            });
        }
        Ok(())
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        indices.iter().try_for_each(|&idx| self.check_index(idx))
    }

    fn check_same_size(&self, other: &Self) -> Result<()> {
        if self.size != other.size {
            return Err(BitsetError::SizeMismatch {
                left: self.size,
                right: other.size,
            });
        }
        Ok(())
    }

    #[inline]
    fn bit(&self, idx: usize) -> bool {
        let (word_idx, bit_idx) = Self::idxs(idx);
        self.words[word_idx] & 1 << bit_idx != 0
    }

    #[inline]
    fn insert(&mut self, idx: usize) {
        let (word_idx, bit_idx) = Self::idxs(idx);
        self.words[word_idx] |= 1 << bit_idx;
    }

    #[inline]
    fn remove(&mut self, idx: usize) {
        let (word_idx, bit_idx) = Self::idxs(idx);
        self.words[word_idx] &= !(1 << bit_idx);
    }

    /// Returns `true` if the bit at `idx` is set.
    ///
    /// # Errors
    /// Returns [`BitsetError::IndexOutOfRange`] if `idx >= size`.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::{Bitset, BitsetError};
    ///
    /// let mut bs = Bitset::new(8);
    /// bs.set_bit(0, true)?;
    /// assert!(bs.get(0)?);
    /// assert!(!bs.get(1)?);
    /// assert!(matches!(bs.get(8), Err(BitsetError::IndexOutOfRange { .. })));
    /// # Ok::<(), BitsetError>(())
    /// ```
    pub fn get(&self, idx: usize) -> Result<bool> {
        self.check_index(idx)?;
        Ok(self.bit(idx))
    }

    /// Sets the bit at `idx` if `value` is `true`, clears it otherwise.
    ///
    /// # Errors
    /// Returns [`BitsetError::IndexOutOfRange`] if `idx >= size`.
    pub fn set_bit(&mut self, idx: usize, value: bool) -> Result<()> {
        self.check_index(idx)?;
        if value {
            self.insert(idx);
        } else {
            self.remove(idx);
        }
        Ok(())
    }

    /// Sets every bit listed in `indices`.
    ///
    /// All indices are validated before any bit is written.
    ///
    /// # Errors
    /// Returns [`BitsetError::IndexOutOfRange`] if any index is `>= size`.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let mut bs = Bitset::new(8);
    /// bs.set(&[1, 2, 3])?;
    /// assert!(bs.set(&[4, 8]).is_err());
    /// assert_eq!(bs.to_string(), "01110000");
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn set(&mut self, indices: &[usize]) -> Result<()> {
        self.check_indices(indices)?;
        for &idx in indices {
            self.insert(idx);
        }
        Ok(())
    }

    /// Clears every bit listed in `indices`.
    ///
    /// All indices are validated before any bit is written.
    ///
    /// # Errors
    /// Returns [`BitsetError::IndexOutOfRange`] if any index is `>= size`.
    pub fn clear(&mut self, indices: &[usize]) -> Result<()> {
        self.check_indices(indices)?;
        for &idx in indices {
            self.remove(idx);
        }
        Ok(())
    }

    /// Returns `true` if every bit listed in `indices` is set.
    ///
    /// # Errors
    /// Returns [`BitsetError::IndexOutOfRange`] if any index is `>= size`.
    pub fn is_set(&self, indices: &[usize]) -> Result<bool> {
        self.check_indices(indices)?;
        Ok(indices.iter().all(|&idx| self.bit(idx)))
    }

    /// Returns `true` if every bit listed in `indices` is unset.
    ///
    /// # Errors
    /// Returns [`BitsetError::IndexOutOfRange`] if any index is `>= size`.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let mut bs = Bitset::new(68);
    /// bs.set(&[0, 2, 66])?;
    /// assert!(bs.is_clear(&[32, 33, 34, 64, 65, 67])?);
    /// assert!(!bs.is_clear(&[1, 66])?);
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn is_clear(&self, indices: &[usize]) -> Result<bool> {
        self.check_indices(indices)?;
        Ok(indices.iter().all(|&idx| !self.bit(idx)))
    }

    fn combine(&self, other: &Self, op: impl Fn(Word, Word) -> Word) -> Result<Self> {
        self.check_same_size(other)?;
        Ok(Self {
            size: self.size,
            words: self
                .words
                .iter()
                .zip(other.words.iter())
                .map(|(&lhs, &rhs)| op(lhs, rhs))
                .collect(),
        })
    }

    fn combine_in_place(
        &mut self,
        other: &Self,
        op: impl Fn(Word, Word) -> Word,
    ) -> Result<&mut Self> {
        self.check_same_size(other)?;
        for (self_word, other_word) in self.words.iter_mut().zip(other.words.iter()) {
            *self_word = op(*self_word, *other_word);
        }
        Ok(self)
    }

    /// Returns a new bitset holding the bits set in both `self` and `other`.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let a = Bitset::from_bit_str("1010");
    /// let b = Bitset::from_bit_str("0110");
    /// assert_eq!(a.intersect(&b)?.to_string(), "0010");
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn intersect(&self, other: &Self) -> Result<Self> {
        self.combine(other, |lhs, rhs| lhs & rhs)
    }

    /// Returns a new bitset holding the bits set in either `self` or `other`.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let a = Bitset::from_bit_str("1010");
    /// let b = Bitset::from_bit_str("0110");
    /// assert_eq!(a.union(&b)?.to_string(), "1110");
    /// assert!(Bitset::new(3).union(&Bitset::new(7)).is_err());
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn union(&self, other: &Self) -> Result<Self> {
        self.combine(other, |lhs, rhs| lhs | rhs)
    }

    /// Returns a new bitset holding the bits that differ between `self` and
    /// `other`.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ.
    pub fn xor(&self, other: &Self) -> Result<Self> {
        self.combine(other, |lhs, rhs| lhs ^ rhs)
    }

    /// Returns a new bitset holding the bits set in `self` but not in `other`.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let a = Bitset::from_bit_str("1010");
    /// let b = Bitset::from_bit_str("0110");
    /// assert_eq!(a.difference(&b)?.to_string(), "1000");
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn difference(&self, other: &Self) -> Result<Self> {
        self.combine(other, |lhs, rhs| lhs & !rhs)
    }

    /// In-place form of [`intersect`](Bitset::intersect). Returns the receiver.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ, leaving
    /// `self` unchanged.
    pub fn intersect_with(&mut self, other: &Self) -> Result<&mut Self> {
        self.combine_in_place(other, |lhs, rhs| lhs & rhs)
    }

    /// In-place form of [`union`](Bitset::union). Returns the receiver.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ, leaving
    /// `self` unchanged.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let mut a = Bitset::from_bit_str("11011");
    /// a.union_with(&Bitset::from_bit_str("01111"))?;
    /// assert_eq!(a.to_string(), "11111");
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn union_with(&mut self, other: &Self) -> Result<&mut Self> {
        self.combine_in_place(other, |lhs, rhs| lhs | rhs)
    }

    /// In-place form of [`xor`](Bitset::xor). Returns the receiver.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ, leaving
    /// `self` unchanged.
    pub fn xor_with(&mut self, other: &Self) -> Result<&mut Self> {
        self.combine_in_place(other, |lhs, rhs| lhs ^ rhs)
    }

    /// In-place form of [`difference`](Bitset::difference). Returns the
    /// receiver.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ, leaving
    /// `self` unchanged.
    pub fn difference_with(&mut self, other: &Self) -> Result<&mut Self> {
        self.combine_in_place(other, |lhs, rhs| lhs & !rhs)
    }

    /// Returns a new bitset with every bit inverted.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bit_str("01001");
    /// assert_eq!(bs.complement().to_string(), "10110");
    /// ```
    pub fn complement(&self) -> Self {
        let mut result = Self {
            size: self.size,
            words: self.words.iter().map(|word| !word).collect(),
        };
        result.clean_unused_bits();
        result
    }

    /// Clears every bit.
    pub fn reset(&mut self) {
        self.words.fill(0);
    }

    #[inline]
    fn clean_unused_bits(&mut self) {
        let mask = tail_mask(self.size);
        if let Some(last) = self.words.last_mut() {
            *last &= mask;
        }
    }

    /// Returns the number of set bits.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bools(&[true, false, true, false]);
    /// assert_eq!(bs.cardinality(), 2);
    /// ```
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if no bit is set.
    ///
    /// Note that this is about the bits, not the size: a bitset of size 100
    /// with all bits unset is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns the number of positions at which `self` and `other` differ.
    ///
    /// # Errors
    /// Returns [`BitsetError::SizeMismatch`] if the sizes differ.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let a = Bitset::from_bit_str("01001001");
    /// let b = Bitset::from_bit_str("01101010");
    /// assert_eq!(a.hamming_distance(&b)?, 3);
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn hamming_distance(&self, other: &Self) -> Result<usize> {
        self.check_same_size(other)?;
        Ok(self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(lhs, rhs)| (lhs ^ rhs).count_ones() as usize)
            .sum())
    }

    /// Returns an iterator over all bits as `bool`, in index order.
    ///
    /// The iterator yields exactly [`size`](Bitset::size) items.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bit_str("1010");
    /// let bits: Vec<bool> = bs.iter().collect();
    /// assert_eq!(bits, [true, false, true, false]);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            idx: 0,
            size: self.size,
        }
    }

    /// Returns an iterator over the indices of all set bits, in ascending
    /// order.
    ///
    /// Runs in O(max(k, w)) where k is the number of set bits and w is the
    /// word count.
    #[inline]
    pub fn iter_ones(&self) -> IterOnes<'_> {
        IterOnes {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
            base_bit_idx: 0,
        }
    }

    /// Returns the indices of all set bits, in ascending order.
    pub fn set_positions(&self) -> Vec<usize> {
        self.iter_ones().collect()
    }

    /// Returns the position of the set bit with the given rank.
    ///
    /// A non-negative `rank` counts from the first set bit, so `0` is the
    /// lowest set index. A negative `rank` counts from the last, so `-1` is
    /// the highest set index.
    ///
    /// # Errors
    /// Returns [`BitsetError::RankOutOfRange`] if there is no set bit with
    /// that rank.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bit_str("110110011");
    /// assert_eq!(bs.nth_set_position(2)?, 3);
    /// assert_eq!(bs.nth_set_position(-1)?, 8);
    /// assert!(bs.nth_set_position(6).is_err());
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn nth_set_position(&self, rank: isize) -> Result<usize> {
        let cardinality = self.cardinality();
        resolve_rank(rank, cardinality)
            .and_then(|resolved| self.select(resolved))
            .ok_or(BitsetError::RankOutOfRange { rank, cardinality })
    }

    fn select(&self, rank: usize) -> Option<usize> {
        let mut remaining = rank;
        for (word_idx, &word) in self.words.iter().enumerate() {
            let ones = word.count_ones() as usize;
            if remaining < ones {
                let mut word = word;
                for _ in 0..remaining {
                    word &= word - 1; // unset LSB
                }
                return Some(word_idx * WORD_BITS + word.trailing_zeros() as usize);
            }
            remaining -= ones;
        }
        None
    }

    /// Returns up to `count` set positions, starting at the set bit with
    /// rank `start`.
    ///
    /// This slices the ascending list of set positions, not the raw indices.
    /// A negative `start` counts from the end of that list, and a `start`
    /// equal to the number of set bits yields an empty list.
    ///
    /// # Errors
    /// Returns [`BitsetError::RankOutOfRange`] if `start` lies beyond either
    /// end of the set-bit list.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bit_str("110110011");
    /// assert_eq!(bs.set_positions_slice(-3, 2)?, [4, 7]);
    /// assert_eq!(bs.set_positions_slice(4, 10)?, [7, 8]);
    /// assert!(bs.set_positions_slice(6, 1)?.is_empty());
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn set_positions_slice(&self, start: isize, count: usize) -> Result<Vec<usize>> {
        let cardinality = self.cardinality();
        let first = if start >= 0 {
            Some(start.unsigned_abs()).filter(|&first| first <= cardinality)
        } else {
            cardinality.checked_sub(start.unsigned_abs())
        };
        let first = first.ok_or(BitsetError::RankOutOfRange {
            rank: start,
            cardinality,
        })?;
        Ok(self.iter_ones().skip(first).take(count).collect())
    }

    /// Dispatches on the shape of `args` to one of the set-bit queries.
    ///
    /// - no argument: [`set_positions`](Bitset::set_positions)
    /// - `[rank]`: [`nth_set_position`](Bitset::nth_set_position)
    /// - `[start, count]`: [`set_positions_slice`](Bitset::set_positions_slice)
    ///
    /// # Errors
    /// Returns [`BitsetError::InvalidArgument`] for more than two arguments or
    /// a negative count, and forwards the errors of the selected query.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::{Bitset, SetBits};
    ///
    /// let bs = Bitset::from_bit_str("110110011");
    /// assert_eq!(bs.each_set(&[2])?, SetBits::Position(3));
    /// assert_eq!(bs.each_set(&[-3, 2])?, SetBits::Positions(vec![4, 7]));
    /// assert!(bs.each_set(&[1, 2, 3]).is_err());
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn each_set(&self, args: &[isize]) -> Result<SetBits> {
        match *args {
            [] => Ok(SetBits::Positions(self.set_positions())),
            [rank] => self.nth_set_position(rank).map(SetBits::Position),
            [start, count] => {
                let count = usize::try_from(count).map_err(|_| {
                    BitsetError::InvalidArgument("set bit slice count must not be negative")
                })?;
                self.set_positions_slice(start, count)
                    .map(SetBits::Positions)
            }
            _ => Err(BitsetError::InvalidArgument(
                "each_set takes at most two arguments",
            )),
        }
    }

    /// Returns the indices of all set bits, in ascending order.
    ///
    /// Same as [`set_positions`](Bitset::set_positions).
    #[doc(alias = "to_a")]
    pub fn to_array(&self) -> Vec<usize> {
        self.set_positions()
    }

    /// Returns one `0` or `1` per bit, in index order.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// assert_eq!(Bitset::from_bit_str("0110").to_binary_array(), [0, 1, 1, 0]);
    /// ```
    pub fn to_binary_array(&self) -> Vec<u8> {
        self.iter().map(u8::from).collect()
    }

    /// Encodes the bitset into bytes.
    ///
    /// The bit stream is a 3-bit padding count `p`, then the bits of the
    /// bitset in index order, then `p` zero bits so that the stream fills
    /// whole bytes. Each byte is filled most significant bit first.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// // 001 1011 0
    /// assert_eq!(Bitset::from_bit_str("1011").pack(), [0b0011_0110]);
    /// // 101 00000
    /// assert_eq!(Bitset::new(0).pack(), [0b1010_0000]);
    /// ```
    pub fn pack(&self) -> Vec<u8> {
        let padding = padding_bits(self.size);
        let total_bits = HEADER_BITS + self.size + padding;
        let mut bytes = vec![0u8; total_bits / 8];

        for pos in 0..HEADER_BITS {
            if (padding >> (HEADER_BITS - 1 - pos)) & 1 == 1 {
                set_stream_bit(&mut bytes, pos);
            }
        }
        for idx in self.iter_ones() {
            set_stream_bit(&mut bytes, HEADER_BITS + idx);
        }

        trace!(
            "packed {} bits into {} bytes with {padding} padding bits",
            self.size,
            bytes.len()
        );
        bytes
    }

    /// Decodes a bitset produced by [`pack`](Bitset::pack).
    ///
    /// # Errors
    /// Returns [`BitsetError::InvalidArgument`] if `bytes` is empty or its
    /// padding count exceeds the bits available.
    ///
    /// # Examples
    /// ```
    /// use packed_bitset::Bitset;
    ///
    /// let bs = Bitset::from_bit_str("101010011101");
    /// assert_eq!(Bitset::unpack(&bs.pack())?, bs);
    /// assert!(Bitset::unpack(&[]).is_err());
    /// # Ok::<(), packed_bitset::BitsetError>(())
    /// ```
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let total_bits = bytes.len() * 8;
        if total_bits < HEADER_BITS {
            debug!("rejecting empty packed bitset");
            return Err(BitsetError::InvalidArgument("packed bitset is empty"));
        }

        let padding = (0..HEADER_BITS).fold(0usize, |acc, pos| {
            (acc << 1) | usize::from(stream_bit(bytes, pos))
        });
        let Some(size) = total_bits.checked_sub(HEADER_BITS + padding) else {
            debug!(
                "rejecting packed bitset of {} bytes with {padding} padding bits",
                bytes.len()
            );
            return Err(BitsetError::InvalidArgument(
                "packed padding exceeds the encoded length",
            ));
        };

        let bitset: Self = (0..size)
            .map(|idx| stream_bit(bytes, HEADER_BITS + idx))
            .collect();
        trace!("unpacked {} bytes into {size} bits", bytes.len());
        Ok(bitset)
    }
}

impl<'bitset> IntoIterator for &'bitset Bitset {
    type Item = bool;
    type IntoIter = Iter<'bitset>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Bitset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for bit in self {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl Debug for Bitset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Bitset:{self}")
    }
}

/// Strict parse of a `'0'`/`'1'` string.
///
/// Unlike [`Bitset::from_bit_str`], any other character is rejected with
/// [`BitsetError::InvalidArgument`].
impl FromStr for Bitset {
    type Err = BitsetError;

    fn from_str(s: &str) -> Result<Self> {
        if s.bytes().any(|byte| byte != b'0' && byte != b'1') {
            return Err(BitsetError::InvalidArgument(
                "bit strings may only contain '0' and '1'",
            ));
        }
        Ok(Self::from_bit_str(s))
    }
}

/// Constructs a bitset from an iterator over `bool`s, one bit per item.
impl FromIterator<bool> for Bitset {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut words = Vec::with_capacity(word_count(iter.size_hint().0));
        let mut size = 0;

        for bit in iter {
            let (word_idx, bit_idx) = Self::idxs(size);
            if bit_idx == 0 {
                words.push(0);
            }
            if bit {
                words[word_idx] |= 1 << bit_idx;
            }
            size += 1;
        }

        Self { size, words }
    }
}

fn unwrap_same_size<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

// Operator forms of the set algebra. They cannot report a size mismatch
// through `Result`, so they panic on one.
macro_rules! binary_operator {
    ($op:ident, $op_fn:ident, $assign:ident, $assign_fn:ident, $method:ident, $method_with:ident) => {
        /// # Panics
        /// Panics if the operands differ in size.
        impl $op<&Bitset> for &Bitset {
            type Output = Bitset;

            fn $op_fn(self, rhs: &Bitset) -> Self::Output {
                unwrap_same_size(self.$method(rhs))
            }
        }

        /// # Panics
        /// Panics if the operands differ in size.
        impl $op for Bitset {
            type Output = Bitset;

            fn $op_fn(mut self, rhs: Bitset) -> Self::Output {
                unwrap_same_size(self.$method_with(&rhs));
                self
            }
        }

        /// # Panics
        /// Panics if the operands differ in size.
        impl $assign<&Bitset> for Bitset {
            fn $assign_fn(&mut self, rhs: &Bitset) {
                unwrap_same_size(self.$method_with(rhs));
            }
        }

        /// # Panics
        /// Panics if the operands differ in size.
        impl $assign for Bitset {
            fn $assign_fn(&mut self, rhs: Bitset) {
                unwrap_same_size(self.$method_with(&rhs));
            }
        }
    };
}

binary_operator!(BitAnd, bitand, BitAndAssign, bitand_assign, intersect, intersect_with);
binary_operator!(BitOr, bitor, BitOrAssign, bitor_assign, union, union_with);
binary_operator!(BitXor, bitxor, BitXorAssign, bitxor_assign, xor, xor_with);
binary_operator!(Sub, sub, SubAssign, sub_assign, difference, difference_with);

impl Not for &Bitset {
    type Output = Bitset;

    fn not(self) -> Self::Output {
        self.complement()
    }
}

impl Not for Bitset {
    type Output = Bitset;

    fn not(mut self) -> Self::Output {
        for word in &mut self.words {
            *word = !*word;
        }
        self.clean_unused_bits();
        self
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawBitset {
    len: usize,
    data: Vec<Word>,
}

#[cfg(feature = "serde")]
impl From<Bitset> for RawBitset {
    fn from(bitset: Bitset) -> Self {
        Self {
            len: bitset.size,
            data: bitset.words,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawBitset> for Bitset {
    type Error = BitsetError;

    fn try_from(raw: RawBitset) -> Result<Self> {
        Self::from_words(raw.len, raw.data)
    }
}

/// Iterator over all bits of a [`Bitset`] as `bool` values.
///
/// Returned by [`Bitset::iter()`].
#[derive(Clone, Copy)]
pub struct Iter<'bitset> {
    words: &'bitset [Word],
    idx: usize,
    size: usize,
}

impl Iterator for Iter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.size {
            return None;
        }
        let bit = self.words[self.idx / WORD_BITS] & 1 << (self.idx % WORD_BITS);
        self.idx += 1;
        Some(bit != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.size - self.idx;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// Iterator over the indices of set bits in a [`Bitset`], in ascending
/// order.
///
/// Returned by [`Bitset::iter_ones()`].
#[derive(Clone, Copy)]
pub struct IterOnes<'bitset> {
    words: &'bitset [Word],
    word_idx: usize,
    current: Word,
    base_bit_idx: usize,
}

impl Iterator for IterOnes<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word_idx < self.words.len() {
            if self.current != 0 {
                let tz = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1; // unset LSB
                return Some(self.base_bit_idx + tz);
            }

            self.word_idx += 1;
            self.base_bit_idx += WORD_BITS;
            self.current = self.words.get(self.word_idx).copied().unwrap_or(0);
        }
        None
    }
}

impl FusedIterator for IterOnes<'_> {}
