//! Dense bit-vector backing.
//!
//! One bit per possible address, indexed directly by the [`AddressKey`]. The
//! whole store is allocated zeroed at construction and never resized, so the
//! memory cost is fixed at `2^32` bits (512 MiB) no matter how few addresses
//! are inserted.

use std::fmt;
use std::ops::RangeInclusive;

use crate::codec::{AddressKey, ADDRESS_BITS};
use crate::{MembershipSet, ADDRESS_SPACE};

// =============================================================================
// Layout
// =============================================================================

type Word = u32;

/// Bits per storage word.
pub const WORD_BITS: u32 = Word::BITS;

/// Words needed to cover every address: `ceil(2^32 / WORD_BITS)`.
pub const WORD_COUNT: usize = ((ADDRESS_SPACE + WORD_BITS as u64 - 1) / WORD_BITS as u64) as usize;

/// Word index and bit offset of `key`. Offset 0 is the word's least
/// significant bit.
#[inline]
fn locate(key: AddressKey) -> (usize, u32) {
    ((key / WORD_BITS) as usize, key % WORD_BITS)
}

/// Mask with bits `lo..=hi` set.
#[inline]
fn span_mask(lo: u32, hi: u32) -> Word {
    debug_assert!(lo <= hi && hi < WORD_BITS);
    (Word::MAX >> (WORD_BITS - 1 - hi)) & (Word::MAX << lo)
}

// =============================================================================
// DenseBitVectorSet
// =============================================================================

/// A set of IPv4 addresses stored as a flat `2^32`-bit vector.
///
/// Bit `k` is set iff key `k` has been inserted, and `unique_count` always
/// equals the number of set bits. All operations are O(1) except
/// [`population`](Self::population) and bulk [`insert_range`](MembershipSet::insert_range).
#[derive(Clone)]
pub struct DenseBitVectorSet {
    words: Box<[Word]>,
    unique_count: u64,
}

impl DenseBitVectorSet {
    /// Allocate the full zeroed store.
    pub fn new() -> Self {
        log::debug!(
            "allocating dense bit vector: {} words of {} bits ({} bytes)",
            WORD_COUNT,
            WORD_BITS,
            WORD_COUNT * std::mem::size_of::<Word>()
        );
        Self {
            words: vec![0; WORD_COUNT].into_boxed_slice(),
            unique_count: 0,
        }
    }

    /// Number of logical bit positions (always `2^32`).
    #[inline]
    pub fn capacity_bits(&self) -> u64 {
        self.words.len() as u64 * u64::from(WORD_BITS)
    }

    /// Count the set bits by scanning every word.
    ///
    /// Always equal to [`unique_count`](MembershipSet::unique_count); this walks
    /// the whole 512 MiB store.
    pub fn population(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// OR `mask` into word `idx`, counting the bits that flip from 0 to 1.
    #[inline]
    fn fill_word(&mut self, idx: usize, mask: Word) -> u32 {
        let word = &mut self.words[idx];
        let added = (mask & !*word).count_ones();
        *word |= mask;
        self.unique_count += u64::from(added);
        added
    }
}

impl MembershipSet for DenseBitVectorSet {
    #[inline]
    fn insert_key(&mut self, key: AddressKey) -> bool {
        let (idx, bit) = locate(key);
        self.fill_word(idx, 1 << bit) != 0
    }

    #[inline]
    fn search_key(&self, key: AddressKey) -> bool {
        let (idx, bit) = locate(key);
        self.words[idx] & (1 << bit) != 0
    }

    #[inline]
    fn unique_count(&self) -> u64 {
        self.unique_count
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of_val(&*self.words)
    }

    /// Word-at-a-time fill: full words are set in one store and counted with
    /// `count_ones`, partial words at either end are masked.
    fn insert_range(&mut self, range: RangeInclusive<AddressKey>) -> u64 {
        if range.is_empty() {
            return 0;
        }
        let before = self.unique_count;
        let (start, end) = range.into_inner();
        let (first_idx, first_bit) = locate(start);
        let (last_idx, last_bit) = locate(end);

        for idx in first_idx..=last_idx {
            let lo = if idx == first_idx { first_bit } else { 0 };
            let hi = if idx == last_idx { last_bit } else { WORD_BITS - 1 };
            self.fill_word(idx, span_mask(lo, hi));
        }
        self.unique_count - before
    }
}

impl Default for DenseBitVectorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DenseBitVectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseBitVectorSet")
            .field("unique_count", &self.unique_count)
            .field("words", &self.words.len())
            .field("word_bits", &WORD_BITS)
            .finish()
    }
}

const _: () = assert!(WORD_COUNT as u64 * WORD_BITS as u64 == 1u64 << ADDRESS_BITS);
