//! Word-packed atomic bitsets.
//!
//! This is a dense alternative to `Vec<AtomicBool>` for bucket membership and
//! per-phase settled sets. Every vertex maps to one bit; concurrent toggles of
//! *different* bits in the same word are safe because each toggle is a single
//! `fetch_or` / `fetch_and`.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::TryReserveError;

const WORD_BITS: usize = usize::BITS as usize;

/// A word-packed atomic bitset with a fixed number of bits.
pub struct AtomicBitset {
    bits: usize,
    words: Box<[AtomicUsize]>,
}

impl AtomicBitset {
    /// Creates a new bitset with `bits` bits, all cleared.
    pub fn new(bits: usize) -> Self {
        let words = (0..bits.div_ceil(WORD_BITS))
            .map(|_| AtomicUsize::new(0))
            .collect();
        Self { bits, words }
    }

    /// Like [`AtomicBitset::new`], but reports allocation failure instead of aborting.
    ///
    /// # Errors
    /// Returns the allocator's error if the word array cannot be reserved.
    pub fn try_new(bits: usize) -> Result<Self, TryReserveError> {
        let len = bits.div_ceil(WORD_BITS);
        let mut words = Vec::new();
        words.try_reserve_exact(len)?;
        words.extend((0..len).map(|_| AtomicUsize::new(0)));
        Ok(Self {
            bits,
            words: words.into_boxed_slice(),
        })
    }

    /// Number of bits.
    #[inline]
    pub fn len_bits(&self) -> usize {
        self.bits
    }

    /// Number of backing words.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Size of the backing storage in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.words.len() * core::mem::size_of::<AtomicUsize>()
    }

    /// Clears all bits.
    pub fn clear_all(&self) {
        for w in self.words.iter() {
            w.store(0, Ordering::Relaxed);
        }
    }

    /// Returns whether `bit` is set.
    ///
    /// # Panics
    /// Panics if `bit >= len_bits()`.
    pub fn is_set(&self, bit: usize) -> bool {
        assert!(bit < self.bits, "bit {bit} out of range for {} bits", self.bits);
        // SAFETY: index checked above.
        unsafe { self.is_set_unchecked(bit) }
    }

    /// Sets `bit` and returns `true` iff this call observed it previously cleared.
    ///
    /// # Panics
    /// Panics if `bit >= len_bits()`.
    pub fn test_and_set(&self, bit: usize, order: Ordering) -> bool {
        assert!(bit < self.bits, "bit {bit} out of range for {} bits", self.bits);
        // SAFETY: index checked above.
        unsafe { self.test_and_set_unchecked(bit, order) }
    }

    /// Clears `bit` and returns `true` iff this call observed it previously set.
    ///
    /// # Panics
    /// Panics if `bit >= len_bits()`.
    pub fn test_and_clear(&self, bit: usize, order: Ordering) -> bool {
        assert!(bit < self.bits, "bit {bit} out of range for {} bits", self.bits);
        // SAFETY: index checked above.
        unsafe { self.test_and_clear_unchecked(bit, order) }
    }

    /// # Safety
    /// Caller must ensure `bit < len_bits()`.
    #[inline(always)]
    pub unsafe fn is_set_unchecked(&self, bit: usize) -> bool {
        let (word, mask) = bit_word_mask(bit);
        // SAFETY: word index derived from bit < self.bits.
        (self.words.get_unchecked(word).load(Ordering::Acquire) & mask) != 0
    }

    /// # Safety
    /// Caller must ensure `bit < len_bits()`.
    #[inline(always)]
    pub unsafe fn test_and_set_unchecked(&self, bit: usize, order: Ordering) -> bool {
        let (word, mask) = bit_word_mask(bit);
        // SAFETY: word index derived from bit < self.bits.
        let prev = self.words.get_unchecked(word).fetch_or(mask, order);
        (prev & mask) == 0
    }

    /// # Safety
    /// Caller must ensure `bit < len_bits()`.
    #[inline(always)]
    pub unsafe fn test_and_clear_unchecked(&self, bit: usize, order: Ordering) -> bool {
        let (word, mask) = bit_word_mask(bit);
        // SAFETY: word index derived from bit < self.bits.
        let prev = self.words.get_unchecked(word).fetch_and(!mask, order);
        (prev & mask) != 0
    }

    /// ORs every bit of `other` into `self` and returns how many bits were newly set.
    ///
    /// Repeating the same union is a no-op (returns 0).
    ///
    /// # Panics
    /// Panics if the two bitsets have different lengths.
    pub fn union_with(&self, other: &AtomicBitset) -> usize {
        assert_eq!(self.bits, other.bits, "bitset length mismatch");
        let mut added = 0usize;
        for (dst, src) in self.words.iter().zip(other.words.iter()) {
            let s = src.load(Ordering::Acquire);
            if s == 0 {
                continue;
            }
            let prev = dst.fetch_or(s, Ordering::AcqRel);
            added += (s & !prev).count_ones() as usize;
        }
        added
    }

    /// Atomically clears every word and returns the indices that were set, ascending.
    ///
    /// Each word is swapped exactly once, so a concurrent `test_and_set` lands
    /// either in the returned snapshot or in the bitset afterwards, never in both.
    pub fn drain(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for (w, word) in self.words.iter().enumerate() {
            let mut bits = word.swap(0, Ordering::AcqRel);
            while bits != 0 {
                let shift = bits.trailing_zeros() as usize;
                out.push(w * WORD_BITS + shift);
                bits &= bits - 1;
            }
        }
        out
    }

    /// Population count.
    pub fn count_ones(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Returns `true` if no bit is set.
    pub fn is_clear(&self) -> bool {
        self.words.iter().all(|w| w.load(Ordering::Acquire) == 0)
    }

    /// Iterates over set bits in ascending order.
    ///
    /// Each word is loaded once when the iterator reaches it; bits toggled
    /// concurrently in words already passed are not observed.
    pub fn iter_ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word: 0,
            current: self.words.first().map_or(0, |w| w.load(Ordering::Acquire)),
        }
    }
}

impl core::fmt::Debug for AtomicBitset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicBitset")
            .field("bits", &self.bits)
            .field("ones", &self.count_ones())
            .finish()
    }
}

/// Iterator over the set bits of an [`AtomicBitset`].
pub struct Ones<'a> {
    words: &'a [AtomicUsize],
    word: usize,
    current: usize,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let shift = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word * WORD_BITS + shift);
            }
            self.word += 1;
            let next = self.words.get(self.word)?;
            self.current = next.load(Ordering::Acquire);
        }
    }
}

#[inline(always)]
fn bit_word_mask(bit: usize) -> (usize, usize) {
    // `usize::BITS` is always a power-of-two (32 or 64), so use shifts/masks.
    // This is on the relaxation hot path.
    #[cfg(target_pointer_width = "64")]
    {
        return (bit >> 6, 1usize << (bit & 63));
    }
    #[cfg(target_pointer_width = "32")]
    {
        return (bit >> 5, 1usize << (bit & 31));
    }
}
