// Rolling hash and byte-run comparison kernels.
//
// The rolling hash is a fixed-base polynomial hash over a window of
// `window_size` bytes:
//
//   h(b[0..w]) = (b[0]*M^(w-1) + b[1]*M^(w-2) + ... + b[w-1]) mod BASE
//
// with M = 257 and BASE = 2^22, so every reduction is a mask.  Sliding the
// window by one byte subtracts the weighted oldest byte (looked up in a
// precomputed table of additive inverses) and folds the new byte in with
// one Horner step.
//
// The comparison kernels count equal bytes forwards or backwards.  They
// back match extension in `BlockHash::find_best_match`, which runs for
// every surviving candidate at every scanned target position.  AVX2 is
// selected once at runtime on x86_64; elsewhere a word-at-a-time scalar
// loop is used.

use std::fmt;
use std::sync::OnceLock;

use super::config::{BLOCK_SIZE, HASH_BASE, HASH_MASK, HASH_MULTIPLIER};

/// Function pointer type for byte-wise match scanning routines.
pub type MatchFn = fn(&[u8], &[u8], usize) -> usize;

// ---------------------------------------------------------------------------
// Modular helpers
// ---------------------------------------------------------------------------

/// Reduce `value` modulo [`HASH_BASE`].
#[inline(always)]
pub fn mod_base(value: u32) -> u32 {
    value & HASH_MASK
}

/// Additive inverse of `value` modulo [`HASH_BASE`].
#[inline(always)]
pub fn mod_base_inverse(value: u32) -> u32 {
    mod_base(HASH_BASE.wrapping_sub(value))
}

/// One Horner step: fold `byte` into a partial hash.
///
/// `partial < 2^22`, so `partial * 257 + 255` stays below `2^31`.
#[inline(always)]
pub fn hash_step(partial: u32, byte: u8) -> u32 {
    mod_base(partial * HASH_MULTIPLIER + byte as u32)
}

// ---------------------------------------------------------------------------
// RollingHash
// ---------------------------------------------------------------------------

/// Polynomial rolling hash over a fixed window.
///
/// Holds no buffer state: one instance can hash any number of buffers and
/// may be shared between threads.
#[derive(Clone)]
pub struct RollingHash {
    window_size: usize,
    /// `remove_table[b]` = `-(b * M^(window_size-1)) mod BASE`.
    remove_table: [u32; 256],
}

impl RollingHash {
    /// Build the hash for `window_size`-byte windows.
    ///
    /// # Panics
    /// If `window_size` is zero.
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "rolling hash window must not be empty");

        let mut weight = 1u32;
        for _ in 1..window_size {
            weight = mod_base(weight * HASH_MULTIPLIER);
        }

        let mut remove_table = [0u32; 256];
        for (byte, slot) in remove_table.iter_mut().enumerate() {
            *slot = mod_base_inverse(mod_base(byte as u32 * weight));
        }

        Self {
            window_size,
            remove_table,
        }
    }

    /// Shared instance for [`BLOCK_SIZE`] windows.
    pub fn for_blocks() -> &'static RollingHash {
        static BLOCK_HASHER: OnceLock<RollingHash> = OnceLock::new();
        BLOCK_HASHER.get_or_init(|| RollingHash::new(BLOCK_SIZE))
    }

    /// Window width in bytes.
    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Hash of the first `window_size` bytes of `window`, from scratch.
    ///
    /// # Panics
    /// If `window` is shorter than `window_size`.
    #[inline]
    pub fn hash(&self, window: &[u8]) -> u32 {
        debug_assert!(window.len() >= self.window_size);
        window[..self.window_size]
            .iter()
            .fold(0, |h, &b| hash_step(h, b))
    }

    /// Hash of the window shifted one byte forward.
    ///
    /// `old_hash` is the hash of `b[i..i+w]`, `old_first_byte` is `b[i]`
    /// and `new_last_byte` is `b[i+w]`; the result is the hash of
    /// `b[i+1..i+w+1]`.
    #[inline(always)]
    pub fn update_hash(&self, old_hash: u32, old_first_byte: u8, new_last_byte: u8) -> u32 {
        debug_assert!(old_hash < HASH_BASE);
        let partial = mod_base(old_hash + self.remove_table[old_first_byte as usize]);
        hash_step(partial, new_last_byte)
    }
}

impl fmt::Debug for RollingHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingHash")
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Forward match comparison
// ---------------------------------------------------------------------------

/// Number of equal leading bytes of `a` and `b`, at most `n`.
#[inline]
pub fn forward_match(a: &[u8], b: &[u8], n: usize) -> usize {
    forward_match_fn()(a, b, n.min(a.len()).min(b.len()))
}

/// Number of equal trailing bytes of `a[..n]` and `b[..n]`.
///
/// Callers pass the bytes just before two cursors, so the slices end where
/// the backward walk starts.
#[inline]
pub fn backward_match(a: &[u8], b: &[u8], n: usize) -> usize {
    let n = n.min(a.len()).min(b.len());
    backward_match_fn()(&a[a.len() - n..], &b[b.len() - n..], n)
}

/// Best forward comparator for the running CPU.
#[inline]
pub fn forward_match_fn() -> MatchFn {
    #[cfg(target_arch = "x86_64")]
    {
        static DISPATCH: OnceLock<MatchFn> = OnceLock::new();
        return *DISPATCH.get_or_init(|| {
            if is_x86_feature_detected!("avx2") {
                forward_match_avx2_call
            } else {
                forward_match_scalar
            }
        });
    }

    #[allow(unreachable_code)]
    forward_match_scalar
}

/// Best backward comparator for the running CPU.
#[inline]
pub fn backward_match_fn() -> MatchFn {
    #[cfg(target_arch = "x86_64")]
    {
        static DISPATCH: OnceLock<MatchFn> = OnceLock::new();
        return *DISPATCH.get_or_init(|| {
            if is_x86_feature_detected!("avx2") {
                backward_match_avx2_call
            } else {
                backward_match_scalar
            }
        });
    }

    #[allow(unreachable_code)]
    backward_match_scalar
}

#[inline(always)]
fn load_word(chunk: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(chunk);
    u64::from_le_bytes(word)
}

/// Scalar forward comparison, eight bytes per step.
fn forward_match_scalar(a: &[u8], b: &[u8], n: usize) -> usize {
    let (a, b) = (&a[..n], &b[..n]);
    let mut matched = 0;
    for (wa, wb) in a.chunks_exact(8).zip(b.chunks_exact(8)) {
        let diff = load_word(wa) ^ load_word(wb);
        if diff != 0 {
            // Little-endian load: the first differing byte is the lowest.
            return matched + (diff.trailing_zeros() / 8) as usize;
        }
        matched += 8;
    }
    matched
        + a[matched..]
            .iter()
            .zip(&b[matched..])
            .take_while(|(x, y)| x == y)
            .count()
}

/// Scalar backward comparison, eight bytes per step from the end.
fn backward_match_scalar(a: &[u8], b: &[u8], n: usize) -> usize {
    let (a, b) = (&a[a.len() - n..], &b[b.len() - n..]);
    let mut matched = 0;
    for (wa, wb) in a.rchunks_exact(8).zip(b.rchunks_exact(8)) {
        let diff = load_word(wa) ^ load_word(wb);
        if diff != 0 {
            return matched + (diff.leading_zeros() / 8) as usize;
        }
        matched += 8;
    }
    let rest = n - matched;
    matched
        + a[..rest]
            .iter()
            .rev()
            .zip(b[..rest].iter().rev())
            .take_while(|(x, y)| x == y)
            .count()
}

#[cfg(target_arch = "x86_64")]
fn forward_match_avx2_call(a: &[u8], b: &[u8], n: usize) -> usize {
    // Safety: AVX2 support is checked once when the dispatcher is built.
    unsafe { forward_match_avx2(a, b, n) }
}

#[cfg(target_arch = "x86_64")]
fn backward_match_avx2_call(a: &[u8], b: &[u8], n: usize) -> usize {
    // Safety: AVX2 support is checked once when the dispatcher is built.
    unsafe { backward_match_avx2(a, b, n) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn forward_match_avx2(a: &[u8], b: &[u8], n: usize) -> usize {
    use std::arch::x86_64::*;
    debug_assert!(n <= a.len() && n <= b.len());
    let mut i = 0;

    // Safety: every load reads 32 bytes at `i` with `i + 32 <= n`, and
    // `n` never exceeds either slice length.
    unsafe {
        while i + 32 <= n {
            let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
            let eq = _mm256_movemask_epi8(_mm256_cmpeq_epi8(va, vb)) as u32;
            if eq != u32::MAX {
                return i + (!eq).trailing_zeros() as usize;
            }
            i += 32;
        }
    }

    i + forward_match_scalar(&a[i..], &b[i..], n - i)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn backward_match_avx2(a: &[u8], b: &[u8], n: usize) -> usize {
    use std::arch::x86_64::*;
    let (a, b) = (&a[a.len() - n..], &b[b.len() - n..]);
    let mut end = n;

    // Safety: every load reads the 32 bytes ending at `end`, with
    // `end >= 32` and `end <= n == a.len() == b.len()`.
    unsafe {
        while end >= 32 {
            let va = _mm256_loadu_si256(a.as_ptr().add(end - 32) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(end - 32) as *const __m256i);
            let eq = _mm256_movemask_epi8(_mm256_cmpeq_epi8(va, vb)) as u32;
            if eq != u32::MAX {
                // Bit 31 is the last byte of the lane.
                return n - end + eq.leading_ones() as usize;
            }
            end -= 32;
        }
    }

    n - end + backward_match_scalar(&a[..end], &b[..end], end)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
