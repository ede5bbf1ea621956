//! Bit-parallel Rule 110 kernels.
//!
//! Each kernel advances a contiguous span of 256-bit blocks. The left and
//! right neighbor planes are built by shifting every word by one bit and
//! carrying the edge bit in from the adjacent word, which may belong to the
//! neighboring block or to a sentinel block.
//!
//! Truth table (left, center, right -> next):
//! `111->0 110->1 101->1 100->0 011->1 010->1 001->1 000->0`,
//! which reduces to `(center ^ right) | (!left & center)`.

use super::lattice::{BLOCK_WORDS, Block, as_words};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelBackend {
    Scalar,
    Avx2,
}

#[inline(always)]
pub fn rule110_word(left: u64, center: u64, right: u64) -> u64 {
    (center ^ right) | (!left & center)
}

/// Cell `i - 1` at bit `i`; bit 0 comes from the top bit of the previous word.
#[inline(always)]
pub fn left_plane(center: u64, prev_word: u64) -> u64 {
    (center << 1) | (prev_word >> 63)
}

/// Cell `i + 1` at bit `i`; bit 63 comes from the low bit of the next word.
#[inline(always)]
pub fn right_plane(center: u64, next_word: u64) -> u64 {
    (center >> 1) | (next_word << 63)
}

#[inline(always)]
fn span_bounds_ok(src: &[Block], first_block: usize, blocks: usize) -> bool {
    first_block >= 1 && first_block + blocks < src.len()
}

/// Advance `dst.len()` blocks starting at block `first_block` of `src`.
///
/// `dst[k]` receives the next generation of source block `first_block + k`.
/// The block before the span and the block after it must exist in `src`.
#[inline(always)]
pub fn advance_span_scalar(src: &[Block], first_block: usize, dst: &mut [Block]) {
    assert!(span_bounds_ok(src, first_block, dst.len()));

    let words = as_words(src);
    for (k, out) in dst.iter_mut().enumerate() {
        let base = (first_block + k) * BLOCK_WORDS;
        let window = &words[base - 1..base + BLOCK_WORDS + 1];
        for lane in 0..BLOCK_WORDS {
            let center = window[lane + 1];
            let left = left_plane(center, window[lane]);
            let right = right_plane(center, window[lane + 2]);
            out.0[lane] = rule110_word(left, center, right);
        }
    }
}

// ── AVX2 kernel ─────────────────────────────────────────────────────────

/// AVX2 kernel: one block per iteration.
///
/// - aligned load of the four center words
/// - unaligned loads at word offsets -1 and +1 for the carry sources
/// - 64-bit lane shifts plus `or` build the neighbor planes
/// - `xor`/`andnot`/`or` apply the rule, aligned store into `dst`
///
/// # Safety
/// The CPU must support AVX2.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn advance_span_avx2(src: &[Block], first_block: usize, dst: &mut [Block]) {
    use std::arch::x86_64::{
        __m256i, _mm256_andnot_si256, _mm256_load_si256, _mm256_loadu_si256, _mm256_or_si256,
        _mm256_slli_epi64, _mm256_srli_epi64, _mm256_store_si256, _mm256_xor_si256,
    };

    assert!(span_bounds_ok(src, first_block, dst.len()));

    // `Block` is 32-byte aligned, so every block start is a valid aligned load.
    let src_ptr = src.as_ptr().cast::<u64>();
    for (k, out) in dst.iter_mut().enumerate() {
        let base = (first_block + k) * BLOCK_WORDS;

        let center = unsafe { _mm256_load_si256(src_ptr.add(base) as *const __m256i) };
        let left_src = unsafe { _mm256_loadu_si256(src_ptr.add(base - 1) as *const __m256i) };
        let right_src = unsafe { _mm256_loadu_si256(src_ptr.add(base + 1) as *const __m256i) };

        let left = _mm256_or_si256(_mm256_slli_epi64(center, 1), _mm256_srli_epi64(left_src, 63));
        let right = _mm256_or_si256(_mm256_srli_epi64(center, 1), _mm256_slli_epi64(right_src, 63));
        let next = _mm256_or_si256(
            _mm256_xor_si256(center, right),
            _mm256_andnot_si256(left, center),
        );

        unsafe { _mm256_store_si256(out.0.as_mut_ptr() as *mut __m256i, next) };
    }
}

#[inline]
pub fn avx2_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Dispatch a span to the selected backend.
///
/// `KernelBackend::Avx2` runs the scalar kernel when the CPU lacks AVX2.
#[inline(always)]
pub fn advance_span(backend: KernelBackend, src: &[Block], first_block: usize, dst: &mut [Block]) {
    match backend {
        KernelBackend::Scalar => advance_span_scalar(src, first_block, dst),
        KernelBackend::Avx2 => {
            #[cfg(target_arch = "x86_64")]
            {
                if avx2_available() {
                    // SAFETY: AVX2 support was just checked.
                    return unsafe { advance_span_avx2(src, first_block, dst) };
                }
            }
            advance_span_scalar(src, first_block, dst)
        }
    }
}
