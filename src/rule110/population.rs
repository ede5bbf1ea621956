//! Population count over the real words of a lattice.

use rayon::prelude::*;

use super::lattice::PackedLattice;

/// Below this many words the parallel reducer stays on the calling thread.
pub(crate) const PARALLEL_POPCOUNT_MIN_WORDS: usize = 1 << 14;
const POPCOUNT_CHUNK_WORDS: usize = 1 << 12;

#[inline]
pub fn count_words(words: &[u64]) -> u64 {
    words.iter().map(|w| w.count_ones() as u64).sum()
}

/// Per-chunk subtotals summed by rayon; the result does not depend on how
/// the chunks are scheduled.
pub fn count_words_parallel(words: &[u64]) -> u64 {
    if words.len() < PARALLEL_POPCOUNT_MIN_WORDS {
        return count_words(words);
    }
    words
        .par_chunks(POPCOUNT_CHUNK_WORDS)
        .map(count_words)
        .sum()
}

fn count_with<F>(lattice: &PackedLattice, count: F) -> u64
where
    F: Fn(&[u64]) -> u64,
{
    if lattice.is_empty() {
        return 0;
    }
    let layout = lattice.layout();
    let words = lattice.real_words();
    let (last, body) = match words.split_last() {
        Some(split) => split,
        None => return 0,
    };
    count(body) + (last & layout.tail_mask).count_ones() as u64
}

/// Live cells in `0..len` of the current generation.
pub fn population(lattice: &PackedLattice) -> u64 {
    count_with(lattice, count_words)
}

/// Same as [`population`], fanned out over the current rayon pool.
pub fn population_parallel(lattice: &PackedLattice) -> u64 {
    count_with(lattice, count_words_parallel)
}

#[cfg(test)]
mod tests {
    use super::{
        PARALLEL_POPCOUNT_MIN_WORDS, count_words, count_words_parallel, population,
        population_parallel,
    };
    use crate::rule110::lattice::PackedLattice;

    use rand::RngCore;
    use rand::SeedableRng;

    #[test]
    fn empty_lattice_has_no_population() {
        let lattice = PackedLattice::empty(0);
        assert_eq!(population(&lattice), 0);
        assert_eq!(population_parallel(&lattice), 0);
    }

    #[test]
    fn counts_only_real_cells() {
        let lattice = PackedLattice::build(70, (0..70).map(|i| i % 3 == 0));
        let expected = (0..70).filter(|i| i % 3 == 0).count() as u64;
        assert_eq!(population(&lattice), expected);
        assert_eq!(population_parallel(&lattice), expected);
    }

    #[test]
    fn parallel_count_matches_serial_on_large_input() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x9090_1234);
        let words: Vec<u64> = (0..PARALLEL_POPCOUNT_MIN_WORDS * 3 + 17)
            .map(|_| rng.next_u64())
            .collect();

        let serial = count_words(&words);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .expect("build thread pool");
        let parallel = pool.install(|| count_words_parallel(&words));
        assert_eq!(serial, parallel);
    }

    #[test]
    fn full_words_count_every_bit() {
        let lattice = PackedLattice::build(512, std::iter::repeat(true));
        assert_eq!(population(&lattice), 512);
    }
}
