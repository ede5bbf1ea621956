//! Packed-bit Rule 110 engine internals and public API.

mod engine;
mod kernel;
mod lattice;
mod population;

pub use engine::{EngineError, Rule110, Rule110Config, RunState};
pub use kernel::{KernelBackend, advance_span, advance_span_scalar, avx2_available, rule110_word};
pub use lattice::{
    BLOCK_BITS, BLOCK_WORDS, Block, EdgeMask, LatticeLayout, PackedLattice, SENTINEL_BLOCKS,
    WORD_BITS,
};
pub use population::{count_words, count_words_parallel, population, population_parallel};
