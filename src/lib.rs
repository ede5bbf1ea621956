//! Packed-bit, multi-threaded Rule 110 cellular automaton.

pub mod bitserial;
pub mod rule110;
pub mod seed;
pub use bitserial::BitSerial;
pub use rule110::{KernelBackend, PackedLattice, Rule110, Rule110Config};
pub use seed::{Seed, SeedError, SeedPolicy};
