//! Bit-serial elementary automaton, one cell at a time.
//!
//! Slow on purpose: it evaluates the Rule 110 table directly and serves as the
//! oracle for the packed engine.

mod engine;
mod rules;

pub use engine::BitSerial;
