//! Seed file reader.
//!
//! A seed file holds a decimal cell count `N` followed by a token of `N`
//! characters from `{0, 1}`, bit 0 first, separated by whitespace.

use std::path::{Path, PathBuf};

use crate::rule110::PackedLattice;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("seed is missing the cell count")]
    MissingLength,
    #[error("invalid cell count {token:?}")]
    InvalidLength { token: String },
    #[error("seed declares {expected} cells but has no cell token")]
    MissingCells { expected: usize },
    #[error("seed declares {expected} cells but the cell token has {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("invalid cell {found:?} at index {index}, expected '0' or '1'")]
    InvalidCell { index: usize, found: char },
    #[error("seed declares {len} cells, more than can be allocated")]
    TooLarge {
        len: usize,
        #[source]
        source: std::collections::TryReserveError,
    },
}

/// How malformed cell tokens are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Reject tokens of the wrong length or with characters other than `0`/`1`.
    #[default]
    Strict,
    /// Anything but `1` is dead, short tokens zero-fill, long tokens are
    /// truncated to `N`, and a missing token means all cells are dead.
    Lenient,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seed {
    pub len: usize,
    pub cells: Vec<bool>,
}

impl Seed {
    pub fn parse(text: &str, policy: SeedPolicy) -> Result<Self, SeedError> {
        let mut tokens = text.split_whitespace();
        let len_token = tokens.next().ok_or(SeedError::MissingLength)?;
        let len: usize = len_token.parse().map_err(|_| SeedError::InvalidLength {
            token: len_token.to_owned(),
        })?;

        let cells = match (tokens.next(), policy) {
            (None, _) if len == 0 => Vec::new(),
            (None, SeedPolicy::Strict) => return Err(SeedError::MissingCells { expected: len }),
            (None, SeedPolicy::Lenient) => pad_dead(Vec::new(), len)?,
            (Some(token), SeedPolicy::Strict) => parse_strict(token, len)?,
            (Some(token), SeedPolicy::Lenient) => parse_lenient(token, len)?,
        };

        Ok(Self { len, cells })
    }

    pub fn from_path(path: impl AsRef<Path>, policy: SeedPolicy) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, policy)
    }

    pub fn live_count(&self) -> u64 {
        self.cells.iter().filter(|&&alive| alive).count() as u64
    }

    pub fn into_lattice(self) -> PackedLattice {
        PackedLattice::build(self.len, self.cells)
    }
}

/// The token is checked against `len` before anything is allocated, so the
/// declared count alone never sizes a buffer.
fn parse_strict(token: &str, len: usize) -> Result<Vec<bool>, SeedError> {
    let token_len = token.chars().count();
    if token_len != len {
        return Err(SeedError::LengthMismatch {
            expected: len,
            found: token_len,
        });
    }
    let mut cells = Vec::with_capacity(token_len);
    for (index, c) in token.chars().enumerate() {
        match c {
            '0' => cells.push(false),
            '1' => cells.push(true),
            found => return Err(SeedError::InvalidCell { index, found }),
        }
    }
    Ok(cells)
}

fn parse_lenient(token: &str, len: usize) -> Result<Vec<bool>, SeedError> {
    let cells: Vec<bool> = token.chars().take(len).map(|c| c == '1').collect();
    if cells.len() < len {
        tracing::warn!(
            expected = len,
            found = cells.len(),
            "short cell token, padding with dead cells"
        );
    }
    pad_dead(cells, len)
}

/// Zero-fill `cells` up to `len`, reporting an unallocatable count as an error.
fn pad_dead(mut cells: Vec<bool>, len: usize) -> Result<Vec<bool>, SeedError> {
    let missing = len.saturating_sub(cells.len());
    cells
        .try_reserve_exact(missing)
        .map_err(|source| SeedError::TooLarge { len, source })?;
    cells.resize(len, false);
    Ok(cells)
}
