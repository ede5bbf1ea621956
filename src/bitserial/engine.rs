//! Bit-serial engine core.

use super::rules::next_state;

pub struct BitSerial {
    cells: Vec<bool>,
    scratch: Vec<bool>,
    generation: u64,
}

impl BitSerial {
    /// Rule 110 lattice of `len` cells from a bit sequence (bit 0 first).
    pub fn new<I>(len: usize, bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut cells = vec![false; len];
        for (cell, alive) in cells.iter_mut().zip(bits) {
            *cell = alive;
        }
        Self {
            scratch: vec![false; len],
            cells,
            generation: 0,
        }
    }

    /// Advance `generations` steps. Cells outside `0..len` are always dead.
    pub fn step(&mut self, generations: u64) {
        let len = self.cells.len();
        for _ in 0..generations {
            for i in 0..len {
                let left = i > 0 && self.cells[i - 1];
                let right = i + 1 < len && self.cells[i + 1];
                self.scratch[i] = next_state(left, self.cells[i], right);
            }
            std::mem::swap(&mut self.cells, &mut self.scratch);
            self.generation += 1;
        }
    }

    pub fn get_cell(&self, index: usize) -> bool {
        self.cells.get(index).copied().unwrap_or(false)
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|&&alive| alive).count() as u64
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn for_each_live<F: FnMut(usize)>(&self, mut f: F) {
        for (i, &alive) in self.cells.iter().enumerate() {
            if alive {
                f(i);
            }
        }
    }
}
