//! Packed lattice storage for the Rule 110 engine.
//!
//! Cells are stored LSB-first in `u64` words, four words per 256-bit
//! [`Block`]. Each buffer carries `SENTINEL_BLOCKS` all-zero blocks on both
//! sides of the real blocks so that the kernel's unaligned neighbor loads at
//! word offsets -1 and +4 never leave the allocation.
//! The two generation buffers share one [`LatticeLayout`]; only their roles
//! swap between steps.

pub const WORD_BITS: usize = 64;
pub const BLOCK_WORDS: usize = 4;
pub const BLOCK_BITS: usize = WORD_BITS * BLOCK_WORDS;
pub const SENTINEL_BLOCKS: usize = 2;

/// Four packed words, aligned for 256-bit aligned loads and stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct Block(pub [u64; BLOCK_WORDS]);

impl Block {
    pub const ZERO: Block = Block([0; BLOCK_WORDS]);
}

/// A single word position plus the bits that survive a boundary clamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeMask {
    pub word: usize,
    pub keep: u64,
}

impl EdgeMask {
    #[inline(always)]
    pub fn apply(self, words: &mut [u64]) {
        words[self.word] &= self.keep;
    }
}

/// Derived geometry of a lattice of `len` cells. Computed once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatticeLayout {
    pub len: usize,
    pub real_words: usize,
    pub real_blocks: usize,
    pub first_real_word: usize,
    pub last_real_word: usize,
    /// Valid bits of the last real word.
    pub tail_mask: u64,
    /// Clears virtual cell -1.
    pub lower_edge: EdgeMask,
    /// Clears virtual cell `len`.
    pub upper_edge: EdgeMask,
}

impl LatticeLayout {
    pub fn new(len: usize) -> Self {
        let real_words = len.div_ceil(WORD_BITS);
        let real_blocks = real_words.div_ceil(BLOCK_WORDS);
        let first_real_word = SENTINEL_BLOCKS * BLOCK_WORDS;
        let last_real_word = first_real_word + len.saturating_sub(1) / WORD_BITS;

        let tail_bits = len % WORD_BITS;
        let tail_mask = if tail_bits == 0 {
            u64::MAX
        } else {
            (1u64 << tail_bits) - 1
        };

        let lower_edge = EdgeMask {
            word: first_real_word - 1,
            keep: !(1u64 << (WORD_BITS - 1)),
        };
        let upper_edge = EdgeMask {
            word: first_real_word + len / WORD_BITS,
            keep: !(1u64 << tail_bits),
        };

        Self {
            len,
            real_words,
            real_blocks,
            first_real_word,
            last_real_word,
            tail_mask,
            lower_edge,
            upper_edge,
        }
    }

    #[inline]
    pub fn first_block(&self) -> usize {
        SENTINEL_BLOCKS
    }

    /// Blocks the kernel writes each step.
    #[inline]
    pub fn real_block_range(&self) -> std::ops::Range<usize> {
        SENTINEL_BLOCKS..SENTINEL_BLOCKS + self.real_blocks
    }

    /// Total blocks per buffer, sentinels included.
    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.real_blocks + 2 * SENTINEL_BLOCKS
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer word index and bit position of cell `index`.
    #[inline]
    pub fn locate(&self, index: usize) -> (usize, u32) {
        (
            self.first_real_word + index / WORD_BITS,
            (index % WORD_BITS) as u32,
        )
    }
}

#[inline]
pub(crate) fn as_words(blocks: &[Block]) -> &[u64] {
    // SAFETY: `Block` is `repr(C)` over `[u64; BLOCK_WORDS]` with no padding,
    // so a block slice is a valid, properly aligned word slice of 4x length.
    unsafe { std::slice::from_raw_parts(blocks.as_ptr().cast::<u64>(), blocks.len() * BLOCK_WORDS) }
}

#[inline]
pub(crate) fn as_words_mut(blocks: &mut [Block]) -> &mut [u64] {
    // SAFETY: see `as_words`; the exclusive borrow is carried over.
    unsafe {
        std::slice::from_raw_parts_mut(
            blocks.as_mut_ptr().cast::<u64>(),
            blocks.len() * BLOCK_WORDS,
        )
    }
}

/// Double-buffered packed lattice.
///
/// `current` holds the live generation, `next` is the write target of the
/// following step. Both are allocated once here and dropped with the owner.
#[derive(Clone, Debug)]
pub struct PackedLattice {
    layout: LatticeLayout,
    current: Vec<Block>,
    next: Vec<Block>,
}

impl PackedLattice {
    /// Build a lattice of `len` cells from a bit sequence (bit 0 first).
    ///
    /// Items past `len` are ignored; a short sequence leaves the remaining
    /// cells dead.
    pub fn build<I>(len: usize, bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut lattice = Self::empty(len);
        {
            let layout = lattice.layout;
            let words = as_words_mut(&mut lattice.current);
            for (index, alive) in bits.into_iter().take(len).enumerate() {
                if alive {
                    let (word, bit) = layout.locate(index);
                    words[word] |= 1u64 << bit;
                }
            }
        }
        lattice
    }

    /// Build a lattice of `len` cells with the given live indices.
    /// Indices outside `0..len` are ignored.
    pub fn from_live_cells<I>(len: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut lattice = Self::empty(len);
        for index in cells {
            lattice.set_cell(index, true);
        }
        lattice
    }

    /// All-dead lattice of `len` cells.
    pub fn empty(len: usize) -> Self {
        let layout = LatticeLayout::new(len);
        let total = layout.total_blocks();
        Self {
            layout,
            current: vec![Block::ZERO; total],
            next: vec![Block::ZERO; total],
        }
    }

    #[inline]
    pub fn layout(&self) -> &LatticeLayout {
        &self.layout
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn get_cell(&self, index: usize) -> bool {
        if index >= self.layout.len {
            return false;
        }
        let (word, bit) = self.layout.locate(index);
        (self.words()[word] >> bit) & 1 == 1
    }

    pub fn set_cell(&mut self, index: usize, alive: bool) {
        if index >= self.layout.len {
            return;
        }
        let (word, bit) = self.layout.locate(index);
        let mask = 1u64 << bit;
        let words = as_words_mut(&mut self.current);
        if alive {
            words[word] |= mask;
        } else {
            words[word] &= !mask;
        }
    }

    /// Whole current buffer as words, sentinels included.
    #[inline]
    pub fn words(&self) -> &[u64] {
        as_words(&self.current)
    }

    /// The `real_words` words holding cells `0..len` of the current buffer.
    #[inline]
    pub fn real_words(&self) -> &[u64] {
        let start = self.layout.first_real_word;
        &self.words()[start..start + self.layout.real_words]
    }

    pub fn for_each_live<F: FnMut(usize)>(&self, mut f: F) {
        for (word_index, &word) in self.real_words().iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let index = word_index * WORD_BITS + bits.trailing_zeros() as usize;
                if index < self.layout.len {
                    f(index);
                }
                bits &= bits - 1;
            }
        }
    }

    /// Whether every sentinel word and every bit outside `0..len` is zero.
    pub fn outside_is_dead(&self) -> bool {
        let layout = &self.layout;
        let words = self.words();
        if layout.is_empty() {
            return words.iter().all(|&w| w == 0);
        }
        let before = &words[..layout.first_real_word];
        let after = &words[layout.last_real_word + 1..];
        before.iter().all(|&w| w == 0)
            && after.iter().all(|&w| w == 0)
            && words[layout.last_real_word] & !layout.tail_mask == 0
    }

    /// Drop bits beyond `len - 1` from the last real word of the current buffer.
    pub fn apply_tail_mask(&mut self) {
        if self.layout.is_empty() {
            return;
        }
        let word = self.layout.last_real_word;
        let mask = self.layout.tail_mask;
        as_words_mut(&mut self.current)[word] &= mask;
    }

    /// Split borrow for one step: read-only current, writable next.
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&[Block], &mut [Block]) {
        (self.current.as_slice(), self.next.as_mut_slice())
    }

    /// Force virtual cells -1 and `len` of the next buffer to dead.
    #[inline]
    pub(crate) fn clamp_next_edges(&mut self) {
        let lower = self.layout.lower_edge;
        let upper = self.layout.upper_edge;
        let words = as_words_mut(&mut self.next);
        lower.apply(words);
        upper.apply(words);
    }

    /// The freshly written buffer becomes current.
    #[inline]
    pub(crate) fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}
