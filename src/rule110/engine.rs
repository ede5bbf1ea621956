use rayon::prelude::*;
use std::sync::OnceLock;

use super::kernel::{KernelBackend, advance_span, avx2_available};
use super::lattice::PackedLattice;
use super::population;

const PARALLEL_KERNEL_MIN_BLOCKS: usize = 256;
const KERNEL_CHUNK_MIN_BLOCKS: usize = 64;

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build rule 110 worker pool with {threads} threads")]
    ThreadPool {
        threads: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Lifecycle of a run. `Done` is re-entered after every completed `run`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Stepping,
    Done,
}

#[inline]
fn parse_toggle(value: &str) -> Option<bool> {
    let v = value.trim();
    if v == "1" || v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v == "0" || v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[inline]
fn detect_kernel_backend() -> KernelBackend {
    let auto_enabled = std::env::var("RULE110_AUTO_KERNEL")
        .ok()
        .and_then(|v| parse_toggle(&v))
        .unwrap_or(true);

    if auto_enabled && avx2_available() {
        KernelBackend::Avx2
    } else {
        KernelBackend::Scalar
    }
}

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

/// The kernel streams through memory; past 8 cores extra threads mostly
/// contend for bandwidth.
#[inline]
fn auto_pool_thread_count_for_physical(physical: usize) -> usize {
    let physical = physical.max(1);
    if physical <= 8 {
        physical
    } else {
        physical.div_ceil(2).max(8)
    }
}

#[inline]
fn auto_pool_thread_count() -> usize {
    auto_pool_thread_count_for_physical(physical_core_count())
}

/// Number of contiguous chunks one step's block range is split into.
#[inline]
fn effective_parallel_chunks(real_blocks: usize, thread_count: usize) -> usize {
    if thread_count <= 1 || real_blocks < PARALLEL_KERNEL_MIN_BLOCKS {
        return 1;
    }
    (real_blocks / KERNEL_CHUNK_MIN_BLOCKS).clamp(1, thread_count)
}

/// Resolve the thread count from a config, falling back to auto-detect.
fn resolve_thread_count(config: &Rule110Config) -> usize {
    let mut threads = config.thread_count.unwrap_or_else(auto_pool_thread_count);
    if let Some(cap) = config.max_threads {
        threads = threads.min(cap);
    }
    threads.max(1)
}

/// Resolve the kernel backend from a config, falling back to default policy.
fn resolve_kernel_backend(config: &Rule110Config) -> KernelBackend {
    match config.kernel {
        Some(KernelBackend::Avx2) if avx2_available() => KernelBackend::Avx2,
        Some(KernelBackend::Avx2) => {
            tracing::warn!("AVX2 kernel requested but not supported, using scalar");
            KernelBackend::Scalar
        }
        Some(backend) => backend,
        None => detect_kernel_backend(),
    }
}

/// One generation: transition, clamp virtual cells -1 and `len`, swap.
///
/// Must run inside the engine's pool; the block range is split into
/// contiguous chunks that write disjoint blocks of the next buffer.
fn advance_generation(lattice: &mut PackedLattice, backend: KernelBackend) {
    if lattice.is_empty() {
        return;
    }

    let layout = *lattice.layout();
    let first_block = layout.first_block();
    let chunks = effective_parallel_chunks(layout.real_blocks, rayon::current_num_threads());

    {
        let (src, next) = lattice.split_mut();
        let dst = &mut next[layout.real_block_range()];
        if chunks <= 1 {
            advance_span(backend, src, first_block, dst);
        } else {
            let chunk_len = layout.real_blocks.div_ceil(chunks);
            dst.par_chunks_mut(chunk_len)
                .enumerate()
                .for_each(|(chunk, blocks)| {
                    advance_span(backend, src, first_block + chunk * chunk_len, blocks);
                });
        }
    }

    lattice.clamp_next_edges();
    lattice.swap_buffers();
    debug_assert!(lattice.outside_is_dead());
}

/// Configuration for a Rule 110 engine instance.
///
/// Use `Rule110Config::default()` for auto-tuned defaults, or customise
/// individual knobs via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct Rule110Config {
    /// Number of threads for the compute pool.
    /// `None` means auto-detect (physical cores, memory-bandwidth capped).
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of auto-detection.
    pub max_threads: Option<usize>,
    /// Kernel backend selection.
    /// `None` means AVX2 when the CPU reports it, scalar otherwise.
    /// Set `RULE110_AUTO_KERNEL=0` to force scalar default policy.
    pub kernel: Option<KernelBackend>,
}

impl Rule110Config {
    /// Set an explicit thread count for the compute pool.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Set a hard upper bound on threads.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    /// Force a specific kernel backend.
    pub fn kernel(mut self, backend: KernelBackend) -> Self {
        self.kernel = Some(backend);
        self
    }
}

/// Step orchestrator: owns both generation buffers and the worker pool.
pub struct Rule110 {
    lattice: PackedLattice,
    generation: u64,
    state: RunState,
    pool: rayon::ThreadPool,
    backend: KernelBackend,
}

impl std::fmt::Debug for Rule110 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule110")
            .field("len", &self.lattice.len())
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("backend", &self.backend)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl Rule110 {
    pub fn new(lattice: PackedLattice) -> Result<Self, EngineError> {
        Self::with_config(lattice, Rule110Config::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(lattice: PackedLattice, config: Rule110Config) -> Result<Self, EngineError> {
        let threads = resolve_thread_count(&config);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("rule110-{i}"))
            .build()
            .map_err(|source| EngineError::ThreadPool { threads, source })?;
        let backend = resolve_kernel_backend(&config);

        tracing::debug!(
            len = lattice.len(),
            real_blocks = lattice.layout().real_blocks,
            threads,
            ?backend,
            "rule 110 engine ready"
        );

        Ok(Self {
            lattice,
            generation: 0,
            state: RunState::Idle,
            pool,
            backend,
        })
    }

    pub fn step(&mut self) {
        self.step_n(1);
    }

    /// Advance `n` generations. An empty lattice has nothing to step and
    /// goes straight to `Done` with the generation counter untouched.
    pub fn step_n(&mut self, n: u64) {
        if self.lattice.is_empty() {
            self.state = RunState::Done;
            return;
        }
        self.state = RunState::Stepping;
        // Split borrow: the pool is only read while the lattice is advanced.
        let Self {
            lattice,
            generation,
            pool,
            backend,
            ..
        } = self;
        let backend = *backend;
        pool.install(|| {
            for _ in 0..n {
                advance_generation(lattice, backend);
                *generation += 1;
                tracing::trace!(generation = *generation, "step complete");
            }
        });
    }

    /// Trim bits past the last real cell and mark the run complete.
    pub fn finish(&mut self) {
        self.lattice.apply_tail_mask();
        self.state = RunState::Done;
    }

    /// Advance `steps` generations and return the final population.
    ///
    /// An empty lattice goes straight to `Done` and reports 0.
    pub fn run(&mut self, steps: u64) -> u64 {
        if self.lattice.is_empty() {
            self.state = RunState::Done;
            tracing::debug!(steps, "empty lattice, skipping simulation");
            return 0;
        }
        if steps > 0 {
            self.step_n(steps);
        }
        self.finish();
        let population = self.population();
        tracing::debug!(
            generation = self.generation,
            population,
            "run complete"
        );
        population
    }

    pub fn population(&self) -> u64 {
        if self.lattice.is_empty() {
            return 0;
        }
        self.pool
            .install(|| population::population_parallel(&self.lattice))
    }

    pub fn get_cell(&self, index: usize) -> bool {
        self.lattice.get_cell(index)
    }

    pub fn for_each_live<F: FnMut(usize)>(&self, f: F) {
        self.lattice.for_each_live(f);
    }

    pub fn lattice(&self) -> &PackedLattice {
        &self.lattice
    }

    pub fn len(&self) -> usize {
        self.lattice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lattice.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn backend(&self) -> KernelBackend {
        self.backend
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}
