use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rule110_turbo::rule110::{KernelBackend, PackedLattice, Rule110, Rule110Config, RunState};

fn engine_from(pattern: &str) -> Rule110 {
    let lattice = PackedLattice::build(pattern.len(), pattern.chars().map(|c| c == '1'));
    Rule110::new(lattice).expect("build engine")
}

fn collect_live(engine: &Rule110) -> HashSet<usize> {
    let mut out = HashSet::new();
    engine.for_each_live(|i| {
        out.insert(i);
    });
    out
}

fn render(engine: &Rule110) -> String {
    (0..engine.len())
        .map(|i| if engine.get_cell(i) { '1' } else { '0' })
        .collect()
}

fn step_naive(cells: &HashSet<usize>, len: usize) -> HashSet<usize> {
    let mut next = HashSet::new();
    for i in 0..len {
        let left = i > 0 && cells.contains(&(i - 1));
        let center = cells.contains(&i);
        let right = cells.contains(&(i + 1)) && i + 1 < len;
        let next_alive = match (left, center, right) {
            (true, true, true) => false,
            (true, false, false) => false,
            (false, false, false) => false,
            _ => true,
        };
        if next_alive {
            next.insert(i);
        }
    }
    next
}

#[test]
fn pair_grows_to_three_after_one_step() {
    let mut engine = engine_from("00011000");
    assert_eq!(engine.run(1), 3);
    assert_eq!(render(&engine), "00111000");
}

#[test]
fn zero_steps_reports_initial_population() {
    let mut engine = engine_from("00011000");
    assert_eq!(engine.run(0), 2);
    assert_eq!(engine.generation(), 0);
    assert_eq!(engine.state(), RunState::Done);
}

#[test]
fn lone_cell_is_a_fixed_point() {
    for steps in [0u64, 1, 2, 7, 100] {
        let mut engine = engine_from("1");
        assert_eq!(engine.run(steps), 1, "steps={steps}");
        assert!(engine.get_cell(0));
    }
}

#[test]
fn empty_lattice_reports_zero() {
    for steps in [0u64, 1, 50] {
        let mut engine = Rule110::new(PackedLattice::empty(0)).expect("build engine");
        assert_eq!(engine.run(steps), 0);
        assert!(engine.is_empty());
    }
}

#[test]
fn right_edge_cell_never_spills_out() {
    // Live cell at the last index: the virtual cell `len` sees `100` and stays dead.
    for len in [1usize, 63, 64, 65, 255, 256, 257, 1024] {
        let lattice = PackedLattice::from_live_cells(len, [len - 1]);
        let mut engine = Rule110::new(lattice).expect("build engine");
        for _ in 0..5 {
            engine.step();
            assert!(engine.lattice().outside_is_dead(), "len={len}");
            assert!(engine.get_cell(len - 1), "len={len}");
        }
    }
}

#[test]
fn left_edge_growth_is_clipped() {
    // Rule 110 grows leftward; a live cell 0 would light cell -1 without the clamp.
    for len in [2usize, 64, 65, 300] {
        let lattice = PackedLattice::from_live_cells(len, [0, 1]);
        let mut engine = Rule110::new(lattice).expect("build engine");
        engine.step_n(10);
        assert!(engine.lattice().outside_is_dead(), "len={len}");
        assert!(engine.get_cell(0), "len={len}");
    }
}

#[test]
fn growth_crosses_word_and_block_boundaries() {
    // Seed right after a block boundary; growth must carry into the previous block.
    let len = 600;
    let lattice = PackedLattice::from_live_cells(len, [256, 257]);
    let mut engine = Rule110::new(lattice).expect("build engine");
    let mut naive: HashSet<usize> = [256, 257].into_iter().collect();
    for _ in 0..80 {
        engine.step();
        naive = step_naive(&naive, len);
        assert_eq!(collect_live(&engine), naive);
    }
    assert!(collect_live(&engine).iter().any(|&i| i < 192));
}

#[test]
fn matches_naive_on_small_random_seed() {
    let len = 333;
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xBADC0FFEE);
    let bits: Vec<bool> = (0..len).map(|_| rng.random::<f64>() < 0.33).collect();
    let mut engine =
        Rule110::new(PackedLattice::build(len, bits.iter().copied())).expect("build engine");
    let mut naive: HashSet<usize> = (0..len).filter(|&i| bits[i]).collect();

    for _ in 0..40 {
        assert_eq!(collect_live(&engine), naive);
        engine.step();
        naive = step_naive(&naive, len);
    }
    assert_eq!(engine.run(0), naive.len() as u64);
}

#[test]
fn deterministic_across_thread_counts() {
    let len = 300_000;
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xD37E_A515);
    let bits: Vec<bool> = (0..len).map(|_| rng.random::<f64>() < 0.3).collect();

    let run = |threads: usize, backend: KernelBackend| {
        let config = Rule110Config::default()
            .thread_count(threads)
            .kernel(backend);
        let mut engine = Rule110::with_config(PackedLattice::build(len, bits.iter().copied()), config)
            .expect("build engine");
        let pop = engine.run(25);
        (pop, collect_live(&engine))
    };

    let (pop1, live1) = run(1, KernelBackend::Scalar);
    let (pop4, live4) = run(4, KernelBackend::Scalar);
    let (pop_avx, live_avx) = run(3, KernelBackend::Avx2);

    assert_eq!(pop1, pop4);
    assert_eq!(live1, live4);
    assert_eq!(pop1, pop_avx);
    assert_eq!(live1, live_avx);
}

#[test]
fn full_lattice_keeps_only_its_ends() {
    // Interior cells see `111` and die; the ends see `011` and `110` against dead cells.
    let mut engine = Rule110::new(PackedLattice::build(130, std::iter::repeat(true)))
        .expect("build engine");
    engine.step();
    let live: Vec<usize> = {
        let mut v = Vec::new();
        engine.for_each_live(|i| v.push(i));
        v
    };
    assert_eq!(live, vec![0, 129]);
}

#[test]
fn repeated_runs_accumulate_generations() {
    let mut engine = engine_from("0000000011");
    let first = engine.run(3);
    let second = engine.run(2);
    assert_eq!(engine.generation(), 5);

    let mut fresh = engine_from("0000000011");
    assert_eq!(fresh.run(3), first);
    assert_eq!(fresh.run(2), second);
}
