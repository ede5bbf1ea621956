use rand::RngCore;
use rand::SeedableRng;
use rule110_turbo::rule110::{BLOCK_BITS, PackedLattice, Rule110};
use std::time::Instant;

fn bench_engine(len: usize, density: f64, iterations: u64) -> (f64, u64) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_1234_ABCD_EF01);
    let threshold = (u64::MAX as f64 * density) as u64;
    let lattice = PackedLattice::build(len, (0..len).map(|_| rng.next_u64() <= threshold));
    let mut engine = Rule110::new(lattice).expect("failed to build engine");

    let start = Instant::now();
    engine.step_n(iterations);
    let duration = start.elapsed();

    let total_ms = duration.as_secs_f64() * 1000.0;
    let pop = engine.population();
    (total_ms, pop)
}

fn main() {
    let scales: &[(usize, u64)] = &[
        (1 << 14, 20_000), // 64 blocks, serial kernel
        (1 << 18, 5_000),  // 1024 blocks
        (1 << 22, 1_000),  // 16384 blocks
        (1 << 26, 100),    // 262144 blocks
        (1 << 30, 10),     // 4M blocks, 256 MiB per buffer
    ];

    println!(
        "{:<12} {:>10} {:>10} {:>12} {:>12} {:>12}",
        "Cells", "Blocks", "Iters", "Total(ms)", "Avg(ms)", "Gcells/s"
    );
    println!("{}", "-".repeat(72));

    for &(len, iters) in scales {
        let blocks = len.div_ceil(BLOCK_BITS);
        let (total_ms, _pop) = bench_engine(len, 0.42, iters);
        let avg_ms = total_ms / iters as f64;
        let gcells = (len as f64 * iters as f64) / (total_ms * 1e6);
        println!(
            "{:<12} {:>10} {:>10} {:>12.1} {:>12.4} {:>12.2}",
            len, blocks, iters, total_ms, avg_ms, gcells
        );
    }
}
