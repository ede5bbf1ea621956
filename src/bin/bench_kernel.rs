//! Scalar vs AVX2 kernel timing on one random lattice.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rand::RngCore;
use rand::SeedableRng;
use rule110_turbo::rule110::{KernelBackend, PackedLattice, Rule110, Rule110Config, avx2_available};

#[derive(Parser, Debug)]
#[command(name = "bench_kernel")]
struct Args {
    /// Lattice length in cells.
    #[arg(long, default_value_t = 1 << 24)]
    len: usize,

    /// Fraction of cells alive in the seed.
    #[arg(long, default_value_t = 0.42)]
    density: f64,

    /// Untimed generations before measuring.
    #[arg(long, default_value_t = 3)]
    warmup: u64,

    /// Timed generations.
    #[arg(long, default_value_t = 200)]
    iters: u64,

    /// RNG seed, decimal or `0x` hex.
    #[arg(long, default_value = "0xA5A55EED77881122", value_parser = parse_seed)]
    seed: u64,

    #[arg(long)]
    threads: Option<usize>,

    /// Emit one JSON object instead of text lines.
    #[arg(long)]
    json: bool,
}

fn parse_seed(value: &str) -> Result<u64, std::num::ParseIntError> {
    match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

struct Timing {
    backend: KernelBackend,
    total_ms: f64,
    avg_ms: f64,
    population: u64,
}

impl Timing {
    fn json(&self) -> String {
        format!(
            "{{\"total_ms\":{:.6},\"avg_ms\":{:.6},\"population\":{}}}",
            self.total_ms, self.avg_ms, self.population
        )
    }

    fn line(&self) -> String {
        format!(
            "{:?}: total_ms={:.6}, avg_ms={:.6}, population={}",
            self.backend, self.total_ms, self.avg_ms, self.population
        )
    }
}

fn time_backend(args: &Args, backend: KernelBackend) -> Result<Timing> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed);
    let threshold = (u64::MAX as f64 * args.density) as u64;
    let lattice = PackedLattice::build(args.len, (0..args.len).map(|_| rng.next_u64() <= threshold));

    let mut config = Rule110Config::default().kernel(backend);
    if let Some(threads) = args.threads {
        config = config.thread_count(threads);
    }
    let mut engine =
        Rule110::with_config(lattice, config).with_context(|| format!("building {backend:?} engine"))?;

    engine.step_n(args.warmup);
    let start = Instant::now();
    engine.step_n(args.iters);
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok(Timing {
        backend,
        total_ms,
        avg_ms: total_ms / args.iters.max(1) as f64,
        population: engine.population(),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    let scalar = time_backend(&args, KernelBackend::Scalar)?;
    let avx2 = if avx2_available() {
        Some(time_backend(&args, KernelBackend::Avx2)?)
    } else {
        None
    };
    let speedup = avx2.as_ref().map(|avx2| scalar.avg_ms / avx2.avg_ms);

    if args.json {
        let avx2_json = avx2.as_ref().map_or_else(|| "null".to_owned(), Timing::json);
        let speedup_json = speedup.map_or_else(|| "null".to_owned(), |s| format!("{s:.6}"));
        println!(
            "{{\"len\":{},\"density\":{},\"warmup\":{},\"iters\":{},\"seed\":{},\"threads\":{},\"scalar\":{},\"avx2\":{avx2_json},\"speedup\":{speedup_json}}}",
            args.len,
            args.density,
            args.warmup,
            args.iters,
            args.seed,
            args.threads.unwrap_or(0),
            scalar.json(),
        );
        return Ok(());
    }

    println!("{}", scalar.line());
    match (avx2, speedup) {
        (Some(avx2), Some(speedup)) => println!("{}, speedup={speedup:.3}x", avx2.line()),
        _ => println!("Avx2: unsupported"),
    }
    Ok(())
}
