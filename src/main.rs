#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rule110_turbo::rule110::{KernelBackend, Rule110, Rule110Config};
use rule110_turbo::seed::{Seed, SeedPolicy};
use tracing_subscriber::EnvFilter;

/// Evolve a seed lattice under Rule 110 and print the final live-cell count.
#[derive(Parser, Debug)]
#[command(name = "rule110-turbo", version)]
struct Args {
    /// Seed file: a cell count followed by a token of that many 0/1 characters.
    #[arg(long, value_name = "PATH")]
    init: PathBuf,

    /// Number of generations to simulate.
    #[arg(long, value_name = "STEPS", default_value_t = 10)]
    iter: u64,

    /// Worker threads (default: physical cores, bandwidth capped).
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Upper bound on worker threads.
    #[arg(long, value_name = "N")]
    max_threads: Option<usize>,

    /// Kernel backend (default: AVX2 when available).
    #[arg(long, value_enum)]
    kernel: Option<KernelArg>,

    /// Accept malformed seeds: non-'1' characters are dead, short tokens zero-fill.
    #[arg(long)]
    lenient: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KernelArg {
    Scalar,
    Avx2,
}

impl From<KernelArg> for KernelBackend {
    fn from(arg: KernelArg) -> Self {
        match arg {
            KernelArg::Scalar => KernelBackend::Scalar,
            KernelArg::Avx2 => KernelBackend::Avx2,
        }
    }
}

impl Args {
    fn engine_config(&self) -> Rule110Config {
        let mut config = Rule110Config::default();
        if let Some(n) = self.threads {
            config = config.thread_count(n);
        }
        if let Some(n) = self.max_threads {
            config = config.max_threads(n);
        }
        if let Some(kernel) = self.kernel {
            config = config.kernel(kernel.into());
        }
        config
    }

    fn seed_policy(&self) -> SeedPolicy {
        if self.lenient {
            SeedPolicy::Lenient
        } else {
            SeedPolicy::Strict
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RULE110_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<u64> {
    let seed = Seed::from_path(&args.init, args.seed_policy())
        .with_context(|| format!("loading seed {}", args.init.display()))?;
    tracing::info!(
        len = seed.len,
        live = seed.live_count(),
        steps = args.iter,
        "seed loaded"
    );

    let mut engine = Rule110::with_config(seed.into_lattice(), args.engine_config())
        .context("starting rule 110 engine")?;
    Ok(engine.run(args.iter))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            // Help and version output go to stdout; usage errors to stderr.
            let _ = err.print();
            return code;
        }
    };
    init_tracing();

    match run(&args) {
        Ok(population) => {
            println!("{population}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
