#![forbid(unsafe_code)]

//! Command-line driver: runs the probability sweeps for every IPID selection
//! method and writes `rate,probability` CSV curves for downstream plotting.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ipid_core::{DiskCache, IdSpace, SweepConfig};
use ipid_prob::sweep::{self, SweepParams};

#[derive(Parser)]
#[command(name = "ipid-survey", about = "IPID selection method probability survey")]
struct Cli {
    /// Optional TOML sweep configuration; flags override file values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of bucketed-counter trials per rate.
    #[arg(short = 'T', long)]
    trials: Option<u64>,

    /// Number of bucketed-counter next-ID samples per rate.
    #[arg(short = 'S', long)]
    samples: Option<u64>,

    /// Number of system ticks per unit time.
    #[arg(short = 'K', long)]
    ticks_per_time: Option<u32>,

    /// Seed for random number generation.
    #[arg(short = 'R', long)]
    seed: Option<u64>,

    /// Number of workers to parallelize over.
    #[arg(short = 'P', long)]
    workers: Option<usize>,

    /// Directory for cached result arrays.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Directory for the emitted CSV curves.
    #[arg(long, default_value = "curves")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collision probability curves for every selection method.
    Collisions,
    /// Adversarial next-ID guess probability curves.
    Security {
        /// Number of identifiers the adversary gets to guess.
        #[arg(short = 'g', long, default_value_t = 1)]
        guesses: u64,
    },
}

fn load_config(cli: &Cli) -> Result<SweepConfig> {
    let mut cfg = match &cli.config {
        Some(path) => SweepConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SweepConfig::default(),
    };
    if let Some(v) = cli.trials {
        cfg.trials = v;
    }
    if let Some(v) = cli.samples {
        cfg.samples = v;
    }
    if let Some(v) = cli.ticks_per_time {
        cfg.ticks_per_time = v;
    }
    if let Some(v) = cli.seed {
        cfg.seed = v;
    }
    if let Some(v) = cli.workers {
        cfg.workers = v;
    }
    if let Some(v) = &cli.cache_dir {
        cfg.cache_dir = v.clone();
    }
    Ok(cfg)
}

fn write_curve(dir: &Path, name: &str, rates: &[f64], probs: &[f64]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.csv"));
    let mut out = BufWriter::new(File::create(&path)?);
    writeln!(out, "rate,probability")?;
    for (rate, prob) in rates.iter().zip(probs) {
        writeln!(out, "{rate:e},{prob:e}")?;
    }
    info!(curve = name, path = %path.display(), "wrote curve");
    Ok(())
}

fn run_collisions(cfg: &SweepConfig, out_dir: &Path) -> Result<()> {
    let space = IdSpace::IPID;
    let cache = DiskCache::new(&cfg.cache_dir);
    let rates = cfg.rates();
    let params = SweepParams {
        trials: cfg.trials,
        ticks_per_time: cfg.ticks_per_time,
        seed: cfg.seed,
        workers: cfg.workers,
    };

    write_curve(out_dir, "global_inc", &rates, &sweep::global_collision_sweep(space, &rates))?;
    write_curve(
        out_dir,
        "per_connection",
        &rates,
        &sweep::per_connection_collision_sweep(space, &rates),
    )?;
    write_curve(
        out_dir,
        "per_destination",
        &rates,
        &sweep::per_destination_collision_sweep(space, &rates),
    )?;
    write_curve(
        out_dir,
        "per_bucket",
        &rates,
        &sweep::bucket_collision_sweep(&cache, space, &rates, &params)?,
    )?;
    // Reservation counts shipped by macOS (2^12), FreeBSD (2^13), OpenBSD (2^15).
    for reserved in [4096u32, 8192, 32_768] {
        let probs = sweep::reserved_collision_sweep(&cache, space, &rates, reserved)?;
        write_curve(out_dir, &format!("prng_k{reserved}"), &rates, &probs)?;
    }
    Ok(())
}

fn run_security(cfg: &SweepConfig, out_dir: &Path, guesses: u64) -> Result<()> {
    let space = IdSpace::IPID;
    let cache = DiskCache::new(&cfg.cache_dir);
    let rates = cfg.rates();
    let params = SweepParams {
        trials: cfg.samples,
        ticks_per_time: cfg.ticks_per_time,
        seed: cfg.seed,
        workers: cfg.workers,
    };
    let g = guesses as usize;

    let global = sweep::global_guess_sweep(&cache, space, &rates, g)?;
    write_curve(out_dir, "global_inc", &rates, &global)?;
    write_curve(
        out_dir,
        "per_connection",
        &rates,
        &sweep::per_connection_guess_sweep(space, &rates, guesses),
    )?;
    // Per-destination shares the global curve; resource scaling happens when
    // the curve is plotted against scaled rates.
    let per_dest = sweep::per_destination_guess_sweep(&cache, space, &rates, g)?;
    write_curve(out_dir, "per_destination", &rates, &per_dest)?;
    write_curve(
        out_dir,
        "per_destination_worst",
        &rates,
        &sweep::worst_case_envelope(&per_dest),
    )?;

    let bucket = sweep::bucket_guess_sweep(&cache, space, &rates, &params, g)?;
    write_curve(out_dir, "per_bucket", &rates, &bucket)?;
    write_curve(
        out_dir,
        "per_bucket_worst",
        &rates,
        &sweep::worst_case_envelope(&bucket),
    )?;

    for reserved in [0u32, 8192, 32_768] {
        let probs = sweep::reserved_guess_sweep(space, &rates, reserved, guesses);
        write_curve(out_dir, &format!("prng_k{reserved}"), &rates, &probs)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    match cli.command {
        Command::Collisions => run_collisions(&cfg, &cli.out_dir.join("collisions"))?,
        Command::Security { guesses } => {
            // The security sweep spans a wider rate range than collisions.
            let mut cfg = cfg;
            if cli.config.is_none() {
                cfg.rate_exp_low = -28.0;
                cfg.rate_exp_high = 26.0;
                cfg.rate_points = 2000;
            }
            run_security(&cfg, &cli.out_dir.join("security"), guesses)?
        }
    }
    Ok(())
}
