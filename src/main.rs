use anyhow::{Context, Result};
use clap::Parser;
use perf_sweep::{Axis, Format, PerfCollector, SizeRange, Sweep, SweepSpec};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sweep a GEMM kernel over problem sizes and implementations under `perf stat`.
///
/// Without arguments this runs M in 1..51, N in 80..120 step 10, K=100 over
/// all eight modes.
#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    #[clap(long, default_value_t = 1)]
    m_start: u64,

    #[clap(long, default_value_t = 51)]
    m_end: u64,

    #[clap(long, default_value_t = 1)]
    m_step: u64,

    #[clap(long, default_value_t = 80)]
    n_start: u64,

    #[clap(long, default_value_t = 120)]
    n_end: u64,

    #[clap(long, default_value_t = 10)]
    n_step: u64,

    /// Hold N fixed instead of sweeping it
    #[clap(short, long)]
    n: Option<u64>,

    #[clap(short, long, default_value_t = 100)]
    k: u64,

    #[clap(short, long, default_value_t = 1000)]
    iterations: u64,

    #[clap(short, long, default_value_t = 0.0)]
    sparsity: f64,

    /// Number of kernel implementations to run, from mode 0
    #[clap(long, default_value_t = 8)]
    modes: usize,

    #[clap(long, default_value = "build/perf_marlin")]
    kernel: PathBuf,

    #[clap(long, default_value = "perf")]
    perf: PathBuf,

    #[clap(short, long, default_value = "build/results")]
    out_dir: PathBuf,

    #[clap(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Hide the progress bar
    #[clap(short, long)]
    quiet: bool,
}

impl Args {
    fn spec(&self) -> SweepSpec {
        SweepSpec {
            m: SizeRange::new(self.m_start, self.m_end, self.m_step),
            n: match self.n {
                Some(n) => Axis::Fixed(n),
                None => Axis::Swept(SizeRange::new(self.n_start, self.n_end, self.n_step)),
            },
            k: self.k,
            iterations: self.iterations,
            sparsity: self.sparsity,
            modes: self.modes,
        }
    }
}

/// `RUST_LOG` when it is set and valid, `info` otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let args = Args::parse();
    let spec = args.spec();
    let sweep = Sweep::new(PerfCollector::new(&args.perf, &args.kernel))
        .with_progress(!args.quiet && std::io::stderr().is_terminal());

    let path = sweep
        .run_to_dir(&spec, &args.out_dir, args.format)
        .context("sweep aborted")?;
    println!("{}", path.display());
    Ok(())
}
