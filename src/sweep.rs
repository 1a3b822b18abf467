use crate::collector::{Collector, ParameterPoint};
use crate::error::{Result, SweepError};
use crate::table::{Format, ResultTable, Row};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Kernel implementations, indexed by the mode argument of the kernel binary.
pub const MODES: [&str; 8] = [
    "oneDNN dynamic",
    "oneDNN static",
    "oneDNN sgemm",
    "MARLIN",
    "Intel MKL",
    "LIBXSMM",
    "Eigen",
    "OpenBLAS",
];

/// Upper bound on rows allocated before the first run.
const PRESIZE_LIMIT: usize = 1 << 16;

pub fn mode_label(mode: usize) -> Option<&'static str> {
    MODES.get(mode).copied()
}

/// Half-open `start..end` stepped by `step`.
///
/// Holds `(end - start) / step` points; a trailing partial step is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub start: u64,
    pub end: u64,
    pub step: u64,
}

impl SizeRange {
    pub fn new(start: u64, end: u64, step: u64) -> Self {
        Self { start, end, step }
    }

    pub fn count(&self) -> usize {
        if self.step == 0 || self.end <= self.start {
            return 0;
        }
        usize::try_from((self.end - self.start) / self.step).unwrap_or(usize::MAX)
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> {
        let Self { start, step, .. } = *self;
        (0..self.count() as u64).map(move |i| start + i * step)
    }

    fn validate(&self, dim: &str) -> Result<()> {
        if self.step == 0 {
            return Err(SweepError::InvalidSpec(format!("{dim} step must be non-zero")));
        }
        if self.start >= self.end {
            return Err(SweepError::InvalidSpec(format!(
                "{dim} range {}..{} is empty",
                self.start, self.end
            )));
        }
        if self.start == 0 {
            return Err(SweepError::InvalidSpec(format!("{dim} must start above zero")));
        }
        Ok(())
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.start, self.end, self.step)
    }
}

/// A problem dimension that is either held fixed or swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Fixed(u64),
    Swept(SizeRange),
}

impl Axis {
    pub fn count(&self) -> usize {
        match self {
            Axis::Fixed(_) => 1,
            Axis::Swept(r) => r.count(),
        }
    }

    pub fn values(&self) -> Vec<u64> {
        match self {
            Axis::Fixed(v) => vec![*v],
            Axis::Swept(r) => r.iter().collect(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Fixed(v) => write!(f, "{v}"),
            Axis::Swept(r) => write!(f, "{r}"),
        }
    }
}

/// The parameter space of one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSpec {
    pub m: SizeRange,
    pub n: Axis,
    pub k: u64,
    pub iterations: u64,
    pub sparsity: f64,
    /// Number of leading `MODES` to run.
    pub modes: usize,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            m: SizeRange::new(1, 51, 1),
            n: Axis::Swept(SizeRange::new(80, 120, 10)),
            k: 100,
            iterations: 1000,
            sparsity: 0.0,
            modes: MODES.len(),
        }
    }
}

impl SweepSpec {
    pub fn validate(&self) -> Result<()> {
        self.m.validate("M")?;
        match self.n {
            Axis::Swept(r) => r.validate("N")?,
            Axis::Fixed(0) => return Err(SweepError::InvalidSpec("N must be positive".into())),
            Axis::Fixed(_) => {}
        }
        if self.k == 0 {
            return Err(SweepError::InvalidSpec("K must be positive".into()));
        }
        if self.iterations == 0 {
            return Err(SweepError::InvalidSpec("iterations must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.sparsity) {
            return Err(SweepError::InvalidSpec(format!(
                "sparsity {} outside [0, 1]",
                self.sparsity
            )));
        }
        if self.modes == 0 || self.modes > MODES.len() {
            return Err(SweepError::InvalidSpec(format!(
                "modes must be within 1..={}",
                MODES.len()
            )));
        }
        if self.rows().is_none() {
            return Err(SweepError::InvalidSpec(format!(
                "{} M x {} N x {} modes overflows the row count",
                self.m.count(),
                self.n.count(),
                self.modes
            )));
        }
        Ok(())
    }

    /// Number of coordinates, or `None` if it does not fit in `usize`.
    pub fn rows(&self) -> Option<usize> {
        self.m
            .count()
            .checked_mul(self.n.count())?
            .checked_mul(self.modes)
    }

    /// Every coordinate in sweep order: N, then M, then mode.
    pub fn points(&self) -> impl Iterator<Item = ParameterPoint> + '_ {
        self.n.values().into_iter().flat_map(move |n| {
            self.m.iter().flat_map(move |m| {
                (0..self.modes).map(move |mode| ParameterPoint {
                    m,
                    n,
                    k: self.k,
                    iterations: self.iterations,
                    mode,
                    sparsity: self.sparsity,
                })
            })
        })
    }

    /// Output file name; it encodes every field of the spec.
    pub fn file_name(&self, format: Format) -> String {
        format!(
            "stats_{}_{}_{}_{}_{}_{}.{}",
            self.m,
            self.n,
            self.k,
            self.sparsity,
            self.iterations,
            self.modes,
            format.extension()
        )
    }
}

/// Drives a collector across a sweep.
pub struct Sweep<C> {
    collector: C,
    progress: bool,
}

impl<C: Collector> Sweep<C> {
    pub fn new(collector: C) -> Self {
        Self {
            collector,
            progress: false,
        }
    }

    /// Show a progress bar while sweeping.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Collect counters for every coordinate of `spec`.
    ///
    /// Stops at the first run that yields no usable report.
    pub fn run(&self, spec: &SweepSpec) -> Result<ResultTable> {
        spec.validate()?;
        let rows = spec.rows().unwrap_or(usize::MAX);
        info!(rows, m = %spec.m, n = %spec.n, k = spec.k, "starting sweep");

        let pb = if self.progress {
            ProgressBar::new(rows as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(ProgressStyle::default_bar().progress_chars("#> "));

        let mut table = ResultTable::with_capacity(rows.min(PRESIZE_LIMIT));
        for point in spec.points() {
            let counters = self
                .collector
                .collect(&point)
                .map_err(|source| SweepError::Collection { point, source })?;
            table.push(Row::new(&point, counters));
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(rows = table.len(), "sweep complete");
        Ok(table)
    }

    /// Run `spec` and write the table into `out_dir`.
    ///
    /// Nothing is written if the sweep fails.
    pub fn run_to_dir(&self, spec: &SweepSpec, out_dir: &Path, format: Format) -> Result<PathBuf> {
        let table = self.run(spec)?;
        let path = out_dir.join(spec.file_name(format));
        table.save(&path, format)?;
        info!(path = %path.display(), "results written");
        Ok(path)
    }
}
