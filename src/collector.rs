use crate::counter::CounterVector;
use crate::event::perf_args;
use crate::report::{self, ReportError};
use crate::sweep::mode_label;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Coordinates of one instrumented run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterPoint {
    pub m: u64,
    pub n: u64,
    pub k: u64,
    pub iterations: u64,
    pub mode: usize,
    pub sparsity: f64,
}

impl ParameterPoint {
    /// Kernel arguments, in the order the kernel binary expects them.
    pub fn args(&self) -> [String; 6] {
        [
            self.m.to_string(),
            self.n.to_string(),
            self.k.to_string(),
            self.iterations.to_string(),
            self.mode.to_string(),
            self.sparsity.to_string(),
        ]
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M={} N={} K={} iterations={} mode={} ({}) sparsity={}",
            self.m,
            self.n,
            self.k,
            self.iterations,
            self.mode,
            mode_label(self.mode).unwrap_or("unknown"),
            self.sparsity
        )
    }
}

/// A run that produced no usable report at all.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Something that turns a parameter point into counter readings.
pub trait Collector {
    fn collect(&self, point: &ParameterPoint) -> Result<CounterVector, CollectionError>;
}

impl<C: Collector + ?Sized> Collector for &C {
    fn collect(&self, point: &ParameterPoint) -> Result<CounterVector, CollectionError> {
        (**self).collect(point)
    }
}

/// Runs the kernel binary under `perf stat`.
#[derive(Debug, Clone)]
pub struct PerfCollector {
    perf: PathBuf,
    kernel: PathBuf,
}

impl PerfCollector {
    pub fn new(perf: impl Into<PathBuf>, kernel: impl Into<PathBuf>) -> Self {
        Self {
            perf: perf.into(),
            kernel: kernel.into(),
        }
    }

    fn command(&self, point: &ParameterPoint) -> Command {
        let mut cmd = Command::new(&self.perf);
        // counts are grouped with ',' only in the C locale
        cmd.env("LC_ALL", "C")
            .arg("stat")
            .args(perf_args())
            .arg(&self.kernel)
            .args(point.args());
        cmd
    }
}

impl Default for PerfCollector {
    fn default() -> Self {
        Self::new("perf", "build/perf_marlin")
    }
}

impl Collector for PerfCollector {
    fn collect(&self, point: &ParameterPoint) -> Result<CounterVector, CollectionError> {
        let out = self
            .command(point)
            .output()
            .map_err(|source| CollectionError::Spawn {
                program: self.perf.display().to_string(),
                source,
            })?;
        if !out.status.success() {
            warn!(%point, status = %out.status, "perf exited unsuccessfully");
        }

        // perf writes its report to stderr, after the kernel's own stdout
        let mut combined = out.stdout;
        combined.extend_from_slice(&out.stderr);
        let text = String::from_utf8_lossy(&combined);

        let report = report::parse(&text)?;
        debug!(%point, elapsed = ?report.elapsed, "collected counters");
        for event in report.counters.missing() {
            warn!(%point, event = event.name, "counter not reported");
        }
        Ok(report.counters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn point() -> ParameterPoint {
        ParameterPoint {
            m: 1,
            n: 80,
            k: 100,
            iterations: 1000,
            mode: 3,
            sparsity: 0.25,
        }
    }

    #[test]
    fn kernel_args_are_positional() {
        assert_eq!(point().args(), ["1", "80", "100", "1000", "3", "0.25"]);
    }

    #[test]
    fn display_names_mode() {
        assert_eq!(
            point().to_string(),
            "M=1 N=80 K=100 iterations=1000 mode=3 (MARLIN) sparsity=0.25"
        );
    }

    #[test]
    fn command_wraps_kernel_in_perf_stat() {
        let c = PerfCollector::new("perf", "bin/kernel");
        let cmd = c.command(&point());
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), "perf");
        assert_eq!(args[0], "stat");
        assert_eq!(args.len(), 1 + 30 + 1 + 6);
        assert_eq!(args[31], "bin/kernel");
        assert_eq!(&args[32..], ["1", "80", "100", "1000", "3", "0.25"]);
    }

    #[test]
    fn command_pins_c_locale() {
        let cmd = PerfCollector::default().command(&point());
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.contains(&(OsStr::new("LC_ALL"), Some(OsStr::new("C")))), "{envs:?}");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let c = PerfCollector::new("/nonexistent/perf-sweep-perf", "kernel");
        let err = c.collect(&point()).unwrap_err();
        assert!(matches!(err, CollectionError::Spawn { .. }), "{err}");
    }
}
