//! Parser for the human-readable report printed by `perf stat`.
//!
//! Everything that depends on the report layout lives here. A report looks
//! like:
//!
//! ```text
//!  Performance counter stats for 'build/perf_marlin 1 80 100 1000 0 0':
//!
//!          1,234,567      L1-dcache-hits
//!    <not supported>      L1-icache-hits
//!          ...
//!        0.012345678 seconds time elapsed
//! ```
//!
//! Parsing is two-staged: [`Sections::locate`] finds the report and checks its
//! shape, then [`Sections::counters`] maps counter lines onto [`EVENTS`].

use crate::counter::{CounterValue, CounterVector};
use crate::event::{EVENTS, EVENT_COUNT};

pub const MARKER: &str = "Performance counter stats for";
const ELAPSED_SUFFIX: &str = "seconds time elapsed";

/// Header line, one line per event, elapsed line.
pub const MIN_LINES: usize = 1 + EVENT_COUNT + 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report marker \"{MARKER}\" not found in perf output")]
    MissingMarker,

    #[error("perf report truncated: expected at least {expected} lines, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("perf report has no \"{ELAPSED_SUFFIX}\" line after the counters")]
    MissingElapsed,

    #[error("perf report line {line} should report {expected}, got \"{text}\"")]
    Misaligned {
        line: usize,
        expected: &'static str,
        text: String,
    },
}

/// Parsed `perf stat` report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub counters: CounterVector,
    /// Wall-clock seconds, when perf printed a readable figure.
    pub elapsed: Option<f64>,
}

struct Sections<'a> {
    counters: &'a [&'a str],
    elapsed: &'a str,
}

impl<'a> Sections<'a> {
    fn locate(lines: &'a [&'a str]) -> Result<Self, ReportError> {
        if lines.len() < MIN_LINES {
            return Err(ReportError::Truncated {
                expected: MIN_LINES,
                found: lines.len(),
            });
        }
        let counters = &lines[1..=EVENT_COUNT];
        let elapsed = lines[EVENT_COUNT + 1..]
            .iter()
            .find(|l| l.ends_with(ELAPSED_SUFFIX))
            .ok_or(ReportError::MissingElapsed)?;
        Ok(Self { counters, elapsed })
    }

    fn counters(&self) -> Result<CounterVector, ReportError> {
        let mut values = [CounterValue::Missing; EVENT_COUNT];
        for (i, (line, event)) in self.counters.iter().zip(EVENTS.iter()).enumerate() {
            if !line.contains(event.name) {
                return Err(ReportError::Misaligned {
                    line: i + 1,
                    expected: event.name,
                    text: line.to_string(),
                });
            }
            values[i] = CounterValue::parse(leading_token(line));
        }
        Ok(CounterVector::new(values))
    }

    fn elapsed(&self) -> Option<f64> {
        leading_token(self.elapsed).parse().ok()
    }
}

fn leading_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Parse the combined output of a `perf stat` run.
pub fn parse(output: &str) -> Result<Report, ReportError> {
    let (_, body) = output
        .split_once(MARKER)
        .ok_or(ReportError::MissingMarker)?;
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let sections = Sections::locate(&lines)?;
    Ok(Report {
        counters: sections.counters()?,
        elapsed: sections.elapsed(),
    })
}
