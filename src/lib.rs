//! Hardware counter sweeps of a GEMM kernel binary under `perf stat`.
//!
//! A [`Sweep`] walks every (N, M, mode) coordinate of a [`SweepSpec`], asks a
//! [`Collector`] for the counters of that run and gathers them into a
//! [`ResultTable`], which is saved once the whole sweep succeeded.

pub mod collector;
pub mod counter;
pub mod error;
pub mod event;
pub mod report;
pub mod sweep;
pub mod table;

pub use collector::{CollectionError, Collector, ParameterPoint, PerfCollector};
pub use counter::{CounterValue, CounterVector};
pub use error::{Result, SweepError};
pub use event::{Event, EVENTS, EVENT_COUNT};
pub use report::{Report, ReportError};
pub use sweep::{mode_label, Axis, SizeRange, Sweep, SweepSpec, MODES};
pub use table::{Format, ResultTable, Row};
