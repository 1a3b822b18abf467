//! End-to-end sweeps against a scripted collector.

use perf_sweep::{
    Axis, CollectionError, Collector, CounterValue, CounterVector, Format, ParameterPoint,
    ReportError, SizeRange, Sweep, SweepError, SweepSpec, EVENT_COUNT,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;

/// Returns counters derived from the point; fails on the `fail_at`-th call.
#[derive(Default)]
struct Scripted {
    calls: RefCell<Vec<ParameterPoint>>,
    fail_at: Option<usize>,
}

impl Scripted {
    fn failing_at(call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::default()
        }
    }
}

impl Collector for Scripted {
    fn collect(&self, point: &ParameterPoint) -> Result<CounterVector, CollectionError> {
        let mut calls = self.calls.borrow_mut();
        calls.push(*point);
        if Some(calls.len()) == self.fail_at {
            return Err(ReportError::MissingMarker.into());
        }
        let mut values = [CounterValue::Present(point.m * point.n); EVENT_COUNT];
        if point.mode == 2 {
            values[4] = CounterValue::Missing;
        }
        Ok(CounterVector::new(values))
    }
}

#[test]
fn default_sweep_has_one_row_per_coordinate() {
    let collector = Scripted::default();
    let table = Sweep::new(&collector).run(&SweepSpec::default()).unwrap();

    assert_eq!(table.len(), 1600);
    let unique: HashSet<_> = table.rows().iter().map(|r| (r.m, r.n, r.mode)).collect();
    assert_eq!(unique.len(), 1600);

    let keys: Vec<_> = table.rows().iter().map(|r| (r.n, r.m, r.mode)).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    assert_eq!(collector.calls.borrow().len(), 1600);
    assert!(table.rows().iter().all(|r| r.k == 100));
    assert_eq!(table.rows()[0].label(), "oneDNN dynamic");
    assert_eq!(table.rows()[1599].label(), "OpenBLAS");
    assert_eq!((table.rows()[1599].m, table.rows()[1599].n), (50, 110));
}

#[test]
fn points_carry_fixed_fields() {
    let collector = Scripted::default();
    let spec = SweepSpec {
        m: SizeRange::new(4, 8, 2),
        n: Axis::Fixed(32),
        k: 7,
        iterations: 3,
        sparsity: 0.5,
        modes: 1,
    };
    Sweep::new(&collector).run(&spec).unwrap();
    let calls = collector.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        ParameterPoint {
            m: 6,
            n: 32,
            k: 7,
            iterations: 3,
            mode: 0,
            sparsity: 0.5
        }
    );
}

#[test]
fn rerun_overwrites_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let spec = SweepSpec {
        m: SizeRange::new(1, 4, 1),
        n: Axis::Swept(SizeRange::new(80, 100, 10)),
        ..SweepSpec::default()
    };

    let first = Sweep::new(&Scripted::default())
        .run_to_dir(&spec, dir.path(), Format::Csv)
        .unwrap();
    let before = fs::read(&first).unwrap();
    let second = Sweep::new(&Scripted::default())
        .run_to_dir(&spec, dir.path(), Format::Csv)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

    let text = String::from_utf8(before).unwrap();
    assert_eq!(text.lines().count(), 1 + 3 * 2 * 8);
    // mode 2 has L2-HITS missing
    let sgemm_row = text.lines().nth(3).unwrap();
    assert_eq!(sgemm_row, "1,80,100,oneDNN sgemm,80,80,80,80,,80,80,80,80,80,80,80,80,80,80");
}

#[test]
fn fatal_collection_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let collector = Scripted::failing_at(3);
    let err = Sweep::new(&collector)
        .run_to_dir(&SweepSpec::default(), dir.path(), Format::Csv)
        .unwrap_err();

    assert_eq!(collector.calls.borrow().len(), 3);
    match &err {
        SweepError::Collection { point, .. } => {
            assert_eq!((point.m, point.n, point.mode), (1, 80, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("M=1 N=80 K=100 iterations=1000 mode=2 (oneDNN sgemm)"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn invalid_spec_runs_nothing() {
    let collector = Scripted::default();
    let spec = SweepSpec {
        m: SizeRange::new(1, 51, 0),
        ..SweepSpec::default()
    };
    let err = Sweep::new(&collector).run(&spec).unwrap_err();
    assert!(matches!(err, SweepError::InvalidSpec(_)));
    assert!(collector.calls.borrow().is_empty());
}

#[test]
fn oversized_sweep_fails_before_running() {
    let collector = Scripted::default();
    let spec = SweepSpec {
        m: SizeRange::new(1, u64::MAX, 1),
        n: Axis::Fixed(1),
        modes: 8,
        ..SweepSpec::default()
    };
    let err = Sweep::new(&collector).run(&spec).unwrap_err();
    assert!(matches!(err, SweepError::InvalidSpec(_)), "{err}");
    assert!(collector.calls.borrow().is_empty());
}

#[test]
fn json_output_uses_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let spec = SweepSpec {
        m: SizeRange::new(2, 3, 1),
        n: Axis::Fixed(5),
        modes: 3,
        ..SweepSpec::default()
    };
    let path = Sweep::new(&Scripted::default())
        .run_to_dir(&spec, dir.path(), Format::Json)
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "stats_2_3_1_5_100_0_1000_3.json");

    let v: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["MODE"], "oneDNN sgemm");
    assert!(rows[2]["L2-HITS"].is_null());
    assert_eq!(rows[2]["L2-MISSES"], 10);
}
