/// A hardware event sampled by `perf stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Name perf prints next to the count
    pub name: &'static str,
    /// Column header in the result table
    pub column: &'static str,
    /// Argument passed to `perf stat -e`
    pub selector: &'static str,
}

/// Number of sampled events.
pub const EVENT_COUNT: usize = 15;

/// The sampled events, in report order.
///
/// Raw encodings are pinned to the MEM_LOAD_RETIRED / ICACHE_64B events of
/// Skylake-SP and later. `perf stat` prints one line per event in exactly
/// this order, which is what the report parser relies on.
pub static EVENTS: [Event; EVENT_COUNT] = [
    Event {
        name: "L1-dcache-hits",
        column: "L1-DCACHE-HITS",
        selector: "cpu/config=0x5201d1,name=L1-dcache-hits/",
    },
    Event {
        name: "L1-dcache-misses",
        column: "L1-DCACHE-MISSES",
        selector: "cpu/config=0x5308d1,name=L1-dcache-misses/",
    },
    Event {
        name: "L1-icache-hits",
        column: "L1-ICACHE-HITS",
        selector: "cpu/config=0x530183,name=L1-icache-hits/",
    },
    Event {
        name: "L1-icache-misses",
        column: "L1-ICACHE-MISSES",
        selector: "cpu/config=0x530283,name=L1-icache-misses/",
    },
    Event {
        name: "L2-hits",
        column: "L2-HITS",
        selector: "cpu/config=0x5302d1,name=L2-hits/",
    },
    Event {
        name: "L2-misses",
        column: "L2-MISSES",
        selector: "cpu/config=0x5310d1,name=L2-misses/",
    },
    Event {
        name: "L3-hits",
        column: "L3-HITS",
        selector: "cpu/config=0x5304d1,name=L3-hits/",
    },
    Event {
        name: "L3-misses",
        column: "L3-MISSES",
        selector: "cpu/config=0x5320d1,name=L3-misses/",
    },
    Event {
        name: "dTLB-loads",
        column: "DTLB-LOADS",
        selector: "dTLB-loads",
    },
    Event {
        name: "dTLB-load-misses",
        column: "DTLB-LOAD-MISSES",
        selector: "dTLB-load-misses",
    },
    Event {
        name: "iTLB-loads",
        column: "ITLB-LOADS",
        selector: "iTLB-loads",
    },
    Event {
        name: "iTLB-load-misses",
        column: "ITLB-LOAD-MISSES",
        selector: "iTLB-load-misses",
    },
    Event {
        name: "page-faults",
        column: "PAGE-FAULTS",
        selector: "page-faults",
    },
    Event {
        name: "minor-faults",
        column: "MINOR-FAULTS",
        selector: "minor-faults",
    },
    Event {
        name: "major-faults",
        column: "MAJOR-FAULTS",
        selector: "major-faults",
    },
];

/// `-e <selector>` pairs for every event, in report order.
pub fn perf_args() -> Vec<&'static str> {
    EVENTS.iter().flat_map(|e| ["-e", e.selector]).collect()
}
