//! End-to-end runs of the verification harness against scripted command
//! output captured from a real CXL-equipped machine.

use cxlcheck::error::{CheckError, CheckResult};
use cxlcheck::verify::compare::Metric;
use cxlcheck::verify::harness::{CommandRunner, Harness};

// ===============================================================================================
// Scripted Runner
// ===============================================================================================

/// Replays a fixed command/stdout script, asserting the harness issues the
/// expected commands in the expected order.
struct ScriptedRunner {
    script: Vec<(&'static str, &'static str)>,
    cursor: usize,
}

impl ScriptedRunner {
    fn new(script: Vec<(&'static str, &'static str)>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, command: &str) -> CheckResult<String> {
        let (expected, output) = self
            .script
            .get(self.cursor)
            .unwrap_or_else(|| panic!("unexpected extra command: {command}"));
        assert_eq!(command, *expected, "command {} out of order", self.cursor);
        self.cursor += 1;
        Ok((*output).to_string())
    }
}

// ===============================================================================================
// Captured Output
// ===============================================================================================

const NUMACTL_OUTPUT: &str = "\
available: 3 nodes (0-2)
node 0 cpus: 0 1 2 3
node 0 size: 15990 MB
node 1 cpus: 4 5 6 7
node 1 size: 16120 MB
node 2 cpus:
node 2 size: 32768 MB
";

const SYSBENCH_CXL: &str = "\
sysbench 1.0.20 (using system LuaJIT 2.1.0-beta3)

8192.00MiB transferred (50.00 MiB/sec)

General statistics:
    total time:                          44.6566s
";

const SYSBENCH_NODE0: &str = "\
sysbench 1.0.20 (using system LuaJIT 2.1.0-beta3)

8192.00MiB transferred (183.53 MiB/sec)

General statistics:
    total time:                          10.0000s
";

const SYSBENCH_NODE1: &str = "\
sysbench 1.0.20 (using system LuaJIT 2.1.0-beta3)

8192.00MiB transferred (170.00 MiB/sec)

General statistics:
    total time:                          12.0000s
";

// CXL faster than node 1: the speed comparison must fail.
const SYSBENCH_CXL_TOO_FAST: &str = "\
sysbench 1.0.20 (using system LuaJIT 2.1.0-beta3)

8192.00MiB transferred (200.00 MiB/sec)

General statistics:
    total time:                          44.6566s
";

const MLC_OUTPUT: &str = "\
Intel(R) Memory Latency Checker - v3.11

Measuring idle latencies for random access (in ns)...
\t\tNuma node
Numa node\t     0\t     1\t     2
       0\t 130.2\t 231.2\t 265.7
       1\t 238.2\t 130.1\t 368.7

Measuring Memory Bandwidths between nodes within system
Using Read-only traffic type
\t\tNuma node
Numa node\t     0\t     1\t     2
       0\t79808.6\t60065.8\t31322.0
       1\t68081.3\t78793.6\t27324.0
";

// Node 1's CXL-column latency dips below one of its NUMA entries.
const MLC_INVERTED_LATENCY: &str = "\
Intel(R) Memory Latency Checker - v3.11

Measuring idle latencies for random access (in ns)...
\t\tNuma node
Numa node\t     0\t     1\t     2
       0\t 130.2\t 231.2\t 265.7
       1\t 238.2\t 130.1\t 200.0

Measuring Memory Bandwidths between nodes within system
\t\tNuma node
Numa node\t     0\t     1\t     2
       0\t79808.6\t60065.8\t31322.0
       1\t68081.3\t78793.6\t27324.0
";

const SYSBENCH_CMD_CXL: &str = "numactl --membind 2 sysbench --threads=1 memory \
    --memory-scope=local --memory-oper=write --memory-block-size=8g --memory-access-mode=rnd run";
const SYSBENCH_CMD_NODE0: &str = "numactl --membind 0 sysbench --threads=1 memory \
    --memory-scope=local --memory-oper=write --memory-block-size=8g --memory-access-mode=rnd run";
const SYSBENCH_CMD_NODE1: &str = "numactl --membind 1 sysbench --threads=1 memory \
    --memory-scope=local --memory-oper=write --memory-block-size=8g --memory-access-mode=rnd run";
const HUGEPAGES_CMD: &str = "echo 4000 > /proc/sys/vm/nr_hugepages";

fn full_script(cxl_sysbench: &'static str, mlc: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("numactl -H", NUMACTL_OUTPUT),
        (SYSBENCH_CMD_CXL, cxl_sysbench),
        (SYSBENCH_CMD_NODE0, SYSBENCH_NODE0),
        (SYSBENCH_CMD_NODE1, SYSBENCH_NODE1),
        (HUGEPAGES_CMD, ""),
        ("mlc", mlc),
    ]
}

// ===============================================================================================
// Scenarios
// ===============================================================================================

#[test]
fn well_ordered_machine_passes() {
    let runner = ScriptedRunner::new(full_script(SYSBENCH_CXL, MLC_OUTPUT));
    let mut harness = Harness::new(runner);
    let verdict = harness.verify().unwrap();
    assert!(verdict.passed());
}

#[test]
fn fast_cxl_fails_the_speed_check() {
    // The matrix commands must never run: the verdict is decided earlier.
    let script = vec![
        ("numactl -H", NUMACTL_OUTPUT),
        (SYSBENCH_CMD_CXL, SYSBENCH_CXL_TOO_FAST),
        (SYSBENCH_CMD_NODE0, SYSBENCH_NODE0),
        (SYSBENCH_CMD_NODE1, SYSBENCH_NODE1),
    ];
    let mut harness = Harness::new(ScriptedRunner::new(script));
    let verdict = harness.verify().unwrap();
    let violation = verdict.violation().expect("verdict should fail");
    assert_eq!(violation.metric, Metric::TransferSpeed);
    assert_eq!(violation.numa_node, 0);
    assert_eq!(violation.cxl_value, 200.0);
    assert_eq!(violation.numa_value, 183.53);
}

#[test]
fn inverted_latency_matrix_fails_with_source_node() {
    let runner = ScriptedRunner::new(full_script(SYSBENCH_CXL, MLC_INVERTED_LATENCY));
    let mut harness = Harness::new(runner);
    let verdict = harness.verify().unwrap();
    let violation = verdict.violation().expect("verdict should fail");
    assert_eq!(violation.metric, Metric::IdleLatency);
    assert_eq!(violation.source_node, Some(1));
}

#[test]
fn machine_without_cxl_node_is_a_topology_error() {
    let script = vec![(
        "numactl -H",
        "available: 2 nodes (0-1)\nnode 0 cpus: 0 1\nnode 1 cpus: 2 3\n",
    )];
    let mut harness = Harness::new(ScriptedRunner::new(script));
    let err = harness.verify().unwrap_err();
    assert!(matches!(err, CheckError::TopologyParse(_)));
}

#[test]
fn sysbench_without_statistics_is_incomplete() {
    let script = vec![
        ("numactl -H", NUMACTL_OUTPUT),
        (SYSBENCH_CMD_CXL, "sysbench 1.0.20\n(run aborted)\n"),
    ];
    let mut harness = Harness::new(ScriptedRunner::new(script));
    let err = harness.verify().unwrap_err();
    assert!(matches!(err, CheckError::IncompleteBandwidth { .. }));
}

#[test]
fn mlc_without_bandwidth_section_is_not_found() {
    let mlc_latency_only = "\
Measuring idle latencies for random access (in ns)...
Numa node\t     0\t     1\t     2
       0\t 130.2\t 231.2\t 265.7
       1\t 238.2\t 130.1\t 368.7
";
    let runner = ScriptedRunner::new(full_script(SYSBENCH_CXL, mlc_latency_only));
    let mut harness = Harness::new(runner);
    let err = harness.verify().unwrap_err();
    assert!(matches!(
        err,
        CheckError::MatrixNotFound {
            section: "memory bandwidth"
        }
    ));
}

#[test]
fn pass_run_issues_exactly_six_commands() {
    let mut issued = 0usize;
    let mut harness = Harness::new(|command: &str| {
        let script = full_script(SYSBENCH_CXL, MLC_OUTPUT);
        let (expected, output) = script[issued];
        issued += 1;
        assert_eq!(command, expected);
        Ok::<_, CheckError>(output.to_string())
    });
    assert!(harness.verify().unwrap().passed());
    drop(harness);
    assert_eq!(issued, 6);
}
