use crate::report::mlc::NodeMatrix;
use std::fmt;

// ===============================================================================================
// Metrics & Verdicts
// ===============================================================================================

/// The measurement whose CXL/NUMA ordering is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Wall-clock duration of a bandwidth run; CXL must take longer.
    ElapsedTime,
    /// Transfer speed of a bandwidth run; CXL must be slower.
    TransferSpeed,
    /// Idle memory access latency; CXL must be higher.
    IdleLatency,
    /// Node-to-node memory bandwidth; CXL must be lower.
    Bandwidth,
}

impl Metric {
    /// Whether the CXL value is required to exceed every NUMA value (as
    /// opposed to staying strictly below them).
    #[must_use]
    pub const fn cxl_must_exceed(self) -> bool {
        matches!(self, Self::ElapsedTime | Self::IdleLatency)
    }

    const fn unit(self) -> &'static str {
        match self {
            Self::ElapsedTime => "s",
            Self::TransferSpeed => "MiB/s",
            Self::IdleLatency => "ns",
            Self::Bandwidth => "MB/s",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ElapsedTime => "elapsed time",
            Self::TransferSpeed => "transfer speed",
            Self::IdleLatency => "idle latency",
            Self::Bandwidth => "bandwidth",
        };
        f.write_str(name)
    }
}

/// A directional relationship that did not hold, with both offending values.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub metric: Metric,
    /// Source NUMA node of the matrix row; `None` for the scalar per-run checks.
    pub source_node: Option<u32>,
    /// The NUMA node whose value the CXL value failed against.
    pub numa_node: u32,
    pub cxl_value: f64,
    pub numa_value: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = if self.metric.cxl_must_exceed() {
            "not above"
        } else {
            "not below"
        };
        write!(
            f,
            "{}: CXL value {}{} {} NUMA node {}'s {}{}",
            self.metric,
            self.cxl_value,
            self.metric.unit(),
            relation,
            self.numa_node,
            self.numa_value,
            self.metric.unit(),
        )?;
        if let Some(src) = self.source_node {
            write!(f, " (measured from node {src})")?;
        }
        Ok(())
    }
}

/// Outcome of one comparison, consumed by the surrounding test framework.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail(Violation),
}

impl Verdict {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// The violation behind a failing verdict, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Pass => None,
            Self::Fail(v) => Some(v),
        }
    }
}

// ===============================================================================================
// Checks
// ===============================================================================================

fn check(metric: Metric, source_node: Option<u32>, cxl: f64, numa: &[f64]) -> Verdict {
    for (j, &value) in numa.iter().enumerate() {
        let holds = if metric.cxl_must_exceed() {
            cxl > value
        } else {
            cxl < value
        };
        if !holds {
            return Verdict::Fail(Violation {
                metric,
                source_node,
                numa_node: j as u32,
                cxl_value: cxl,
                numa_value: value,
            });
        }
    }
    Verdict::Pass
}

/// CXL run duration must strictly exceed every NUMA run duration.
#[must_use]
pub fn check_elapsed(cxl_elapsed_s: f64, numa_elapsed_s: &[f64]) -> Verdict {
    check(Metric::ElapsedTime, None, cxl_elapsed_s, numa_elapsed_s)
}

/// CXL transfer speed must stay strictly below every NUMA speed.
#[must_use]
pub fn check_speed(cxl_speed: f64, numa_speeds: &[f64]) -> Verdict {
    check(Metric::TransferSpeed, None, cxl_speed, numa_speeds)
}

/// Per source node, the CXL-column latency must exceed every NUMA entry in
/// that node's row.
#[must_use]
pub fn check_latency(matrix: &NodeMatrix) -> Verdict {
    check_rows(Metric::IdleLatency, matrix)
}

/// Per source node, the CXL-column bandwidth must stay below every NUMA entry
/// in that node's row.
#[must_use]
pub fn check_bandwidth(matrix: &NodeMatrix) -> Verdict {
    check_rows(Metric::Bandwidth, matrix)
}

fn check_rows(metric: Metric, matrix: &NodeMatrix) -> Verdict {
    for (i, row) in matrix.numa.iter().enumerate() {
        let verdict = check(metric, Some(i as u32), matrix.cxl_column[i], row);
        if !verdict.passed() {
            return verdict;
        }
    }
    Verdict::Pass
}

// ===============================================================================================
// Tests
// ===============================================================================================
