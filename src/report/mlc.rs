use crate::error::{CheckError, CheckResult};

// ===============================================================================================
// Section Configuration
// ===============================================================================================

/// Locates one matrix inside an `mlc` report.
///
/// Markers are per-instance configuration rather than process-wide constants
/// so a parser built for a custom report stays independently testable.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    /// Short name used in diagnostics.
    pub name: &'static str,
    /// Substring announcing the section.
    pub marker: &'static str,
    /// Prefix of the matrix header row.
    pub header: &'static str,
}

/// The idle-latency matrix section (values in ns).
pub const IDLE_LATENCY: SectionSpec = SectionSpec {
    name: "idle latency",
    marker: "Measuring idle latencies",
    header: "Numa node",
};

/// The node-to-node bandwidth matrix section (values in MB/s).
pub const MEMORY_BANDWIDTH: SectionSpec = SectionSpec {
    name: "memory bandwidth",
    marker: "Measuring Memory Bandwidths",
    header: "Numa node",
};

// ===============================================================================================
// Matrix Data
// ===============================================================================================

/// One per-source-node matrix, already split along the CXL column.
///
/// Row `i` belongs to source NUMA node `i`: `numa[i]` holds its entries
/// toward the regular NUMA nodes, `cxl_column[i]` its entry toward the CXL
/// node (the last column of the printed table).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMatrix {
    pub numa: Vec<Vec<f64>>,
    pub cxl_column: Vec<f64>,
}

/// Both matrices extracted from a single `mlc` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MlcReport {
    pub idle_latency: NodeMatrix,
    pub bandwidth: NodeMatrix,
}

// ===============================================================================================
// Parsing
// ===============================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingMarker,
    SeekingHeader,
    ReadingRows,
    Done,
}

/// Extracts one [`NodeMatrix`] from an `mlc` report.
#[derive(Debug, Clone, Copy)]
pub struct MatrixParser {
    spec: SectionSpec,
}

impl MatrixParser {
    #[must_use]
    pub const fn new(spec: SectionSpec) -> Self {
        Self { spec }
    }

    /// Scans `output` for the configured section and reads its matrix.
    ///
    /// The scan is a line-by-line state machine: find the marker substring,
    /// then the first line starting with the header prefix, then exactly
    /// `numa_nodes` contiguous data rows of `numa_nodes + 2` floats each
    /// (row label, one column per NUMA node, the CXL column). Only the first
    /// header block after the marker is consumed.
    ///
    /// # Errors
    /// Returns [`CheckError::MatrixNotFound`] when the marker or header never
    /// appears or the report ends before `numa_nodes` rows are read, and
    /// [`CheckError::MalformedReport`] when a row has the wrong number of
    /// fields, a non-numeric field, or a label that contradicts its position.
    /// A paginated report (nodes split across repeated header blocks) fails
    /// on its short rows rather than truncating silently.
    pub fn parse(&self, output: &str, numa_nodes: u32) -> CheckResult<NodeMatrix> {
        let want = numa_nodes as usize;
        let mut state = ScanState::SeekingMarker;
        let mut numa: Vec<Vec<f64>> = Vec::with_capacity(want);
        let mut cxl_column: Vec<f64> = Vec::with_capacity(want);

        for (idx, line) in output.lines().enumerate() {
            match state {
                ScanState::SeekingMarker => {
                    if line.contains(self.spec.marker) {
                        state = ScanState::SeekingHeader;
                    }
                }
                ScanState::SeekingHeader => {
                    if line.starts_with(self.spec.header) {
                        state = ScanState::ReadingRows;
                    }
                }
                ScanState::ReadingRows => {
                    let row = Self::parse_row(line, idx + 1)?;
                    if row.len() != want + 2 {
                        return Err(CheckError::MalformedReport {
                            line: idx + 1,
                            what: format!(
                                "matrix row has {} fields, expected {}",
                                row.len(),
                                want + 2
                            ),
                        });
                    }
                    let label = row[0];
                    if label < 0.0 || label.fract() != 0.0 || label as usize != numa.len() {
                        return Err(CheckError::MalformedReport {
                            line: idx + 1,
                            what: format!("row label {} where node {} expected", label, numa.len()),
                        });
                    }
                    numa.push(row[1..=want].to_vec());
                    cxl_column.push(row[want + 1]);
                    if numa.len() == want {
                        state = ScanState::Done;
                    }
                }
                ScanState::Done => break,
            }
        }

        if state != ScanState::Done {
            return Err(CheckError::MatrixNotFound {
                section: self.spec.name,
            });
        }

        Ok(NodeMatrix { numa, cxl_column })
    }

    fn parse_row(line: &str, lineno: usize) -> CheckResult<Vec<f64>> {
        line.split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| CheckError::MalformedReport {
                        line: lineno,
                        what: format!("matrix field `{token}` is not a number"),
                    })
            })
            .collect()
    }
}

/// Parses both sections of an `mlc` report.
///
/// # Errors
/// Propagates the first parser failure; see [`MatrixParser::parse`].
pub fn parse_mlc(output: &str, numa_nodes: u32) -> CheckResult<MlcReport> {
    Ok(MlcReport {
        idle_latency: MatrixParser::new(IDLE_LATENCY).parse(output, numa_nodes)?,
        bandwidth: MatrixParser::new(MEMORY_BANDWIDTH).parse(output, numa_nodes)?,
    })
}

// ===============================================================================================
// Tests
// ===============================================================================================
