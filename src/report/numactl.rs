use crate::error::{CheckError, CheckResult};

// ===============================================================================================
// Topology Data
// ===============================================================================================

/// Node layout discovered from `numactl -H` output.
///
/// A CXL memory expander shows up as a NUMA-visible node with an empty CPU
/// list; every node that does bind CPUs is counted as a regular NUMA node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// Index of the CPU-less (CXL-backed) node.
    pub cxl_node: u32,
    /// Number of regular NUMA nodes, excluding the CXL node.
    pub numa_nodes: u32,
}

impl Topology {
    /// Iterator over the regular NUMA node indices.
    pub fn numa_node_ids(&self) -> impl Iterator<Item = u32> {
        0..self.numa_nodes
    }
}

// ===============================================================================================
// Parsing
// ===============================================================================================

/// Extracts the [`Topology`] from the stdout of `numactl -H`.
///
/// The scan is a single forward pass: the `available:` line carries the total
/// node count as its second token, and a `node <N> cpus:` line with nothing
/// after the colon marks node `N` as the CXL node (the last such line wins).
///
/// # Errors
/// Returns [`CheckError::TopologyParse`] when the node-count line or the
/// CPU-less node is absent, or when the two disagree (CXL index out of range,
/// fewer than one regular NUMA node). Returns [`CheckError::MalformedReport`]
/// when a matched line carries a non-numeric node field.
pub fn parse_topology(output: &str) -> CheckResult<Topology> {
    let mut total_nodes: Option<u32> = None;
    let mut cxl_node: Option<u32> = None;

    for (idx, line) in output.lines().enumerate() {
        if line.contains("available:") {
            let token = line.split_whitespace().nth(1).ok_or_else(|| {
                CheckError::MalformedReport {
                    line: idx + 1,
                    what: "`available:` line has no node count".to_string(),
                }
            })?;
            total_nodes =
                Some(
                    token
                        .parse::<u32>()
                        .map_err(|_| CheckError::MalformedReport {
                            line: idx + 1,
                            what: format!("node count `{token}` is not an integer"),
                        })?,
                );
        } else if let Some((head, cpus)) = line.split_once("cpus:") {
            let mut parts = head.split_whitespace();
            if parts.next() != Some("node") {
                continue;
            }
            if !cpus.trim().is_empty() {
                continue;
            }
            let token = parts.next().ok_or_else(|| CheckError::MalformedReport {
                line: idx + 1,
                what: "node line has no node index".to_string(),
            })?;
            cxl_node = Some(token.parse::<u32>().map_err(|_| {
                CheckError::MalformedReport {
                    line: idx + 1,
                    what: format!("node index `{token}` is not an integer"),
                }
            })?);
        }
    }

    let total = total_nodes.ok_or_else(|| {
        CheckError::TopologyParse("no `available:` line in numactl output".to_string())
    })?;
    let cxl = cxl_node.ok_or_else(|| {
        CheckError::TopologyParse("no CPU-less node present, CXL memory not attached".to_string())
    })?;

    if cxl >= total {
        return Err(CheckError::TopologyParse(format!(
            "CXL node {cxl} out of range for {total} declared nodes"
        )));
    }
    if total < 2 {
        return Err(CheckError::TopologyParse(format!(
            "{total} declared nodes leave no regular NUMA node to compare against"
        )));
    }

    Ok(Topology {
        cxl_node: cxl,
        numa_nodes: total - 1,
    })
}

// ===============================================================================================
// Tests
// ===============================================================================================
