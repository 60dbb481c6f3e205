use crate::error::{CheckError, CheckResult};

// ===============================================================================================
// Benchmark Command Configuration
// ===============================================================================================

/// Parameters for one `sysbench memory` run, bound to a single node with
/// `numactl --membind`.
///
/// Every flag is optional; `None` leaves it to the tool's default. The
/// [`Default`] impl is the standard verification run: one thread writing 8 GiB
/// of local memory with random access.
#[derive(Debug, Clone)]
pub struct SysbenchConfig {
    pub threads: Option<u32>,
    pub memory_scope: Option<String>,
    pub memory_oper: Option<String>,
    pub memory_block_size: Option<String>,
    pub memory_access_mode: Option<String>,
    pub memory_hugetlb: Option<String>,
    pub memory_total_size: Option<String>,
}

impl Default for SysbenchConfig {
    fn default() -> Self {
        Self {
            threads: Some(1),
            memory_scope: Some("local".to_string()),
            memory_oper: Some("write".to_string()),
            memory_block_size: Some("8g".to_string()),
            memory_access_mode: Some("rnd".to_string()),
            memory_hugetlb: None,
            memory_total_size: None,
        }
    }
}

impl SysbenchConfig {
    /// Renders the full shell command for a run bound to `node`.
    #[must_use]
    pub fn command(&self, node: u32) -> String {
        let mut cmd = format!("numactl --membind {node} sysbench");
        if let Some(threads) = self.threads {
            cmd.push_str(&format!(" --threads={threads}"));
        }
        cmd.push_str(" memory");
        if let Some(v) = &self.memory_scope {
            cmd.push_str(&format!(" --memory-scope={v}"));
        }
        if let Some(v) = &self.memory_oper {
            cmd.push_str(&format!(" --memory-oper={v}"));
        }
        if let Some(v) = &self.memory_block_size {
            cmd.push_str(&format!(" --memory-block-size={v}"));
        }
        if let Some(v) = &self.memory_access_mode {
            cmd.push_str(&format!(" --memory-access-mode={v}"));
        }
        if let Some(v) = &self.memory_hugetlb {
            cmd.push_str(&format!(" --memory-hugetlb={v}"));
        }
        if let Some(v) = &self.memory_total_size {
            cmd.push_str(&format!(" --memory-total-size={v}"));
        }
        cmd.push_str(" run");
        cmd
    }
}

// ===============================================================================================
// Report Data
// ===============================================================================================

/// Raw extraction from one sysbench run.
///
/// sysbench omits a section when the run aborts early, so each field is
/// `None` until its line is actually seen. "Not measured" and "measured
/// zero" stay distinguishable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandwidthReport {
    /// Transfer speed in MiB/sec, from the `MiB transferred` line.
    pub speed_mib_s: Option<f64>,
    /// Wall-clock duration in seconds, from the `total time` line.
    pub elapsed_s: Option<f64>,
}

impl BandwidthReport {
    /// Collapses the report into a complete sample.
    ///
    /// # Errors
    /// Returns [`CheckError::IncompleteBandwidth`] naming the first field the
    /// report never produced.
    pub fn sample(&self) -> CheckResult<BandwidthSample> {
        let speed_mib_s = self
            .speed_mib_s
            .ok_or(CheckError::IncompleteBandwidth { field: "speed" })?;
        let elapsed_s = self
            .elapsed_s
            .ok_or(CheckError::IncompleteBandwidth { field: "total time" })?;
        Ok(BandwidthSample {
            speed_mib_s,
            elapsed_s,
        })
    }
}

/// A completed measurement: both fields present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthSample {
    pub speed_mib_s: f64,
    pub elapsed_s: f64,
}

// ===============================================================================================
// Parsing
// ===============================================================================================

/// Extracts speed and elapsed time from sysbench stdout.
///
/// Single forward pass. The speed is the number opening the first parenthesis
/// group on the `MiB transferred` line (`8192.00MiB transferred (183.53
/// MiB/sec)`); the elapsed time follows the first colon on the `total time`
/// line, with its trailing `s` unit stripped. Lines that match neither marker
/// are ignored regardless of content.
///
/// # Errors
/// Returns [`CheckError::MalformedReport`] when a marker line is present but
/// its numeric token does not parse. Absent markers are not an error; the
/// corresponding field stays `None`.
pub fn parse_bandwidth(output: &str) -> CheckResult<BandwidthReport> {
    let mut report = BandwidthReport::default();

    for (idx, line) in output.lines().enumerate() {
        if line.contains("MiB transferred") {
            let inner = line
                .split_once('(')
                .map(|(_, rest)| rest)
                .ok_or_else(|| CheckError::MalformedReport {
                    line: idx + 1,
                    what: "transfer line has no parenthesised speed".to_string(),
                })?;
            let token = inner.split_whitespace().next().unwrap_or("");
            report.speed_mib_s =
                Some(
                    token
                        .parse::<f64>()
                        .map_err(|_| CheckError::MalformedReport {
                            line: idx + 1,
                            what: format!("speed `{token}` is not a number"),
                        })?,
                );
        } else if line.contains("total time") {
            let rest = line
                .split_once(':')
                .map(|(_, rest)| rest)
                .ok_or_else(|| CheckError::MalformedReport {
                    line: idx + 1,
                    what: "total time line has no colon".to_string(),
                })?;
            let token = rest.split('s').next().unwrap_or("").trim();
            report.elapsed_s =
                Some(
                    token
                        .parse::<f64>()
                        .map_err(|_| CheckError::MalformedReport {
                            line: idx + 1,
                            what: format!("elapsed time `{token}` is not a number"),
                        })?,
                );
        }
    }

    Ok(report)
}

// ===============================================================================================
// Tests
// ===============================================================================================
