use crate::error::CheckResult;
use crate::report::mlc::{self, MlcReport};
use crate::report::numactl::{self, Topology};
use crate::report::sysbench::{self, BandwidthSample, SysbenchConfig};
use crate::verify::compare::{Verdict, check_bandwidth, check_elapsed, check_latency, check_speed};
use tracing::{debug, info};

// ===============================================================================================
// Command Execution Seam
// ===============================================================================================

/// Executes shell commands on the machine under test.
///
/// The transport (SSH, serial, local shell) lives behind this trait; the
/// harness only ever sees the resulting stdout text. Installation of the
/// benchmark tools is the runner's problem as well.
pub trait CommandRunner {
    /// Runs `command` to completion and returns its stdout.
    ///
    /// # Errors
    /// Returns [`crate::error::CheckError::Command`] when the command cannot be executed or
    /// exits unsuccessfully.
    fn run(&mut self, command: &str) -> CheckResult<String>;
}

impl<F> CommandRunner for F
where
    F: FnMut(&str) -> CheckResult<String>,
{
    fn run(&mut self, command: &str) -> CheckResult<String> {
        self(command)
    }
}

// ===============================================================================================
// Harness Configuration
// ===============================================================================================

const TOPOLOGY_COMMAND: &str = "numactl -H";

/// Knobs for one verification run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Parameters of each per-node sysbench run.
    pub sysbench: SysbenchConfig,
    /// Command invoking the Intel Memory Latency Checker.
    pub mlc_command: String,
    /// Hugepage count written to `/proc/sys/vm/nr_hugepages` before mlc runs.
    pub hugepages: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            sysbench: SysbenchConfig::default(),
            mlc_command: "mlc".to_string(),
            hugepages: 4000,
        }
    }
}

impl HarnessConfig {
    fn hugepages_command(&self) -> String {
        format!("echo {} > /proc/sys/vm/nr_hugepages", self.hugepages)
    }
}

// ===============================================================================================
// Harness
// ===============================================================================================

/// Sequences the full CXL-versus-NUMA verification.
///
/// Every benchmark command is issued one at a time and waited on before the
/// next starts; running them concurrently would contend for the memory
/// bandwidth being measured.
pub struct Harness<R> {
    runner: R,
    config: HarnessConfig,
}

impl<R: CommandRunner> Harness<R> {
    pub fn new(runner: R) -> Self {
        Self::with_config(runner, HarnessConfig::default())
    }

    pub const fn with_config(runner: R, config: HarnessConfig) -> Self {
        Self { runner, config }
    }

    /// Runs the whole sequence: topology probe, one bandwidth run per node
    /// (CXL first, then each NUMA node), one mlc run, then all comparisons.
    ///
    /// A failed directional comparison is the `Fail` verdict, not an error;
    /// errors mean a command or a parse went wrong.
    ///
    /// # Errors
    /// Propagates [`crate::error::CheckError`] from command execution and report parsing
    /// unrecovered. A bad report is never re-parsed or retried here.
    pub fn verify(&mut self) -> CheckResult<Verdict> {
        let topology = self.probe_topology()?;
        info!(
            cxl_node = topology.cxl_node,
            numa_nodes = topology.numa_nodes,
            "topology discovered"
        );

        let cxl_sample = self.run_bandwidth(topology.cxl_node)?;
        let mut numa_speeds = Vec::with_capacity(topology.numa_nodes as usize);
        let mut numa_elapsed = Vec::with_capacity(topology.numa_nodes as usize);
        for node in topology.numa_node_ids() {
            let sample = self.run_bandwidth(node)?;
            numa_speeds.push(sample.speed_mib_s);
            numa_elapsed.push(sample.elapsed_s);
        }

        let verdict = check_speed(cxl_sample.speed_mib_s, &numa_speeds);
        if !verdict.passed() {
            return Ok(verdict);
        }
        let verdict = check_elapsed(cxl_sample.elapsed_s, &numa_elapsed);
        if !verdict.passed() {
            return Ok(verdict);
        }
        info!("per-node bandwidth runs ordered as expected");

        let report = self.run_mlc(topology.numa_nodes)?;
        let verdict = check_latency(&report.idle_latency);
        if !verdict.passed() {
            return Ok(verdict);
        }
        let verdict = check_bandwidth(&report.bandwidth);
        if !verdict.passed() {
            return Ok(verdict);
        }
        info!("latency and bandwidth matrices ordered as expected");

        Ok(Verdict::Pass)
    }

    /// Probes the node layout with `numactl -H`.
    ///
    /// # Errors
    /// See [`numactl::parse_topology`].
    pub fn probe_topology(&mut self) -> CheckResult<Topology> {
        let output = self.execute(TOPOLOGY_COMMAND)?;
        numactl::parse_topology(&output)
    }

    /// One sysbench memory run bound to `node`.
    ///
    /// # Errors
    /// Returns [`crate::error::CheckError::IncompleteBandwidth`] when the run produced no
    /// speed or time line, besides the usual command and parse failures.
    pub fn run_bandwidth(&mut self, node: u32) -> CheckResult<BandwidthSample> {
        let command = self.config.sysbench.command(node);
        let output = self.execute(&command)?;
        let sample = sysbench::parse_bandwidth(&output)?.sample()?;
        debug!(
            node,
            speed_mib_s = sample.speed_mib_s,
            elapsed_s = sample.elapsed_s,
            "bandwidth run complete"
        );
        Ok(sample)
    }

    /// Reserves hugepages, runs mlc once and parses both matrices.
    ///
    /// # Errors
    /// See [`mlc::parse_mlc`].
    pub fn run_mlc(&mut self, numa_nodes: u32) -> CheckResult<MlcReport> {
        let setup = self.config.hugepages_command();
        self.execute(&setup)?;
        let command = self.config.mlc_command.clone();
        let output = self.execute(&command)?;
        mlc::parse_mlc(&output, numa_nodes)
    }

    fn execute(&mut self, command: &str) -> CheckResult<String> {
        debug!(command, "executing");
        self.runner.run(command)
    }
}

// ===============================================================================================
// Tests
// ===============================================================================================
