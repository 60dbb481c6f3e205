use cxlcheck::report::{mlc, numactl, sysbench};
use cxlcheck::verify::compare::{check_bandwidth, check_elapsed, check_latency, check_speed};
use cxlcheck::verify::harness::Harness;
use cxlcheck::{CheckError, CheckResult};

const NUMACTL_OUTPUT: &str = "\
available: 3 nodes (0-2)
node 0 cpus: 0 1 2 3
node 0 size: 15990 MB
node 1 cpus: 4 5 6 7
node 1 size: 16120 MB
node 2 cpus:
node 2 size: 32768 MB
";

const SYSBENCH_OUTPUTS: &[&str] = &[
    // node 0, node 1, then the CXL node
    "8192.00MiB transferred (183.53 MiB/sec)\n    total time:   10.0000s\n",
    "8192.00MiB transferred (170.00 MiB/sec)\n    total time:   12.0000s\n",
    "8192.00MiB transferred (50.00 MiB/sec)\n    total time:   44.6566s\n",
];

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

fn main() -> CheckResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("============================================================");
    println!("        CXL vs NUMA Verification - Captured Replay          ");
    println!("============================================================");

    // 1. Topology
    println!("[+] Parsing `numactl -H` capture...");
    let topology = numactl::parse_topology(NUMACTL_OUTPUT)?;
    println!("    CXL node:      {}", topology.cxl_node);
    println!("    NUMA nodes:    {}", topology.numa_nodes);

    // 2. Per-node bandwidth runs
    println!("\n[+] Parsing sysbench captures...");
    let mut speeds = Vec::new();
    let mut elapsed = Vec::new();
    for (node, output) in SYSBENCH_OUTPUTS.iter().copied().enumerate() {
        let sample = sysbench::parse_bandwidth(output)?.sample()?;
        println!(
            "    node {}:  {:>8.2} MiB/s  in {:>8.4}s",
            node, sample.speed_mib_s, sample.elapsed_s
        );
        speeds.push(sample.speed_mib_s);
        elapsed.push(sample.elapsed_s);
    }
    let (cxl_speed, numa_speeds) = speeds.split_last().expect("captures present");
    let (cxl_elapsed, numa_elapsed) = elapsed.split_last().expect("captures present");
    println!("    speed verdict:   {:?}", check_speed(*cxl_speed, numa_speeds));
    println!(
        "    elapsed verdict: {:?}",
        check_elapsed(*cxl_elapsed, numa_elapsed)
    );

    // 3. Latency/bandwidth matrices
    println!("\n[+] Parsing mlc capture...");
    let report = mlc::parse_mlc(MLC_OUTPUT, topology.numa_nodes)?;
    for (i, row) in report.idle_latency.numa.iter().enumerate() {
        println!(
            "    latency from node {}: NUMA {:?} ns, CXL {} ns",
            i, row, report.idle_latency.cxl_column[i]
        );
    }
    for (i, row) in report.bandwidth.numa.iter().enumerate() {
        println!(
            "    bandwidth from node {}: NUMA {:?} MB/s, CXL {} MB/s",
            i, row, report.bandwidth.cxl_column[i]
        );
    }
    println!("    latency verdict:   {:?}", check_latency(&report.idle_latency));
    println!("    bandwidth verdict: {:?}", check_bandwidth(&report.bandwidth));

    // 4. The same data end-to-end through the harness
    println!("\n[+] Replaying the full sequence through the harness...");
    let mut harness = Harness::new(|command: &str| match command {
        "numactl -H" => Ok(NUMACTL_OUTPUT.to_string()),
        "mlc" => Ok(MLC_OUTPUT.to_string()),
        c if c.starts_with("echo ") => Ok(String::new()),
        c if c.contains("--membind 2") => Ok(SYSBENCH_OUTPUTS[2].to_string()),
        c if c.contains("--membind 1") => Ok(SYSBENCH_OUTPUTS[1].to_string()),
        c if c.contains("--membind 0") => Ok(SYSBENCH_OUTPUTS[0].to_string()),
        c => Err(CheckError::Command(format!("no capture for `{c}`"))),
    });
    let verdict = harness.verify()?;
    println!("    final verdict: {verdict:?}");

    Ok(())
}
