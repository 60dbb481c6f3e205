//! Verification harness comparing CXL-attached memory against local NUMA
//! memory on a machine under test.
//!
//! A CXL memory expander appears as a NUMA-visible node with no CPUs bound to
//! it, and is expected to show higher access latency and lower bandwidth than
//! every regular NUMA node. This crate drives two external tools through a
//! caller-supplied [`verify::CommandRunner`] — `sysbench memory` pinned per
//! node with `numactl --membind`, and the Intel Memory Latency Checker — then
//! parses their free-form stdout and asserts the expected ordering.
//!
//! The [`report`] module holds the parsers (pure functions over the captured
//! text); [`verify`] holds the comparator and the [`verify::Harness`] that
//! sequences a full run.

pub mod error;
pub mod report;
pub mod verify;

pub use error::{CheckError, CheckResult};
pub use report::{BandwidthReport, BandwidthSample, MlcReport, NodeMatrix, Topology};
pub use verify::{CommandRunner, Harness, HarnessConfig, Metric, Verdict, Violation};
