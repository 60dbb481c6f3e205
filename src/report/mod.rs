//! Raw-text parsing layer.
//!
//! Each parser is a pure function of one tool's stdout: no state survives a
//! call, and failures surface as typed errors instead of defaulted values.

pub mod mlc;
pub mod numactl;
pub mod sysbench;

// Re-export the structured results for easy access
pub use mlc::{MlcReport, NodeMatrix};
pub use numactl::Topology;
pub use sysbench::{BandwidthReport, BandwidthSample};
