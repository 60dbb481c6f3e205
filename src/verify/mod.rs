//! Verification layer: directional comparisons and the run sequencer.

pub mod compare;
pub mod harness;

// Re-export the main entry points for easy access
pub use compare::{Metric, Verdict, Violation};
pub use harness::{CommandRunner, Harness, HarnessConfig};
