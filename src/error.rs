use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Topology Error: {0}")]
    TopologyParse(String),

    #[error("Section `{section}` not found in latency-checker report")]
    MatrixNotFound { section: &'static str },

    #[error("Malformed report on line {line}: {what}")]
    MalformedReport { line: usize, what: String },

    #[error("Benchmark report is missing the `{field}` field")]
    IncompleteBandwidth { field: &'static str },

    #[error("Command Error: {0}")]
    Command(String),
}

// A convenient alias
pub type CheckResult<T> = Result<T, CheckError>;
