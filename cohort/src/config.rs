//! Runtime-configurable parameters for cohort.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `COHORT_`) or by constructing a custom `CohortConfig`.

use crate::error::CohortError;
use std::str::FromStr;
use std::time::Duration;

/// Message pattern used by `all_reduce`.
///
/// The choice only changes which messages are exchanged, never the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllReduceAlgorithm {
    /// Butterfly for power-of-two groups, doubling otherwise.
    #[default]
    Auto,
    /// Hypercube butterfly. Falls back to `Doubling` when the group size is
    /// not a power of two.
    Butterfly,
    /// Excess ranks fold into the largest power-of-two subgroup, which runs
    /// the butterfly and hands the result back.
    FoldedButterfly,
    /// Doubling reduce to rank 0 followed by a tree broadcast.
    Doubling,
}

impl AllReduceAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            AllReduceAlgorithm::Auto => "auto",
            AllReduceAlgorithm::Butterfly => "butterfly",
            AllReduceAlgorithm::FoldedButterfly => "folded",
            AllReduceAlgorithm::Doubling => "doubling",
        }
    }
}

impl std::fmt::Display for AllReduceAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AllReduceAlgorithm {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "butterfly" | "hypercube" => Ok(Self::Butterfly),
            "folded" | "folded_butterfly" | "halving_doubling" => Ok(Self::FoldedButterfly),
            "doubling" | "tree" => Ok(Self::Doubling),
            other => Err(CohortError::InvalidConfig(format!(
                "unknown allreduce algorithm '{other}'"
            ))),
        }
    }
}

/// Tuning parameters for collectives and the TCP transport.
#[derive(Debug, Clone)]
pub struct CohortConfig {
    /// Message pattern for `all_reduce`.
    pub all_reduce: AllReduceAlgorithm,

    /// How long `TcpChannel` keeps trying to reach every peer while the mesh
    /// forms. Collectives themselves never time out.
    pub connect_timeout: Duration,

    /// Pause between TCP connection attempts to a peer that is not yet listening.
    pub connect_backoff: Duration,

    /// Frames larger than this close the TCP connection.
    pub max_frame_bytes: usize,

    /// Worker threads of the runtime that drives TCP I/O.
    pub io_threads: usize,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            all_reduce: AllReduceAlgorithm::Auto,
            connect_timeout: Duration::from_secs(30),
            connect_backoff: Duration::from_millis(50),
            max_frame_bytes: 1024 * 1024 * 1024, // 1 GiB
            io_threads: 2,
        }
    }
}

impl CohortConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `COHORT_ALLREDUCE_ALGORITHM` (`auto`, `butterfly`, `folded`, `doubling`)
    /// - `COHORT_CONNECT_TIMEOUT_SECS`
    /// - `COHORT_CONNECT_BACKOFF_MS`
    /// - `COHORT_MAX_FRAME_BYTES`
    /// - `COHORT_IO_THREADS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("COHORT_ALLREDUCE_ALGORITHM") {
            match v.parse::<AllReduceAlgorithm>() {
                Ok(algo) => cfg.all_reduce = algo,
                Err(e) => tracing::warn!("ignoring COHORT_ALLREDUCE_ALGORITHM: {e}"),
            }
        }
        if let Ok(v) = std::env::var("COHORT_CONNECT_TIMEOUT_SECS")
            && let Ok(s) = v.parse::<u64>()
        {
            cfg.connect_timeout = Duration::from_secs(s);
        }
        if let Ok(v) = std::env::var("COHORT_CONNECT_BACKOFF_MS")
            && let Ok(ms) = v.parse::<u64>()
        {
            cfg.connect_backoff = Duration::from_millis(ms);
        }
        if let Ok(v) = std::env::var("COHORT_MAX_FRAME_BYTES")
            && let Ok(n) = v.parse::<usize>()
        {
            cfg.max_frame_bytes = n;
        }
        if let Ok(v) = std::env::var("COHORT_IO_THREADS")
            && let Ok(n) = v.parse::<usize>()
        {
            cfg.io_threads = n;
        }

        cfg
    }

    /// Builder-style override of the allreduce algorithm.
    pub fn with_all_reduce(mut self, algorithm: AllReduceAlgorithm) -> Self {
        self.all_reduce = algorithm;
        self
    }

    /// Reject values no transport can work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.io_threads == 0 {
            return Err(CohortError::InvalidConfig(
                "io_threads must be at least 1".into(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(CohortError::InvalidConfig(
                "max_frame_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
