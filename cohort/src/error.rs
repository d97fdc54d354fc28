use crate::types::Rank;

pub type Result<T> = std::result::Result<T, CohortError>;

#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    #[error("invalid group size {size}: a group needs at least one rank")]
    InvalidGroupSize { size: u32 },

    #[error("invalid rank {rank}: world size is {world_size}")]
    InvalidRank { rank: Rank, world_size: u32 },

    #[error("invalid root {root} for {operation}: world size is {world_size}")]
    InvalidRoot {
        root: Rank,
        world_size: u32,
        operation: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("payload decode failed: {0}")]
    DecodeFailed(String),

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("rank {rank} not found in group")]
    UnknownPeer { rank: Rank },

    #[error("connection to rank {rank} failed: {reason}")]
    ConnectionFailed { rank: Rank, reason: String },

    #[error("protocol version mismatch: local={local}, remote={remote}")]
    ProtocolMismatch { local: u16, remote: u16 },

    #[error("mesh formation timed out: {connected}/{expected} peers connected")]
    MeshFormationTimeout { connected: u32, expected: u32 },

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{operation} failed at rank {rank}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        rank: Rank,
        reason: String,
    },

    #[error("internal lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl CohortError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for errors raised before any message was exchanged.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidGroupSize { .. }
                | Self::InvalidRank { .. }
                | Self::InvalidRoot { .. }
                | Self::InvalidConfig(_)
        )
    }
}
