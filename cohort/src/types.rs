/// Rank of a participant in a process group (0-indexed).
pub type Rank = u32;

/// Tag that disambiguates logical message streams between the same pair of
/// ranks. A `recv` only matches a `send` carrying the identical tag.
pub type Tag = u64;

/// Built-in reduction operations for collective communication.
///
/// Applied element-wise to vector and array payloads through
/// [`Reducible`](crate::reduce::Reducible).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// Element-wise sum across ranks.
    Sum,
    /// Element-wise product across ranks.
    Prod,
    /// Element-wise minimum across ranks.
    Min,
    /// Element-wise maximum across ranks.
    Max,
}

impl std::fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReduceOp::Sum => f.write_str("sum"),
            ReduceOp::Prod => f.write_str("prod"),
            ReduceOp::Min => f.write_str("min"),
            ReduceOp::Max => f.write_str("max"),
        }
    }
}

/// Wire version exchanged in the TCP handshake.
pub const PROTOCOL_VERSION: u16 = 1;
