//! Collective engines.
//!
//! Every engine is a plain blocking function over a [`Group`](crate::group::Group)
//! and a [`Channel`](crate::transport::Channel). All ranks of the group must
//! call the same engine with the same root and tag; a rank never sends to
//! itself.

mod allreduce;
mod barrier;
mod broadcast;
mod helpers;
mod reduce;

pub use allreduce::{butterfly_all_reduce, doubling_all_reduce, folded_butterfly_all_reduce};
pub use barrier::barrier;
pub use broadcast::tree_broadcast;
pub use reduce::tree_reduce;

/// Tags used by [`Communicator`](crate::client::Communicator).
///
/// Point-to-point traffic on the same channel should stay clear of these.
pub mod tags {
    use crate::types::Tag;

    pub const BROADCAST: Tag = 0x0C01;
    pub const REDUCE: Tag = 0x0C02;
    pub const ALL_REDUCE: Tag = 0x0C03;
    pub const BARRIER: Tag = 0x0C04;
}
