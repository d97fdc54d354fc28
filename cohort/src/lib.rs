//! Blocking collective communication over explicit process groups.
//!
//! A [`Group`] names this rank and the group size; a [`Channel`] moves
//! tagged byte messages between ranks. On top of those, [`collective`]
//! provides tree broadcast, binomial reduce, three all-reduce engines and a
//! barrier, and [`Communicator`] bundles them behind one handle per rank.

pub mod client;
pub mod collective;
pub mod config;
pub mod error;
pub mod group;
pub mod payload;
pub mod reduce;
pub mod topology;
pub mod transport;
pub mod types;

pub use client::Communicator;
pub use config::{AllReduceAlgorithm, CohortConfig};
pub use error::{CohortError, Result};
pub use group::Group;
pub use payload::{Payload, Scalar};
pub use reduce::Reducible;
pub use transport::{Channel, Delivery, LocalChannel, RecordingChannel, TcpChannel};
pub use types::{Rank, ReduceOp, Tag};
