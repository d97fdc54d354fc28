//! Point-to-point channels the collectives are built on.
//!
//! [`Channel`] is the only seam between the collective engines and the
//! outside world: a blocking, reliable, FIFO-per-pair `send`/`recv` keyed by
//! rank and tag. Everything in [`crate::collective`] is written against it.

mod local;
mod recording;
mod tcp;

pub use local::{Delivery, LocalChannel};
pub use recording::{ChannelEvent, EventKind, RecordingChannel};
pub use tcp::TcpChannel;

use crate::error::Result;
use crate::types::{Rank, Tag};
use std::sync::Arc;

/// Blocking point-to-point transport between the ranks of one group.
///
/// Implementations must deliver messages between a given (src, dest) pair in
/// the order they were sent, and must hand a `recv(src, tag)` only a message
/// that was sent with the same `tag`. Messages for other tags stay queued for
/// their own receivers.
///
/// `send` may return as soon as the message is handed off; it may also block
/// until the receiver takes it (a rendezvous). Collectives are correct under
/// both.
pub trait Channel {
    /// Send `payload` to `dest` under `tag`.
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()>;

    /// Block until a message with `tag` arrives from `src`.
    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>>;
}

impl<C: Channel + ?Sized> Channel for &C {
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        (**self).send(dest, tag, payload)
    }

    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        (**self).recv(src, tag)
    }
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        (**self).send(dest, tag, payload)
    }

    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        (**self).recv(src, tag)
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        (**self).send(dest, tag, payload)
    }

    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        (**self).recv(src, tag)
    }
}
