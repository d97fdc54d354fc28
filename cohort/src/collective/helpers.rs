use crate::error::{CohortError, Result};
use crate::transport::Channel;
use crate::types::{Rank, Tag};

/// Send bytes to a peer, wrapping errors as `CollectiveFailed`.
pub(crate) fn collective_send<C: Channel + ?Sized>(
    channel: &C,
    dest: Rank,
    tag: Tag,
    data: &[u8],
    operation: &'static str,
) -> Result<()> {
    channel
        .send(dest, tag, data)
        .map_err(|e| CohortError::CollectiveFailed {
            operation,
            rank: dest,
            reason: e.to_string(),
        })
}

/// Receive bytes from a peer, wrapping errors as `CollectiveFailed`.
pub(crate) fn collective_recv<C: Channel + ?Sized>(
    channel: &C,
    src: Rank,
    tag: Tag,
    operation: &'static str,
) -> Result<Vec<u8>> {
    channel
        .recv(src, tag)
        .map_err(|e| CohortError::CollectiveFailed {
            operation,
            rank: src,
            reason: e.to_string(),
        })
}

/// Receive bytes that must have the same encoded size as the local value.
pub(crate) fn collective_recv_sized<C: Channel + ?Sized>(
    channel: &C,
    src: Rank,
    tag: Tag,
    expected: usize,
    operation: &'static str,
) -> Result<Vec<u8>> {
    let received = collective_recv(channel, src, tag, operation)?;
    check_len(expected, &received)?;
    Ok(received)
}

/// Swap values with `partner` without relying on channel buffering.
///
/// The lower rank of the pair sends first and then receives; the higher rank
/// receives first and then sends. Both sides derive the order from the same
/// comparison, so the pair never ends up in send/send or recv/recv.
///
/// Sizes are compared only after both messages have moved, so a mismatch
/// fails on both sides instead of leaving the lower rank waiting.
pub(crate) fn ordered_exchange<C: Channel + ?Sized>(
    channel: &C,
    rank: Rank,
    partner: Rank,
    tag: Tag,
    data: &[u8],
    operation: &'static str,
) -> Result<Vec<u8>> {
    debug_assert_ne!(rank, partner);
    if rank < partner {
        collective_send(channel, partner, tag, data, operation)?;
        collective_recv_sized(channel, partner, tag, data.len(), operation)
    } else {
        let received = collective_recv(channel, partner, tag, operation)?;
        collective_send(channel, partner, tag, data, operation)?;
        check_len(data.len(), &received)?;
        Ok(received)
    }
}

fn check_len(expected: usize, received: &[u8]) -> Result<()> {
    if received.len() != expected {
        return Err(CohortError::BufferSizeMismatch {
            expected,
            actual: received.len(),
        });
    }
    Ok(())
}

/// Tag for the broadcast-down phase of a two-phase collective started with `tag`.
pub(crate) fn down_phase_tag(tag: Tag) -> Tag {
    tag ^ DOWN_PHASE_BIT
}

const DOWN_PHASE_BIT: Tag = 1 << 63;
