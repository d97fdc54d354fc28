use crate::collective::broadcast::broadcast_bytes;
use crate::collective::helpers::{
    collective_recv_sized, collective_send, down_phase_tag, ordered_exchange,
};
use crate::collective::reduce::reduce_to_root;
use crate::error::{CohortError, Result};
use crate::group::Group;
use crate::payload::Payload;
use crate::topology::{hypercube_partner, hypercube_steps, largest_power_of_two_at_most};
use crate::transport::Channel;
use crate::types::{Rank, Tag};

/// Butterfly (recursive doubling) all-reduce.
///
/// In round `k` each rank swaps its running value with `rank ^ 2^k` and
/// combines. After `log2(size)` rounds every rank holds the full result.
///
/// Needs a power-of-two group. Other sizes run [`doubling_all_reduce`]
/// instead so the result is still correct.
pub fn butterfly_all_reduce<C, T, F>(
    group: &Group,
    channel: &C,
    value: T,
    op: F,
    tag: Tag,
) -> Result<T>
where
    C: Channel + ?Sized,
    T: Payload,
    F: Fn(T, T) -> T,
{
    let world = group.size();
    if world <= 1 {
        return Ok(value);
    }
    if !world.is_power_of_two() {
        tracing::debug!(
            rank = group.rank(),
            world,
            "butterfly all-reduce needs a power-of-two group, using doubling"
        );
        return doubling_all_reduce(group, channel, value, op, tag);
    }
    butterfly_rounds(channel, group.rank(), world, value, &op, tag)
}

/// Butterfly all-reduce for any group size.
///
/// The `size - p2` ranks above the largest power of two `p2` first fold
/// their value into rank `r - p2`, sit out the butterfly among the first
/// `p2` ranks, then get the result back from the same partner.
pub fn folded_butterfly_all_reduce<C, T, F>(
    group: &Group,
    channel: &C,
    value: T,
    op: F,
    tag: Tag,
) -> Result<T>
where
    C: Channel + ?Sized,
    T: Payload,
    F: Fn(T, T) -> T,
{
    let world = group.size();
    let rank = group.rank();
    if world <= 1 {
        return Ok(value);
    }

    let p2 = largest_power_of_two_at_most(world);
    let excess = world - p2;
    let local = value.to_bytes();

    if rank >= p2 {
        let partner = rank - p2;
        tracing::trace!(rank, peer = partner, tag, "folded all-reduce: folding in");
        collective_send(channel, partner, tag, &local, "allreduce")?;
        let bytes = collective_recv_sized(channel, partner, tag, local.len(), "allreduce")?;
        return T::decode(&bytes);
    }

    let mut acc = value;
    let folded = (rank < excess).then_some(rank + p2);
    if let Some(partner) = folded {
        let bytes = collective_recv_sized(channel, partner, tag, local.len(), "allreduce")?;
        acc = op(acc, T::decode(&bytes)?);
    }

    let acc = butterfly_rounds(channel, rank, p2, acc, &op, tag)?;

    if let Some(partner) = folded {
        collective_send(channel, partner, tag, &acc.to_bytes(), "allreduce")?;
    }
    Ok(acc)
}

/// Reduce to rank 0 over a binomial tree, then tree-broadcast the result.
///
/// Works for every group size and never has two ranks sending to each other
/// at once. Takes about twice the rounds of a butterfly.
pub fn doubling_all_reduce<C, T, F>(
    group: &Group,
    channel: &C,
    value: T,
    op: F,
    tag: Tag,
) -> Result<T>
where
    C: Channel + ?Sized,
    T: Payload,
    F: Fn(T, T) -> T,
{
    const ROOT: Rank = 0;

    if group.size() <= 1 {
        return Ok(value);
    }

    let local_len = value.to_bytes().len();
    let down = down_phase_tag(tag);
    match reduce_to_root(group, channel, value, &op, ROOT, tag)? {
        Some(result) => {
            broadcast_bytes(group, channel, Some(result.to_bytes()), ROOT, down)?;
            Ok(result)
        }
        None => {
            let bytes = broadcast_bytes(group, channel, None, ROOT, down)?;
            if bytes.len() != local_len {
                return Err(CohortError::BufferSizeMismatch {
                    expected: local_len,
                    actual: bytes.len(),
                });
            }
            T::decode(&bytes)
        }
    }
}

/// Butterfly rounds among ranks `0..world`, `world` a power of two.
fn butterfly_rounds<C, T, F>(
    channel: &C,
    rank: Rank,
    world: u32,
    mut acc: T,
    op: &F,
    tag: Tag,
) -> Result<T>
where
    C: Channel + ?Sized,
    T: Payload,
    F: Fn(T, T) -> T,
{
    for step in hypercube_steps(world) {
        let Some(partner) = hypercube_partner(rank, step, world) else {
            continue;
        };
        tracing::trace!(rank, peer = partner, step, tag, "butterfly round");
        let received = ordered_exchange(channel, rank, partner, tag, &acc.to_bytes(), "allreduce")?;
        let theirs = T::decode(&received)?;
        // Lower rank on the left on both sides, so the pair computes the
        // same bits even when `op` is not bitwise commutative.
        acc = if rank < partner {
            op(acc, theirs)
        } else {
            op(theirs, acc)
        };
    }
    Ok(acc)
}
