use crate::collective::helpers::{collective_recv_sized, collective_send};
use crate::error::Result;
use crate::group::Group;
use crate::payload::Payload;
use crate::topology::{DoublingRole, doubling_role, hypercube_steps, to_global_rank, to_tree_rank};
use crate::transport::Channel;
use crate::types::{Rank, Tag};

/// Binomial-tree reduce: combine every rank's value at `root`.
///
/// Returns `Some(result)` on the root and `None` everywhere else. At step
/// `2^k`, a rank whose tree rank is a multiple of `2^(k+1)` absorbs the
/// value of the rank `2^k` above it; the sender is then done.
pub fn tree_reduce<C, T, F>(
    group: &Group,
    channel: &C,
    value: T,
    op: F,
    root: Rank,
    tag: Tag,
) -> Result<Option<T>>
where
    C: Channel + ?Sized,
    T: Payload,
    F: Fn(T, T) -> T,
{
    group.check_root(root, "reduce")?;
    reduce_to_root(group, channel, value, &op, root, tag)
}

/// Unchecked core of [`tree_reduce`], shared with doubling all-reduce and
/// barrier.
pub(crate) fn reduce_to_root<C, T, F>(
    group: &Group,
    channel: &C,
    value: T,
    op: &F,
    root: Rank,
    tag: Tag,
) -> Result<Option<T>>
where
    C: Channel + ?Sized,
    T: Payload,
    F: Fn(T, T) -> T,
{
    let world = group.size();
    let rank = group.rank();
    if world <= 1 {
        return Ok(Some(value));
    }

    let me = to_tree_rank(rank, root, world);
    let local_len = value.to_bytes().len();
    let mut acc = value;

    for step in hypercube_steps(world) {
        match doubling_role(me, step, world) {
            DoublingRole::Receive(child) => {
                let src = to_global_rank(child, root, world);
                tracing::trace!(rank, peer = src, step, tag, "reduce: absorbing");
                let bytes = collective_recv_sized(channel, src, tag, local_len, "reduce")?;
                // The lower tree rank's value goes on the left.
                acc = op(acc, T::decode(&bytes)?);
            }
            DoublingRole::Send(parent) => {
                let dest = to_global_rank(parent, root, world);
                tracing::trace!(rank, peer = dest, step, tag, "reduce: handing off");
                collective_send(channel, dest, tag, &acc.to_bytes(), "reduce")?;
                return Ok(None);
            }
            DoublingRole::Idle => {}
        }
    }

    Ok((me == 0).then_some(acc))
}
