use crate::collective::helpers::{collective_recv, collective_send};
use crate::error::{CohortError, Result};
use crate::group::Group;
use crate::payload::Payload;
use crate::topology::{children, parent, to_global_rank, to_tree_rank};
use crate::transport::Channel;
use crate::types::{Rank, Tag};

/// Tree broadcast: root's value reaches every rank over a binary tree.
///
/// Ranks are renumbered so `root` is tree rank 0. Every other rank first
/// receives from its parent, then forwards to its left and right child in
/// that order. Nobody sends before it has received, so depth `d` only hears
/// from depth `d-1`, and the longest chain is `floor(log2(size))` hops.
///
/// Every rank passes a `value`; only the root's is used. Non-root ranks get
/// the root's value back, decoded from the root's encoding, so its shape
/// need not match theirs.
pub fn tree_broadcast<C, T>(
    group: &Group,
    channel: &C,
    value: T,
    root: Rank,
    tag: Tag,
) -> Result<T>
where
    C: Channel + ?Sized,
    T: Payload,
{
    group.check_root(root, "broadcast")?;

    if group.is_single() {
        return Ok(value);
    }

    if group.rank() == root {
        broadcast_bytes(group, channel, Some(value.to_bytes()), root, tag)?;
        Ok(value)
    } else {
        let bytes = broadcast_bytes(group, channel, None, root, tag)?;
        T::decode(&bytes)
    }
}

/// Byte-level tree broadcast shared by the typed collectives.
///
/// `data` must be `Some` on the root; it is ignored elsewhere. Returns the
/// root's bytes on every rank.
pub(crate) fn broadcast_bytes<C: Channel + ?Sized>(
    group: &Group,
    channel: &C,
    data: Option<Vec<u8>>,
    root: Rank,
    tag: Tag,
) -> Result<Vec<u8>> {
    let world = group.size();
    let rank = group.rank();
    let me = to_tree_rank(rank, root, world);

    let data = match (parent(me), data) {
        (None, Some(data)) => data,
        (None, None) => {
            return Err(CohortError::CollectiveFailed {
                operation: "broadcast",
                rank,
                reason: "root has nothing to broadcast".into(),
            });
        }
        (Some(parent_tree), _) => {
            let src = to_global_rank(parent_tree, root, world);
            tracing::trace!(rank, root, peer = src, tag, "broadcast: waiting on parent");
            collective_recv(channel, src, tag, "broadcast")?
        }
    };

    for child_tree in children(me, world).iter() {
        let dest = to_global_rank(child_tree, root, world);
        tracing::trace!(rank, root, peer = dest, tag, "broadcast: forwarding to child");
        collective_send(channel, dest, tag, &data, "broadcast")?;
    }

    Ok(data)
}
