use crate::collective::allreduce::doubling_all_reduce;
use crate::error::Result;
use crate::group::Group;
use crate::transport::Channel;
use crate::types::Tag;

/// Block until every rank in `group` has entered the barrier.
///
/// An empty-payload reduce to rank 0 followed by a broadcast back out. Rank 0
/// only starts the broadcast once it has heard from everyone, and no rank
/// returns before the broadcast reaches it.
pub fn barrier<C: Channel + ?Sized>(group: &Group, channel: &C, tag: Tag) -> Result<()> {
    tracing::trace!(rank = group.rank(), tag, "barrier: entering");
    doubling_all_reduce(group, channel, (), |(), ()| (), tag)
}
