use crate::config::CohortConfig;
use crate::error::Result;
use crate::group::Group;
use crate::transport::{Channel, Delivery, LocalChannel, TcpChannel};
use crate::types::Rank;
use std::net::SocketAddr;

/// Blocking collective API for one rank of a group.
///
/// Bundles the rank's [`Group`] with the [`Channel`] it talks over. Every
/// rank in the group must call the same collectives in the same order with
/// the same root; the calls block until this rank's part is done.
///
/// # Example
///
/// ```no_run
/// use cohort::client::Communicator;
/// use cohort::types::ReduceOp;
///
/// # fn example() -> cohort::error::Result<()> {
/// let comms = Communicator::local(4)?;
/// let handles: Vec<_> = comms
///     .into_iter()
///     .map(|comm| {
///         std::thread::spawn(move || comm.all_reduce_op(comm.rank() as u64, ReduceOp::Sum))
///     })
///     .collect();
/// for h in handles {
///     assert_eq!(h.join().unwrap()?, 6);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Communicator<C> {
    pub(crate) group: Group,
    pub(crate) channel: C,
    pub(crate) config: CohortConfig,
}

impl<C: Channel> Communicator<C> {
    pub fn new(group: Group, channel: C) -> Self {
        Self::with_config(group, channel, CohortConfig::default())
    }

    pub fn with_config(group: Group, channel: C, config: CohortConfig) -> Self {
        Self {
            group,
            channel,
            config,
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    /// This rank's position in the group (0-indexed).
    pub fn rank(&self) -> Rank {
        self.group.rank()
    }

    /// Number of ranks in the group.
    pub fn size(&self) -> u32 {
        self.group.size()
    }

    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }
}

impl Communicator<LocalChannel> {
    /// In-process group of `size` buffered ranks, one communicator per rank.
    pub fn local(size: u32) -> Result<Vec<Self>> {
        Self::local_with(size, Delivery::Buffered, CohortConfig::default())
    }

    /// In-process group with explicit delivery mode and config.
    pub fn local_with(size: u32, delivery: Delivery, config: CohortConfig) -> Result<Vec<Self>> {
        config.validate()?;
        let endpoints = LocalChannel::mesh(size, delivery)?;
        tracing::debug!(size, ?delivery, "local group formed");
        Ok(endpoints
            .into_iter()
            .map(|ch| Communicator::with_config(ch.group(), ch, config.clone()))
            .collect())
    }
}

impl Communicator<TcpChannel> {
    /// Join a TCP group. `addrs[i]` is rank `i`'s listen address; this call
    /// binds `addrs[group.rank()]` and blocks until the mesh is formed.
    pub fn tcp(group: Group, addrs: &[SocketAddr], config: CohortConfig) -> Result<Self> {
        let channel = TcpChannel::connect(group, addrs, &config)?;
        Ok(Communicator::with_config(group, channel, config))
    }
}

impl<C> std::fmt::Debug for Communicator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Communicator")
            .field("rank", &self.group.rank())
            .field("size", &self.group.size())
            .field("all_reduce", &self.config.all_reduce)
            .finish()
    }
}
