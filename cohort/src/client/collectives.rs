use crate::collective::{self, tags};
use crate::config::AllReduceAlgorithm;
use crate::error::Result;
use crate::payload::Payload;
use crate::reduce::Reducible;
use crate::transport::Channel;
use crate::types::{Rank, ReduceOp};

use super::Communicator;

impl<C: Channel> Communicator<C> {
    /// Broadcast `value` from `root` to every rank.
    ///
    /// Every rank passes a value; only the root's is sent. Returns the
    /// root's value on every rank. `root` is checked before any message
    /// is sent.
    pub fn broadcast<T: Payload>(&self, value: T, root: Rank) -> Result<T> {
        collective::tree_broadcast(&self.group, &self.channel, value, root, tags::BROADCAST)
    }

    /// Combine every rank's value with `op` and return the result everywhere.
    ///
    /// `op` must be associative and commutative, and every rank must pass a
    /// value with the same encoded size. The engine comes from
    /// [`CohortConfig::all_reduce`](crate::config::CohortConfig::all_reduce).
    pub fn all_reduce<T, F>(&self, value: T, op: F) -> Result<T>
    where
        T: Payload,
        F: Fn(T, T) -> T,
    {
        let algorithm = self.resolved_all_reduce();
        tracing::debug!(
            rank = self.rank(),
            size = self.size(),
            algorithm = algorithm.name(),
            "all-reduce"
        );
        let (group, channel, tag) = (&self.group, &self.channel, tags::ALL_REDUCE);
        match algorithm {
            AllReduceAlgorithm::Butterfly => {
                collective::butterfly_all_reduce(group, channel, value, op, tag)
            }
            AllReduceAlgorithm::FoldedButterfly => {
                collective::folded_butterfly_all_reduce(group, channel, value, op, tag)
            }
            AllReduceAlgorithm::Doubling | AllReduceAlgorithm::Auto => {
                collective::doubling_all_reduce(group, channel, value, op, tag)
            }
        }
    }

    /// [`all_reduce`](Self::all_reduce) with a built-in operator.
    pub fn all_reduce_op<T: Payload + Reducible>(&self, value: T, op: ReduceOp) -> Result<T> {
        self.all_reduce(value, move |a, b| op.apply(a, b))
    }

    /// Combine every rank's value at `root`.
    ///
    /// Returns `Some(result)` on the root and `None` on every other rank.
    pub fn reduce<T, F>(&self, value: T, op: F, root: Rank) -> Result<Option<T>>
    where
        T: Payload,
        F: Fn(T, T) -> T,
    {
        collective::tree_reduce(&self.group, &self.channel, value, op, root, tags::REDUCE)
    }

    /// [`reduce`](Self::reduce) with a built-in operator.
    pub fn reduce_op<T: Payload + Reducible>(
        &self,
        value: T,
        op: ReduceOp,
        root: Rank,
    ) -> Result<Option<T>> {
        self.reduce(value, move |a, b| op.apply(a, b), root)
    }

    /// Block until every rank has called `barrier`.
    pub fn barrier(&self) -> Result<()> {
        collective::barrier(&self.group, &self.channel, tags::BARRIER)
    }

    /// All-reduce engine this communicator runs, with `Auto` resolved for
    /// the group size.
    pub fn resolved_all_reduce(&self) -> AllReduceAlgorithm {
        match self.config.all_reduce {
            AllReduceAlgorithm::Auto if self.size().is_power_of_two() => {
                AllReduceAlgorithm::Butterfly
            }
            AllReduceAlgorithm::Auto => AllReduceAlgorithm::Doubling,
            other => other,
        }
    }
}
