use crate::error::{CohortError, Result};
use crate::types::Rank;

/// This process's position in a fixed-size process group.
///
/// Constructed once by whatever bootstraps the processes and passed by
/// reference into every collective. Immutable: rank and size never change
/// for the lifetime of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Group {
    rank: Rank,
    size: u32,
}

impl Group {
    /// Validate and build a group membership.
    pub fn new(rank: Rank, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(CohortError::InvalidGroupSize { size });
        }
        if rank >= size {
            return Err(CohortError::InvalidRank {
                rank,
                world_size: size,
            });
        }
        Ok(Self { rank, size })
    }

    /// A group of one: every collective is a local copy.
    pub fn single() -> Self {
        Self { rank: 0, size: 1 }
    }

    /// This process's rank (0-indexed).
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Number of ranks in the group.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_single(&self) -> bool {
        self.size == 1
    }

    /// Check that `root` names a member, for the operation being started.
    pub fn check_root(&self, root: Rank, operation: &'static str) -> Result<()> {
        if root >= self.size {
            return Err(CohortError::InvalidRoot {
                root,
                world_size: self.size,
                operation,
            });
        }
        Ok(())
    }

    /// Every membership of a group of `size`, one per rank.
    pub fn all(size: u32) -> Result<Vec<Self>> {
        if size == 0 {
            return Err(CohortError::InvalidGroupSize { size });
        }
        Ok((0..size).map(|rank| Self { rank, size }).collect())
    }
}
