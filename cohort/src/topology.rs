//! Rank arithmetic shared by every collective.
//!
//! Pure functions: no I/O, no state. Trees are binary heaps over
//! root-relative ranks; hypercube and doubling patterns pair ranks that
//! differ in one bit.

use crate::types::Rank;

/// Integer ceiling of log2(n). Returns 0 for n <= 1.
pub fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        return 0;
    }
    // For n > 1: ceil(log2(n)) = 32 - (n-1).leading_zeros()
    u32::BITS - (n - 1).leading_zeros()
}

/// Largest power of two `<= n`. Returns 0 for n == 0.
pub fn largest_power_of_two_at_most(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    1 << (u32::BITS - 1 - n.leading_zeros())
}

/// Renumber `rank` so that `root` becomes tree rank 0.
pub fn to_tree_rank(rank: Rank, root: Rank, size: u32) -> Rank {
    debug_assert!(rank < size && root < size);
    (rank + size - root) % size
}

/// Inverse of [`to_tree_rank`].
pub fn to_global_rank(tree_rank: Rank, root: Rank, size: u32) -> Rank {
    debug_assert!(tree_rank < size && root < size);
    (tree_rank + root) % size
}

/// Parent of a tree rank in the binary heap; `None` for the root.
pub fn parent(tree_rank: Rank) -> Option<Rank> {
    if tree_rank == 0 {
        None
    } else {
        Some((tree_rank - 1) / 2)
    }
}

/// Children of a node in the binary heap over `size` tree ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Children {
    pub left: Option<Rank>,
    pub right: Option<Rank>,
}

impl Children {
    /// Left child first, then right.
    pub fn iter(&self) -> impl Iterator<Item = Rank> + '_ {
        self.left.into_iter().chain(self.right)
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

pub fn children(tree_rank: Rank, size: u32) -> Children {
    // u64 so that tree ranks near u32::MAX cannot overflow.
    let present = |c: u64| (c < u64::from(size)).then_some(c as Rank);
    let base = 2 * u64::from(tree_rank);
    Children {
        left: present(base + 1),
        right: present(base + 2),
    }
}

/// Depth of the binary heap over `size` ranks (0 for a single rank).
pub fn tree_depth(size: u32) -> u32 {
    if size <= 1 {
        return 0;
    }
    // Deepest node is size-1; its depth is floor(log2(size)).
    u32::BITS - 1 - size.leading_zeros()
}

/// Butterfly partner of `rank` at `step`, if it exists in a group of `size`.
pub fn hypercube_partner(rank: Rank, step: u32, size: u32) -> Option<Rank> {
    let partner = rank ^ step;
    (partner < size).then_some(partner)
}

/// Steps `1, 2, 4, …` strictly below `size`.
pub fn hypercube_steps(size: u32) -> impl Iterator<Item = u32> {
    (0..ceil_log2(size)).map(|bit| 1u32 << bit)
}

/// What a root-relative rank does in one round of the doubling reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoublingRole {
    /// Receive from this tree rank and combine.
    Receive(Rank),
    /// Send the accumulated value to this tree rank, then retire.
    Send(Rank),
    /// Nothing to do this round (already retired, or no partner in range).
    Idle,
}

/// Role of `tree_rank` at `step` of a doubling reduce toward tree rank 0.
///
/// Ranks with `tree_rank % (2*step) == 0` receive from `tree_rank + step`
/// when that rank exists; ranks with `tree_rank % (2*step) == step` send to
/// `tree_rank - step`. Everything else has retired in an earlier round.
pub fn doubling_role(tree_rank: Rank, step: u32, size: u32) -> DoublingRole {
    let span = u64::from(step) * 2;
    let offset = u64::from(tree_rank) % span;
    if offset == 0 {
        let src = u64::from(tree_rank) + u64::from(step);
        if src < u64::from(size) {
            DoublingRole::Receive(src as Rank)
        } else {
            DoublingRole::Idle
        }
    } else if offset == u64::from(step) {
        DoublingRole::Send(tree_rank - step)
    } else {
        DoublingRole::Idle
    }
}
