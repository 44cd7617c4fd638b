//! Union-find (disjoint set union) over the clustered entities.
//!
//! The merge loop resolves both endpoints of every candidate edge to their
//! current roots and joins the roots when a merge is accepted. `find`
//! compresses paths iteratively so arbitrarily long chains never grow the
//! stack; `union` attaches by rank.

use crate::error::{ClusteringError, Result};

/// Partition of `0..len` into disjoint subsets.
///
/// # Examples
/// ```
/// use roicluster_core::DisjointSet;
///
/// let mut set = DisjointSet::new(4)?;
/// let root = set.union(0, 1)?;
/// assert_eq!(set.find(1)?, root);
/// assert_ne!(set.find(2)?, root);
/// assert_eq!(set.component_count(), 3);
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
    components: usize,
}

impl DisjointSet {
    /// Creates `len` singleton subsets.
    ///
    /// # Errors
    /// Returns [`ClusteringError::InvalidSize`] when `len == 0`.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(ClusteringError::InvalidSize { got: len });
        }
        Ok(Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
            components: len,
        })
    }

    /// Number of elements in the forest.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.parent.len() }

    /// Always `false`; construction rejects empty forests.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.parent.is_empty() }

    /// Number of disjoint subsets currently in the forest.
    #[must_use]
    #[rustfmt::skip]
    pub fn component_count(&self) -> usize { self.components }

    /// Returns the representative of `node`'s subset.
    ///
    /// Every node visited on the way up is repointed directly at the root.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when `node >= len`.
    pub fn find(&mut self, node: usize) -> Result<usize> {
        self.check(node)?;
        Ok(self.find_root(node))
    }

    /// Joins the subsets containing `left` and `right` and returns the
    /// surviving root.
    ///
    /// Raw elements and already-resolved roots are accepted alike. When both
    /// are already joined the shared root is returned unchanged. On equal
    /// rank `left`'s root survives.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when either index is invalid.
    pub fn union(&mut self, left: usize, right: usize) -> Result<usize> {
        self.check(left)?;
        self.check(right)?;
        Ok(self.union_roots(left, right))
    }

    /// Returns `true` when `left` and `right` share a representative.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when either index is invalid.
    pub fn same_set(&mut self, left: usize, right: usize) -> Result<bool> {
        Ok(self.find(left)? == self.find(right)?)
    }

    /// Returns `true` when `node` is currently the root of its subset.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when `node >= len`.
    pub fn is_root(&self, node: usize) -> Result<bool> {
        self.check(node)?;
        Ok(self.parent[node] == node)
    }

    /// Resolves the root of every element, in element order.
    pub fn roots(&mut self) -> Vec<usize> {
        (0..self.len()).map(|node| self.find_root(node)).collect()
    }

    fn check(&self, node: usize) -> Result<()> {
        if node < self.len() {
            Ok(())
        } else {
            Err(ClusteringError::entity_out_of_range(node, self.len()))
        }
    }

    /// Unchecked `find` for callers that validated `node` up front.
    pub(crate) fn find_root(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != root {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Unchecked `union` for callers that validated both indices up front.
    pub(crate) fn union_roots(&mut self, left: usize, right: usize) -> usize {
        let mut left = self.find_root(left);
        let mut right = self.find_root(right);
        if left == right {
            return left;
        }
        let left_rank = self.rank[left];
        let right_rank = self.rank[right];
        if left_rank < right_rank {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if left_rank == right_rank {
            self.rank[left] = left_rank.saturating_add(1);
        }
        self.components -= 1;
        left
    }
}
