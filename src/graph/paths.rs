// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The shortest-path cache: the root path of every bus, and the branches
//! lying on it.

use petgraph::graph::NodeIndex;

use crate::{Branch, Bus, Error, TopologyGraph};

/// Root paths of all buses of a [`TopologyGraph`], addressed by bus index.
///
/// Computed once from the graph and never changed afterwards.  The root path
/// of a bus orders the forward sweep, and the branches on it are the ones
/// that carry the bus's nodal current back to the root.
#[derive(Clone, Debug, PartialEq)]
pub struct PathCache {
    paths: Vec<Vec<usize>>,
    path_branches: Vec<Vec<usize>>,
}

impl PathCache {
    /// Returns the bus indices from the root to the given bus, both ends
    /// included.  The root's own path is just the root.
    pub fn path(&self, bus_idx: usize) -> &[usize] {
        self.paths.get(bus_idx).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the number of buses on the root path of the given bus.
    pub fn path_len(&self, bus_idx: usize) -> usize {
        self.path(bus_idx).len()
    }

    /// Returns the branch indices of the branches lying on the root path of
    /// the given bus.
    pub fn branches_on_path(&self, bus_idx: usize) -> &[usize] {
        self.path_branches
            .get(bus_idx)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl<B, L> TopologyGraph<B, L>
where
    B: Bus,
    L: Branch,
{
    /// Computes the root path of every bus.
    ///
    /// A branch belongs to a bus's root path when both of its endpoints are
    /// contained in that path.
    ///
    /// Returns an error if some bus can't be reached from the root.
    pub fn path_cache(&self) -> Result<PathCache, Error> {
        let mut paths = Vec::with_capacity(self.num_buses());
        let mut path_branches = Vec::with_capacity(self.num_buses());

        for index in self.graph.node_indices() {
            let path = self
                .find_path(self.root, index)
                .ok_or_else(|| {
                    Error::invalid_topology(format!(
                        "No path from root bus {} to bus {}.",
                        self.root().name(),
                        self.graph[index].name()
                    ))
                })?
                .into_iter()
                .map(NodeIndex::index)
                .collect::<Vec<_>>();

            let mut on_path = Vec::new();
            for branch_idx in 0..self.num_branches() {
                let (sending, receiving) = self.branch_endpoints(branch_idx)?;
                if path.contains(&sending) && path.contains(&receiving) {
                    on_path.push(branch_idx);
                }
            }

            paths.push(path);
            path_branches.push(on_path);
        }

        Ok(PathCache {
            paths,
            path_branches,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::TopologyBuilder;
    use crate::Error;

    #[test]
    fn test_path_cache() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let root = builder.root();
        let b1 = builder.bus();
        let b2 = builder.bus();
        let b3 = builder.bus();
        let b4 = builder.bus();
        builder
            .connect(root, b1)
            .connect(b1, b2)
            .connect(b2, b3)
            .connect(b4, b1);
        let graph = builder.build()?;
        let cache = graph.path_cache()?;

        assert_eq!(cache.path(root.index()), &[0]);
        assert_eq!(cache.path(b3.index()), &[0, 1, 2, 3]);
        assert_eq!(cache.path(b4.index()), &[0, 1, 4]);
        assert_eq!(cache.path_len(b2.index()), 3);
        assert_eq!(cache.path(17), &[] as &[usize]);

        assert_eq!(cache.branches_on_path(root.index()), &[] as &[usize]);
        assert_eq!(cache.branches_on_path(b3.index()), &[0, 1, 2]);
        assert_eq!(cache.branches_on_path(b4.index()), &[0, 3]);

        Ok(())
    }
}
