// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving buses and branches from a [`TopologyGraph`].

use petgraph::graph::NodeIndex;

use crate::iterators::{Buses, Neighbors};
use crate::{Branch, Bus, Error, TopologyGraph};

/// `Bus` and `Branch` retrieval.
impl<B, L> TopologyGraph<B, L>
where
    B: Bus,
    L: Branch,
{
    /// Returns the bus with the given name, if it exists.
    pub fn bus(&self, name: &str) -> Result<&B, Error> {
        self.node_index(name).map(|i| &self.graph[i])
    }

    /// Returns the bus index of the bus with the given name.
    pub fn bus_index(&self, name: &str) -> Result<usize, Error> {
        self.node_index(name).map(|i| i.index())
    }

    /// Returns the bus at the given bus index.
    pub fn bus_at(&self, index: usize) -> Option<&B> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Returns the root bus.
    pub fn root(&self) -> &B {
        &self.graph[self.root]
    }

    /// Returns the bus index of the root bus.
    pub fn root_index(&self) -> usize {
        self.root.index()
    }

    /// Returns the number of buses in the graph.
    pub fn num_buses(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of branches in the graph.
    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    /// Returns an iterator over the buses in the graph.
    pub fn buses(&self) -> Buses<'_, B> {
        Buses {
            iter: self.graph.raw_nodes().iter(),
        }
    }

    /// Returns an iterator over the branches in the graph, in branch index
    /// order.
    pub fn branches(&self) -> std::slice::Iter<'_, L> {
        self.branches.iter()
    }

    /// Returns the branch with the given device id, if it exists.
    pub fn branch(&self, device_id: &str) -> Result<&L, Error> {
        self.branch_indices
            .get(device_id)
            .map(|&i| &self.branches[i])
            .ok_or_else(|| {
                Error::branch_not_found(format!("Branch with device id {device_id} not found."))
            })
    }

    /// Returns the bus indices of the sending and receiving end of the branch
    /// at the given branch index.
    pub(crate) fn branch_endpoints(&self, branch_idx: usize) -> Result<(usize, usize), Error> {
        let branch = self.branches.get(branch_idx).ok_or_else(|| {
            Error::internal(format!("Branch index {branch_idx} out of range."))
        })?;
        Ok((
            self.bus_index(branch.sending_bus())?,
            self.bus_index(branch.receiving_bus())?,
        ))
    }

    /// Returns an iterator over the buses adjacent to the bus with the given
    /// name.
    ///
    /// Returns an error if the given bus does not exist.
    pub fn neighbors(&self, name: &str) -> Result<Neighbors<'_, B>, Error> {
        self.node_index(name).map(|index| Neighbors {
            graph: &self.graph,
            iter: self.graph.neighbors(index),
        })
    }

    pub(crate) fn node_index(&self, name: &str) -> Result<NodeIndex, Error> {
        self.bus_indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::bus_not_found(format!("Bus with name {name} not found.")))
    }
}
