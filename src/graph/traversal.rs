// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains methods that help with graph traversal.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::NodeIndex;

use crate::{Branch, Bus, Error, TopologyGraph};

/// Traversal methods.
impl<B, L> TopologyGraph<B, L>
where
    B: Bus,
    L: Branch,
{
    /// Breadth-first search from `start` to `goal`.
    ///
    /// Returns the buses on the path, both ends included, or `None` if `goal`
    /// can't be reached.  A bus is its own single-bus path.
    pub(crate) fn find_path(&self, start: NodeIndex, goal: NodeIndex) -> Option<Vec<NodeIndex>> {
        if start == goal {
            return Some(vec![start]);
        }

        let mut came_from = HashMap::from([(start, start)]);
        let mut queue = VecDeque::from([start]);

        while let Some(index) = queue.pop_front() {
            for neighbor in self.graph.neighbors(index) {
                if came_from.contains_key(&neighbor) {
                    continue;
                }
                came_from.insert(neighbor, index);

                if neighbor == goal {
                    let mut path = vec![goal];
                    let mut current = goal;
                    while current != start {
                        current = came_from[&current];
                        path.push(current);
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }

        None
    }

    /// Returns the shortest sequence of buses leading from `from` to `to`,
    /// both ends included.
    ///
    /// Returns `Ok(None)` if there is no path between the two buses, and an
    /// error if either bus does not exist.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Option<Vec<&B>>, Error> {
        let start = self.node_index(from)?;
        let goal = self.node_index(to)?;

        Ok(self
            .find_path(start, goal)
            .map(|path| path.into_iter().map(|i| &self.graph[i]).collect()))
    }

    /// Returns the branch index of the branch connecting two buses, given by
    /// their bus indices, regardless of which of them is the sending end.
    pub(crate) fn branch_index_between(&self, a: usize, b: usize) -> Option<usize> {
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    /// Returns the branch connecting the two given buses, if they are
    /// adjacent.
    pub fn branch_between(&self, a: &str, b: &str) -> Result<Option<&L>, Error> {
        let a = self.bus_index(a)?;
        let b = self.bus_index(b)?;
        Ok(self
            .branch_index_between(a, b)
            .map(|branch_idx| &self.branches[branch_idx]))
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::{TestBranch, TestBus};
    use crate::{Bus, BusType, Error, TopologyGraph};

    fn buses_and_branches() -> (Vec<TestBus>, Vec<TestBranch>) {
        let buses = vec![
            TestBus::new("S", BusType::Root),
            TestBus::new("A", BusType::Regular),
            TestBus::new("B", BusType::Regular),
            TestBus::new("C", BusType::Regular),
            TestBus::new("D", BusType::Regular),
            TestBus::new("E", BusType::Regular),
        ];
        let branches = vec![
            // Main feeder
            TestBranch::new("SA", "S", "A"),
            TestBranch::new("AB", "A", "B"),
            TestBranch::new("BC", "B", "C"),
            // Lateral, given receiving end first
            TestBranch::new("DA", "D", "A"),
            TestBranch::new("ED", "E", "D"),
        ];

        (buses, branches)
    }

    fn names(path: Option<Vec<&TestBus>>) -> Option<Vec<&str>> {
        path.map(|p| p.into_iter().map(|b| b.name()).collect())
    }

    #[test]
    fn test_shortest_path() -> Result<(), Error> {
        let (buses, branches) = buses_and_branches();
        let graph = TopologyGraph::try_new(buses, branches)?;

        assert_eq!(
            names(graph.shortest_path("S", "C")?),
            Some(vec!["S", "A", "B", "C"])
        );
        assert_eq!(
            names(graph.shortest_path("S", "E")?),
            Some(vec!["S", "A", "D", "E"])
        );
        assert_eq!(
            names(graph.shortest_path("C", "E")?),
            Some(vec!["C", "B", "A", "D", "E"])
        );
        assert_eq!(names(graph.shortest_path("S", "S")?), Some(vec!["S"]));

        assert!(graph
            .shortest_path("S", "X")
            .is_err_and(|e| e == Error::bus_not_found("Bus with name X not found.")));

        Ok(())
    }

    #[test]
    fn test_every_bus_reachable_from_root() -> Result<(), Error> {
        let (buses, branches) = buses_and_branches();
        let graph = TopologyGraph::try_new(buses, branches)?;

        assert_eq!(graph.num_branches() + 1, graph.num_buses());
        for bus in graph.buses() {
            let path = graph.shortest_path(graph.root().name(), bus.name())?;
            assert!(path.is_some_and(|p| p.last() == Some(&bus)));
        }

        Ok(())
    }

    #[test]
    fn test_branch_between() -> Result<(), Error> {
        let (buses, branches) = buses_and_branches();
        let graph = TopologyGraph::try_new(buses, branches)?;

        assert_eq!(
            graph.branch_between("A", "D")?,
            Some(&TestBranch::new("DA", "D", "A"))
        );
        assert_eq!(
            graph.branch_between("D", "A")?,
            Some(&TestBranch::new("DA", "D", "A"))
        );
        assert_eq!(graph.branch_between("S", "B")?, None);
        assert!(graph.branch_between("S", "Q").is_err());

        Ok(())
    }
}
