// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over buses and branches in a `TopologyGraph`.

use petgraph::graph::UnGraph;

use crate::Bus;

/// An iterator over the buses in a `TopologyGraph`, in bus index order.
pub struct Buses<'a, B>
where
    B: Bus,
{
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Node<B>>,
}

impl<'a, B> Iterator for Buses<'a, B>
where
    B: Bus,
{
    type Item = &'a B;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|n| &n.weight)
    }
}

/// An iterator over the buses adjacent to a bus in a `TopologyGraph`.
pub struct Neighbors<'a, B>
where
    B: Bus,
{
    pub(crate) graph: &'a UnGraph<B, usize>,
    pub(crate) iter: petgraph::graph::Neighbors<'a, usize>,
}

impl<'a, B> Iterator for Neighbors<'a, B>
where
    B: Bus,
{
    type Item = &'a B;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}
