// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Fixed-size per-rail storage for three-phase-plus-neutral quantities.

use std::ops::{Index, IndexMut};

use crate::Phase;

/// One value per rail, indexed by [`Phase`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rails<T>([T; 4]);

impl<T> Rails<T> {
    /// Creates rails from values in `[One, Two, Three, Neutral]` order.
    pub fn new(values: [T; 4]) -> Self {
        Rails(values)
    }

    /// Iterates over `(phase, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &T)> {
        Phase::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T: Copy> Rails<T> {
    /// Creates rails with the same value on every rail.
    pub fn splat(value: T) -> Self {
        Rails([value; 4])
    }

    /// Applies `f` to every rail.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Rails<U> {
        Rails(self.0.map(f))
    }
}

impl<T> Index<Phase> for Rails<T> {
    type Output = T;

    fn index(&self, phase: Phase) -> &T {
        &self.0[phase.index()]
    }
}

impl<T> IndexMut<Phase> for Rails<T> {
    fn index_mut(&mut self, phase: Phase) -> &mut T {
        &mut self.0[phase.index()]
    }
}
