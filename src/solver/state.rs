// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Working state of one power-flow solve.

use num_complex::Complex64;

use crate::per_unit::PerUnitBases;
use crate::{Branch, Bus, Error, PathCache, Rails, TopologyGraph};

/// Electrical state of a bus during a solve, in per-unit.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BusState {
    /// Voltages of the previous iteration.
    pub(crate) voltage_old: Rails<Complex64>,
    /// Voltages computed by the current iteration.  Zero until resolved by
    /// the forward sweep, except at the root.
    pub(crate) voltage_new: Rails<Complex64>,
    pub(crate) current: Rails<Complex64>,
    /// Half the shunt admittance of every branch incident to the bus.
    pub(crate) shunt_admittance: f64,
    /// Power drawn on each phase.  Always zero on the neutral.
    pub(crate) power: Rails<f64>,
}

/// Electrical state of a branch during a solve, in per-unit.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BranchState {
    pub(crate) sending: usize,
    pub(crate) receiving: usize,
    pub(crate) impedance: Complex64,
    /// Sum of the nodal currents of all buses downstream of the branch.
    pub(crate) current: Rails<Complex64>,
    pub(crate) voltage_drop: Rails<Complex64>,
}

/// All working arrays of a solve, built fresh for every epoch and dropped
/// once its results are extracted.
#[derive(Debug)]
pub(crate) struct SweepState<'a> {
    pub(crate) root: usize,
    pub(crate) flat_start: Rails<Complex64>,
    pub(crate) paths: &'a PathCache,
    pub(crate) buses: Vec<BusState>,
    pub(crate) branches: Vec<BranchState>,
}

impl<'a> SweepState<'a> {
    /// Builds the working state and applies the flat start: every bus gets
    /// the root voltage profile as its old voltage, and only the root has a
    /// new voltage.
    pub(crate) fn try_new<B, L>(
        graph: &TopologyGraph<B, L>,
        bases: &PerUnitBases,
        paths: &'a PathCache,
        flat_start: Rails<Complex64>,
        nodal_power: &[Rails<f64>],
    ) -> Result<Self, Error>
    where
        B: Bus,
        L: Branch,
    {
        if nodal_power.len() != graph.num_buses() {
            return Err(Error::internal(format!(
                "Got nodal power for {} buses, the network has {}.",
                nodal_power.len(),
                graph.num_buses()
            )));
        }

        let mut buses = nodal_power
            .iter()
            .map(|power| BusState {
                voltage_old: flat_start,
                voltage_new: Rails::default(),
                current: Rails::default(),
                shunt_admittance: 0.0,
                power: *power,
            })
            .collect::<Vec<_>>();

        let mut branches = Vec::with_capacity(graph.num_branches());
        for (branch_idx, branch) in graph.branches().enumerate() {
            let (sending, receiving) = graph.branch_endpoints(branch_idx)?;
            let half_shunt = bases.admittance_to_per_unit(sending, branch.shunt_admittance())? / 2.0;
            buses[sending].shunt_admittance += half_shunt;
            buses[receiving].shunt_admittance += half_shunt;

            branches.push(BranchState {
                sending,
                receiving,
                impedance: bases.impedance_to_per_unit(sending, branch.impedance())?,
                current: Rails::default(),
                voltage_drop: Rails::default(),
            });
        }

        let root = graph.root_index();
        buses[root].voltage_new = flat_start;

        Ok(Self {
            root,
            flat_start,
            paths,
            buses,
            branches,
        })
    }

    /// Makes the new voltages the old ones and clears everything the next
    /// iteration recomputes.  The root stays pinned to the flat start.
    pub(crate) fn start_next_iteration(&mut self) {
        for (bus_idx, bus) in self.buses.iter_mut().enumerate() {
            bus.voltage_old = bus.voltage_new;
            bus.current = Rails::default();
            bus.voltage_new = if bus_idx == self.root {
                self.flat_start
            } else {
                Rails::default()
            };
        }
        for branch in &mut self.branches {
            branch.current = Rails::default();
            branch.voltage_drop = Rails::default();
        }
    }
}
