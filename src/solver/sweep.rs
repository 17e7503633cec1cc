// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The steps of one backward-forward sweep iteration.

use num_complex::Complex64;

use super::state::SweepState;
use crate::{Error, Phase};

/// Buses whose phase currents are all below this magnitude don't load the
/// branches upstream of them.
const NEGLIGIBLE_CURRENT: f64 = 1e-4;

impl SweepState<'_> {
    /// Computes the current drawn at every bus from its power and its
    /// voltages of the previous iteration, less the current of its shunt
    /// admittance.
    pub(crate) fn compute_nodal_currents(&mut self) {
        for bus in &mut self.buses {
            let neutral_voltage = bus.voltage_old[Phase::Neutral];
            let mut neutral_current = Complex64::default();

            for phase in Phase::LINES {
                let voltage = bus.voltage_old[phase] - neutral_voltage;
                let current = if voltage.norm() > 0.0 {
                    (Complex64::from(bus.power[phase]) / voltage).conj()
                } else {
                    Complex64::default()
                };
                bus.current[phase] = current;
                neutral_current -= current;
            }
            bus.current[Phase::Neutral] = neutral_current;

            for phase in Phase::ALL {
                bus.current[phase] -= bus.voltage_old[phase] * bus.shunt_admittance;
            }
        }
    }

    /// Adds the nodal current of every bus to all branches on its root path.
    pub(crate) fn accumulate_branch_currents(&mut self) {
        for (bus_idx, bus) in self.buses.iter().enumerate() {
            if Phase::LINES
                .iter()
                .all(|&phase| bus.current[phase].norm() <= NEGLIGIBLE_CURRENT)
            {
                continue;
            }
            for &branch_idx in self.paths.branches_on_path(bus_idx) {
                let branch = &mut self.branches[branch_idx];
                for phase in Phase::ALL {
                    branch.current[phase] += bus.current[phase];
                }
            }
        }
    }

    pub(crate) fn compute_voltage_drops(&mut self) {
        for branch in &mut self.branches {
            branch.voltage_drop = branch.current.map(|current| current * branch.impedance);
        }
    }

    /// Propagates the root voltage outwards through the tree.
    ///
    /// A bus is resolved from an already resolved neighbor; the voltage drop
    /// of the branch between them is subtracted when moving away from the
    /// root and added otherwise.
    pub(crate) fn forward_sweep(&mut self) -> Result<(), Error> {
        let mut resolved = vec![false; self.buses.len()];
        resolved[self.root] = true;
        let mut remaining = self.buses.len() - 1;

        while remaining > 0 {
            let mut progress = false;

            for branch in &self.branches {
                let (near, far) = match (resolved[branch.sending], resolved[branch.receiving]) {
                    (true, false) => (branch.sending, branch.receiving),
                    (false, true) => (branch.receiving, branch.sending),
                    _ => continue,
                };

                let near_voltage = self.buses[near].voltage_new;
                let away_from_root = self.paths.path_len(far) > self.paths.path_len(near);
                let far_bus = &mut self.buses[far];
                for phase in Phase::ALL {
                    far_bus.voltage_new[phase] = if away_from_root {
                        near_voltage[phase] - branch.voltage_drop[phase]
                    } else {
                        near_voltage[phase] + branch.voltage_drop[phase]
                    };
                }

                resolved[far] = true;
                remaining -= 1;
                progress = true;
            }

            if !progress {
                let unresolved = resolved
                    .iter()
                    .enumerate()
                    .filter(|(_, done)| !**done)
                    .map(|(idx, _)| idx)
                    .collect::<Vec<_>>();
                return Err(Error::invalid_topology(format!(
                    "Forward sweep can't reach buses at indices {unresolved:?}."
                )));
            }
        }

        Ok(())
    }

    /// Returns the largest change of a phase-1 voltage between the previous
    /// and the current iteration.
    pub(crate) fn max_voltage_change(&self) -> f64 {
        self.buses
            .iter()
            .map(|bus| (bus.voltage_old[Phase::One] - bus.voltage_new[Phase::One]).norm())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use crate::graph::test_utils::TopologyBuilder;
    use crate::per_unit::PerUnitBases;
    use crate::solver::flat_start;
    use crate::solver::state::SweepState;
    use crate::{Error, Phase, Rails};

    #[test]
    fn test_single_iteration() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let root = builder.root();
        let b1 = builder.bus();
        let b2 = builder.bus();
        let b3 = builder.bus();
        // B2 hangs off B1, B3 is fed from the root through a reversed branch.
        builder.connect(root, b1).connect(b1, b2).connect(b3, root);
        let graph = builder.build()?;
        let bases = PerUnitBases::from_graph(&graph, 10_000.0)?;
        let paths = graph.path_cache()?;

        let load = Rails::new([0.3, 0.0, 0.0, 0.0]);
        let power = vec![Rails::splat(0.0), Rails::splat(0.0), load, load];
        let mut state = SweepState::try_new(&graph, &bases, &paths, flat_start(1.0), &power)?;

        state.compute_nodal_currents();
        let expected = Complex64::new(0.3, 0.0);
        assert!((state.buses[2].current[Phase::One] - expected).norm() < 1e-12);
        assert!((state.buses[2].current[Phase::Neutral] + expected).norm() < 1e-12);
        assert_eq!(state.buses[1].current, Rails::default());

        state.accumulate_branch_currents();
        assert!((state.branches[0].current[Phase::One] - expected).norm() < 1e-12);
        assert!((state.branches[1].current[Phase::One] - expected).norm() < 1e-12);
        assert!((state.branches[2].current[Phase::One] - expected).norm() < 1e-12);

        state.compute_voltage_drops();
        state.forward_sweep()?;

        let drop = expected * state.branches[0].impedance;
        let v1 = state.buses[1].voltage_new[Phase::One];
        let v2 = state.buses[2].voltage_new[Phase::One];
        let v3 = state.buses[3].voltage_new[Phase::One];
        assert!((v1 - (Complex64::new(1.0, 0.0) - drop)).norm() < 1e-12);
        assert!((v2 - (Complex64::new(1.0, 0.0) - 2.0 * drop)).norm() < 1e-12);
        assert!((v3 - v1).norm() < 1e-12);
        assert!(v2.norm() < v1.norm());
        assert!((state.max_voltage_change() - 2.0 * drop.norm()).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn test_shunt_currents() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let root = builder.root();
        builder.shunt_admittance(1e-3).chain(root, 2);
        let graph = builder.build()?;
        let bases = PerUnitBases::from_graph(&graph, 10_000.0)?;
        let paths = graph.path_cache()?;
        let power = vec![Rails::splat(0.0); 3];
        let mut state = SweepState::try_new(&graph, &bases, &paths, flat_start(1.0), &power)?;

        state.compute_nodal_currents();
        for bus in &state.buses[1..] {
            assert!(bus.shunt_admittance > 0.0);
            for phase in Phase::ALL {
                let expected = -bus.voltage_old[phase] * bus.shunt_admittance;
                assert!((bus.current[phase] - expected).norm() < 1e-12);
            }
            assert!(bus.current[Phase::One].norm() > 1e-4);
        }

        state.accumulate_branch_currents();
        let (b1, b2) = (&state.buses[1], &state.buses[2]);
        for phase in Phase::LINES {
            let upstream = state.branches[0].current[phase];
            assert!(upstream.norm() > 0.0);
            assert!((upstream - (b1.current[phase] + b2.current[phase])).norm() < 1e-12);
            assert!((state.branches[1].current[phase] - b2.current[phase]).norm() < 1e-12);
        }

        Ok(())
    }

    #[test]
    fn test_negligible_current_ignored() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let root = builder.root();
        builder.chain(root, 2);
        let graph = builder.build()?;
        let bases = PerUnitBases::from_graph(&graph, 10_000.0)?;
        let paths = graph.path_cache()?;
        let power = vec![
            Rails::splat(0.0),
            Rails::new([0.3, 0.0, 0.0, 0.0]),
            Rails::new([5e-5, 0.0, 0.0, 0.0]),
        ];
        let mut state = SweepState::try_new(&graph, &bases, &paths, flat_start(1.0), &power)?;

        state.compute_nodal_currents();
        assert!((state.buses[2].current[Phase::One] - Complex64::new(5e-5, 0.0)).norm() < 1e-12);

        state.accumulate_branch_currents();
        assert_eq!(state.branches[1].current, Rails::default());
        assert_eq!(state.branches[0].current, state.buses[1].current);

        Ok(())
    }

    #[test]
    fn test_next_iteration_keeps_root_pinned() -> Result<(), Error> {
        let mut builder = TopologyBuilder::new();
        let root = builder.root();
        builder.chain(root, 2);
        let graph = builder.build()?;
        let bases = PerUnitBases::from_graph(&graph, 10_000.0)?;
        let paths = graph.path_cache()?;
        let flat = flat_start(1.02);
        let power = vec![Rails::splat(0.0), Rails::splat(0.2), Rails::splat(0.0)];
        let mut state = SweepState::try_new(&graph, &bases, &paths, flat, &power)?;

        state.compute_nodal_currents();
        state.accumulate_branch_currents();
        state.compute_voltage_drops();
        state.forward_sweep()?;
        let solved = state.buses[2].voltage_new;
        state.start_next_iteration();

        assert_eq!(state.buses[0].voltage_new, flat);
        assert_eq!(state.buses[2].voltage_new, Rails::default());
        assert_eq!(state.buses[2].voltage_old, solved);
        assert!(state.branches.iter().all(|b| b.current == Rails::default()));

        Ok(())
    }
}
