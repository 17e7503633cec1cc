// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The backward-forward sweep power-flow solver.
//!
//! Every iteration computes the nodal currents from the voltages of the
//! previous one, accumulates them into the branches towards the root,
//! derives the branch voltage drops and propagates the root voltage out to
//! the leaves.  Iterations stop once the largest phase-1 voltage change
//! falls to the configured precision, or at the iteration cap.

mod state;
mod sweep;

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::per_unit::PerUnitBases;
use crate::{Branch, Bus, Error, PathCache, PowerFlowConfig, Rails, TopologyGraph};
use state::SweepState;

/// Returns the balanced voltage profile of the root bus: phase 2 lags phase
/// 1 by 120° and phase 3 leads it by 120°, with a grounded neutral.
pub fn flat_start(root_voltage: f64) -> Rails<Complex64> {
    Rails::new([
        Complex64::from_polar(root_voltage, 0.0),
        Complex64::from_polar(root_voltage, -2.0 * PI / 3.0),
        Complex64::from_polar(root_voltage, 2.0 * PI / 3.0),
        Complex64::default(),
    ])
}

/// Convergence settings of the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverSettings {
    pub precision: f64,
    pub max_iterations: usize,
    /// Per-unit voltage magnitude of the root bus.
    pub root_voltage: f64,
}

impl From<&PowerFlowConfig> for SolverSettings {
    fn from(config: &PowerFlowConfig) -> Self {
        Self {
            precision: config.precision(),
            max_iterations: config.max_iterations(),
            root_voltage: config.root_voltage(),
        }
    }
}

/// How a solve ended.
///
/// Reaching the iteration cap before the precision is not an error: the
/// voltages of the last iteration are still the best estimate available.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceReport {
    pub iterations: usize,
    /// Largest phase-1 voltage change of the last iteration, in per-unit.
    pub max_error: f64,
    pub converged: bool,
    /// Largest phase-1 voltage change of every iteration.
    pub error_history: Vec<f64>,
}

/// Per-unit voltages of every bus and currents of every branch, addressed
/// by bus and branch index.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerFlowSolution {
    pub bus_voltages: Vec<Rails<Complex64>>,
    pub branch_currents: Vec<Rails<Complex64>>,
    pub report: ConvergenceReport,
}

/// Solves the power flow of a radial network, one epoch at a time.
///
/// The graph, bases and path cache are built once and shared by all solves.
pub struct BackwardForwardSweep<'a, B, L>
where
    B: Bus,
    L: Branch,
{
    graph: &'a TopologyGraph<B, L>,
    bases: &'a PerUnitBases,
    paths: &'a PathCache,
    settings: SolverSettings,
}

impl<'a, B, L> BackwardForwardSweep<'a, B, L>
where
    B: Bus,
    L: Branch,
{
    pub fn new(
        graph: &'a TopologyGraph<B, L>,
        bases: &'a PerUnitBases,
        paths: &'a PathCache,
        settings: SolverSettings,
    ) -> Self {
        Self {
            graph,
            bases,
            paths,
            settings,
        }
    }

    /// Solves the network for the given per-unit nodal powers, one entry
    /// per bus in bus index order.
    pub fn solve(&self, nodal_power: &[Rails<f64>]) -> Result<PowerFlowSolution, Error> {
        let mut state = SweepState::try_new(
            self.graph,
            self.bases,
            self.paths,
            flat_start(self.settings.root_voltage),
            nodal_power,
        )?;

        let mut error_history = Vec::new();
        loop {
            state.compute_nodal_currents();
            state.accumulate_branch_currents();
            state.compute_voltage_drops();
            state.forward_sweep()?;

            let error = state.max_voltage_change();
            error_history.push(error);
            tracing::debug!("Sweep iteration {}: max voltage change {error}.", error_history.len());

            if error <= self.settings.precision
                || error_history.len() >= self.settings.max_iterations
            {
                break;
            }
            state.start_next_iteration();
        }

        let max_error = error_history.last().copied().unwrap_or_default();
        let report = ConvergenceReport {
            iterations: error_history.len(),
            max_error,
            converged: max_error <= self.settings.precision,
            error_history,
        };
        if report.converged {
            tracing::info!(
                "Power flow converged after {} iterations, max voltage change {}.",
                report.iterations,
                report.max_error
            );
        } else {
            tracing::warn!(
                "Power flow did not converge within {} iterations, max voltage change {} \
                 is above the precision {}.",
                report.iterations,
                report.max_error,
                self.settings.precision
            );
        }

        Ok(PowerFlowSolution {
            bus_voltages: state.buses.iter().map(|b| b.voltage_new).collect(),
            branch_currents: state.branches.iter().map(|b| b.current).collect(),
            report,
        })
    }
}
