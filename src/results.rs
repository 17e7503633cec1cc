// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Conversion of a per-unit solution to the published voltage and current
//! records.

use crate::per_unit::PerUnitBases;
use crate::solver::PowerFlowSolution;
use crate::{Branch, Bus, Error, Phase, TopologyGraph};

/// Prefix of all output topics.
pub const NETWORK_STATE_TOPIC: &str = "NetworkState";

/// The voltage of one phase of a bus.
#[derive(Clone, Debug, PartialEq)]
pub struct VoltageRecord {
    /// Magnitude, in kV.
    pub magnitude: f64,
    /// Angle, in degrees.
    pub angle: f64,
    pub bus: String,
    pub phase: Phase,
}

impl VoltageRecord {
    /// Returns the topic the record is published on.
    pub fn topic(&self, grid_id: &str) -> String {
        format!("{NETWORK_STATE_TOPIC}.{grid_id}.Voltage.{}", self.bus)
    }
}

/// The current of one phase of a branch.
///
/// Branches are lumped, so both ends carry the same current.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentRecord {
    /// Magnitude at the sending end, in A.
    pub magnitude_sending_end: f64,
    /// Magnitude at the receiving end, in A.
    pub magnitude_receiving_end: f64,
    /// Angle at the sending end, in degrees.
    pub angle_sending_end: f64,
    /// Angle at the receiving end, in degrees.
    pub angle_receiving_end: f64,
    pub device_id: String,
    pub phase: Phase,
}

impl CurrentRecord {
    /// Returns the topic the record is published on.
    pub fn topic(&self, grid_id: &str) -> String {
        format!("{NETWORK_STATE_TOPIC}.{grid_id}.Current.{}", self.device_id)
    }
}

/// All records of one epoch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkState {
    pub voltages: Vec<VoltageRecord>,
    pub currents: Vec<CurrentRecord>,
}

impl NetworkState {
    /// Converts a solution to physical units.
    ///
    /// Voltages are scaled by the voltage base of their bus and currents by
    /// the current base of the sending bus of their branch.  Neutral rails
    /// are not part of the records.
    pub fn from_solution<B, L>(
        graph: &TopologyGraph<B, L>,
        bases: &PerUnitBases,
        solution: &PowerFlowSolution,
    ) -> Result<Self, Error>
    where
        B: Bus,
        L: Branch,
    {
        let mut voltages = Vec::with_capacity(graph.num_buses() * 3);
        for (bus_idx, (bus, rails)) in graph.buses().zip(&solution.bus_voltages).enumerate() {
            for (phase, &voltage) in rails.iter().filter(|(p, _)| p.is_publishable()) {
                let voltage = bases.voltage_from_per_unit(bus_idx, voltage)?;
                voltages.push(VoltageRecord {
                    magnitude: voltage.norm(),
                    angle: voltage.arg().to_degrees(),
                    bus: bus.name().to_string(),
                    phase,
                });
            }
        }

        let mut currents = Vec::with_capacity(graph.num_branches() * 3);
        for (branch_idx, (branch, rails)) in graph
            .branches()
            .zip(&solution.branch_currents)
            .enumerate()
        {
            let (sending, _) = graph.branch_endpoints(branch_idx)?;
            for (phase, &current) in rails.iter().filter(|(p, _)| p.is_publishable()) {
                let current = bases.current_from_per_unit(sending, current)?;
                let magnitude = current.norm();
                let angle = current.arg().to_degrees();
                currents.push(CurrentRecord {
                    magnitude_sending_end: magnitude,
                    magnitude_receiving_end: magnitude,
                    angle_sending_end: angle,
                    angle_receiving_end: angle,
                    device_id: branch.device_id().to_string(),
                    phase,
                });
            }
        }

        Ok(Self { voltages, currents })
    }
}
