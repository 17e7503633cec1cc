// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Per-unit normalization of voltages, currents, powers and impedances.
//!
//! All bases are derived from the line-to-line voltage base of each bus (in
//! kV) and one apparent-power base (in VA) shared by the whole network:
//!
//! - current base: `S_base / (√3 · V_base)`, in A,
//! - impedance base: `V_base / I_base`, in Ω.
//!
//! Voltage bases are given in kV and converted to V inside both formulas.

use num_complex::Complex64;

use crate::{Branch, Bus, Error, TopologyGraph};

/// The bases of a single bus.
#[derive(Clone, Copy, Debug, PartialEq)]
struct BusBases {
    voltage: f64,
    current: f64,
    impedance: f64,
}

/// Per-unit bases of every bus of a network, addressed by bus index.
#[derive(Clone, Debug, PartialEq)]
pub struct PerUnitBases {
    power_base: f64,
    buses: Vec<BusBases>,
}

impl PerUnitBases {
    /// Computes the bases for the given voltage bases (kV, in bus index
    /// order) and apparent-power base (VA).
    pub fn try_new(
        voltage_bases: impl IntoIterator<Item = f64>,
        power_base: f64,
    ) -> Result<Self, Error> {
        if !power_base.is_finite() || power_base <= 0.0 {
            return Err(Error::invalid_config(format!(
                "Apparent power base must be positive, got {power_base}."
            )));
        }

        let buses = voltage_bases
            .into_iter()
            .enumerate()
            .map(|(index, voltage)| {
                if !voltage.is_finite() || voltage <= 0.0 {
                    return Err(Error::invalid_bus(format!(
                        "Bus at index {index} has an invalid voltage base: {voltage}"
                    )));
                }
                let current = power_base / (3.0_f64.sqrt() * voltage * 1000.0);
                Ok(BusBases {
                    voltage,
                    current,
                    impedance: voltage * 1000.0 / current,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { power_base, buses })
    }

    /// Computes the bases of all buses of a topology graph.
    pub fn from_graph<B, L>(graph: &TopologyGraph<B, L>, power_base: f64) -> Result<Self, Error>
    where
        B: Bus,
        L: Branch,
    {
        Self::try_new(graph.buses().map(|b| b.voltage_base()), power_base)
    }

    fn bus(&self, bus_idx: usize) -> Result<&BusBases, Error> {
        self.buses
            .get(bus_idx)
            .ok_or_else(|| Error::internal(format!("No per-unit bases for bus index {bus_idx}.")))
    }

    /// Returns the apparent-power base, in VA.
    pub fn power_base(&self) -> f64 {
        self.power_base
    }

    /// Returns the voltage base of a bus, in kV.
    pub fn voltage_base(&self, bus_idx: usize) -> Result<f64, Error> {
        self.bus(bus_idx).map(|b| b.voltage)
    }

    /// Returns the current base of a bus, in A.
    pub fn current_base(&self, bus_idx: usize) -> Result<f64, Error> {
        self.bus(bus_idx).map(|b| b.current)
    }

    /// Returns the impedance base of a bus, in Ω.
    pub fn impedance_base(&self, bus_idx: usize) -> Result<f64, Error> {
        self.bus(bus_idx).map(|b| b.impedance)
    }

    /// Converts a voltage in kV at the given bus to per-unit.
    pub fn voltage_to_per_unit(&self, bus_idx: usize, kv: Complex64) -> Result<Complex64, Error> {
        Ok(kv / self.voltage_base(bus_idx)?)
    }

    /// Converts a per-unit voltage at the given bus to kV.
    pub fn voltage_from_per_unit(&self, bus_idx: usize, pu: Complex64) -> Result<Complex64, Error> {
        Ok(pu * self.voltage_base(bus_idx)?)
    }

    /// Converts a per-unit current to A, using the current base of the given
    /// bus.
    pub fn current_from_per_unit(&self, bus_idx: usize, pu: Complex64) -> Result<Complex64, Error> {
        Ok(pu * self.current_base(bus_idx)?)
    }

    /// Converts a power in W to per-unit.
    pub fn power_to_per_unit(&self, watts: f64) -> f64 {
        watts / self.power_base
    }

    /// Converts an impedance in Ω to per-unit, using the impedance base of
    /// the given bus.
    pub fn impedance_to_per_unit(&self, bus_idx: usize, ohms: Complex64) -> Result<Complex64, Error> {
        Ok(ohms / self.impedance_base(bus_idx)?)
    }

    /// Converts an admittance in S to per-unit, using the impedance base of
    /// the given bus.
    pub fn admittance_to_per_unit(&self, bus_idx: usize, siemens: f64) -> Result<f64, Error> {
        Ok(siemens * self.impedance_base(bus_idx)?)
    }
}
