// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Assembly of per-unit nodal powers from the resource states of an epoch.

use crate::aggregator::CollectedState;
use crate::messages::CustomerInfo;
use crate::per_unit::PerUnitBases;
use crate::{Branch, Bus, Phase, PhaseConnection, Rails, TopologyGraph};

/// Computes the per-unit power drawn at every bus, on each phase rail.
///
/// Resource powers are in W with production positive, so they are negated:
/// a positive per-unit nodal power is demand.  Three-phase resources are
/// split over the three phases with a factor of `1/√3`.  The neutral rail
/// never carries power.
///
/// A storage override replaces the power of the regular resource states of
/// the same customer.  Resources that can't be placed on a bus are logged
/// and skipped.
pub fn assemble_nodal_power<B, L>(
    graph: &TopologyGraph<B, L>,
    bases: &PerUnitBases,
    customers: &CustomerInfo,
    resource_states: &[CollectedState],
    storage_states: &[CollectedState],
) -> Vec<Rails<f64>>
where
    B: Bus,
    L: Branch,
{
    let mut powers = vec![Rails::splat(0.0); graph.num_buses()];

    for collected in resource_states {
        let mut real_power = collected.state.real_power;
        for storage in storage_states
            .iter()
            .filter(|s| s.state.customer_id == collected.state.customer_id)
        {
            tracing::debug!(
                "Power of resource {} replaced by storage state of {}: {} W -> {} W.",
                collected.source,
                storage.source,
                real_power,
                storage.state.real_power
            );
            real_power = storage.state.real_power;
        }

        let Some(bus_name) = customers.bus_of(&collected.source) else {
            tracing::warn!(
                "Resource {} is not listed in the customer data, skipping it.",
                collected.source
            );
            continue;
        };
        let bus_idx = match graph.bus_index(bus_name) {
            Ok(idx) => idx,
            Err(err) => {
                tracing::warn!("Resource {} skipped: {err}", collected.source);
                continue;
            }
        };

        let per_unit = -bases.power_to_per_unit(real_power);
        let rails = &mut powers[bus_idx];
        match collected.state.node {
            PhaseConnection::Single(phase) => rails[phase] += per_unit,
            PhaseConnection::ThreePhase => {
                let per_phase = per_unit / 3.0_f64.sqrt();
                for phase in Phase::LINES {
                    rails[phase] += per_phase;
                }
            }
        }
        tracing::debug!(
            "Resource {} adds {per_unit} pu at bus {bus_name} ({}).",
            collected.source,
            collected.state.node
        );
    }

    for storage in storage_states {
        if !resource_states
            .iter()
            .any(|r| r.state.customer_id == storage.state.customer_id)
        {
            tracing::warn!(
                "Storage state of {} matches no resource of customer {}.",
                storage.source,
                storage.state.customer_id
            );
        }
    }

    powers
}
