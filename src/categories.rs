// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `BusType`, `Phase` and `PhaseConnection` enums,
//! which categorize buses, electrical rails and resource connections.

use crate::graph_traits::Bus;
use std::fmt::Display;

/// Represents the type of a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusType {
    /// The source bus.  Its voltage is fixed and never solved for.
    Root,
    Regular,
}

impl BusType {
    /// Maps the bus type string of the network information system to a
    /// `BusType`.  Only `root` identifies the root bus.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("root") {
            BusType::Root
        } else {
            BusType::Regular
        }
    }
}

impl Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusType::Root => write!(f, "Root"),
            BusType::Regular => write!(f, "Regular"),
        }
    }
}

/// One of the four rails of a three-phase-plus-neutral bus or branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    One,
    Two,
    Three,
    Neutral,
}

impl Phase {
    /// All rails, in storage order.
    pub const ALL: [Phase; 4] = [Phase::One, Phase::Two, Phase::Three, Phase::Neutral];

    /// The three phase conductors, without the neutral.
    pub const LINES: [Phase; 3] = [Phase::One, Phase::Two, Phase::Three];

    /// Position of the rail inside a [`Rails`][crate::Rails] array.
    pub fn index(self) -> usize {
        match self {
            Phase::One => 0,
            Phase::Two => 1,
            Phase::Three => 2,
            Phase::Neutral => 3,
        }
    }

    /// Phase number used in published records, `None` for the neutral.
    pub fn number(self) -> Option<u8> {
        match self {
            Phase::One => Some(1),
            Phase::Two => Some(2),
            Phase::Three => Some(3),
            Phase::Neutral => None,
        }
    }

    /// Returns true if records for this rail are published.
    ///
    /// The neutral is computed by the solver but never published.
    pub fn is_publishable(self) -> bool {
        self != Phase::Neutral
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.number() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "neutral"),
        }
    }
}

/// How a resource is connected to its bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseConnection {
    /// Connected between one phase conductor and the neutral.
    Single(Phase),
    /// Balanced connection to all three phase conductors.
    ThreePhase,
}

impl PhaseConnection {
    /// Maps a resource-state node code to a connection.
    ///
    /// Codes 1, 2 and 3 select a single phase.  Any other code is taken as a
    /// three-phase connection.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PhaseConnection::Single(Phase::One),
            2 => PhaseConnection::Single(Phase::Two),
            3 => PhaseConnection::Single(Phase::Three),
            other => {
                tracing::debug!("Node code {other} treated as a three-phase connection.");
                PhaseConnection::ThreePhase
            }
        }
    }
}

impl Display for PhaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseConnection::Single(phase) => write!(f, "Phase{phase}"),
            PhaseConnection::ThreePhase => write!(f, "ThreePhase"),
        }
    }
}

/// Predicates for checking the type of a `Bus`.
pub(crate) trait BusPredicates: Bus {
    fn is_root(&self) -> bool {
        self.bus_type() == BusType::Root
    }
}

/// Implement the `BusPredicates` trait for all types that implement the
/// `Bus` trait.
impl<T: Bus> BusPredicates for T {}
