// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur in the library.

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Debug, PartialEq)]
        pub(crate) enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub(crate) fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (BusNotFound, bus_not_found),
    (BranchNotFound, branch_not_found),
    (Internal, internal),
    (InvalidBus, invalid_bus),
    (InvalidBranch, invalid_branch),
    (InvalidConfig, invalid_config),
    (InvalidInput, invalid_input),
    (InvalidTopology, invalid_topology),
    (ProtocolViolation, protocol_violation)
);

/// An error that can occur while building the network topology, collecting
/// the inputs of an epoch, or solving the power flow.
#[derive(Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl Error {
    /// Returns true if the error comes from a missing or malformed setting.
    ///
    /// Such errors are fatal at startup.
    pub fn is_config_error(&self) -> bool {
        self.kind == ErrorKind::InvalidConfig
    }

    /// Returns true if the network topology can't be solved: the graph is
    /// disconnected, not a tree, or its buses and branches are inconsistent.
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidTopology | ErrorKind::InvalidBus | ErrorKind::InvalidBranch
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}
