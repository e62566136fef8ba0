//! Quantum Key Distribution Protocols.
//!
//! This module contains the protocol selector and the basis lookup tables
//! shared by the per-protocol encoders and decoders:
//! - **BB84**: four states in the Z and X bases.
//! - **SSP**: the Six-State protocol, adding the Y basis.
//! - **E91**: entanglement-based, certified by the CHSH inequality.

pub mod block;
pub mod qkd;

pub use qkd::{bb84, e91, ssp};

use crate::core::errors::ProtocolError;
use crate::core::{Circuit, Gate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protocol selected for a run, fixed for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "BB84", alias = "bb84")]
    Bb84,
    #[serde(rename = "SSP", alias = "ssp")]
    SixState,
    #[serde(rename = "E91", alias = "e91")]
    E91,
}

impl Protocol {
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Bb84 => bb84::PROTOCOL,
            Protocol::SixState => ssp::PROTOCOL,
            Protocol::E91 => e91::PROTOCOL,
        }
    }

    /// Number of basis codes each party draws from.
    pub fn basis_count(&self) -> u8 {
        match self {
            Protocol::Bb84 => bb84::PREPARATION.len(),
            Protocol::SixState => ssp::PREPARATION.len(),
            Protocol::E91 => e91::ALICE_MEASUREMENT.len(),
        }
    }

    /// Whether the sender prepares single qubits (as opposed to sharing pairs).
    pub fn is_prepare_and_measure(&self) -> bool {
        !matches!(self, Protocol::E91)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BB84" => Ok(Protocol::Bb84),
            "SSP" | "SIX-STATE" | "SIXSTATE" => Ok(Protocol::SixState),
            "E91" => Ok(Protocol::E91),
            _ => Err(ProtocolError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// Lookup from basis code to the gate sequence a party applies for it.
///
/// Code `c` selects `entries[c]`; the gates are applied in order.
#[derive(Clone, Copy, Debug)]
pub struct BasisTable {
    protocol: &'static str,
    entries: &'static [&'static [fn() -> Gate]],
}

impl BasisTable {
    pub const fn new(protocol: &'static str, entries: &'static [&'static [fn() -> Gate]]) -> Self {
        Self { protocol, entries }
    }

    pub const fn len(&self) -> u8 {
        self.entries.len() as u8
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = u8> + use<> {
        0..self.len()
    }

    pub fn supports(&self, basis: u8) -> bool {
        (basis as usize) < self.entries.len()
    }

    /// Gates for `basis`, in application order.
    pub fn gates(&self, basis: u8) -> Result<Vec<Gate>, ProtocolError> {
        self.entries
            .get(basis as usize)
            .map(|entry| entry.iter().map(|make| make()).collect())
            .ok_or(ProtocolError::UnsupportedBasis {
                protocol: self.protocol,
                basis,
            })
    }

    /// Single-qubit circuit applying the gates for `basis`.
    pub fn circuit(&self, basis: u8) -> Result<Circuit, ProtocolError> {
        let mut circuit = Circuit::new(1);
        for gate in self.gates(basis)? {
            circuit.push(gate, &[0])?;
        }
        Ok(circuit)
    }
}

/// Checks that every code in `bases` is defined by `table`.
pub(crate) fn check_bases(table: &BasisTable, bases: &[u8]) -> Result<(), ProtocolError> {
    match bases.iter().find(|&&b| !table.supports(b)) {
        Some(&basis) => Err(ProtocolError::UnsupportedBasis {
            protocol: table.protocol,
            basis,
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_length(expected: usize, got: usize) -> Result<(), ProtocolError> {
    if expected != got {
        return Err(ProtocolError::LengthMismatch { expected, got });
    }
    Ok(())
}
