//! Block codec for prepare-and-measure protocols.
//!
//! Encodes N key bits into a single N-qubit register (qubit `i` carries bit
//! `i`) and decodes it with one composed basis-change circuit followed by a
//! single measurement of the whole register.

use crate::core::errors::{ProtocolError, StateError};
use crate::core::{Circuit, QuantumState};
use crate::protocols::qkd::prepare_state;
use crate::protocols::{BasisTable, Protocol, bb84, check_bases, check_length, ssp};
use rand::Rng;

fn tables(protocol: Protocol) -> Result<(BasisTable, BasisTable), ProtocolError> {
    match protocol {
        Protocol::Bb84 => Ok((bb84::PREPARATION, bb84::MEASUREMENT)),
        Protocol::SixState => Ok((ssp::PREPARATION, ssp::MEASUREMENT)),
        Protocol::E91 => Err(ProtocolError::UnsupportedProtocol(protocol.to_string())),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BlockEncoder {
    protocol: Protocol,
    preparation: BasisTable,
}

impl BlockEncoder {
    /// Fails with `UnsupportedProtocol` for entanglement-based protocols.
    pub fn new(protocol: Protocol) -> Result<Self, ProtocolError> {
        let (preparation, _) = tables(protocol)?;
        Ok(Self {
            protocol,
            preparation,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Encodes `key_bits[i]` in basis `bases[i]` on qubit `i` of one register.
    pub fn encode(&self, key_bits: &[bool], bases: &[u8]) -> Result<QuantumState, ProtocolError> {
        check_length(key_bits.len(), bases.len())?;
        check_bases(&self.preparation, bases)?;

        let mut qubits = key_bits
            .iter()
            .zip(bases)
            .map(|(&bit, &basis)| prepare_state(&self.preparation, bit, basis));

        let first = match qubits.next() {
            Some(state) => state?,
            None => return Err(StateError::EmptyRegister.into()),
        };
        qubits.try_fold(first, |register, qubit| Ok(register.compose(qubit?)))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BlockDecoder {
    protocol: Protocol,
    measurement: BasisTable,
}

impl BlockDecoder {
    pub fn new(protocol: Protocol) -> Result<Self, ProtocolError> {
        let (_, measurement) = tables(protocol)?;
        Ok(Self {
            protocol,
            measurement,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Basis-change circuit over the whole register.
    pub fn circuit(&self, bases: &[u8]) -> Result<Circuit, ProtocolError> {
        let mut circuit = Circuit::new(bases.len());
        for (qubit, &basis) in bases.iter().enumerate() {
            circuit.compose(&self.measurement.circuit(basis)?, qubit)?;
        }
        Ok(circuit)
    }

    /// Measures qubit `i` in basis `bases[i]`, returning one bit per qubit.
    pub fn decode<R: Rng + ?Sized>(
        &self,
        mut register: QuantumState,
        bases: &[u8],
        rng: &mut R,
    ) -> Result<Vec<bool>, ProtocolError> {
        check_length(register.num_qubits(), bases.len())?;
        check_bases(&self.measurement, bases)?;

        self.circuit(bases)?.apply_to(&mut register)?;
        Ok(register.measure_all(rng))
    }
}
