//! Six-State Quantum Key Distribution Protocol.
//!
//! Alice encodes each bit in one of three bases:
//!
//! | basis | bit 0          | bit 1           |
//! |-------|----------------|-----------------|
//! | 0 (Z) | \|0>           | X\|0>           |
//! | 1 (X) | H\|0>          | HX\|0>          |
//! | 2 (Y) | SH\|0>         | SHX\|0>         |
//!
//! Bob never applies S: basis 2 decodes with the same H as basis 1, so
//! Y-basis rounds that survive sifting carry uniformly random bits.

use crate::core::errors::ProtocolError;
use crate::core::{Gate, QuantumState};
use crate::protocols::qkd::{self, KeyExchangeResult, RunParameters};
use crate::protocols::{BasisTable, Protocol};
use rand::Rng;

pub const PROTOCOL: &str = "SSP";

pub const PREPARATION: BasisTable =
    BasisTable::new(PROTOCOL, &[&[], &[Gate::h], &[Gate::h, Gate::s]]);

pub const MEASUREMENT: BasisTable = BasisTable::new(PROTOCOL, &[&[], &[Gate::h], &[Gate::h]]);

#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder;

impl Encoder {
    pub fn encode(
        &self,
        raw_key: &[bool],
        bases: &[u8],
    ) -> Result<Vec<QuantumState>, ProtocolError> {
        qkd::prepare_states(&PREPARATION, raw_key, bases)
    }
}

/// Receiver side; structurally the BB84 decoder over three basis codes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder;

impl Decoder {
    pub fn decode<R: Rng + ?Sized>(
        &self,
        bases: &[u8],
        states: Vec<QuantumState>,
        rng: &mut R,
    ) -> Result<Vec<bool>, ProtocolError> {
        qkd::measure_states(&MEASUREMENT, bases, states, rng)
    }
}

pub fn run<R: Rng + ?Sized>(
    params: &RunParameters,
    rng: &mut R,
) -> Result<KeyExchangeResult, ProtocolError> {
    qkd::run_prepare_and_measure(Protocol::SixState, &PREPARATION, &MEASUREMENT, params, rng)
}
