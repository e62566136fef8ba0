//! E91 Quantum Key Distribution Protocol.
//!
//! A source distributes singlets |Ψ⁻> = (|01> - |10>)/√2; Alice measures
//! qubit 0 and Bob qubit 1, each in one of three bases:
//!
//! | code | Alice          | Bob            |
//! |------|----------------|----------------|
//! | 0    | Z              | Z              |
//! | 1    | X              | (Z - X)/√2     |
//! | 2    | (Z + X)/√2     | (Z + X)/√2     |
//!
//! Rounds where both chose 0 or both chose 2 are perfectly anti-correlated and
//! form the key; the (0|1, 1|2) pairs feed the CHSH test.

use crate::core::errors::ProtocolError;
use crate::core::{Circuit, Gate, QuantumState};
use crate::noise::add_noise;
use crate::protocols::qkd::RunParameters;
use crate::protocols::qkd::estimation::{ChshEstimator, error_rate};
use crate::protocols::qkd::sifting::Sifter;
use crate::protocols::{BasisTable, Protocol, check_bases, check_length};
use rand::Rng;
use std::f64::consts::FRAC_PI_4;
use tracing::{debug, warn};

pub const PROTOCOL: &str = "E91";

fn ry_minus_quarter() -> Gate {
    Gate::ry(-FRAC_PI_4)
}

fn ry_plus_quarter() -> Gate {
    Gate::ry(FRAC_PI_4)
}

/// Alice's basis code -> rotation applied to qubit 0 before measuring Z.
pub const ALICE_MEASUREMENT: BasisTable =
    BasisTable::new(PROTOCOL, &[&[Gate::i], &[Gate::h], &[ry_minus_quarter]]);

/// Bob's basis code -> rotation applied to qubit 1 before measuring Z.
pub const BOB_MEASUREMENT: BasisTable =
    BasisTable::new(PROTOCOL, &[&[Gate::i], &[ry_plus_quarter], &[ry_minus_quarter]]);

/// Circuit preparing |Ψ⁻> from |00>: (CNOT)(H ⊗ I)(X ⊗ X).
pub fn singlet_circuit() -> Result<Circuit, ProtocolError> {
    let mut circuit = Circuit::new(2);
    circuit
        .push(Gate::x(), &[0])?
        .push(Gate::x(), &[1])?
        .push(Gate::h(), &[0])?
        .push(Gate::cnot(), &[0, 1])?;
    Ok(circuit)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder;

impl Encoder {
    /// Creates `length` independent singlet pairs.
    pub fn encode(&self, length: usize) -> Result<Vec<QuantumState>, ProtocolError> {
        let circuit = singlet_circuit()?;
        (0..length)
            .map(|_| circuit.prepare().map_err(ProtocolError::from))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder;

impl Decoder {
    /// Two-qubit circuit rotating qubit 0 for Alice's basis and qubit 1 for Bob's.
    pub fn circuit(a_basis: u8, b_basis: u8) -> Result<Circuit, ProtocolError> {
        let mut circuit = Circuit::new(2);
        circuit
            .compose(&ALICE_MEASUREMENT.circuit(a_basis)?, 0)?
            .compose(&BOB_MEASUREMENT.circuit(b_basis)?, 1)?;
        Ok(circuit)
    }

    /// Measures every pair jointly, returning Alice's and Bob's raw keys.
    pub fn decode<R: Rng + ?Sized>(
        &self,
        a_bases: &[u8],
        b_bases: &[u8],
        states: Vec<QuantumState>,
        rng: &mut R,
    ) -> Result<(Vec<bool>, Vec<bool>), ProtocolError> {
        check_length(a_bases.len(), b_bases.len())?;
        check_length(a_bases.len(), states.len())?;
        check_bases(&ALICE_MEASUREMENT, a_bases)?;
        check_bases(&BOB_MEASUREMENT, b_bases)?;

        let mut a_raw_key = Vec::with_capacity(states.len());
        let mut b_raw_key = Vec::with_capacity(states.len());

        for ((&a_basis, &b_basis), mut state) in a_bases.iter().zip(b_bases).zip(states) {
            Self::circuit(a_basis, b_basis)?.apply_to(&mut state)?;
            let bits = state.measure_all(rng);
            a_raw_key.push(bits[0]);
            b_raw_key.push(bits[1]);
        }

        Ok((a_raw_key, b_raw_key))
    }
}

/// Outcome of an E91 run.
#[derive(Clone, Debug)]
pub struct E91Result {
    pub raw_length: usize,
    pub sifted_length: usize,
    /// sifted / raw; 2/9 in expectation for uniform bases.
    pub sifted_ratio: f64,
    /// CHSH parameter S; -2√2 for ideal singlets.
    pub chsh: f64,
    /// Correlations of the A0B1, A0B2, A1B2 and A1B1 buckets.
    pub correlations: [f64; 4],
    pub alice_bases: Vec<u8>,
    pub bob_bases: Vec<u8>,
    pub alice_raw_key: Vec<bool>,
    pub bob_raw_key: Vec<bool>,
    pub alice_sifted_key: Vec<bool>,
    pub bob_sifted_key: Vec<bool>,
    /// Bob's sifted key complemented to match Alice's (singlets anti-correlate).
    pub bob_key: Vec<bool>,
    /// Disagreement between `alice_sifted_key` and `bob_key`; `None` if nothing was sifted.
    pub key_error_rate: Option<f64>,
}

/// Runs E91 with uniformly random bases for both parties.
///
/// The channel acts on Bob's qubit; `eve_ratio` and `check_ratio` do not apply.
pub fn run<R: Rng + ?Sized>(
    params: &RunParameters,
    rng: &mut R,
) -> Result<E91Result, ProtocolError> {
    params.validate()?;
    let rounds = params.rounds;

    let alice_bases: Vec<u8> = (0..rounds)
        .map(|_| rng.random_range(0..ALICE_MEASUREMENT.len()))
        .collect();
    let bob_bases: Vec<u8> = (0..rounds)
        .map(|_| rng.random_range(0..BOB_MEASUREMENT.len()))
        .collect();

    let mut states = Encoder.encode(rounds)?;
    for state in states.iter_mut() {
        params.channel.apply(state, &[1], rng)?;
    }

    let (alice_raw_key, mut bob_raw_key) = Decoder.decode(&alice_bases, &bob_bases, states, rng)?;
    if params.bit_flip_noise > 0.0 {
        bob_raw_key = add_noise(&bob_raw_key, params.bit_flip_noise, rng)?;
    }

    let sifter = Sifter::for_protocol(Protocol::E91, &alice_bases, &bob_bases)?;
    let alice_sifted_key = sifter.sift(&alice_raw_key)?;
    let bob_sifted_key = sifter.sift(&bob_raw_key)?;
    let bob_key: Vec<bool> = bob_sifted_key.iter().map(|&b| !b).collect();
    let key_error_rate = error_rate(&alice_sifted_key, &bob_key).ok();
    if key_error_rate.is_none() {
        warn!(rounds, "no E91 round used a shared key basis");
    }

    let mut estimator = ChshEstimator::new();
    estimator.record_all(&alice_raw_key, &bob_raw_key, &alice_bases, &bob_bases)?;
    let chsh = estimator.parameter();

    let sifted_length = alice_sifted_key.len();
    let sifted_ratio = sifted_length as f64 / rounds as f64;

    debug!(rounds, sifted_length, sifted_ratio, chsh, "E91 finished");

    Ok(E91Result {
        raw_length: rounds,
        sifted_length,
        sifted_ratio,
        chsh,
        correlations: estimator.correlations(),
        alice_bases,
        bob_bases,
        alice_raw_key,
        bob_raw_key,
        alice_sifted_key,
        bob_sifted_key,
        bob_key,
        key_error_rate,
    })
}
