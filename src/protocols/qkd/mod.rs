//! Per-protocol encode / decode / sift / estimate pipelines.
//!
//! BB84 and SSP are prepare-and-measure protocols that differ only in their
//! basis tables, so their encoder, decoder and end-to-end run share the
//! helpers below. E91 distributes entangled pairs and has its own pipeline.

pub mod bb84;
pub mod e91;
pub mod estimation;
pub mod sifting;
pub mod ssp;

use crate::core::errors::ProtocolError;
use crate::core::{Gate, QuantumChannel, QuantumState};
use crate::noise::add_noise;
use crate::protocols::{BasisTable, Protocol, check_bases, check_length};
use crate::sampler::KeySampler;
use estimation::error_rate;
use rand::Rng;
use sifting::Sifter;
use tracing::{debug, trace};

/// Knobs of an end-to-end run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunParameters {
    /// Number of rounds (qubits or pairs) to simulate.
    pub rounds: usize,
    /// Noise applied to every transmitted qubit.
    pub channel: QuantumChannel,
    /// Probability that an intercept-resend attacker measures a round.
    pub eve_ratio: f64,
    /// Probability of flipping each bit of the receiver's raw key.
    pub bit_flip_noise: f64,
    /// Fraction of the sifted key disclosed to estimate the error rate.
    pub check_ratio: f64,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            rounds: 1000,
            channel: QuantumChannel::identity(),
            eve_ratio: 0.0,
            bit_flip_noise: 0.0,
            check_ratio: 0.5,
        }
    }
}

impl RunParameters {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.rounds == 0 {
            return Err(ProtocolError::InvalidConfig(
                "rounds must be positive".to_string(),
            ));
        }
        for p in [self.eve_ratio, self.bit_flip_noise, self.check_ratio] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ProtocolError::InvalidProbability(p));
            }
        }
        // No check bits means no error-rate estimate
        if self.check_ratio == 0.0 {
            return Err(ProtocolError::InvalidConfig(
                "check_ratio must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a BB84 or SSP run.
#[derive(Clone, Debug)]
pub struct KeyExchangeResult {
    pub protocol: Protocol,
    pub raw_length: usize,
    pub sifted_length: usize,
    /// Bits disclosed for error estimation.
    pub check_length: usize,
    pub check_errors: usize,
    /// Fractional Hamming distance over the check bits.
    pub error_rate: f64,
    pub eve_intercepted_count: usize,
    pub alice_bits: Vec<bool>,
    pub alice_bases: Vec<u8>,
    pub bob_bases: Vec<u8>,
    pub bob_raw_key: Vec<bool>,
    pub alice_sifted_key: Vec<bool>,
    pub bob_sifted_key: Vec<bool>,
    /// Sifted key left after removing the check bits.
    pub alice_key: Vec<bool>,
    pub bob_key: Vec<bool>,
}

/// Prepares one single-qubit state per round: X if the bit is set, then the
/// preparation gates of the round's basis.
pub(crate) fn prepare_states(
    table: &BasisTable,
    raw_key: &[bool],
    bases: &[u8],
) -> Result<Vec<QuantumState>, ProtocolError> {
    check_length(raw_key.len(), bases.len())?;
    check_bases(table, bases)?;

    raw_key
        .iter()
        .zip(bases)
        .map(|(&bit, &basis)| prepare_state(table, bit, basis))
        .collect()
}

pub(crate) fn prepare_state(
    table: &BasisTable,
    bit: bool,
    basis: u8,
) -> Result<QuantumState, ProtocolError> {
    let mut state = QuantumState::new(1)?;
    if bit {
        state.apply(&Gate::x(), &[0])?;
    }
    table.circuit(basis)?.apply_to(&mut state)?;
    Ok(state)
}

/// Applies the measurement gates of each round's basis and reads one bit per state.
pub(crate) fn measure_states<R: Rng + ?Sized>(
    table: &BasisTable,
    bases: &[u8],
    states: Vec<QuantumState>,
    rng: &mut R,
) -> Result<Vec<bool>, ProtocolError> {
    check_length(bases.len(), states.len())?;
    check_bases(table, bases)?;

    bases
        .iter()
        .zip(states)
        .map(|(&basis, state)| measure_state(table, basis, state, rng))
        .collect()
}

pub(crate) fn measure_state<R: Rng + ?Sized>(
    table: &BasisTable,
    basis: u8,
    mut state: QuantumState,
    rng: &mut R,
) -> Result<bool, ProtocolError> {
    table.circuit(basis)?.apply_to(&mut state)?;
    Ok(state.measure_all(rng)[0])
}

fn random_bases<R: Rng + ?Sized>(count: u8, rounds: usize, rng: &mut R) -> Vec<u8> {
    (0..rounds).map(|_| rng.random_range(0..count)).collect()
}

/// Runs a prepare-and-measure protocol end to end.
///
/// Randomness is consumed in a fixed order: Alice's bits, Alice's bases,
/// Bob's bases, then per-round channel/attacker draws, measurement draws,
/// classical noise and finally the check-sample choice.
pub(crate) fn run_prepare_and_measure<R: Rng + ?Sized>(
    protocol: Protocol,
    preparation: &BasisTable,
    measurement: &BasisTable,
    params: &RunParameters,
    rng: &mut R,
) -> Result<KeyExchangeResult, ProtocolError> {
    params.validate()?;
    let rounds = params.rounds;

    let alice_bits: Vec<bool> = (0..rounds).map(|_| rng.random_bool(0.5)).collect();
    let alice_bases = random_bases(preparation.len(), rounds, rng);
    let bob_bases = random_bases(measurement.len(), rounds, rng);

    let states = prepare_states(preparation, &alice_bits, &alice_bases)?;

    let mut eve_intercepted_count = 0;
    let mut transmitted = Vec::with_capacity(rounds);
    for (round, mut state) in states.into_iter().enumerate() {
        params.channel.apply(&mut state, &[0], rng)?;

        // Intercept-resend: Eve measures in a random basis and re-prepares
        if params.eve_ratio > 0.0 && rng.random_bool(params.eve_ratio) {
            eve_intercepted_count += 1;
            let e_basis = rng.random_range(0..measurement.len());
            let e_bit = measure_state(measurement, e_basis, state, rng)?;
            trace!(round, e_basis, e_bit, "intercepted");
            state = prepare_state(preparation, e_bit, e_basis)?;
        }

        transmitted.push(state);
    }

    let mut bob_raw_key = measure_states(measurement, &bob_bases, transmitted, rng)?;
    if params.bit_flip_noise > 0.0 {
        bob_raw_key = add_noise(&bob_raw_key, params.bit_flip_noise, rng)?;
    }

    let sifter = Sifter::for_protocol(protocol, &alice_bases, &bob_bases)?;
    let alice_sifted_key = sifter.sift(&alice_bits)?;
    let bob_sifted_key = sifter.sift(&bob_raw_key)?;
    let sifted_length = alice_sifted_key.len();

    let sampler = KeySampler::random(sifted_length, params.check_ratio, rng);
    let alice_check = sampler.sample(&alice_sifted_key)?;
    let bob_check = sampler.sample(&bob_sifted_key)?;
    let error_rate = error_rate(&alice_check, &bob_check)?;
    let check_errors = alice_check
        .iter()
        .zip(&bob_check)
        .filter(|(a, b)| a != b)
        .count();

    debug!(
        protocol = %protocol,
        rounds,
        sifted_length,
        check_length = alice_check.len(),
        error_rate,
        eve_intercepted_count,
        "key exchange finished"
    );

    Ok(KeyExchangeResult {
        protocol,
        raw_length: rounds,
        sifted_length,
        check_length: alice_check.len(),
        check_errors,
        error_rate,
        eve_intercepted_count,
        alice_key: sampler.remaining(&alice_sifted_key)?,
        bob_key: sampler.remaining(&bob_sifted_key)?,
        alice_bits,
        alice_bases,
        bob_bases,
        bob_raw_key,
        alice_sifted_key,
        bob_sifted_key,
    })
}
