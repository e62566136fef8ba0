//! BB84 Quantum Key Distribution Protocol.
//!
//! Alice encodes each bit in the Z basis (`0`) or the X basis (`1`):
//! |0>, |1>, |+> = H|0>, |-> = H|1>. Bob measures after applying H for the
//! X basis. Only rounds with equal bases are kept.

use crate::core::errors::ProtocolError;
use crate::core::{Gate, QuantumState};
use crate::protocols::qkd::{self, KeyExchangeResult, RunParameters};
use crate::protocols::{BasisTable, Protocol};
use rand::Rng;

pub const PROTOCOL: &str = "BB84";

/// Alice's basis code -> gates after the optional X.
pub const PREPARATION: BasisTable = BasisTable::new(PROTOCOL, &[&[], &[Gate::h]]);

/// Bob's basis code -> gates before the Z measurement.
pub const MEASUREMENT: BasisTable = BasisTable::new(PROTOCOL, &[&[], &[Gate::h]]);

#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder;

impl Encoder {
    /// Creates one state per round from Alice's raw key and bases.
    pub fn encode(
        &self,
        raw_key: &[bool],
        bases: &[u8],
    ) -> Result<Vec<QuantumState>, ProtocolError> {
        qkd::prepare_states(&PREPARATION, raw_key, bases)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder;

impl Decoder {
    /// Measures every state in Bob's basis for that round, yielding his raw key.
    pub fn decode<R: Rng + ?Sized>(
        &self,
        bases: &[u8],
        states: Vec<QuantumState>,
        rng: &mut R,
    ) -> Result<Vec<bool>, ProtocolError> {
        qkd::measure_states(&MEASUREMENT, bases, states, rng)
    }
}

/// Runs BB84 with random bits and bases.
pub fn run<R: Rng + ?Sized>(
    params: &RunParameters,
    rng: &mut R,
) -> Result<KeyExchangeResult, ProtocolError> {
    qkd::run_prepare_and_measure(Protocol::Bb84, &PREPARATION, &MEASUREMENT, params, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuantumChannel;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn encodes_the_four_states() {
        let states = Encoder
            .encode(&[false, true, false, true], &[0, 0, 1, 1])
            .unwrap();
        let h = std::f64::consts::FRAC_1_SQRT_2;

        assert_relative_eq!(states[0].probabilities()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(states[1].probabilities()[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(states[2].amplitudes()[1].re, h, epsilon = 1e-12);
        assert_relative_eq!(states[3].amplitudes()[1].re, -h, epsilon = 1e-12);
    }

    #[test]
    fn matching_bases_decode_exactly() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let states = Encoder.encode(&[true, false], &[0, 1]).unwrap();
            let bits = Decoder.decode(&[0, 1], states, &mut rng).unwrap();
            assert_eq!(bits, vec![true, false]);
        }
    }

    #[test]
    fn mismatched_basis_is_uniform() {
        let mut rng = StdRng::seed_from_u64(2);
        let trials = 4000;
        let states = Encoder.encode(&vec![false; trials], &vec![0; trials]).unwrap();
        let bits = Decoder.decode(&vec![1; trials], states, &mut rng).unwrap();
        let ones = bits.iter().filter(|&&b| b).count() as f64 / trials as f64;
        assert!((ones - 0.5).abs() < 0.05, "ones ratio {ones}");
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            Encoder.encode(&[true], &[2]).err(),
            Some(ProtocolError::UnsupportedBasis {
                protocol: PROTOCOL,
                basis: 2
            })
        );
        assert_eq!(
            Encoder.encode(&[true, false], &[0]).err(),
            Some(ProtocolError::LengthMismatch {
                expected: 2,
                got: 1
            })
        );

        let mut rng = StdRng::seed_from_u64(3);
        let states = Encoder.encode(&[true], &[0]).unwrap();
        assert_eq!(
            Decoder.decode(&[5], states, &mut rng).err(),
            Some(ProtocolError::UnsupportedBasis {
                protocol: PROTOCOL,
                basis: 5
            })
        );
    }

    #[test]
    fn noiseless_run_has_no_errors() {
        let mut rng = StdRng::seed_from_u64(4);
        let params = RunParameters {
            rounds: 2000,
            ..RunParameters::default()
        };
        let result = run(&params, &mut rng).unwrap();

        assert_eq!(result.raw_length, 2000);
        assert_eq!(result.error_rate, 0.0);
        assert_eq!(result.alice_sifted_key, result.bob_sifted_key);
        assert_eq!(result.alice_key, result.bob_key);
        let ratio = result.sifted_length as f64 / 2000.0;
        assert!((ratio - 0.5).abs() < 0.05, "sifted ratio {ratio}");
        assert_eq!(
            result.check_length + result.alice_key.len(),
            result.sifted_length
        );
    }

    #[test]
    fn full_interception_gives_quarter_error_rate() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = RunParameters {
            rounds: 8000,
            eve_ratio: 1.0,
            ..RunParameters::default()
        };
        let result = run(&params, &mut rng).unwrap();
        assert_eq!(result.eve_intercepted_count, 8000);
        assert!(
            (result.error_rate - 0.25).abs() < 0.04,
            "error rate {}",
            result.error_rate
        );
    }

    #[test]
    fn bit_flip_channel_shows_up_in_error_rate() {
        let mut rng = StdRng::seed_from_u64(6);
        let params = RunParameters {
            rounds: 8000,
            channel: QuantumChannel::bit_flip(0.1).unwrap(),
            ..RunParameters::default()
        };
        let result = run(&params, &mut rng).unwrap();
        // X errors are invisible to |+>/|-> so only Z-basis rounds are hit
        assert!(
            (result.error_rate - 0.05).abs() < 0.02,
            "error rate {}",
            result.error_rate
        );
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let params = RunParameters {
            rounds: 300,
            ..RunParameters::default()
        };
        let a = run(&params, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = run(&params, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a.alice_bits, b.alice_bits);
        assert_eq!(a.bob_raw_key, b.bob_raw_key);
        assert_eq!(a.alice_key, b.alice_key);
    }
}
