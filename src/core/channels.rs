use crate::core::errors::{ChannelError, StateError};
use crate::core::{Gate, QuantumState};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Single-qubit Pauli channel $\rho \to p_I\rho + p_X X\rho X + p_Y Y\rho Y + p_Z Z\rho Z$.
///
/// On a pure state the channel is unravelled: one Pauli is sampled per qubit
/// and applied as a unitary, which reproduces the channel on average.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantumChannel {
    p_x: f64,
    p_y: f64,
    p_z: f64,
}

/// Serializable description of a [`QuantumChannel`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "p", rename_all = "snake_case")]
pub enum ChannelConfig {
    BitFlip(f64),
    PhaseFlip(f64),
    BitPhaseFlip(f64),
    Depolarizing(f64),
}

impl ChannelConfig {
    pub fn build(&self) -> Result<QuantumChannel, ChannelError> {
        match *self {
            ChannelConfig::BitFlip(p) => QuantumChannel::bit_flip(p),
            ChannelConfig::PhaseFlip(p) => QuantumChannel::phase_flip(p),
            ChannelConfig::BitPhaseFlip(p) => QuantumChannel::bit_phase_flip(p),
            ChannelConfig::Depolarizing(p) => QuantumChannel::depolarizing(p),
        }
    }
}

impl QuantumChannel {
    /// Noise-free channel.
    pub fn identity() -> Self {
        Self {
            p_x: 0.0,
            p_y: 0.0,
            p_z: 0.0,
        }
    }

    /// Bit Flip Channel -> X
    pub fn bit_flip(p: f64) -> Result<Self, ChannelError> {
        validate_prob(p)?;
        Ok(Self {
            p_x: p,
            ..Self::identity()
        })
    }

    /// Phase Flip Channel -> Z
    pub fn phase_flip(p: f64) -> Result<Self, ChannelError> {
        validate_prob(p)?;
        Ok(Self {
            p_z: p,
            ..Self::identity()
        })
    }

    /// Bit-Phase Flip Channel -> Y
    pub fn bit_phase_flip(p: f64) -> Result<Self, ChannelError> {
        validate_prob(p)?;
        Ok(Self {
            p_y: p,
            ..Self::identity()
        })
    }

    /// Depolarizing Channel
    /// The qubit is replaced by the maximally mixed state with probability p
    pub fn depolarizing(p: f64) -> Result<Self, ChannelError> {
        validate_prob(p)?;
        let each = p / 4.0;
        Ok(Self {
            p_x: each,
            p_y: each,
            p_z: each,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.p_x + self.p_y + self.p_z == 0.0
    }

    /// Samples the Pauli error hitting one qubit, if any.
    fn sample_error<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Gate> {
        let roll: f64 = rng.random();
        if roll < self.p_x {
            Some(Gate::x())
        } else if roll < self.p_x + self.p_y {
            Some(Gate::y())
        } else if roll < self.p_x + self.p_y + self.p_z {
            Some(Gate::z())
        } else {
            None
        }
    }

    /// Apply the channel independently to every qubit in `target_qubits`.
    ///
    /// Draws exactly one random number per target, even for the identity channel.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        state: &mut QuantumState,
        target_qubits: &[usize],
        rng: &mut R,
    ) -> Result<(), StateError> {
        for &q in target_qubits {
            if let Some(error) = self.sample_error(rng) {
                state.apply(&error, &[q])?;
            }
        }
        Ok(())
    }
}

/// Validate probability parameter
fn validate_prob(p: f64) -> Result<(), ChannelError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ChannelError::InvalidProbability(p));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rejects_invalid_probability() {
        assert_eq!(
            QuantumChannel::bit_flip(1.5),
            Err(ChannelError::InvalidProbability(1.5))
        );
        assert_eq!(
            QuantumChannel::depolarizing(-0.1),
            Err(ChannelError::InvalidProbability(-0.1))
        );
    }

    #[test]
    fn certain_bit_flip_always_flips() {
        let channel = QuantumChannel::bit_flip(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let mut state = QuantumState::new(1).unwrap();
            channel.apply(&mut state, &[0], &mut rng).unwrap();
            assert_eq!(state.measure_all(&mut rng), vec![true]);
        }
    }

    #[test]
    fn phase_flip_leaves_computational_basis_alone() {
        let channel = QuantumChannel::phase_flip(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = QuantumState::new(1).unwrap();
        channel.apply(&mut state, &[0], &mut rng).unwrap();
        assert_eq!(state.measure_all(&mut rng), vec![false]);
    }

    #[test]
    fn bit_flip_rate_matches_probability() {
        let channel = QuantumChannel::bit_flip(0.25).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let trials = 4000;
        let flips = (0..trials)
            .filter(|_| {
                let mut state = QuantumState::new(1).unwrap();
                channel.apply(&mut state, &[0], &mut rng).unwrap();
                state.measure_all(&mut rng)[0]
            })
            .count();
        let rate = flips as f64 / trials as f64;
        assert!((rate - 0.25).abs() < 0.03, "rate {rate}");
    }

    #[test]
    fn config_builds_channel() {
        let config: ChannelConfig =
            serde_json::from_str(r#"{"kind": "depolarizing", "p": 0.2}"#).unwrap();
        assert_eq!(config, ChannelConfig::Depolarizing(0.2));
        assert_eq!(
            config.build().unwrap(),
            QuantumChannel::depolarizing(0.2).unwrap()
        );
        assert!(QuantumChannel::identity().is_identity());
    }
}
