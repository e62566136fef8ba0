use crate::core::Gate;
use crate::core::errors::StateError;
use crate::core::utils::{bit_mask, deposit_bits, find_duplicate};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::Rng;

/// Allowed deviation of the squared norm from 1.
pub const NORM_TOLERANCE: f64 = 1e-9;

/// Pure state of `num_qubits` qubits stored as $2^N$ complex amplitudes.
///
/// Qubit `k` corresponds to bit `k` of the basis-state index, so qubit 0 is
/// the least significant bit.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumState {
    amplitudes: Array1<Complex64>,
    num_qubits: usize,
}

impl QuantumState {
    /// Creates a new quantum state initialized to |0...0>.
    pub fn new(num_qubits: usize) -> Result<Self, StateError> {
        if num_qubits == 0 {
            return Err(StateError::EmptyRegister);
        }

        let mut amplitudes = Array1::<Complex64>::zeros(1 << num_qubits);
        amplitudes[0] = Complex64::new(1.0, 0.0);

        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Creates a QuantumState from a generic amplitude vector.
    pub fn from_amplitudes(amplitudes: Array1<Complex64>) -> Result<Self, StateError> {
        let dim = amplitudes.len();

        if dim < 2 || !dim.is_power_of_two() {
            return Err(StateError::InvalidDimensions(dim));
        }

        let norm_sqr = Self::squared_norm(&amplitudes);
        if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
            return Err(StateError::NotNormalized(norm_sqr));
        }

        Ok(Self {
            amplitudes,
            num_qubits: dim.trailing_zeros() as usize,
        })
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    /// Born-rule probability of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    pub fn norm_sqr(&self) -> f64 {
        Self::squared_norm(&self.amplitudes)
    }

    fn squared_norm(amplitudes: &Array1<Complex64>) -> f64 {
        amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Checks if a given index is within the system QuantumState's range
    fn validate_qubit_index(&self, index: usize) -> Result<(), StateError> {
        if index >= self.num_qubits {
            return Err(StateError::IndexOutOfBounds {
                index,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Applies non controlled quantum gate
    pub fn apply(&mut self, gate: &Gate, target_qubits: &[usize]) -> Result<(), StateError> {
        self.apply_controlled(gate, target_qubits, &[])
    }

    /// Applies `gate` to `target_qubits` on the basis states where every
    /// qubit in `control_qubits` is 1.
    pub fn apply_controlled(
        &mut self,
        gate: &Gate,
        target_qubits: &[usize],
        control_qubits: &[usize],
    ) -> Result<(), StateError> {
        if gate.num_qubits != target_qubits.len() {
            return Err(StateError::ArityMismatch {
                expected: gate.num_qubits,
                got: target_qubits.len(),
            });
        }

        for &q in target_qubits.iter().chain(control_qubits) {
            self.validate_qubit_index(q)?;
        }

        let all: Vec<usize> = target_qubits.iter().chain(control_qubits).copied().collect();
        if let Some(dup) = find_duplicate(&all) {
            return Err(StateError::DuplicateQubit(dup));
        }

        self.apply_local(&gate.matrix, target_qubits, control_qubits);
        self.check_norm()
    }

    /// In-place product with the operator embedded on `targets`.
    ///
    /// Equivalent to left-multiplying by `expand_operator(n, matrix, targets, controls)`
    /// without materialising the $2^N \times 2^N$ matrix.
    fn apply_local(&mut self, matrix: &Array2<Complex64>, targets: &[usize], controls: &[usize]) {
        let dim = self.amplitudes.len();
        let target_mask = bit_mask(targets);
        let control_mask = bit_mask(controls);
        let offsets: Vec<usize> = (0..matrix.nrows())
            .map(|local| deposit_bits(local, targets))
            .collect();
        let mut local = vec![Complex64::new(0.0, 0.0); offsets.len()];

        for base in 0..dim {
            if base & target_mask != 0 || base & control_mask != control_mask {
                continue;
            }

            for (slot, &offset) in local.iter_mut().zip(&offsets) {
                *slot = self.amplitudes[base | offset];
            }

            for (row, &offset) in offsets.iter().enumerate() {
                self.amplitudes[base | offset] = local
                    .iter()
                    .enumerate()
                    .map(|(col, &amp)| matrix[[row, col]] * amp)
                    .sum();
            }
        }
    }

    fn check_norm(&self) -> Result<(), StateError> {
        let norm_sqr = self.norm_sqr();
        if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
            return Err(StateError::NormDrift(norm_sqr));
        }
        Ok(())
    }

    /// Tensor product `other ⊗ self`.
    ///
    /// The qubits of `self` keep their indices; the qubits of `other` are
    /// relabelled to follow them.
    pub fn compose(self, other: QuantumState) -> QuantumState {
        let low_dim = self.amplitudes.len();
        let amplitudes = Array1::from_shape_fn(low_dim * other.amplitudes.len(), |i| {
            self.amplitudes[i % low_dim] * other.amplitudes[i / low_dim]
        });

        QuantumState {
            amplitudes,
            num_qubits: self.num_qubits + other.num_qubits,
        }
    }

    /// Randomly selects a basis index ponderating by Born-rule probabilities
    fn pick_outcome<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let roll: f64 = rng.random();

        let mut cumulative = 0.0;
        let mut last_possible = 0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let p = amp.norm_sqr();
            if p == 0.0 {
                continue;
            }
            cumulative += p;
            last_possible = i;
            if roll < cumulative {
                return i;
            }
        }
        // Rounding left the cumulative sum just below the roll
        last_possible
    }

    /// Measures every qubit in the computational basis.
    ///
    /// Consumes the state: the outcome bits, indexed from qubit 0, are all
    /// that remains after collapse.
    pub fn measure_all<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<bool> {
        let outcome = self.pick_outcome(rng);
        (0..self.num_qubits)
            .map(|q| (outcome >> q) & 1 == 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::expand_operator;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::{FRAC_1_SQRT_2, PI};

    #[test]
    fn new_state_is_all_zero() {
        let state = QuantumState::new(3).unwrap();
        assert_eq!(state.num_qubits(), 3);
        assert_eq!(state.amplitudes().len(), 8);
        assert_eq!(state.amplitudes()[0], Complex64::new(1.0, 0.0));
        assert!(state.amplitudes().iter().skip(1).all(|a| a.norm() == 0.0));
    }

    #[test]
    fn zero_qubits_rejected() {
        assert_eq!(QuantumState::new(0), Err(StateError::EmptyRegister));
    }

    #[test]
    fn from_amplitudes_validates() {
        let bad = Array1::from(vec![Complex64::new(1.0, 0.0); 3]);
        assert_eq!(
            QuantumState::from_amplitudes(bad),
            Err(StateError::InvalidDimensions(3))
        );

        let unnormalized = Array1::from(vec![Complex64::new(1.0, 0.0); 2]);
        assert!(matches!(
            QuantumState::from_amplitudes(unnormalized),
            Err(StateError::NotNormalized(_))
        ));

        let plus = Array1::from(vec![Complex64::new(FRAC_1_SQRT_2, 0.0); 2]);
        assert_eq!(QuantumState::from_amplitudes(plus).unwrap().num_qubits(), 1);
    }

    #[test]
    fn x_on_second_qubit_sets_bit_one() {
        let mut state = QuantumState::new(2).unwrap();
        state.apply(&Gate::x(), &[1]).unwrap();
        assert_relative_eq!(state.probabilities()[0b10], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn hadamard_creates_equal_superposition() {
        let mut state = QuantumState::new(1).unwrap();
        state.apply(&Gate::h(), &[0]).unwrap();
        assert_relative_eq!(state.amplitudes()[0].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state.amplitudes()[1].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state.norm_sqr(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn phase_after_hadamard_gives_plus_i() {
        let mut state = QuantumState::new(1).unwrap();
        state.apply(&Gate::h(), &[0]).unwrap();
        state.apply(&Gate::s(), &[0]).unwrap();
        assert_relative_eq!(state.amplitudes()[1].im, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state.amplitudes()[1].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn singlet_preparation() {
        let mut state = QuantumState::new(2).unwrap();
        state.apply(&Gate::x(), &[0]).unwrap();
        state.apply(&Gate::x(), &[1]).unwrap();
        state.apply(&Gate::h(), &[0]).unwrap();
        state.apply(&Gate::cnot(), &[0, 1]).unwrap();

        // (|01> - |10>)/sqrt(2) with qubit 0 written first:
        // "01" means qubit 0 = 0, qubit 1 = 1, i.e. index 0b10.
        let amps = state.amplitudes();
        assert_relative_eq!(amps[0b10].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(amps[0b01].re, -FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(amps[0b00].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(amps[0b11].norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn local_application_matches_expanded_operator() {
        let mut state = QuantumState::new(3).unwrap();
        state.apply(&Gate::h(), &[0]).unwrap();
        state.apply(&Gate::ry(PI / 3.0), &[2]).unwrap();
        let before = state.amplitudes().clone();

        state.apply(&Gate::cnot(), &[2, 1]).unwrap();

        let full = expand_operator(3, &Gate::cnot().matrix, &[2, 1], &[]);
        let expected = full.dot(&before);
        for (a, b) in state.amplitudes().iter().zip(expected.iter()) {
            assert_relative_eq!((a - b).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn controlled_application() {
        let mut state = QuantumState::new(2).unwrap();
        state.apply_controlled(&Gate::x(), &[1], &[0]).unwrap();
        assert_relative_eq!(state.probabilities()[0], 1.0, epsilon = 1e-12);

        state.apply(&Gate::x(), &[0]).unwrap();
        state.apply_controlled(&Gate::x(), &[1], &[0]).unwrap();
        assert_relative_eq!(state.probabilities()[0b11], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn apply_rejects_bad_indices() {
        let mut state = QuantumState::new(2).unwrap();
        assert_eq!(
            state.apply(&Gate::x(), &[2]),
            Err(StateError::IndexOutOfBounds {
                index: 2,
                num_qubits: 2
            })
        );
        assert_eq!(
            state.apply(&Gate::cnot(), &[0]),
            Err(StateError::ArityMismatch {
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            state.apply(&Gate::cnot(), &[1, 1]),
            Err(StateError::DuplicateQubit(1))
        );
        assert_eq!(
            state.apply_controlled(&Gate::x(), &[0], &[0]),
            Err(StateError::DuplicateQubit(0))
        );
    }

    #[test]
    fn non_unitary_operator_surfaces_norm_drift() {
        let mut state = QuantumState::new(1).unwrap();
        let doubled = Gate {
            matrix: Gate::i().matrix.mapv(|v| v * 2.0),
            num_qubits: 1,
        };
        assert!(matches!(
            state.apply(&doubled, &[0]),
            Err(StateError::NormDrift(n)) if (n - 4.0).abs() < 1e-12
        ));
    }

    #[test]
    fn compose_relabels_other_qubits() {
        let mut low = QuantumState::new(1).unwrap();
        low.apply(&Gate::x(), &[0]).unwrap();
        let high = QuantumState::new(2).unwrap();

        let joint = low.compose(high);
        assert_eq!(joint.num_qubits(), 3);
        assert_relative_eq!(joint.probabilities()[0b001], 1.0, epsilon = 1e-12);

        let low = QuantumState::new(1).unwrap();
        let mut high = QuantumState::new(1).unwrap();
        high.apply(&Gate::x(), &[0]).unwrap();
        let joint = low.compose(high);
        assert_relative_eq!(joint.probabilities()[0b10], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn deterministic_measurement() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let mut state = QuantumState::new(3).unwrap();
            state.apply(&Gate::x(), &[0]).unwrap();
            state.apply(&Gate::x(), &[2]).unwrap();
            assert_eq!(state.measure_all(&mut rng), vec![true, false, true]);
        }
    }

    #[test]
    fn hadamard_hadamard_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut state = QuantumState::new(1).unwrap();
            state.apply(&Gate::x(), &[0]).unwrap();
            state.apply(&Gate::h(), &[0]).unwrap();
            state.apply(&Gate::h(), &[0]).unwrap();
            assert_eq!(state.measure_all(&mut rng), vec![true]);
        }
    }

    #[test]
    fn superposition_measurement_is_balanced() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 4000;
        let ones = (0..trials)
            .filter(|_| {
                let mut state = QuantumState::new(1).unwrap();
                state.apply(&Gate::h(), &[0]).unwrap();
                state.measure_all(&mut rng)[0]
            })
            .count();
        let ratio = ones as f64 / trials as f64;
        assert!((ratio - 0.5).abs() < 0.05, "ratio {ratio}");
    }
}
