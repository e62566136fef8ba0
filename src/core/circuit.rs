//! Ordered gate sequences.
//!
//! A [`Circuit`] records `(gate, targets)` operations over a fixed register
//! width and replays them on a [`QuantumState`]. Protocols build one circuit
//! for state preparation and one for the basis change, then compose them.

use crate::core::errors::StateError;
use crate::core::utils::find_duplicate;
use crate::core::{Gate, QuantumState};

/// One gate application.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub gate: Gate,
    pub targets: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Circuit {
    num_qubits: usize,
    operations: Vec<Operation>,
}

impl Circuit {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            operations: Vec::new(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Appends `gate` acting on `targets`, validating indices eagerly.
    pub fn push(&mut self, gate: Gate, targets: &[usize]) -> Result<&mut Self, StateError> {
        if gate.num_qubits != targets.len() {
            return Err(StateError::ArityMismatch {
                expected: gate.num_qubits,
                got: targets.len(),
            });
        }

        if let Some(&index) = targets.iter().find(|&&q| q >= self.num_qubits) {
            return Err(StateError::IndexOutOfBounds {
                index,
                num_qubits: self.num_qubits,
            });
        }

        if let Some(dup) = find_duplicate(targets) {
            return Err(StateError::DuplicateQubit(dup));
        }

        self.operations.push(Operation {
            gate,
            targets: targets.to_vec(),
        });
        Ok(self)
    }

    /// Appends every operation of `other`, shifting its qubits up by `offset`.
    ///
    /// `other` must fit in `[offset, offset + other.num_qubits)` of this circuit.
    pub fn compose(&mut self, other: &Circuit, offset: usize) -> Result<&mut Self, StateError> {
        if offset + other.num_qubits > self.num_qubits {
            return Err(StateError::IndexOutOfBounds {
                index: offset + other.num_qubits - 1,
                num_qubits: self.num_qubits,
            });
        }

        for op in &other.operations {
            let shifted: Vec<usize> = op.targets.iter().map(|&q| q + offset).collect();
            self.push(op.gate.clone(), &shifted)?;
        }
        Ok(self)
    }

    /// Replays the operations, in order, on `state`.
    pub fn apply_to(&self, state: &mut QuantumState) -> Result<(), StateError> {
        if state.num_qubits() != self.num_qubits {
            return Err(StateError::ArityMismatch {
                expected: self.num_qubits,
                got: state.num_qubits(),
            });
        }

        for op in &self.operations {
            state.apply(&op.gate, &op.targets)?;
        }
        Ok(())
    }

    /// Runs the circuit on a fresh |0...0> register.
    pub fn prepare(&self) -> Result<QuantumState, StateError> {
        let mut state = QuantumState::new(self.num_qubits)?;
        self.apply_to(&mut state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn push_validates_targets() {
        let mut circuit = Circuit::new(2);
        assert!(circuit.push(Gate::x(), &[1]).is_ok());
        assert_eq!(
            circuit.push(Gate::x(), &[2]).err(),
            Some(StateError::IndexOutOfBounds {
                index: 2,
                num_qubits: 2
            })
        );
        assert_eq!(
            circuit.push(Gate::cnot(), &[0, 0]).err(),
            Some(StateError::DuplicateQubit(0))
        );
        assert_eq!(circuit.operations().len(), 1);
    }

    #[test]
    fn composed_circuit_prepares_bell_pair() {
        let mut prep = Circuit::new(1);
        prep.push(Gate::h(), &[0]).unwrap();

        let mut bell = Circuit::new(2);
        bell.compose(&prep, 0)
            .unwrap()
            .push(Gate::cnot(), &[0, 1])
            .unwrap();

        let state = bell.prepare().unwrap();
        let probs = state.probabilities();
        assert_relative_eq!(probs[0b00], 0.5, epsilon = 1e-12);
        assert_relative_eq!(probs[0b11], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn compose_with_offset_shifts_targets() {
        let mut flip = Circuit::new(1);
        flip.push(Gate::x(), &[0]).unwrap();

        let mut register = Circuit::new(3);
        register.compose(&flip, 2).unwrap();
        assert_eq!(register.operations()[0].targets, vec![2]);

        assert!(register.compose(&flip, 3).is_err());
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let circuit = Circuit::new(2);
        let mut state = QuantumState::new(1).unwrap();
        assert_eq!(
            circuit.apply_to(&mut state),
            Err(StateError::ArityMismatch {
                expected: 2,
                got: 1
            })
        );
    }
}
