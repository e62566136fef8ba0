use crate::core::errors::GateError;
use crate::core::utils;
use ndarray::{Array2, arr2};
use num_complex::Complex64;

/// Represents a quantum gate.
///
/// A gate is defined by its unitary matrix and the number of qubits it acts on.
/// Local qubit `i` of the gate corresponds to bit `i` of the matrix row/column index.
#[derive(Clone, Debug, PartialEq)]
pub struct Gate {
    /// The unitary matrix of the gate.
    pub matrix: Array2<Complex64>,
    /// The number of qubits the gate acts on.
    pub num_qubits: usize,
}

impl Gate {
    /// Creates a new `Gate` from a unitary matrix.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` if:
    /// - The matrix is not square.
    /// - The matrix dimensions are not a power of 2.
    /// - The matrix is not unitary.
    pub fn new(matrix: Array2<Complex64>) -> Result<Self, GateError> {
        let (rows, cols) = matrix.dim();

        if rows != cols {
            return Err(GateError::NotSquareMatrix);
        }

        if rows < 2 || !rows.is_power_of_two() {
            return Err(GateError::InvalidDimensions);
        }

        if !utils::is_unitary(&matrix) {
            return Err(GateError::NonUnitary);
        }

        let num_qubits = rows.trailing_zeros() as usize;

        Ok(Self { matrix, num_qubits })
    }

    /// Builds a library gate from a closed-form matrix known to be unitary.
    fn exact(matrix: Array2<Complex64>) -> Gate {
        let num_qubits = matrix.nrows().trailing_zeros() as usize;
        Gate { matrix, num_qubits }
    }

    /// Expands a gate to act on a larger system of qubits.
    ///
    /// The result acts on `num_total_qubits`, applying `gate` to `targets`
    /// when every qubit in `controls` is 1, and Identity on the rest.
    ///
    /// # Errors
    ///
    /// Returns `GateError` if:
    /// - `targets` does not match the gate's arity.
    /// - Duplicate indices are found in `targets` or `controls`.
    /// - A qubit is used as both control and target.
    pub fn expand_gate(
        num_total_qubits: usize,
        gate: &Gate,
        targets: &[usize],
        controls: &[usize],
    ) -> Result<Gate, GateError> {
        if targets.len() != gate.num_qubits {
            return Err(GateError::InvalidDimensions);
        }

        if let Some(dup) = utils::find_duplicate(targets) {
            return Err(GateError::DuplicateQubit(dup));
        }

        if let Some(dup) = utils::find_duplicate(controls) {
            return Err(GateError::DuplicateQubit(dup));
        }

        for &c in controls {
            if targets.contains(&c) {
                return Err(GateError::ControlTargetOverlap(c));
            }
        }

        if targets
            .iter()
            .chain(controls)
            .any(|&q| q >= num_total_qubits)
        {
            return Err(GateError::InvalidDimensions);
        }

        Ok(Gate {
            matrix: utils::expand_operator(num_total_qubits, &gate.matrix, targets, controls),
            num_qubits: num_total_qubits,
        })
    }

    /// Tensor product of two gates acting side by side.
    ///
    /// `self` acts on the low local qubits and `upper` on the ones above them,
    /// so applying the result to `[a, b]` equals applying `self` to `a` and
    /// `upper` to `b`.
    pub fn tensor(&self, upper: &Gate) -> Gate {
        Gate {
            matrix: utils::kronecker_product(&upper.matrix, &self.matrix),
            num_qubits: self.num_qubits + upper.num_qubits,
        }
    }

    // --- Standard Gates ---

    /// Creates an Identity gate.
    pub fn i() -> Gate {
        Gate::exact(arr2(&[
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        ]))
    }

    /// Creates a Pauli-X gate (NOT gate).
    pub fn x() -> Gate {
        Gate::exact(arr2(&[
            [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        ]))
    }

    /// Creates a Pauli-Y gate.
    pub fn y() -> Gate {
        Gate::exact(arr2(&[
            [Complex64::new(0.0, 0.0), Complex64::new(0.0, -1.0)],
            [Complex64::new(0.0, 1.0), Complex64::new(0.0, 0.0)],
        ]))
    }

    /// Creates a Pauli-Z gate.
    pub fn z() -> Gate {
        Gate::exact(arr2(&[
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(-1.0, 0.0)],
        ]))
    }

    /// Creates a Hadamard gate.
    pub fn h() -> Gate {
        let factor = std::f64::consts::FRAC_1_SQRT_2;
        Gate::exact(arr2(&[
            [Complex64::new(factor, 0.0), Complex64::new(factor, 0.0)],
            [Complex64::new(factor, 0.0), Complex64::new(-factor, 0.0)],
        ]))
    }

    /// Creates an S gate (Phase gate, Z^1/2).
    pub fn s() -> Gate {
        Gate::exact(arr2(&[
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(0.0, 1.0)],
        ]))
    }

    /// Creates a rotation of `theta` radians about the Y axis.
    ///
    /// $R_y(\theta) = \begin{pmatrix} \cos\frac{\theta}{2} & -\sin\frac{\theta}{2} \\ \sin\frac{\theta}{2} & \cos\frac{\theta}{2} \end{pmatrix}$
    pub fn ry(theta: f64) -> Gate {
        let (sin, cos) = (theta / 2.0).sin_cos();
        Gate::exact(arr2(&[
            [Complex64::new(cos, 0.0), Complex64::new(-sin, 0.0)],
            [Complex64::new(sin, 0.0), Complex64::new(cos, 0.0)],
        ]))
    }

    /// Creates a CNOT (Controlled-NOT) gate.
    ///
    /// Local qubit 0 is the control and local qubit 1 the target.
    pub fn cnot() -> Gate {
        Gate::exact(utils::expand_operator(2, &Gate::x().matrix, &[1], &[0]))
    }
}
