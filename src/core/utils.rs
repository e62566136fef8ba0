//! Utility functions for the state-vector engine.
//!
//! This module contains helper functions for:
//! - Matrix operations (Kronecker product, unitarity check).
//! - Operator expansion to larger systems.
//! - Bit manipulation for basis-state indices.

use ndarray::Array2;
use num_complex::Complex64;

/// Tolerance used when checking `U U† = I`.
pub const UNITARY_TOLERANCE: f64 = 1e-9;

/// Computes the Kronecker (Tensor) product of two matrices.
///
/// If `A` is an $m \times n$ matrix and `B` is a $p \times q$ matrix,
/// the result is an $mp \times nq$ matrix.
pub fn kronecker_product(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (m, n) = a.dim();
    let (p, q) = b.dim();

    // Block (r / p, c / q) of the result is a[r / p, c / q] * B
    Array2::from_shape_fn((m * p, n * q), |(r, c)| {
        a[[r / p, c / q]] * b[[r % p, c % q]]
    })
}

/// Checks if a given matrix is unitary.
pub fn is_unitary(matrix: &Array2<Complex64>) -> bool {
    let (rows, _) = matrix.dim();
    let eye = Array2::<Complex64>::eye(rows);

    let u_dagger = matrix.t().mapv(|x| x.conj());
    let product = matrix.dot(&u_dagger);

    product
        .iter()
        .zip(eye.iter())
        .all(|(a, b)| (*a - *b).norm() < UNITARY_TOLERANCE)
}

/// Generates the full operator matrix ($2^N \times 2^N$) for the whole system.
///
/// Qubit `k` of the system corresponds to bit `k` of a basis-state index.
/// The local operator acts on `targets` (local bit `i` is qubit `targets[i]`),
/// is controlled by `controls`, and identity is used on every other qubit.
pub fn expand_operator(
    num_total_qubits: usize,
    matrix: &Array2<Complex64>,
    targets: &[usize],
    controls: &[usize],
) -> Array2<Complex64> {
    let dim = 1 << num_total_qubits;
    let mut full_matrix = Array2::<Complex64>::zeros((dim, dim));
    let control_mask = bit_mask(controls);
    let passive_mask = !bit_mask(targets);

    for col_idx in 0..dim {
        // Basis states without every control set are left untouched
        if (col_idx & control_mask) != control_mask {
            full_matrix[[col_idx, col_idx]] = Complex64::new(1.0, 0.0);
            continue;
        }
        let small_col = extract_bits(col_idx, targets);
        for small_row in 0..matrix.nrows() {
            let val = matrix[[small_row, small_col]];
            if val.norm_sqr() < f64::EPSILON {
                continue;
            }
            let row_idx = (col_idx & passive_mask) | deposit_bits(small_row, targets);
            full_matrix[[row_idx, col_idx]] = val;
        }
    }
    full_matrix
}

/// Mask with a 1 in every position listed in `indices`.
pub fn bit_mask(indices: &[usize]) -> usize {
    indices.iter().fold(0usize, |mask, &i| mask | (1 << i))
}

/// Extracts the bits in positions `indices` of the sequence `value`.
pub fn extract_bits(value: usize, indices: &[usize]) -> usize {
    let mut result = 0;
    for (i, &pos) in indices.iter().enumerate() {
        if (value >> pos) & 1 == 1 {
            result |= 1 << i;
        }
    }
    result
}

/// Scatters bits from `compact_value` into the positions specified by `indices`.
pub fn deposit_bits(compact_value: usize, indices: &[usize]) -> usize {
    let mut result = 0;
    for (i, &pos) in indices.iter().enumerate() {
        if (compact_value >> i) & 1 == 1 {
            result |= 1 << pos;
        }
    }
    result
}

/// Find duplicate in a slice of usize
pub fn find_duplicate(indices: &[usize]) -> Option<usize> {
    let mut seen = std::collections::HashSet::new();
    indices.iter().find(|&&idx| !seen.insert(idx)).copied()
}
