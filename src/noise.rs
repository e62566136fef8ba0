//! Classical noise induced on measured bit strings.

use crate::core::errors::ProtocolError;
use rand::Rng;

/// Flips each bit independently with probability `probability`.
///
/// Draws one random number per bit.
pub fn add_noise<R: Rng + ?Sized>(
    bits: &[bool],
    probability: f64,
    rng: &mut R,
) -> Result<Vec<bool>, ProtocolError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(ProtocolError::InvalidProbability(probability));
    }

    Ok(bits
        .iter()
        .map(|&bit| bit ^ rng.random_bool(probability))
        .collect())
}

/// Positions where two bit strings differ (XOR).
pub fn errors_bitvector(a: &[bool], b: &[bool]) -> Result<Vec<bool>, ProtocolError> {
    crate::protocols::check_length(a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_and_full_noise() {
        let mut rng = StdRng::seed_from_u64(0);
        let bits = vec![true, false, true, false];
        assert_eq!(add_noise(&bits, 0.0, &mut rng).unwrap(), bits);
        assert_eq!(
            add_noise(&bits, 1.0, &mut rng).unwrap(),
            vec![false, true, false, true]
        );
    }

    #[test]
    fn flip_rate_tracks_probability() {
        let mut rng = StdRng::seed_from_u64(1);
        let bits = vec![false; 10_000];
        let noisy = add_noise(&bits, 0.2, &mut rng).unwrap();
        let flips = errors_bitvector(&bits, &noisy)
            .unwrap()
            .into_iter()
            .filter(|&e| e)
            .count();
        let rate = flips as f64 / 10_000.0;
        assert!((rate - 0.2).abs() < 0.02, "rate {rate}");
    }

    #[test]
    fn invalid_probability() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(
            add_noise(&[true], 1.2, &mut rng),
            Err(ProtocolError::InvalidProbability(1.2))
        );
    }
}
