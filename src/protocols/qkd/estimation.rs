//! Security-parameter estimation.
//!
//! Prepare-and-measure protocols compare a disclosed sample of the sifted
//! keys ([`error_rate`]). E91 checks the CHSH inequality on the rounds whose
//! bases were not used for the key ([`ChshEstimator`]).

use crate::core::errors::{EstimationError, ProtocolError};
use crate::protocols::check_length;

/// Number of positions where the samples differ.
pub fn hamming_distance(a_sample: &[bool], b_sample: &[bool]) -> Result<usize, EstimationError> {
    if a_sample.len() != b_sample.len() {
        return Err(EstimationError::LengthMismatch {
            left: a_sample.len(),
            right: b_sample.len(),
        });
    }
    Ok(a_sample.iter().zip(b_sample).filter(|(a, b)| a != b).count())
}

/// Fractional Hamming distance of two equal-length, non-empty samples.
pub fn error_rate(a_sample: &[bool], b_sample: &[bool]) -> Result<f64, EstimationError> {
    let distance = hamming_distance(a_sample, b_sample)?;
    if a_sample.is_empty() {
        return Err(EstimationError::EmptySample);
    }
    Ok(distance as f64 / a_sample.len() as f64)
}

/// Basis pairs entering S = <A0B1> + <A0B2> + <A1B2> - <A1B1>.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChshBucket {
    A0B1,
    A0B2,
    A1B2,
    A1B1,
}

impl ChshBucket {
    pub const ALL: [ChshBucket; 4] = [
        ChshBucket::A0B1,
        ChshBucket::A0B2,
        ChshBucket::A1B2,
        ChshBucket::A1B1,
    ];

    /// Bucket for a basis pair; `None` for the five pairs the test ignores.
    pub fn from_bases(a_basis: u8, b_basis: u8) -> Option<Self> {
        match (a_basis, b_basis) {
            (0, 1) => Some(ChshBucket::A0B1),
            (0, 2) => Some(ChshBucket::A0B2),
            (1, 2) => Some(ChshBucket::A1B2),
            (1, 1) => Some(ChshBucket::A1B1),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn sign(self) -> f64 {
        match self {
            ChshBucket::A1B1 => -1.0,
            _ => 1.0,
        }
    }
}

/// Joint-outcome counts per CHSH bucket.
///
/// Each bucket holds `[N00, N01, N10, N11]`, indexed by `2 * a_bit + b_bit`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChshEstimator {
    counts: [[usize; 4]; 4],
}

impl ChshEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an estimator from counts given in [`ChshBucket::ALL`] order.
    pub fn from_counts(counts: [[usize; 4]; 4]) -> Self {
        Self { counts }
    }

    pub fn counts(&self, bucket: ChshBucket) -> [usize; 4] {
        self.counts[bucket.index()]
    }

    /// Adds one round; rounds outside the four buckets are ignored.
    pub fn record(&mut self, a_bit: bool, b_bit: bool, a_basis: u8, b_basis: u8) {
        if let Some(bucket) = ChshBucket::from_bases(a_basis, b_basis) {
            let outcome = 2 * usize::from(a_bit) + usize::from(b_bit);
            self.counts[bucket.index()][outcome] += 1;
        }
    }

    pub fn record_all(
        &mut self,
        a_raw_key: &[bool],
        b_raw_key: &[bool],
        a_bases: &[u8],
        b_bases: &[u8],
    ) -> Result<(), ProtocolError> {
        let n = a_raw_key.len();
        check_length(n, b_raw_key.len())?;
        check_length(n, a_bases.len())?;
        check_length(n, b_bases.len())?;

        for i in 0..n {
            self.record(a_raw_key[i], b_raw_key[i], a_bases[i], b_bases[i]);
        }
        Ok(())
    }

    /// Computes S from the raw keys and bases of a whole run.
    pub fn estimate(
        a_raw_key: &[bool],
        b_raw_key: &[bool],
        a_bases: &[u8],
        b_bases: &[u8],
    ) -> Result<f64, ProtocolError> {
        let mut estimator = Self::new();
        estimator.record_all(a_raw_key, b_raw_key, a_bases, b_bases)?;
        Ok(estimator.parameter())
    }

    /// E = (N00 - N01 - N10 + N11) / N; 0.0 for an empty bucket.
    pub fn bucket_mean(counts: &[usize; 4]) -> f64 {
        let total: usize = counts.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let agree = (counts[0] + counts[3]) as f64;
        let disagree = (counts[1] + counts[2]) as f64;
        (agree - disagree) / total as f64
    }

    /// Correlations in [`ChshBucket::ALL`] order.
    pub fn correlations(&self) -> [f64; 4] {
        ChshBucket::ALL.map(|bucket| Self::bucket_mean(&self.counts[bucket.index()]))
    }

    pub fn parameter(&self) -> f64 {
        ChshBucket::ALL
            .iter()
            .zip(self.correlations())
            .map(|(bucket, mean)| bucket.sign() * mean)
            .sum()
    }
}
