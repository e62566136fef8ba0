use crate::core::errors::ProtocolError;
use crate::protocols::check_length;
use rand::Rng;
use rand::seq::SliceRandom;

/// Splits a sifted key into a disclosed check sample and the retained key.
///
/// The split is a mask over key positions: `true` positions are sampled for
/// error estimation, the rest remain secret. The same sampler must be applied
/// to both parties' keys so they disclose the same positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySampler {
    mask: Vec<bool>,
}

impl KeySampler {
    /// Uses an explicit sampling mask.
    pub fn from_mask(mask: Vec<bool>) -> Self {
        Self { mask }
    }

    /// Samples `floor(ratio * len)` positions uniformly at random, and at
    /// least one when `len > 0` and `ratio > 0`.
    ///
    /// `ratio` is clamped to [0, 1]. A ratio of 0.5 reproduces the usual
    /// half/half split.
    pub fn random<R: Rng + ?Sized>(len: usize, ratio: f64, rng: &mut R) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        let mut num_check = (len as f64 * ratio).floor() as usize;
        if num_check == 0 && len > 0 && ratio > 0.0 {
            num_check = 1;
        }

        let mut mask = vec![false; len];
        mask[..num_check].fill(true);
        mask.shuffle(rng);

        Self { mask }
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Number of sampled positions.
    pub fn sample_size(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Bits at sampled positions.
    pub fn sample<T: Copy>(&self, key: &[T]) -> Result<Vec<T>, ProtocolError> {
        self.select(key, true)
    }

    /// Bits at the positions that were not sampled.
    pub fn remaining<T: Copy>(&self, key: &[T]) -> Result<Vec<T>, ProtocolError> {
        self.select(key, false)
    }

    fn select<T: Copy>(&self, key: &[T], sampled: bool) -> Result<Vec<T>, ProtocolError> {
        check_length(self.mask.len(), key.len())?;

        Ok(key
            .iter()
            .zip(&self.mask)
            .filter_map(|(&bit, &m)| (m == sampled).then_some(bit))
            .collect())
    }
}
