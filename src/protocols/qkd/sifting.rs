//! Sifting: keep the raw-key positions where both parties' bases are compatible.

use crate::core::errors::ProtocolError;
use crate::protocols::{Protocol, check_length};

/// E91 basis codes shared by Alice and Bob that generate key bits.
pub const E91_KEY_BASES: [u8; 2] = [0, 2];

/// When two basis choices are compatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiftRule {
    /// Equal codes (BB84, SSP).
    SameBasis,
    /// Equal codes drawn from the listed key-generating subset (E91).
    SameKeyBasis(&'static [u8]),
}

impl SiftRule {
    pub fn for_protocol(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Bb84 | Protocol::SixState => SiftRule::SameBasis,
            Protocol::E91 => SiftRule::SameKeyBasis(&E91_KEY_BASES),
        }
    }

    pub fn compatible(&self, a_basis: u8, b_basis: u8) -> bool {
        match self {
            SiftRule::SameBasis => a_basis == b_basis,
            SiftRule::SameKeyBasis(keys) => a_basis == b_basis && keys.contains(&a_basis),
        }
    }
}

/// Mask built once from both basis sequences, then applied to any raw key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sifter {
    mask: Vec<bool>,
}

impl Sifter {
    pub fn new(rule: SiftRule, a_bases: &[u8], b_bases: &[u8]) -> Result<Self, ProtocolError> {
        check_length(a_bases.len(), b_bases.len())?;

        let mask = a_bases
            .iter()
            .zip(b_bases)
            .map(|(&a, &b)| rule.compatible(a, b))
            .collect();

        Ok(Self { mask })
    }

    pub fn for_protocol(
        protocol: Protocol,
        a_bases: &[u8],
        b_bases: &[u8],
    ) -> Result<Self, ProtocolError> {
        Self::new(SiftRule::for_protocol(protocol), a_bases, b_bases)
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Number of positions kept.
    pub fn kept(&self) -> usize {
        self.mask.iter().filter(|&&keep| keep).count()
    }

    /// Bits of `raw_key` at masked positions, in original order.
    pub fn sift<T: Copy>(&self, raw_key: &[T]) -> Result<Vec<T>, ProtocolError> {
        check_length(self.mask.len(), raw_key.len())?;

        Ok(raw_key
            .iter()
            .zip(&self.mask)
            .filter_map(|(&bit, &keep)| keep.then_some(bit))
            .collect())
    }
}
