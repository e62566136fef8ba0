use crate::core::errors::ProtocolError;
use crate::core::{ChannelConfig, QuantumChannel};
use crate::protocols::qkd::e91::E91Result;
use crate::protocols::qkd::{KeyExchangeResult, RunParameters};
use crate::protocols::{Protocol, bb84, e91, ssp};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Configuration for an end-to-end run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub protocol: Protocol,
    pub rounds: usize,
    /// Deterministic seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Noise on every transmitted qubit.
    pub channel: Option<ChannelConfig>,
    /// Classical flip probability on the receiver's raw key.
    pub bit_flip_noise: f64,
    /// Intercept-resend probability per round (BB84 / SSP only).
    pub eve_ratio: f64,
    /// Fraction of the sifted key disclosed to estimate the error rate.
    pub check_ratio: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let defaults = RunParameters::default();
        Self {
            protocol: Protocol::Bb84,
            rounds: defaults.rounds,
            seed: None,
            channel: None,
            bit_flip_noise: defaults.bit_flip_noise,
            eve_ratio: defaults.eve_ratio,
            check_ratio: defaults.check_ratio,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        self.parameters()?.validate()
    }

    pub fn parameters(&self) -> Result<RunParameters, ProtocolError> {
        let channel = match &self.channel {
            Some(config) => config.build()?,
            None => QuantumChannel::identity(),
        };
        Ok(RunParameters {
            rounds: self.rounds,
            channel,
            eve_ratio: self.eve_ratio,
            bit_flip_noise: self.bit_flip_noise,
            check_ratio: self.check_ratio,
        })
    }
}

/// Result of [`Simulator::run`], shaped by the protocol family.
#[derive(Clone, Debug)]
pub enum SimulationReport {
    KeyExchange(KeyExchangeResult),
    Entanglement(E91Result),
}

impl SimulationReport {
    pub fn protocol(&self) -> Protocol {
        match self {
            SimulationReport::KeyExchange(result) => result.protocol,
            SimulationReport::Entanglement(_) => Protocol::E91,
        }
    }

    pub fn sifted_length(&self) -> usize {
        match self {
            SimulationReport::KeyExchange(result) => result.sifted_length,
            SimulationReport::Entanglement(result) => result.sifted_length,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Simulator {
    pub config: SimulationConfig,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Replace the channel of the configured run
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.config.channel = Some(channel);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Runs the configured protocol once.
    pub fn run(&self) -> Result<SimulationReport, ProtocolError> {
        let params = self.config.parameters()?;
        params.validate()?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let start = Instant::now();
        let report = match self.config.protocol {
            Protocol::Bb84 => SimulationReport::KeyExchange(bb84::run(&params, &mut rng)?),
            Protocol::SixState => SimulationReport::KeyExchange(ssp::run(&params, &mut rng)?),
            Protocol::E91 => SimulationReport::Entanglement(e91::run(&params, &mut rng)?),
        };

        info!(
            protocol = %self.config.protocol,
            rounds = params.rounds,
            sifted_length = report.sifted_length(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "simulation finished"
        );
        Ok(report)
    }
}
