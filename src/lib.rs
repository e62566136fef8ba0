mod core;
pub mod noise;
pub mod protocols;
mod sampler;
pub mod simulator;

pub use crate::core::{
    ChannelConfig, Circuit, Gate, NORM_TOLERANCE, Operation, QuantumChannel, QuantumState,
    errors, utils,
};
pub use crate::protocols::block::{BlockDecoder, BlockEncoder};
pub use crate::protocols::{BasisTable, Protocol};
pub use crate::sampler::KeySampler;
pub use crate::simulator::{SimulationConfig, SimulationReport, Simulator};
