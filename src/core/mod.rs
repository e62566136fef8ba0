mod channels;
mod circuit;
pub mod errors;
mod gates;
mod state;
pub mod utils;

pub use channels::{ChannelConfig, QuantumChannel};
pub use circuit::{Circuit, Operation};
pub use gates::Gate;
pub use state::{NORM_TOLERANCE, QuantumState};
