use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("Matrix is not Unitary (U†U != I)")]
    NonUnitary,

    #[error("Matrix must be square")]
    NotSquareMatrix,

    #[error("Invalid Dimensions")]
    InvalidDimensions,

    #[error("Qubit {0} cannot be both control and target")]
    ControlTargetOverlap(usize),

    #[error("Duplicate qubit index found: {0}")]
    DuplicateQubit(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("A quantum state needs at least one qubit")]
    EmptyRegister,

    #[error("Qubit index {index} out of bounds for a {num_qubits}-qubit state")]
    IndexOutOfBounds { index: usize, num_qubits: usize },

    #[error("Operator acts on {expected} qubit(s) but {got} index(es) were given")]
    ArityMismatch { expected: usize, got: usize },

    #[error("Duplicate qubit index found: {0}")]
    DuplicateQubit(usize),

    #[error("Amplitude vector length {0} is not a power of two")]
    InvalidDimensions(usize),

    #[error("Vector is not normalized. Norm squared: {0}")]
    NotNormalized(f64),

    #[error("Norm drifted to {0} after gate application")]
    NormDrift(f64),

    #[error("Gate error: {0}")]
    GateError(#[from] GateError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    #[error("Cannot estimate a parameter from an empty sample")]
    EmptySample,

    #[error("Sample lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("Invalid probability: {0}. Must be between 0.0 and 1.0")]
    InvalidProbability(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Basis code {basis} is not defined for {protocol}")]
    UnsupportedBasis { protocol: &'static str, basis: u8 },

    #[error("Sequence length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Invalid probability: {0}. Must be between 0.0 and 1.0")]
    InvalidProbability(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl From<GateError> for ProtocolError {
    fn from(err: GateError) -> Self {
        ProtocolError::State(StateError::GateError(err))
    }
}
