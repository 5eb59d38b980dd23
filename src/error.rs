use thiserror::Error;

/// Fatal failures of the evolutionary core.
///
/// Expected local failures (adding a duplicate synapse, removing a neuron
/// that is not there) are reported as `bool` results instead and are normal
/// control flow for the genetic operators.
#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error("neuron uid {0} is already present in the network")]
    DuplicateUid(u32),

    #[error("population, fitness scores and operations must have the same length")]
    LengthMismatch,

    #[error("parent networks have different input or output neurons")]
    InterfaceMismatch,

    #[error("malformed stats document: {0}")]
    Document(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("fitness evaluation failed: {0}")]
    Fitness(#[source] Box<dyn std::error::Error + Send + Sync>),
}
