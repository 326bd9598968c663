pub mod aig;
pub mod aiger;
pub mod random;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("output index {index} out of range (outputs={outputs})")]
    OutputOutOfRange { index: usize, outputs: usize },
    #[error("node id {id} exceeds max_id {max_id}")]
    NodeOutOfRange { id: u32, max_id: u32 },
    #[error("node {0} is referenced but not defined as input or and")]
    UndefinedNode(u32),
    #[error("node {0} is defined more than once")]
    Redefined(u32),
    #[error("and gate {gate} depends on later node {fanin}")]
    NotTopological { gate: u32, fanin: u32 },
}
