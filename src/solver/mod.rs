pub mod analyze;
pub mod clause;
pub mod encode;
pub mod frontier;
pub mod implication;
pub mod lit;
mod propagate;
pub mod search;
pub mod vars;

pub use frontier::Heuristic;
pub use search::{Model, Solver, SolverParams, SolverStats, Verdict};

pub mod targets {
    pub const ENCODE: &str = "encode";
    pub const PROPAGATE: &str = "propagate";
    pub const ANALYZE: &str = "analyze";
    pub const SEARCH: &str = "search";
}
