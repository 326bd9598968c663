pub mod circuit;
pub mod cnf;
pub mod miter;
pub mod reference;
pub mod solver;
