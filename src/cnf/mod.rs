pub mod cnf;
pub mod tseitin;
