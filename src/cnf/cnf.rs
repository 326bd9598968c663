/// CNF literal: `sign == true` is the positive phase of `var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    pub var: u32,
    pub sign: bool,
}

impl Lit {
    pub fn new(var: u32, sign: bool) -> Self {
        Self { var, sign }
    }

    pub fn neg(self) -> Self {
        Self {
            var: self.var,
            sign: !self.sign,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cnf {
    pub num_vars: u32,
    pub clauses: Vec<Vec<Lit>>,
}

impl Cnf {
    pub fn new(num_vars: u32) -> Self {
        Self {
            num_vars,
            clauses: Vec::new(),
        }
    }

    pub fn add_clause(&mut self, clause: Vec<Lit>) {
        self.clauses.push(clause);
    }
}
