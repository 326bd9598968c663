use anyhow::{Result, bail};
use varisat::ExtendFormula;

use crate::circuit::aig::{Aig, AigLit};
use crate::cnf::cnf::{Cnf, Lit};
use crate::cnf::tseitin::encode_output;

pub struct VarisatOracle {
    inner: varisat::Solver<'static>,
    vars: Vec<varisat::Var>,
    last_model: Option<Vec<varisat::Lit>>,
}

impl VarisatOracle {
    pub fn new() -> Self {
        Self {
            inner: varisat::Solver::new(),
            vars: Vec::new(),
            last_model: None,
        }
    }

    pub fn load(&mut self, cnf: &Cnf) {
        while (self.vars.len() as u32) < cnf.num_vars {
            self.vars.push(self.inner.new_var());
        }
        for clause in &cnf.clauses {
            let lits = clause
                .iter()
                .filter_map(|&x| self.to_lit(x))
                .collect::<Vec<_>>();
            self.inner.add_clause(&lits);
        }
    }

    pub fn solve(&mut self) -> Result<bool> {
        match self.inner.solve() {
            Ok(sat) => {
                self.last_model = if sat { self.inner.model() } else { None };
                Ok(sat)
            }
            Err(_) => {
                self.last_model = None;
                bail!("varisat stopped without a verdict")
            }
        }
    }

    pub fn model_value(&self, var: u32) -> Option<bool> {
        let v = self.to_var(var)?;
        let model = self.last_model.as_ref()?;
        if model.contains(&v.lit(true)) {
            Some(true)
        } else if model.contains(&v.lit(false)) {
            Some(false)
        } else {
            None
        }
    }

    fn to_var(&self, v: u32) -> Option<varisat::Var> {
        if v == 0 {
            return None;
        }
        self.vars.get(v as usize - 1).copied()
    }

    fn to_lit(&self, lit: Lit) -> Option<varisat::Lit> {
        let var = self.to_var(lit.var)?;
        Some(varisat::Lit::from_var(var, lit.sign))
    }
}

impl Default for VarisatOracle {
    fn default() -> Self {
        Self::new()
    }
}

pub fn decide_output(aig: &Aig, output: AigLit) -> Result<Option<Vec<bool>>> {
    let enc = encode_output(aig, output)?;
    let mut oracle = VarisatOracle::new();
    oracle.load(&enc.cnf);
    if !oracle.solve()? {
        return Ok(None);
    }
    let bits = enc
        .input_vars
        .iter()
        .map(|&v| oracle.model_value(v).unwrap_or(false))
        .collect::<Vec<_>>();
    Ok(Some(bits))
}
