use crate::circuit::CircuitError;
use crate::circuit::aig::{Aig, AigLit};

use super::cnf::{Cnf, Lit};

#[derive(Debug, Clone)]
pub struct TseitinCnf {
    pub cnf: Cnf,
    pub input_vars: Vec<u32>,
    pub output_lit: Lit,
    pub false_var: u32,
}

pub fn encode_output(aig: &Aig, output: AigLit) -> Result<TseitinCnf, CircuitError> {
    aig.nodes()?;
    if output.id > aig.max_id {
        return Err(CircuitError::NodeOutOfRange {
            id: output.id,
            max_id: aig.max_id,
        });
    }

    let false_var = aig.max_id + 1;
    let mut cnf = Cnf::new(false_var);

    // pin the false var to false
    cnf.add_clause(vec![Lit::new(false_var, false)]);

    for gate in &aig.ands {
        let g = Lit::new(gate.id, true);
        let a = lit_from_aig(gate.a, false_var);
        let b = lit_from_aig(gate.b, false_var);

        // g -> a
        cnf.add_clause(vec![g.neg(), a]);
        // g -> b
        cnf.add_clause(vec![g.neg(), b]);
        // a & b -> g
        cnf.add_clause(vec![g, a.neg(), b.neg()]);
    }

    let output_lit = lit_from_aig(output, false_var);
    cnf.add_clause(vec![output_lit]);

    Ok(TseitinCnf {
        cnf,
        input_vars: aig.inputs.clone(),
        output_lit,
        false_var,
    })
}

fn lit_from_aig(lit: AigLit, false_var: u32) -> Lit {
    let var = if lit.id == 0 { false_var } else { lit.id };
    Lit::new(var, !lit.neg)
}
