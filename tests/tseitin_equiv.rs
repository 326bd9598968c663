use circuitsat::circuit::aig::{Aig, AigBuilder, AigLit};
use circuitsat::circuit::aiger::parse_aag_str;
use circuitsat::cnf::cnf::{Cnf, Lit};
use circuitsat::cnf::tseitin::encode_output;
use circuitsat::reference::VarisatOracle;

fn oracle_sat(cnf: &Cnf) -> bool {
    let mut oracle = VarisatOracle::new();
    oracle.load(cnf);
    oracle.solve().expect("varisat")
}

fn check_every_pattern(aig: &Aig, out: AigLit) {
    let enc = encode_output(aig, out).expect("encode");
    let n = aig.num_inputs();
    for pattern in 0u32..(1 << n) {
        let bits = (0..n).map(|i| (pattern >> i) & 1 == 1).collect::<Vec<_>>();
        let mut cnf = enc.cnf.clone();
        add_input_units(&mut cnf, &enc.input_vars, &bits);
        assert_eq!(oracle_sat(&cnf), aig.eval_lit(out, &bits), "pattern {bits:?}");
    }
}

#[test]
fn and_or_equiv_with_sat() {
    let mut b = AigBuilder::new();
    let a = b.input();
    let x = b.input();
    let c = b.input();
    let n1 = b.and(a, x);
    let out = b.or(n1, c);
    let aig = b.finish(vec![out]);
    check_every_pattern(&aig, out);
    let enc = encode_output(&aig, out).expect("encode");
    assert_eq!(enc.output_lit, Lit::new(out.id, false));

    // one output-true pattern with the output forced false
    let enc = encode_output(&aig, !out).expect("encode");
    let mut bad = enc.cnf.clone();
    add_input_units(&mut bad, &enc.input_vars, &[true, true, false]);
    assert!(!oracle_sat(&bad));
}

#[test]
fn xor_with_constant_fanin_equiv_with_sat() {
    let mut b = AigBuilder::new();
    let a = b.input();
    let x = b.input();
    let t = b.and(x, AigLit::TRUE);
    let out = b.xor(a, t);
    let aig = b.finish(vec![out]);
    check_every_pattern(&aig, out);
    check_every_pattern(&aig, !out);
}

#[test]
fn aag_demorgan_equiv_with_sat() {
    let src = "\
aag 5 3 0 1 2
2
4
6
11
8 2 4
10 9 7
";
    let aig = parse_aag_str(src).expect("parse aag");
    check_every_pattern(&aig, aig.outputs()[0]);
}

fn add_input_units(cnf: &mut Cnf, input_vars: &[u32], bits: &[bool]) {
    assert_eq!(input_vars.len(), bits.len());
    for (&var, &bit) in input_vars.iter().zip(bits.iter()) {
        cnf.add_clause(vec![Lit::new(var, bit)]);
    }
}
