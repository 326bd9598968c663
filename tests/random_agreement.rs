use proptest::prelude::*;

use circuitsat::circuit::aig::{Aig, AigLit, AndGate};
use circuitsat::circuit::random::{RandomShape, random_aig};
use circuitsat::cnf::cnf::Lit;
use circuitsat::cnf::tseitin::encode_output;
use circuitsat::reference::{VarisatOracle, decide_output};
use circuitsat::solver::{Heuristic, Solver, SolverParams, Verdict};

fn shape(inputs: usize, ands: usize) -> RandomShape {
    RandomShape {
        inputs,
        ands,
        outputs: 1,
        window: 8,
    }
}

fn oracle_sat(aig: &Aig, out: AigLit) -> bool {
    decide_output(aig, out).expect("oracle").is_some()
}

/// Adds the negation of `clause` to the circuit with `out` asserted and
/// checks that the oracle finds no solution.
fn clause_is_implied(aig: &Aig, out: AigLit, clause: &[AigLit]) -> bool {
    let mut enc = encode_output(aig, out).expect("tseitin");
    for lit in clause {
        let var = if lit.id == 0 { enc.false_var } else { lit.id };
        enc.cnf.add_clause(vec![Lit::new(var, lit.neg)]);
    }
    let mut oracle = VarisatOracle::new();
    oracle.load(&enc.cnf);
    !oracle.solve().expect("oracle")
}

/// Copy of `aig` with one extra and gate over `a` and `b`.
fn with_conjunction(aig: &Aig, a: AigLit, b: AigLit) -> (Aig, AigLit) {
    let mut joined = aig.clone();
    let id = aig.max_id + 1;
    joined.max_id = id;
    joined.ands.push(AndGate { id, a, b });
    (joined, AigLit::new(id, false))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn verdicts_match_the_cnf_oracle(seed in any::<u64>(), inputs in 2usize..8, ands in 4usize..40) {
        let aig = random_aig(shape(inputs, ands), seed);
        let out = aig.outputs()[0];
        let mut solver = Solver::default();
        let verdict = solver.solve_output(&aig, out).expect("load");
        let expected = oracle_sat(&aig, out);
        match verdict {
            Verdict::Sat(model) => {
                prop_assert!(expected);
                prop_assert!(aig.eval_lit(out, &model.input_bits(&aig)));
            }
            Verdict::Unsat => prop_assert!(!expected),
            Verdict::Undecided => prop_assert!(false, "default limits left a small circuit undecided"),
        }
        prop_assert!(solver.watches_consistent());
    }

    #[test]
    fn learned_clauses_follow_from_the_circuit(seed in any::<u64>(), ands in 8usize..40) {
        let aig = random_aig(shape(5, ands), seed);
        let out = aig.outputs()[0];
        let mut solver = Solver::default();
        solver.solve_output(&aig, out).expect("load");
        for clause in solver.learned_clauses() {
            prop_assert!(clause.len() >= 2);
            prop_assert!(clause_is_implied(&aig, out, &clause), "clause {clause:?}");
        }
    }

    #[test]
    fn repeated_solves_are_identical(seed in any::<u64>(), ands in 4usize..40) {
        let aig = random_aig(shape(6, ands), seed);
        let out = aig.outputs()[0];
        let params = SolverParams { heuristic: Heuristic::Activity, ..SolverParams::default() };
        let first = Solver::new(params).solve_output(&aig, out).expect("load");

        let mut reused = Solver::new(params);
        let other = random_aig(shape(4, 10), seed ^ 1);
        reused.solve_output(&other, other.outputs()[0]).expect("load");
        let second = reused.solve_output(&aig, out).expect("load");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn restarts_never_flip_a_verdict(seed in any::<u64>(), ands in 8usize..48) {
        let aig = random_aig(shape(6, ands), seed);
        let out = aig.outputs()[0];
        let expected = oracle_sat(&aig, out);
        for restarts in 1..4 {
            let params = SolverParams {
                max_conflicts: 1,
                max_restarts: restarts,
                ..SolverParams::default()
            };
            let mut solver = Solver::new(params);
            match solver.solve_output(&aig, out).expect("load") {
                Verdict::Sat(_) => prop_assert!(expected),
                Verdict::Unsat => prop_assert!(!expected),
                Verdict::Undecided => {}
            }
            prop_assert!(solver.stats().attempts <= u64::from(restarts));
        }
    }

    #[test]
    fn bounded_depth_models_hold_on_the_cut_circuit(seed in any::<u64>(), depth in 0u32..4, ands in 4usize..40) {
        let aig = random_aig(shape(6, ands), seed);
        let out = aig.outputs()[0];
        let params = SolverParams { depth: Some(depth), ..SolverParams::default() };
        let mut solver = Solver::new(params);
        match solver.solve_output(&aig, out).expect("load") {
            Verdict::Sat(model) => prop_assert!(model.satisfies(&aig, out)),
            // the cut cone is weaker, so it cannot be unsat when the circuit is sat
            Verdict::Unsat => prop_assert!(!oracle_sat(&aig, out)),
            Verdict::Undecided => {}
        }
    }

    #[test]
    fn target_sets_agree_with_an_explicit_and(seed in any::<u64>(), ands in 4usize..40, neg in any::<bool>()) {
        let aig = random_aig(RandomShape { outputs: 2, ..shape(6, ands) }, seed);
        let (a, b) = (aig.outputs()[0], aig.outputs()[1].negate_if(neg));
        let (joined, both) = with_conjunction(&aig, a, b);

        let mut solver = Solver::default();
        solver.load_all(&aig, &[a, b]).expect("load");
        match solver.solve() {
            Verdict::Sat(model) => {
                prop_assert!(oracle_sat(&joined, both));
                let bits = model.input_bits(&aig);
                prop_assert!(aig.eval_lit(a, &bits) && aig.eval_lit(b, &bits));
            }
            Verdict::Unsat => prop_assert!(!oracle_sat(&joined, both)),
            Verdict::Undecided => prop_assert!(false, "default limits left a small circuit undecided"),
        }
    }
}
