use circuitsat::circuit::aig::{Aig, AigBuilder, AigLit};
use circuitsat::miter::{Engine, MiterOptions, OutputStatus, check_miter};
use circuitsat::solver::SolverParams;

/// Outputs: equivalent xor shapes, and-vs-or, constant false, constant true.
fn miter_circuit() -> Aig {
    let mut b = AigBuilder::new();
    let x = b.input();
    let y = b.input();
    let z = b.input();

    let left = {
        let p = b.xor(x, y);
        b.xor(p, z)
    };
    let right = {
        let q = b.xor(y, z);
        b.xnor(x, !q)
    };
    let same = b.miter(left, right);

    let and = b.and(x, y);
    let or = b.or(x, y);
    let differ = b.miter(and, or);

    b.finish(vec![same, differ, AigLit::FALSE, AigLit::TRUE])
}

#[test]
fn batch_proves_and_refutes_per_output() {
    let aig = miter_circuit();
    let report = check_miter(&aig, &MiterOptions::default()).expect("miter");
    assert_eq!(report.outputs.len(), 4);

    assert_eq!(report.outputs[0].status, OutputStatus::Proved);
    assert_eq!(report.outputs[0].engine, Engine::Circuit);

    let OutputStatus::Counterexample(bits) = &report.outputs[1].status else {
        panic!("expected counterexample, got {:?}", report.outputs[1].status);
    };
    assert!(aig.eval(bits)[1]);
    assert_ne!(bits[0], bits[1]);

    assert_eq!(report.outputs[2].status, OutputStatus::Proved);
    assert_eq!(report.outputs[2].engine, Engine::Constant);
    assert_eq!(
        report.outputs[3].status,
        OutputStatus::Counterexample(vec![false; 3])
    );

    assert!(!report.proved_all());
    assert_eq!(report.stats.outputs, 4);
    assert_eq!(report.stats.unsat.calls, 1);
    assert_eq!(report.stats.sat.calls, 1);
    assert_eq!(report.stats.undecided.calls, 0);
    assert_eq!(report.solver.solves, 2);
    assert_eq!(report.stats.unsat.conflicts, report.outputs[0].conflicts);
}

#[test]
fn fallback_settles_what_the_budget_left_open() {
    let aig = miter_circuit();
    let starved = SolverParams {
        max_conflicts: 0,
        ..SolverParams::default()
    };

    let report = check_miter(
        &aig,
        &MiterOptions {
            solver: starved,
            fallback: false,
        },
    )
    .expect("miter");
    assert_eq!(report.outputs[0].status, OutputStatus::Undecided);
    assert_eq!(report.stats.undecided.calls, 2);

    let report = check_miter(
        &aig,
        &MiterOptions {
            solver: starved,
            fallback: true,
        },
    )
    .expect("miter");
    assert_eq!(report.stats.fallback_calls, 2);
    assert_eq!(report.outputs[0].status, OutputStatus::Proved);
    assert_eq!(report.outputs[0].engine, Engine::Reference);
    let OutputStatus::Counterexample(bits) = &report.outputs[1].status else {
        panic!("expected counterexample, got {:?}", report.outputs[1].status);
    };
    assert!(aig.eval(bits)[1]);
    assert_eq!(report.outputs[1].engine, Engine::Reference);
}

#[test]
fn all_equivalent_outputs_prove_the_miter() {
    let mut b = AigBuilder::new();
    let x = b.input();
    let y = b.input();
    let lhs = b.and(x, y);
    let rhs = {
        let n = b.or(!x, !y);
        !n
    };
    let out = b.miter(lhs, rhs);
    let aig = b.finish(vec![out, AigLit::FALSE]);

    let report = check_miter(&aig, &MiterOptions::default()).expect("miter");
    assert!(report.proved_all());
}

#[test]
fn bad_output_is_reported_as_error() {
    let aig = Aig {
        max_id: 1,
        inputs: vec![1],
        outputs: vec![AigLit::new(2, false)],
        ands: vec![],
    };
    assert!(check_miter(&aig, &MiterOptions::default()).is_err());
}

/// `g1 & !g2` where g1 and g2 are two copies of the same gate. Cut at depth
/// one, both copies are free and the output looks satisfiable.
fn twin_gate_miter() -> Aig {
    let mut b = AigBuilder::new();
    let x = b.input();
    let y = b.input();
    let g1 = b.and(x, y);
    let g2 = b.and(x, y);
    let out = b.and(g1, !g2);
    b.finish(vec![out])
}

#[test]
fn depth_bound_patterns_that_fail_simulation_stay_open() {
    let aig = twin_gate_miter();
    let bounded = SolverParams {
        depth: Some(1),
        ..SolverParams::default()
    };

    let report = check_miter(
        &aig,
        &MiterOptions {
            solver: bounded,
            fallback: false,
        },
    )
    .expect("miter");
    assert_eq!(report.outputs[0].status, OutputStatus::Undecided);
    assert_eq!(report.outputs[0].engine, Engine::Circuit);
    assert_eq!(report.stats.sat.calls, 1);
    assert_eq!(report.stats.fallback_calls, 0);

    let report = check_miter(
        &aig,
        &MiterOptions {
            solver: bounded,
            fallback: true,
        },
    )
    .expect("miter");
    assert_eq!(report.outputs[0].status, OutputStatus::Proved);
    assert_eq!(report.outputs[0].engine, Engine::Reference);
    assert_eq!(report.stats.fallback_calls, 1);

    let report = check_miter(&aig, &MiterOptions::default()).expect("miter");
    assert_eq!(report.outputs[0].status, OutputStatus::Proved);
    assert_eq!(report.outputs[0].engine, Engine::Circuit);
}
