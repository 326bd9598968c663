use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::circuit::aig::Aig;
use crate::circuit::CircuitError;
use crate::reference::decide_output;
use crate::solver::{Solver, SolverParams, SolverStats, Verdict};

const TARGET: &str = "miter";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiterOptions {
    pub solver: SolverParams,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputStatus {
    Proved,
    Counterexample(Vec<bool>),
    Undecided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Constant,
    Circuit,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputReport {
    pub index: usize,
    pub status: OutputStatus,
    pub engine: Engine,
    pub conflicts: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub calls: usize,
    pub conflicts: u64,
    pub time: Duration,
}

impl CategoryStats {
    fn add(&mut self, conflicts: u64, time: Duration) {
        self.calls += 1;
        self.conflicts += conflicts;
        self.time += time;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiterStats {
    pub outputs: usize,
    pub sat: CategoryStats,
    pub unsat: CategoryStats,
    pub undecided: CategoryStats,
    pub fallback_calls: usize,
    pub total_time: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiterReport {
    pub outputs: Vec<OutputReport>,
    pub stats: MiterStats,
    pub solver: SolverStats,
}

impl MiterReport {
    pub fn proved_all(&self) -> bool {
        self.outputs
            .iter()
            .all(|o| o.status == OutputStatus::Proved)
    }

    pub fn count(&self, pick: impl Fn(&OutputStatus) -> bool) -> usize {
        self.outputs.iter().filter(|o| pick(&o.status)).count()
    }
}

pub fn check_miter(aig: &Aig, opts: &MiterOptions) -> Result<MiterReport, CircuitError> {
    let started = Instant::now();
    aig.nodes()?;
    let mut solver = Solver::new(opts.solver);
    let mut stats = MiterStats {
        outputs: aig.outputs().len(),
        ..MiterStats::default()
    };
    let mut outputs = Vec::with_capacity(aig.outputs().len());

    for (index, &out) in aig.outputs().iter().enumerate() {
        if out.is_const() {
            let status = if out.neg {
                OutputStatus::Counterexample(vec![false; aig.num_inputs()])
            } else {
                OutputStatus::Proved
            };
            debug!(target: TARGET, "output {index}: constant");
            outputs.push(OutputReport {
                index,
                status,
                engine: Engine::Constant,
                conflicts: 0,
            });
            continue;
        }

        let clk = Instant::now();
        let verdict = solver.solve_output(aig, out)?;
        let conflicts = solver.stats().conflicts;
        let status = match verdict {
            Verdict::Unsat => {
                stats.unsat.add(conflicts, clk.elapsed());
                OutputStatus::Proved
            }
            Verdict::Sat(model) => {
                stats.sat.add(conflicts, clk.elapsed());
                match model.witness(aig, out) {
                    Some(bits) => OutputStatus::Counterexample(bits),
                    None => {
                        assert!(
                            opts.solver.depth.is_some(),
                            "model of output {index} fails simulation"
                        );
                        debug!(target: TARGET, "output {index}: spurious pattern under depth bound");
                        OutputStatus::Undecided
                    }
                }
            }
            Verdict::Undecided => {
                stats.undecided.add(conflicts, clk.elapsed());
                OutputStatus::Undecided
            }
        };

        let (status, engine) = if status == OutputStatus::Undecided && opts.fallback {
            stats.fallback_calls += 1;
            match decide_output(aig, out) {
                Ok(Some(bits)) => {
                    assert!(aig.eval_lit(out, &bits), "oracle model of output {index} fails simulation");
                    (OutputStatus::Counterexample(bits), Engine::Reference)
                }
                Ok(None) => (OutputStatus::Proved, Engine::Reference),
                Err(e) => {
                    warn!(target: TARGET, "output {index}: fallback failed: {e:#}");
                    (OutputStatus::Undecided, Engine::Circuit)
                }
            }
        } else {
            (status, Engine::Circuit)
        };
        debug!(target: TARGET, "output {index}: {status:?} by {engine:?} after {conflicts} conflicts");
        outputs.push(OutputReport {
            index,
            status,
            engine,
            conflicts,
        });
    }

    stats.total_time = started.elapsed();
    let report = MiterReport {
        outputs,
        stats,
        solver: *solver.totals(),
    };
    info!(
        target: TARGET,
        "{} outputs: {} proved, {} failed, {} undecided in {:.3}s",
        stats.outputs,
        report.count(|s| *s == OutputStatus::Proved),
        report.count(|s| matches!(s, OutputStatus::Counterexample(_))),
        report.count(|s| *s == OutputStatus::Undecided),
        stats.total_time.as_secs_f64()
    );
    Ok(report)
}
