use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};

use circuitsat::circuit::aig::{Aig, AigLit};
use circuitsat::circuit::aiger::{parse_aag_reader, write_aag};
use circuitsat::circuit::random::{RandomShape, random_aig};
use circuitsat::miter::{Engine, MiterOptions, OutputStatus, check_miter};
use circuitsat::reference::decide_output;
use circuitsat::solver::{Heuristic, Solver, SolverParams, SolverStats, Verdict};

#[derive(Debug, Parser)]
#[command(name = "circuitsat")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    Parse {
        path: String,
    },
    Solve {
        path: String,
        #[arg(long, default_value_t = 0)]
        out: usize,
        #[command(flatten)]
        limits: Limits,
        /// Cross-check the verdict with the CNF oracle.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    Miter {
        path: String,
        #[command(flatten)]
        limits: Limits,
        #[arg(long, default_value_t = false)]
        fallback: bool,
    },
    Random {
        #[arg(long, default_value_t = 6)]
        inputs: usize,
        #[arg(long, default_value_t = 24)]
        ands: usize,
        #[arg(long, default_value_t = 1)]
        outputs: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        emit: String,
    },
}

#[derive(Debug, Args)]
struct Limits {
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long, default_value_t = 2000)]
    conflicts: u64,
    #[arg(long, default_value_t = 2000)]
    frontier: usize,
    #[arg(long, default_value_t = 1)]
    restarts: u32,
    #[arg(long, value_enum, default_value_t = HeuristicArg::Fanout)]
    heuristic: HeuristicArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeuristicArg {
    Fanout,
    Highest,
    Lowest,
    Activity,
}

impl Limits {
    fn params(&self) -> SolverParams {
        SolverParams {
            max_conflicts: self.conflicts,
            max_frontier: self.frontier,
            max_restarts: self.restarts,
            depth: self.depth,
            heuristic: match self.heuristic {
                HeuristicArg::Fanout => Heuristic::FanoutRefs,
                HeuristicArg::Highest => Heuristic::HighestId,
                HeuristicArg::Lowest => Heuristic::LowestId,
                HeuristicArg::Activity => Heuristic::Activity,
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Cmd::Parse { path } => parse_cmd(&path)?,
        Cmd::Solve {
            path,
            out,
            limits,
            check,
        } => solve_cmd(&path, out, &limits, check)?,
        Cmd::Miter {
            path,
            limits,
            fallback,
        } => miter_cmd(&path, &limits, fallback)?,
        Cmd::Random {
            inputs,
            ands,
            outputs,
            seed,
            emit,
        } => random_cmd(inputs, ands, outputs, seed, &emit)?,
    }
    Ok(())
}

fn load_aig(path: &str) -> Result<Aig> {
    let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
    parse_aag_reader(BufReader::new(file)).with_context(|| format!("cannot parse {path}"))
}

fn parse_cmd(path: &str) -> Result<()> {
    let aig = load_aig(path)?;
    println!(
        "inputs={} outputs={} ands={} max_id={}",
        aig.num_inputs(),
        aig.outputs().len(),
        aig.num_ands(),
        aig.max_id
    );
    Ok(())
}

fn solve_cmd(path: &str, out: usize, limits: &Limits, check: bool) -> Result<()> {
    let aig = load_aig(path)?;
    let root = aig.output(out)?;
    let cone = aig.cone_inputs(root)?;
    println!(
        "out={} inputs_total={} inputs_cone={}",
        out,
        aig.num_inputs(),
        cone.len()
    );
    let mut solver = Solver::new(limits.params());
    let verdict = solver.solve_output(&aig, root)?;
    let outcome = outcome(&aig, root, &verdict, limits.depth.is_some());
    match &outcome {
        Outcome::Sat(bits) => println!("result=sat model={}", bit_string(bits)),
        Outcome::SatBounded => println!("result=sat_bounded"),
        Outcome::Unsat => println!("result=unsat"),
        Outcome::Undecided => println!("result=undecided"),
    }
    print_stats(solver.stats(), solver.num_vars());

    if check {
        let expected = decide_output(&aig, root)?;
        let agrees = outcome.agrees_with(expected.is_some());
        println!(
            "oracle={} agrees={}",
            if expected.is_some() { "sat" } else { "unsat" },
            agrees
        );
        if !agrees {
            bail!("circuit solver disagrees with the CNF oracle on output {out}");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Sat(Vec<bool>),
    /// Satisfiable only with the depth-boundary nodes left free.
    SatBounded,
    Unsat,
    Undecided,
}

impl Outcome {
    fn agrees_with(&self, oracle_sat: bool) -> bool {
        match self {
            Outcome::Sat(_) => oracle_sat,
            // the cut cone is weaker, so a bounded unsat still holds
            Outcome::Unsat => !oracle_sat,
            Outcome::SatBounded | Outcome::Undecided => true,
        }
    }
}

fn outcome(aig: &Aig, root: AigLit, verdict: &Verdict, bounded: bool) -> Outcome {
    match verdict {
        Verdict::Sat(model) => match model.witness(aig, root) {
            Some(bits) => Outcome::Sat(bits),
            None => {
                assert!(bounded, "model fails simulation on the full cone");
                Outcome::SatBounded
            }
        },
        Verdict::Unsat => Outcome::Unsat,
        Verdict::Undecided => Outcome::Undecided,
    }
}

fn miter_cmd(path: &str, limits: &Limits, fallback: bool) -> Result<()> {
    let aig = load_aig(path)?;
    let report = check_miter(
        &aig,
        &MiterOptions {
            solver: limits.params(),
            fallback,
        },
    )?;
    for o in &report.outputs {
        let engine = match o.engine {
            Engine::Constant => "const",
            Engine::Circuit => "circuit",
            Engine::Reference => "oracle",
        };
        match &o.status {
            OutputStatus::Proved => println!("out={} proved by={}", o.index, engine),
            OutputStatus::Counterexample(bits) => {
                println!("out={} cex={} by={}", o.index, bit_string(bits), engine)
            }
            OutputStatus::Undecided => println!("out={} undecided", o.index),
        }
    }
    let s = &report.stats;
    println!(
        "sat={} unsat={} undec={} fallback={} total_ms={}",
        s.sat.calls,
        s.unsat.calls,
        s.undecided.calls,
        s.fallback_calls,
        s.total_time.as_millis()
    );
    println!(
        "conf_sat={} conf_unsat={} conf_undec={}",
        s.sat.conflicts, s.unsat.conflicts, s.undecided.conflicts
    );
    print_stats(&report.solver, 0);
    Ok(())
}

fn random_cmd(inputs: usize, ands: usize, outputs: usize, seed: u64, emit: &str) -> Result<()> {
    let aig = random_aig(
        RandomShape {
            inputs,
            ands,
            outputs,
            ..RandomShape::default()
        },
        seed,
    );
    std::fs::write(emit, write_aag(&aig)).with_context(|| format!("cannot write {emit}"))?;
    println!(
        "inputs={} outputs={} ands={} max_id={}",
        aig.num_inputs(),
        aig.outputs().len(),
        aig.num_ands(),
        aig.max_id
    );
    Ok(())
}

fn print_stats(stats: &SolverStats, vars: usize) {
    println!(
        "vars={} attempts={} conflicts={} decisions={} propagations={} implications={} learned={} peak_frontier={}",
        vars,
        stats.attempts,
        stats.conflicts,
        stats.decisions,
        stats.propagations,
        stats.implications,
        stats.learned,
        stats.peak_frontier
    );
}

fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
