use indexmap::IndexMap;
use log::{debug, trace};

use super::analyze::{ConflictId, ConflictStore};
use super::clause::ClauseArena;
use super::encode::{encode, Encoding, Roots};
use super::frontier::{Frontier, Heuristic};
use super::implication::ImplicationTable;
use super::lit::{Lit, Var};
use super::targets;
use super::vars::{Reason, VarStore};
use crate::circuit::aig::{lit_value, Aig, AigLit};
use crate::circuit::CircuitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverParams {
    pub max_conflicts: u64,
    pub max_frontier: usize,
    /// Attempts per solve; zero behaves like one.
    pub max_restarts: u32,
    /// Expansion depth from the root; `None` encodes the whole cone.
    pub depth: Option<u32>,
    pub heuristic: Heuristic,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_conflicts: 2000,
            max_frontier: 2000,
            max_restarts: 1,
            depth: None,
            heuristic: Heuristic::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solves: u64,
    pub attempts: u64,
    pub conflicts: u64,
    pub decisions: u64,
    pub propagations: u64,
    pub implications: u64,
    pub learned: u64,
    pub peak_frontier: usize,
}

impl SolverStats {
    fn absorb(&mut self, other: &SolverStats) {
        self.solves += other.solves;
        self.attempts += other.attempts;
        self.conflicts += other.conflicts;
        self.decisions += other.decisions;
        self.propagations += other.propagations;
        self.implications += other.implications;
        self.learned += other.learned;
        self.peak_frontier = self.peak_frontier.max(other.peak_frontier);
    }
}

/// Satisfying values of the leaves of the encoded cone: primary inputs and
/// the and nodes cut off by the depth bound. Leaves the search never had
/// to assign read as false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    leaves: IndexMap<u32, bool>,
}

impl Model {
    pub fn value(&self, node: u32) -> Option<bool> {
        self.leaves.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.leaves.iter().map(|(&id, &v)| (id, v))
    }

    /// One bit per primary input of `aig`; inputs outside the cone are false.
    pub fn input_bits(&self, aig: &Aig) -> Vec<bool> {
        aig.input_ids()
            .iter()
            .map(|id| self.value(*id).unwrap_or(false))
            .collect()
    }

    /// Node values under this model, with boundary leaves held at their
    /// model value instead of being recomputed from their fanins.
    pub fn simulate(&self, aig: &Aig) -> Vec<bool> {
        let mut values = vec![false; aig.max_id as usize + 1];
        for &id in aig.input_ids() {
            values[id as usize] = self.value(id).unwrap_or(false);
        }
        for gate in &aig.ands {
            values[gate.id as usize] = match self.value(gate.id) {
                Some(v) => v,
                None => lit_value(gate.a, &values) & lit_value(gate.b, &values),
            };
        }
        values
    }

    pub fn satisfies(&self, aig: &Aig, output: AigLit) -> bool {
        lit_value(output, &self.simulate(aig))
    }

    /// Input bits that drive `output` true on the whole circuit. A model
    /// found under a depth bound may only work with its boundary leaves
    /// free, in which case there is none.
    pub fn witness(&self, aig: &Aig, output: AigLit) -> Option<Vec<bool>> {
        let bits = self.input_bits(aig);
        aig.eval_lit(output, &bits).then_some(bits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Sat(Model),
    Unsat,
    Undecided,
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Verdict::Unsat)
    }

    pub fn is_undecided(&self) -> bool {
        matches!(self, Verdict::Undecided)
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            Verdict::Sat(model) => Some(model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Search {
    Sat,
    Conflict(ConflictId),
    Undecided,
}

#[derive(Debug)]
pub struct Solver {
    params: SolverParams,
    pub(super) vars: VarStore,
    pub(super) clauses: ClauseArena,
    pub(super) implications: ImplicationTable,
    pub(super) frontier: Frontier,
    pub(super) conflicts: ConflictStore,
    encoding: Option<Encoding>,
    pub(super) seen: Vec<Var>,
    pub(super) learnt: Vec<Lit>,
    pub(super) var_inc: f64,
    attempt_conflicts: u64,
    pub(super) stats: SolverStats,
    totals: SolverStats,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SolverParams::default())
    }
}

impl Solver {
    pub fn new(params: SolverParams) -> Self {
        Self {
            params,
            vars: VarStore::new(),
            clauses: ClauseArena::new(),
            implications: ImplicationTable::new(),
            frontier: Frontier::new(),
            conflicts: ConflictStore::new(),
            encoding: None,
            seen: Vec::new(),
            learnt: Vec::new(),
            var_inc: 1.0,
            attempt_conflicts: 0,
            stats: SolverStats::default(),
            totals: SolverStats::default(),
        }
    }

    pub fn reset(&mut self) {
        self.vars.reset();
        self.clauses.reset();
        self.implications.reset();
        self.frontier.clear();
        self.conflicts.clear();
        self.encoding = None;
        self.var_inc = 1.0;
        self.stats = SolverStats::default();
    }

    pub fn load(&mut self, aig: &Aig, output: AigLit) -> Result<(), CircuitError> {
        self.load_all(aig, &[output])
    }

    /// Loads the conjunction of `outputs`: a later `solve` looks for one
    /// input pattern that drives every one of them true. Replaces whatever
    /// was loaded before.
    pub fn load_all(&mut self, aig: &Aig, outputs: &[AigLit]) -> Result<(), CircuitError> {
        self.reset();
        let encoding = encode(
            aig,
            outputs,
            self.params.depth,
            &mut self.vars,
            &mut self.implications,
        )?;
        self.clauses.reserve_vars(self.vars.len());
        self.encoding = Some(encoding);
        Ok(())
    }

    pub fn solve_output(&mut self, aig: &Aig, output: AigLit) -> Result<Verdict, CircuitError> {
        self.load(aig, output)?;
        Ok(self.solve())
    }

    /// Decides the loaded output. Learned clauses carry over between the
    /// attempts of one call and between calls on the same load.
    pub fn solve(&mut self) -> Verdict {
        let Some(roots) = self.encoding.as_ref().map(|e| e.roots.clone()) else {
            panic!("Solver::solve called before load");
        };
        self.stats = SolverStats {
            solves: 1,
            ..SolverStats::default()
        };
        let verdict = match roots {
            Roots::Const(true) => Verdict::Sat(Model::default()),
            Roots::Const(false) => Verdict::Unsat,
            Roots::Lits(roots) => {
                let attempts = self.params.max_restarts.max(1);
                let mut verdict = Verdict::Undecided;
                for attempt in 0..attempts {
                    self.stats.attempts += 1;
                    verdict = self.attempt(&roots);
                    if !verdict.is_undecided() {
                        break;
                    }
                    debug!(
                        target: targets::SEARCH,
                        "attempt {} undecided after {} conflicts",
                        attempt + 1,
                        self.attempt_conflicts
                    );
                }
                verdict
            }
        };
        self.totals.absorb(&self.stats);
        debug!(
            target: targets::SEARCH,
            "{} vars: {} after {} conflicts, {} decisions, peak frontier {}",
            self.vars.len(),
            match &verdict {
                Verdict::Sat(_) => "sat",
                Verdict::Unsat => "unsat",
                Verdict::Undecided => "undecided",
            },
            self.stats.conflicts,
            self.stats.decisions,
            self.stats.peak_frontier
        );
        verdict
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn totals(&self) -> &SolverStats {
        &self.totals
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_learned(&self) -> usize {
        self.clauses.len()
    }

    /// Learned clauses over node ids; a literal with `neg == false` reads
    /// "this node is true".
    pub fn learned_clauses(&self) -> Vec<Vec<AigLit>> {
        self.clauses
            .clauses()
            .map(|cref| {
                self.clauses
                    .lits(cref)
                    .map(|lit| AigLit::new(self.vars.node(lit.var()), lit.is_negated()))
                    .collect()
            })
            .collect()
    }

    pub fn watches_consistent(&self) -> bool {
        self.clauses.check_watches()
    }

    fn attempt(&mut self, roots: &[Lit]) -> Verdict {
        self.attempt_conflicts = 0;
        if let Some(c) = self.encoding.as_ref().and_then(|e| e.const_var) {
            self.vars.assign(c.lit(false), 0, Reason::Decision);
        }
        for &root in roots {
            self.vars.assign(root, 0, Reason::Decision);
        }
        let verdict = match self.search(0) {
            Search::Sat => Verdict::Sat(self.model()),
            Search::Conflict(_) => Verdict::Unsat,
            Search::Undecided => Verdict::Undecided,
        };
        self.vars.cancel_until(0);
        self.frontier.clear();
        self.conflicts.clear();
        verdict
    }

    fn search(&mut self, level: u32) -> Search {
        if let Some(conflict) = self.propagate(level) {
            self.learn(conflict);
            return Search::Conflict(conflict);
        }
        if self.frontier.is_empty() {
            return Search::Sat;
        }
        self.stats.peak_frontier = self.stats.peak_frontier.max(self.frontier.len());
        if self.over_budget() {
            return Search::Undecided;
        }

        let mark = self.vars.trail_len();
        let saved = self.frontier.store();
        let Some(decision) = self.frontier.pick(&self.vars, self.params.heuristic) else {
            unreachable!("non-empty frontier always yields a decision");
        };

        self.stats.decisions += 1;
        trace!(target: targets::SEARCH, "level {}: decide {decision}", level + 1);
        self.vars.assign(decision, level + 1, Reason::Decision);
        let first = match self.search(level + 1) {
            Search::Conflict(c) => c,
            other => return other,
        };
        if self.conflicts.head(first) != Some(decision.var()) {
            return Search::Conflict(first);
        }

        self.vars.cancel_until(mark);
        self.frontier.restore(saved);
        self.stats.decisions += 1;
        trace!(target: targets::SEARCH, "level {}: flip to {}", level + 1, !decision);
        self.vars.assign(!decision, level + 1, Reason::Decision);
        let second = match self.search(level + 1) {
            Search::Conflict(c) => c,
            other => return other,
        };
        if self.conflicts.head(second) != Some(decision.var()) {
            return Search::Conflict(second);
        }

        let merged = self.resolve(first, second);
        self.learn(merged);
        self.stats.conflicts += 1;
        self.attempt_conflicts += 1;
        Search::Conflict(merged)
    }

    fn over_budget(&self) -> bool {
        self.frontier.len() > self.params.max_frontier
            || self.attempt_conflicts >= self.params.max_conflicts
    }

    fn model(&self) -> Model {
        let leaves = match &self.encoding {
            Some(enc) => enc
                .leaves
                .iter()
                .map(|(&id, &var)| (id, self.vars.value(var).unwrap_or(false)))
                .collect(),
            None => IndexMap::new(),
        };
        Model { leaves }
    }
}
