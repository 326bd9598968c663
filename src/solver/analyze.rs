use log::trace;

use super::lit::Var;
use super::search::Solver;
use super::targets;
use super::vars::Reason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictId(u32);

/// Conflict sets of the current attempt, back to back.
///
/// A set is laid out as `[head, members.., None]`. The head is the single
/// variable left at the analysed level (the asserting one); members sit at
/// lower levels. A set without a head is the empty clause.
#[derive(Debug)]
pub struct ConflictStore {
    slots: Vec<Option<Var>>,
}

impl Default for ConflictStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictStore {
    pub fn new() -> Self {
        Self { slots: vec![None] }
    }

    pub fn clear(&mut self) {
        self.slots.truncate(1);
    }

    pub fn head(&self, id: ConflictId) -> Option<Var> {
        self.slots[id.0 as usize]
    }

    pub fn members(&self, id: ConflictId) -> impl Iterator<Item = Var> + '_ {
        self.slots[id.0 as usize + 1..].iter().map_while(|v| *v)
    }

    pub fn clause_len(&self, id: ConflictId) -> usize {
        match self.head(id) {
            Some(_) => 1 + self.members(id).count(),
            None => 0,
        }
    }

    fn open(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }
}

impl Solver {
    pub(super) fn analyze(&mut self, seeds: &[Var], level: u32) -> ConflictId {
        let begin = self.conflicts.open();
        self.conflicts.slots.extend(seeds.iter().map(|&v| Some(v)));
        let id = self.derive_reason(begin, level);
        trace!(
            target: targets::ANALYZE,
            "conflict at level {level}: {} literals",
            self.conflicts.clause_len(id)
        );
        id
    }

    /// Merges two sets that assert the same variable from opposite values,
    /// then explains the union at its highest level.
    pub(super) fn resolve(&mut self, first: ConflictId, second: ConflictId) -> ConflictId {
        debug_assert!(self.conflicts.head(first).is_some());
        debug_assert_eq!(self.conflicts.head(first), self.conflicts.head(second));
        let begin = self.conflicts.open();
        let mut level_max = None::<u32>;
        for id in [first, second] {
            let mut i = id.0 as usize + 1;
            while let Some(var) = self.conflicts.slots[i] {
                i += 1;
                if self.vars.is_marked(var) {
                    continue;
                }
                self.vars.set_mark(var, true);
                self.conflicts.slots.push(Some(var));
                let level = self.vars.level(var);
                level_max = Some(level_max.map_or(level, |m| m.max(level)));
            }
        }
        for i in begin + 1..self.conflicts.slots.len() {
            if let Some(var) = self.conflicts.slots[i] {
                self.vars.set_mark(var, false);
            }
        }
        match level_max {
            Some(level) => {
                let id = self.derive_reason(begin, level);
                trace!(
                    target: targets::ANALYZE,
                    "resolved into level {level}: {} literals",
                    self.conflicts.clause_len(id)
                );
                id
            }
            None => {
                self.conflicts.slots.push(None);
                trace!(target: targets::ANALYZE, "resolved into the empty clause");
                ConflictId(begin as u32)
            }
        }
    }

    /// Replaces every member at `level` by its reason until only the
    /// decision of that level is left, which becomes the head. Members
    /// below `level` are kept once each.
    fn derive_reason(&mut self, begin: usize, level: u32) -> ConflictId {
        let mut keep = begin + 1;
        let mut i = begin + 1;
        while i < self.conflicts.slots.len() {
            let Some(var) = self.conflicts.slots[i] else {
                unreachable!("open conflict set holds no terminator");
            };
            i += 1;
            if self.vars.is_marked(var) {
                continue;
            }
            self.vars.set_mark(var, true);
            self.seen.push(var);

            let var_level = self.vars.level(var);
            if var_level < level {
                self.conflicts.slots[keep] = Some(var);
                keep += 1;
                continue;
            }
            debug_assert_eq!(var_level, level, "conflict member above analysed level");
            match self.vars.reason(var) {
                Reason::Clause(cref) => {
                    debug_assert_eq!(self.clauses.lit(cref, 0).var(), var);
                    for j in 1..self.clauses.size(cref) {
                        let other = self.clauses.lit(cref, j).var();
                        self.conflicts.slots.push(Some(other));
                    }
                }
                Reason::Circuit(r0, r1) => {
                    self.conflicts.slots.push(Some(r0));
                    if let Some(r1) = r1 {
                        self.conflicts.slots.push(Some(r1));
                    }
                }
                Reason::Decision => {
                    if self.conflicts.slots[begin].is_none() {
                        self.conflicts.slots[begin] = Some(var);
                    } else {
                        // several root assumptions share level 0
                        debug_assert_eq!(level, 0);
                    }
                }
            }
        }
        self.conflicts.slots.truncate(keep);
        self.conflicts.slots.push(None);
        for var in self.seen.drain(..) {
            self.vars.set_mark(var, false);
        }
        debug_assert!(self.conflicts.slots[begin].is_some(), "no decision at level {level}");
        ConflictId(begin as u32)
    }

    pub(super) fn learn(&mut self, id: ConflictId) {
        let Some(head) = self.conflicts.head(id) else {
            return;
        };
        self.learnt.clear();
        self.learnt.push(!self.vars.true_lit(head));
        for var in self.conflicts.members(id) {
            self.learnt.push(!self.vars.true_lit(var));
        }

        let mut rescale = false;
        for lit in &self.learnt {
            rescale |= self.vars.bump(lit.var(), self.var_inc);
        }
        if rescale {
            self.vars.rescale_activity();
            self.var_inc *= 1e-100;
        }
        self.var_inc /= ACTIVITY_DECAY;

        if self.learnt.len() >= 2 {
            self.clauses.alloc(&self.learnt);
            self.stats.learned += 1;
        }
    }
}

const ACTIVITY_DECAY: f64 = 0.95;
