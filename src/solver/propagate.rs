use log::trace;

use super::analyze::ConflictId;
use super::clause::Link;
use super::lit::Lit;
use super::search::Solver;
use super::targets;
use super::vars::Reason;

impl Solver {
    /// Runs every pending assignment to a fixpoint at `level`, then
    /// refreshes the frontier. Returns the first conflict found.
    pub(super) fn propagate(&mut self, level: u32) -> Option<ConflictId> {
        self.stats.propagations += 1;
        let from = self.vars.head();
        while let Some(lit) = self.vars.next_pending() {
            if let Some(conflict) = self.propagate_clauses(lit, level) {
                return Some(conflict);
            }
            if let Some(conflict) = self.propagate_fanins(lit, level) {
                return Some(conflict);
            }
            if let Some(conflict) = self.propagate_implications(lit, level) {
                return Some(conflict);
            }
        }
        self.frontier.refresh(&self.vars, from);
        None
    }

    fn propagate_clauses(&mut self, lit: Lit, level: u32) -> Option<ConflictId> {
        let false_lit = !lit;
        let mut link = Link::Head(lit);
        let mut cur = self.clauses.head(lit);
        while let Some(cref) = cur {
            if self.clauses.lit(cref, 0) == false_lit {
                self.clauses.swap_watched(cref);
            }
            debug_assert_eq!(self.clauses.lit(cref, 1), false_lit, "watch list corrupted");

            let first = self.clauses.lit(cref, 0);
            if self.vars.lit_is_true(first) {
                link = Link::Next(cref, 1);
                cur = self.clauses.next(cref, 1);
                continue;
            }

            let size = self.clauses.size(cref);
            let replacement =
                (2..size).find(|&i| !self.vars.lit_is_false(self.clauses.lit(cref, i)));
            if let Some(i) = replacement {
                let new_watch = self.clauses.lit(cref, i);
                self.clauses.set_lit(cref, 1, new_watch);
                self.clauses.set_lit(cref, i, false_lit);
                let next = self.clauses.next(cref, 1);
                self.clauses.set_link(link, next);
                self.clauses.watch(cref, 1);
                cur = next;
                continue;
            }

            if self.vars.lit_value(first).is_none() {
                self.vars.assign(first, level, Reason::Clause(cref));
                self.stats.implications += 1;
                link = Link::Next(cref, 1);
                cur = self.clauses.next(cref, 1);
                continue;
            }

            trace!(target: targets::PROPAGATE, "clause conflict at level {level}");
            let seeds = self.clauses.lits(cref).map(Lit::var).collect::<Vec<_>>();
            return Some(self.analyze(&seeds, level));
        }
        None
    }

    fn propagate_fanins(&mut self, lit: Lit, level: u32) -> Option<ConflictId> {
        if lit.is_negated() {
            return None;
        }
        let x = lit.var();
        let (f0, f1) = self.vars.fanins(x)?;
        for fanin in [f0, f1] {
            match self.vars.lit_value(fanin) {
                Some(true) => {}
                None => {
                    self.vars.assign(fanin, level, Reason::Circuit(x, None));
                    self.stats.implications += 1;
                }
                Some(false) => {
                    trace!(target: targets::PROPAGATE, "fanin conflict on {lit} at level {level}");
                    return Some(self.analyze(&[x, fanin.var()], level));
                }
            }
        }
        None
    }

    fn propagate_implications(&mut self, lit: Lit, level: u32) -> Option<ConflictId> {
        let key = lit.var();
        for i in 0..self.implications.len_of(lit) {
            let (a, b) = self.implications.get(lit, i);
            if a == b {
                match self.vars.lit_value(a) {
                    Some(true) => {}
                    None => {
                        self.vars.assign(a, level, Reason::Circuit(key, None));
                        self.stats.implications += 1;
                    }
                    Some(false) => {
                        trace!(target: targets::PROPAGATE, "implication conflict on {lit} at level {level}");
                        return Some(self.analyze(&[key, a.var()], level));
                    }
                }
                continue;
            }
            match (self.vars.lit_value(a), self.vars.lit_value(b)) {
                (Some(true), _) | (_, Some(true)) | (None, None) => {}
                (Some(false), None) => {
                    self.vars.assign(b, level, Reason::Circuit(key, Some(a.var())));
                    self.stats.implications += 1;
                }
                (None, Some(false)) => {
                    self.vars.assign(a, level, Reason::Circuit(key, Some(b.var())));
                    self.stats.implications += 1;
                }
                (Some(false), Some(false)) => {
                    trace!(target: targets::PROPAGATE, "implication conflict on {lit} at level {level}");
                    return Some(self.analyze(&[key, a.var(), b.var()], level));
                }
            }
        }
        None
    }
}
