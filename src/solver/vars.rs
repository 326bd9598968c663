use super::clause::ClauseRef;
use super::lit::{Lit, Var};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Free choice, or a root assumption at level 0.
    Decision,
    Circuit(Var, Option<Var>),
    /// Forced by a learned clause whose first literal is this variable.
    Clause(ClauseRef),
}

/// Per-variable state plus the assignment trail.
#[derive(Debug, Default)]
pub struct VarStore {
    value: Vec<Option<bool>>,
    level: Vec<u32>,
    reason: Vec<Reason>,
    fanins: Vec<Option<(Lit, Lit)>>,
    refs: Vec<u32>,
    node: Vec<u32>,
    activity: Vec<f64>,
    mark: Vec<bool>,
    trail: Vec<Lit>,
    head: usize,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.value.clear();
        self.level.clear();
        self.reason.clear();
        self.fanins.clear();
        self.refs.clear();
        self.node.clear();
        self.activity.clear();
        self.mark.clear();
        self.trail.clear();
        self.head = 0;
    }

    pub fn add_var(&mut self, node: u32, refs: u32) -> Var {
        let var = Var::new(self.value.len() as u32);
        self.value.push(None);
        self.level.push(0);
        self.reason.push(Reason::Decision);
        self.fanins.push(None);
        self.refs.push(refs);
        self.node.push(node);
        self.activity.push(0.0);
        self.mark.push(false);
        var
    }

    pub fn set_fanins(&mut self, var: Var, fan0: Lit, fan1: Lit) {
        self.fanins[var.index()] = Some((fan0, fan1));
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn fanins(&self, var: Var) -> Option<(Lit, Lit)> {
        self.fanins[var.index()]
    }

    pub fn refs(&self, var: Var) -> u32 {
        self.refs[var.index()]
    }

    pub fn node(&self, var: Var) -> u32 {
        self.node[var.index()]
    }

    pub fn value(&self, var: Var) -> Option<bool> {
        self.value[var.index()]
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value[lit.var().index()].map(|v| v ^ lit.is_negated())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.lit_value(lit) == Some(true)
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.lit_value(lit) == Some(false)
    }

    pub fn true_lit(&self, var: Var) -> Lit {
        let value = self.value[var.index()];
        assert!(value.is_some(), "variable {} is unassigned", var.index());
        var.lit(value == Some(true))
    }

    pub fn level(&self, var: Var) -> u32 {
        debug_assert!(self.value[var.index()].is_some());
        self.level[var.index()]
    }

    pub fn reason(&self, var: Var) -> Reason {
        debug_assert!(self.value[var.index()].is_some());
        self.reason[var.index()]
    }

    pub fn assign(&mut self, lit: Lit, level: u32, reason: Reason) {
        let idx = lit.var().index();
        assert!(
            self.value[idx].is_none(),
            "variable {} assigned twice",
            idx
        );
        debug_assert!(
            self.trail
                .last()
                .map_or(true, |&last| self.level[last.var().index()] <= level),
            "trail levels must not decrease"
        );
        self.value[idx] = Some(!lit.is_negated());
        self.level[idx] = level;
        self.reason[idx] = reason;
        self.trail.push(lit);
    }

    /// Unassigns everything at trail positions `bound..` in reverse order.
    pub fn cancel_until(&mut self, bound: usize) {
        assert!(bound <= self.trail.len(), "cancel beyond trail end");
        while self.trail.len() > bound {
            if let Some(lit) = self.trail.pop() {
                let idx = lit.var().index();
                self.value[idx] = None;
                self.reason[idx] = Reason::Decision;
            }
        }
        self.head = bound;
    }

    /// Trail length that keeps exactly the assignments at levels `<= level`.
    pub fn level_boundary(&self, level: u32) -> usize {
        self.trail
            .partition_point(|lit| self.level[lit.var().index()] <= level)
    }

    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    pub fn next_pending(&mut self) -> Option<Lit> {
        let lit = self.trail.get(self.head).copied()?;
        self.head += 1;
        Some(lit)
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// True for an and node assigned false with neither fanin assigned.
    pub fn is_unjustified(&self, var: Var) -> bool {
        match self.fanins[var.index()] {
            Some((f0, f1)) => {
                self.value[var.index()] == Some(false)
                    && self.value[f0.var().index()].is_none()
                    && self.value[f1.var().index()].is_none()
            }
            None => false,
        }
    }

    pub fn is_marked(&self, var: Var) -> bool {
        self.mark[var.index()]
    }

    pub fn set_mark(&mut self, var: Var, on: bool) {
        self.mark[var.index()] = on;
    }

    pub fn activity(&self, var: Var) -> f64 {
        self.activity[var.index()]
    }

    pub fn bump(&mut self, var: Var, inc: f64) -> bool {
        let a = &mut self.activity[var.index()];
        *a += inc;
        *a > 1e100
    }

    pub fn rescale_activity(&mut self) {
        for a in &mut self.activity {
            *a *= 1e-100;
        }
    }
}
