use super::lit::{Lit, Var};
use super::vars::VarStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Heuristic {
    /// Node whose busiest fanin has the most fanouts.
    #[default]
    FanoutRefs,
    HighestId,
    LowestId,
    Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierMark {
    head: usize,
    tail: usize,
}

/// And nodes assigned false whose fanins are both still open.
///
/// The active entries are `items[head..]`. Taking a mark copies them to the
/// end so the copy can be filtered freely and the original range restored
/// on backtrack.
#[derive(Debug, Default)]
pub struct Frontier {
    items: Vec<Var>,
    head: usize,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.head = 0;
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Var> + '_ {
        self.items[self.head..].iter().copied()
    }

    pub fn store(&mut self) -> FrontierMark {
        let mark = FrontierMark {
            head: self.head,
            tail: self.items.len(),
        };
        self.items.extend_from_within(mark.head..mark.tail);
        self.head = mark.tail;
        mark
    }

    pub fn restore(&mut self, mark: FrontierMark) {
        debug_assert!(mark.tail <= self.items.len());
        self.head = mark.head;
        self.items.truncate(mark.tail);
    }

    pub fn refresh(&mut self, vars: &VarStore, from: usize) {
        let mut keep = self.head;
        for i in self.head..self.items.len() {
            let var = self.items[i];
            if vars.is_unjustified(var) {
                self.items[keep] = var;
                keep += 1;
            }
        }
        self.items.truncate(keep);
        for lit in &vars.trail()[from..] {
            if vars.is_unjustified(lit.var()) {
                self.items.push(lit.var());
            }
        }
    }

    /// The chosen node is justified by making one of its fanins false.
    pub fn pick(&self, vars: &VarStore, heuristic: Heuristic) -> Option<Lit> {
        let node = match heuristic {
            Heuristic::FanoutRefs => self
                .iter()
                .map(|x| (x, preferred_fanin(vars, x)))
                .max_by(|(_, a), (_, b)| {
                    let (ra, rb) = (vars.refs(a.var()), vars.refs(b.var()));
                    ra.cmp(&rb).then(b.var().cmp(&a.var()))
                })
                .map(|(x, _)| x),
            Heuristic::HighestId => self.iter().max(),
            Heuristic::LowestId => self.iter().min(),
            Heuristic::Activity => self.iter().max_by(|&a, &b| {
                vars.activity(a)
                    .total_cmp(&vars.activity(b))
                    .then(b.cmp(&a))
            }),
        }?;
        Some(!preferred_fanin(vars, node))
    }
}

/// Fanin with more fanouts, the lower variable on ties.
fn preferred_fanin(vars: &VarStore, x: Var) -> Lit {
    let Some((f0, f1)) = vars.fanins(x) else {
        panic!("frontier holds non-and variable {}", x.index());
    };
    let (r0, r1) = (vars.refs(f0.var()), vars.refs(f1.var()));
    if r0 > r1 || (r0 == r1 && f0.var() <= f1.var()) {
        f0
    } else {
        f1
    }
}
