use super::lit::Lit;

/// Circuit implications keyed by literal: when the key is true, at least
/// one literal of every listed pair must be true. A pair with both sides
/// equal is a plain binary implication.
#[derive(Debug, Default)]
pub struct ImplicationTable {
    lists: Vec<Vec<(Lit, Lit)>>,
    entries: usize,
}

impl ImplicationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve_vars(&mut self, num_vars: usize) {
        if self.lists.len() < 2 * num_vars {
            self.lists.resize_with(2 * num_vars, Vec::new);
        }
    }

    pub fn reset(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
        self.entries = 0;
    }

    pub fn add(&mut self, key: Lit, a: Lit, b: Lit) {
        self.lists[key.code()].push((a, b));
        self.entries += 1;
    }

    pub fn len_of(&self, key: Lit) -> usize {
        self.lists[key.code()].len()
    }

    pub fn get(&self, key: Lit, i: usize) -> (Lit, Lit) {
        self.lists[key.code()][i]
    }

    pub fn entries(&self) -> usize {
        self.entries
    }
}
