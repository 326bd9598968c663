use super::lit::Lit;

/// Offset of a clause record inside the arena. Offset 0 is never a
/// clause, so it doubles as the end of a watch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseRef(u32);

impl ClauseRef {
    fn offset(self) -> usize {
        self.0 as usize
    }
}

const NIL: u32 = 0;
// record layout: size, next watch of lits[0], next watch of lits[1], lits...
const SIZE: usize = 0;
const NEXT: usize = 1;
const LITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Head(Lit),
    Next(ClauseRef, usize),
}

/// Learned clauses of size two or more, stored back to back in one buffer.
///
/// Each record carries the next-pointers of the two watch lists it sits
/// in. The list keyed by literal `l` holds the clauses watching `!l`, so
/// assigning `l` true visits exactly the clauses that lost a watch.
#[derive(Debug)]
pub struct ClauseArena {
    words: Vec<u32>,
    heads: Vec<u32>,
    listed: Vec<Lit>,
    count: usize,
}

impl Default for ClauseArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseArena {
    pub fn new() -> Self {
        Self {
            words: vec![NIL],
            heads: Vec::new(),
            listed: Vec::new(),
            count: 0,
        }
    }

    pub fn reserve_vars(&mut self, num_vars: usize) {
        if self.heads.len() < 2 * num_vars {
            self.heads.resize(2 * num_vars, NIL);
        }
    }

    pub fn reset(&mut self) {
        for lit in self.listed.drain(..) {
            self.heads[lit.code()] = NIL;
        }
        self.words.truncate(1);
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn alloc(&mut self, lits: &[Lit]) -> ClauseRef {
        assert!(lits.len() >= 2, "stored clauses have at least two literals");
        let cref = ClauseRef(self.words.len() as u32);
        self.words.push(lits.len() as u32);
        self.words.push(NIL);
        self.words.push(NIL);
        self.words.extend(lits.iter().map(|l| l.code() as u32));
        self.count += 1;
        self.watch(cref, 0);
        self.watch(cref, 1);
        cref
    }

    pub fn size(&self, cref: ClauseRef) -> usize {
        self.words[cref.offset() + SIZE] as usize
    }

    pub fn lit(&self, cref: ClauseRef, i: usize) -> Lit {
        debug_assert!(i < self.size(cref));
        Lit::from_code(self.words[cref.offset() + LITS + i])
    }

    pub fn lits(&self, cref: ClauseRef) -> impl Iterator<Item = Lit> + '_ {
        let start = cref.offset() + LITS;
        self.words[start..start + self.size(cref)]
            .iter()
            .map(|&w| Lit::from_code(w))
    }

    pub fn set_lit(&mut self, cref: ClauseRef, i: usize, lit: Lit) {
        debug_assert!(i < self.size(cref));
        self.words[cref.offset() + LITS + i] = lit.code() as u32;
    }

    pub fn head(&self, lit: Lit) -> Option<ClauseRef> {
        decode(self.heads[lit.code()])
    }

    pub fn next(&self, cref: ClauseRef, slot: usize) -> Option<ClauseRef> {
        decode(self.words[cref.offset() + NEXT + slot])
    }

    pub fn set_link(&mut self, link: Link, to: Option<ClauseRef>) {
        let raw = to.map_or(NIL, |c| c.0);
        match link {
            Link::Head(lit) => self.heads[lit.code()] = raw,
            Link::Next(cref, slot) => self.words[cref.offset() + NEXT + slot] = raw,
        }
    }

    pub fn watch(&mut self, cref: ClauseRef, slot: usize) {
        debug_assert!(slot < 2);
        let key = !self.lit(cref, slot);
        let old = self.heads[key.code()];
        if old == NIL {
            self.listed.push(key);
        }
        self.words[cref.offset() + NEXT + slot] = old;
        self.heads[key.code()] = cref.0;
    }

    pub fn swap_watched(&mut self, cref: ClauseRef) {
        let base = cref.offset();
        self.words.swap(base + LITS, base + LITS + 1);
        self.words.swap(base + NEXT, base + NEXT + 1);
    }

    pub fn clauses(&self) -> impl Iterator<Item = ClauseRef> + '_ {
        let mut offset = 1usize;
        std::iter::from_fn(move || {
            if offset >= self.words.len() {
                return None;
            }
            let cref = ClauseRef(offset as u32);
            offset += LITS + self.words[offset + SIZE] as usize;
            Some(cref)
        })
    }

    pub fn check_watches(&self) -> bool {
        let mut seen = std::collections::HashMap::<ClauseRef, [u32; 2]>::new();
        for code in 0..self.heads.len() {
            let key = Lit::from_code(code as u32);
            let mut cur = self.head(key);
            while let Some(cref) = cur {
                let slot = if self.lit(cref, 0) == !key {
                    0
                } else if self.lit(cref, 1) == !key {
                    1
                } else {
                    return false;
                };
                seen.entry(cref).or_default()[slot] += 1;
                cur = self.next(cref, slot);
            }
        }
        self.clauses()
            .all(|cref| seen.get(&cref).copied() == Some([1, 1]))
            && seen.len() == self.count
    }
}

fn decode(raw: u32) -> Option<ClauseRef> {
    (raw != NIL).then_some(ClauseRef(raw))
}
