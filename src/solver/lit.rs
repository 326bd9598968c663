use std::fmt;
use std::ops::Not;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Literal of this variable that is true when the variable has `value`.
    pub fn lit(self, value: bool) -> Lit {
        Lit::new(self, !value)
    }
}

/// Packed `(variable, polarity)`; the low bit is set for the negative phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(u32);

impl Lit {
    pub fn new(var: Var, negated: bool) -> Self {
        Self((var.0 << 1) | negated as u32)
    }

    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    pub fn is_negated(self) -> bool {
        self.0 & 1 == 1
    }

    pub fn code(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_code(code: u32) -> Self {
        Self(code)
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Self(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negated() {
            write!(f, "-{}", self.var().0)
        } else {
            write!(f, "{}", self.var().0)
        }
    }
}
