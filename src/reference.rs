use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// A handle to a BDD node, with a complement bit encoded in the sign.
///
/// `Ref(i)` points to node `i`, `Ref(-i)` to its negation. Index 0 is never
/// a valid node, so negation is always an involution.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    /// The node index, ignoring the complement bit.
    pub const fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// The raw signed value, used for hashing.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Injective mapping to `u64`, used by the computed cache.
    pub fn as_lit(self) -> u64 {
        ((self.0.unsigned_abs() as u64) << 1) | (self.0 < 0) as u64
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}
