//! Boolean atoms and their canonical registry.
//!
//! Every atom of a reduction is identified by a structural [`AtomKey`].
//! The [`AtomRegistry`] hands out exactly one [`Atom`] per key: asking twice
//! for structurally equal keys yields the same atom. Constraints built at
//! different places that talk about "the same" state therefore always share
//! their variable.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::types::Symbol;

/// Structural identity of an atom.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AtomKey {
    /// "The path is at `node` with stack height `height` at position `pos`."
    State { node: usize, pos: usize, height: usize },
    /// "Stack cell `height` holds `symbol` at position `pos`."
    Symbol { pos: usize, height: usize, symbol: Symbol },
}

impl AtomKey {
    pub fn state(node: usize, pos: usize, height: usize) -> Self {
        AtomKey::State { node, pos, height }
    }

    pub fn symbol(pos: usize, height: usize, symbol: Symbol) -> Self {
        AtomKey::Symbol { pos, height, symbol }
    }

    pub fn position(&self) -> usize {
        match *self {
            AtomKey::State { pos, .. } => pos,
            AtomKey::Symbol { pos, .. } => pos,
        }
    }

    /// Position-major ordering key: all atoms of position `p` come before
    /// those of `p + 1`, states before stack cells.
    pub fn order_key(&self) -> (usize, u8, usize, usize) {
        match *self {
            AtomKey::State { node, pos, height } => (pos, 0, node, height),
            AtomKey::Symbol { pos, height, symbol } => (pos, 1, height, symbol as usize),
        }
    }
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomKey::State { node, pos, height } => {
                write!(f, "x[node={},pos={},h={}]", node, pos, height)
            }
            AtomKey::Symbol { pos, height, symbol } => {
                write!(f, "y[pos={},h={},{}]", pos, height, symbol)
            }
        }
    }
}

/// An opaque boolean variable (0-indexed, dense).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Atom(u32);

impl Atom {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// DIMACS variable number (1-indexed).
    pub fn to_dimacs(self) -> u32 {
        self.0 + 1
    }

    pub fn from_dimacs(var: u32) -> Option<Atom> {
        var.checked_sub(1).map(Atom)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Inner {
    atoms: HashMap<AtomKey, Atom>,
    keys: Vec<AtomKey>,
}

/// Memoizing map from keys to atoms, owned by one reduction.
///
/// Atoms are allocated on first request and never removed; the registry is
/// dropped together with the formula that uses it.
#[derive(Default)]
pub struct AtomRegistry {
    inner: RefCell<Inner>,
}

impl AtomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RefCell::new(Inner {
                atoms: HashMap::with_capacity(capacity),
                keys: Vec::with_capacity(capacity),
            }),
        }
    }

    /// Returns the canonical atom for `key`, allocating it if needed.
    pub fn atom_for(&self, key: AtomKey) -> Atom {
        let mut inner = self.inner.borrow_mut();
        if let Some(&atom) = inner.atoms.get(&key) {
            return atom;
        }
        let atom = Atom(inner.keys.len() as u32);
        inner.keys.push(key);
        inner.atoms.insert(key, atom);
        atom
    }

    /// Returns the atom for `key` only if it was already allocated.
    pub fn lookup(&self, key: &AtomKey) -> Option<Atom> {
        self.inner.borrow().atoms.get(key).copied()
    }

    pub fn key(&self, atom: Atom) -> AtomKey {
        self.inner.borrow().keys[atom.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All allocated atoms with their keys, in allocation order.
    pub fn entries(&self) -> Vec<(Atom, AtomKey)> {
        self.inner
            .borrow()
            .keys
            .iter()
            .enumerate()
            .map(|(i, &k)| (Atom(i as u32), k))
            .collect()
    }

    pub fn state(&self, node: usize, pos: usize, height: usize) -> Atom {
        self.atom_for(AtomKey::state(node, pos, height))
    }

    pub fn symbol(&self, pos: usize, height: usize, symbol: Symbol) -> Atom {
        self.atom_for(AtomKey::symbol(pos, height, symbol))
    }
}

impl fmt::Debug for AtomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomRegistry").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_same_atom() {
        let reg = AtomRegistry::new();
        let a = reg.state(1, 2, 0);
        let b = reg.symbol(2, 0, Symbol::A);
        let c = reg.state(1, 2, 0);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.symbol(2, 0, Symbol::A), b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_distinct_keys() {
        let reg = AtomRegistry::new();
        // Keys that would collide under a naive "{}{}{}" string encoding.
        let a = reg.state(1, 12, 3);
        let b = reg.state(11, 2, 3);
        assert_ne!(a, b);
        assert_ne!(reg.symbol(0, 0, Symbol::A), reg.symbol(0, 0, Symbol::B));
    }

    #[test]
    fn test_reverse_lookup() {
        let reg = AtomRegistry::new();
        let a = reg.state(0, 1, 2);
        assert_eq!(reg.key(a), AtomKey::state(0, 1, 2));
        assert_eq!(reg.lookup(&AtomKey::state(0, 1, 2)), Some(a));
        assert_eq!(reg.lookup(&AtomKey::state(0, 1, 3)), None);
        assert_eq!(reg.entries(), vec![(a, AtomKey::state(0, 1, 2))]);
    }

    #[test]
    fn test_dimacs_numbering() {
        let reg = AtomRegistry::new();
        let a = reg.state(0, 0, 0);
        assert_eq!(a.to_dimacs(), 1);
        assert_eq!(Atom::from_dimacs(1), Some(a));
        assert_eq!(Atom::from_dimacs(0), None);
    }

    #[test]
    fn test_order_key_is_position_major() {
        let s = AtomKey::state(9, 0, 3);
        let y = AtomKey::symbol(0, 0, Symbol::B);
        let t = AtomKey::state(0, 1, 0);
        assert!(s.order_key() < y.order_key());
        assert!(y.order_key() < t.order_key());
    }
}
