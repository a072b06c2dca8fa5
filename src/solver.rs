//! Interface to the satisfiability oracle.
//!
//! The oracle consumes a [`Formula`] over named atoms and answers SAT with a
//! total assignment, or UNSAT. Two oracles ship with the crate:
//! [`BddSolver`][crate::bdd::BddSolver] and
//! [`DimacsSolver`][crate::cnf::DimacsSolver].

use std::collections::HashSet;

use crate::atom::{Atom, AtomKey, AtomRegistry};
use crate::error::SolverError;
use crate::formula::Formula;

/// A total assignment of atoms.
pub trait Model {
    fn value_of(&self, atom: Atom) -> bool;

    /// Value of the atom registered under `key`; unknown keys are false.
    fn value_of_key(&self, atoms: &AtomRegistry, key: AtomKey) -> bool {
        atoms.lookup(&key).is_some_and(|a| self.value_of(a))
    }
}

/// A concrete assignment: the set of atoms that are true.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Assignment {
    true_atoms: HashSet<Atom>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, atom: Atom, value: bool) {
        if value {
            self.true_atoms.insert(atom);
        } else {
            self.true_atoms.remove(&atom);
        }
    }

    pub fn true_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.true_atoms.iter().copied()
    }

    pub fn num_true(&self) -> usize {
        self.true_atoms.len()
    }

    /// Whether the assignment satisfies `formula`.
    pub fn satisfies(&self, formula: &Formula) -> bool {
        formula.eval(&|a| self.value_of(a))
    }
}

impl FromIterator<Atom> for Assignment {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Self {
            true_atoms: iter.into_iter().collect(),
        }
    }
}

impl Model for Assignment {
    fn value_of(&self, atom: Atom) -> bool {
        self.true_atoms.contains(&atom)
    }
}

/// Answer of the oracle.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SolveResult<M = Assignment> {
    Sat(M),
    Unsat,
}

impl<M> SolveResult<M> {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveResult::Sat(_))
    }

    pub fn model(self) -> Option<M> {
        match self {
            SolveResult::Sat(m) => Some(m),
            SolveResult::Unsat => None,
        }
    }
}

/// A satisfiability oracle.
pub trait Solver {
    /// Decides `formula`. Atoms are resolved through `atoms`, which also
    /// provides their structural keys (useful for variable ordering and for
    /// annotating exported problems).
    fn solve(&mut self, formula: &Formula, atoms: &AtomRegistry) -> Result<SolveResult, SolverError>;
}

impl<S: Solver + ?Sized> Solver for &mut S {
    fn solve(&mut self, formula: &Formula, atoms: &AtomRegistry) -> Result<SolveResult, SolverError> {
        (**self).solve(formula, atoms)
    }
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn solve(&mut self, formula: &Formula, atoms: &AtomRegistry) -> Result<SolveResult, SolverError> {
        (**self).solve(formula, atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::Symbol;

    #[test]
    fn test_assignment() {
        let reg = AtomRegistry::new();
        let x = reg.state(0, 0, 0);
        let y = reg.symbol(0, 0, Symbol::A);

        let mut m = Assignment::new();
        m.set(x, true);
        assert!(m.value_of(x));
        assert!(!m.value_of(y));
        assert!(m.value_of_key(&reg, AtomKey::state(0, 0, 0)));
        assert!(!m.value_of_key(&reg, AtomKey::state(3, 3, 3)));

        assert!(m.satisfies(&Formula::and2(x, Formula::not(y))));
        m.set(x, false);
        assert_eq!(m.num_true(), 0);
    }

    #[test]
    fn test_solve_result() {
        let r: SolveResult = SolveResult::Unsat;
        assert!(!r.is_sat());
        assert_eq!(r.model(), None);
        let r = SolveResult::Sat(Assignment::new());
        assert!(r.is_sat());
    }
}
