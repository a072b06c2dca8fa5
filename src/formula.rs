//! Propositional formulas over [`Atom`]s.
//!
//! A [`Formula`] is a plain tree of `Atom`, `Not`, `And`, `Or`, `Implies` and
//! `Eq` nodes. `And` and `Or` are n-ary; the empty conjunction is *true* and
//! the empty disjunction is *false*, so no separate constants are needed.
//!
//! The smart constructors ([`Formula::and`], [`Formula::or`], [`Formula::not`])
//! perform only local, structure-preserving simplifications: flattening of
//! nested n-ary nodes, unwrapping of singletons and removal of double negation.

use std::collections::BTreeSet;
use std::fmt;

use crate::atom::Atom;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Formula {
    Atom(Atom),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Eq(Box<Formula>, Box<Formula>),
}

impl From<Atom> for Formula {
    fn from(atom: Atom) -> Self {
        Formula::Atom(atom)
    }
}

// Constructors
impl Formula {
    pub fn atom(atom: Atom) -> Self {
        Formula::Atom(atom)
    }

    /// The constant *true* (empty conjunction).
    pub fn top() -> Self {
        Formula::And(Vec::new())
    }

    /// The constant *false* (empty disjunction).
    pub fn bottom() -> Self {
        Formula::Or(Vec::new())
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Formula::And(args) if args.is_empty())
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Formula::Or(args) if args.is_empty())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(f: impl Into<Formula>) -> Self {
        match f.into() {
            Formula::Not(inner) => *inner,
            f => Formula::Not(Box::new(f)),
        }
    }

    pub fn and(args: impl IntoIterator<Item = Formula>) -> Self {
        let mut flat = Vec::new();
        for arg in args {
            match arg {
                Formula::And(inner) => flat.extend(inner),
                f => flat.push(f),
            }
        }
        if flat.len() == 1 {
            return flat.pop().unwrap_or_else(Formula::top);
        }
        Formula::And(flat)
    }

    pub fn or(args: impl IntoIterator<Item = Formula>) -> Self {
        let mut flat = Vec::new();
        for arg in args {
            match arg {
                Formula::Or(inner) => flat.extend(inner),
                f => flat.push(f),
            }
        }
        if flat.len() == 1 {
            return flat.pop().unwrap_or_else(Formula::bottom);
        }
        Formula::Or(flat)
    }

    pub fn and2(a: impl Into<Formula>, b: impl Into<Formula>) -> Self {
        Formula::and([a.into(), b.into()])
    }

    pub fn or2(a: impl Into<Formula>, b: impl Into<Formula>) -> Self {
        Formula::or([a.into(), b.into()])
    }

    pub fn implies(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Self {
        Formula::Implies(Box::new(lhs.into()), Box::new(rhs.into()))
    }

    pub fn eq(lhs: impl Into<Formula>, rhs: impl Into<Formula>) -> Self {
        Formula::Eq(Box::new(lhs.into()), Box::new(rhs.into()))
    }

    /// `¬(a ∧ b)`.
    pub fn nand2(a: impl Into<Formula>, b: impl Into<Formula>) -> Self {
        Formula::not(Formula::and2(a, b))
    }

    /// Exactly one of `(a ∧ ¬b)`, `(¬a ∧ b)`.
    pub fn xor2(a: impl Into<Formula>, b: impl Into<Formula>) -> Self {
        let (a, b) = (a.into(), b.into());
        Formula::or2(
            Formula::and2(a.clone(), Formula::not(b.clone())),
            Formula::and2(Formula::not(a), b),
        )
    }

    pub fn at_least_one(args: impl IntoIterator<Item = Formula>) -> Self {
        Formula::or(args)
    }

    /// At most one of `args` is true.
    ///
    /// Built by recursive halving: `amo(L ++ R) = amo(L) ∧ amo(R) ∧ ¬(∨L ∧ ∨R)`.
    /// The result has `O(n log n)` nodes and introduces no auxiliary atoms.
    pub fn at_most_one(args: impl IntoIterator<Item = Formula>) -> Self {
        let args: Vec<Formula> = args.into_iter().collect();
        Self::at_most_one_rec(&args)
    }

    fn at_most_one_rec(args: &[Formula]) -> Self {
        match args {
            [] | [_] => Formula::top(),
            [a, b] => Formula::nand2(a.clone(), b.clone()),
            _ => {
                let (left, right) = args.split_at(args.len() / 2);
                Formula::and([
                    Self::at_most_one_rec(left),
                    Self::at_most_one_rec(right),
                    Formula::nand2(Formula::or(left.to_vec()), Formula::or(right.to_vec())),
                ])
            }
        }
    }

    /// Exactly one of `args` is true.
    pub fn exactly_one(args: impl IntoIterator<Item = Formula>) -> Self {
        let args: Vec<Formula> = args.into_iter().collect();
        Formula::and([Formula::or(args.clone()), Self::at_most_one_rec(&args)])
    }
}

// Queries
impl Formula {
    /// Evaluates the formula under the given assignment.
    pub fn eval(&self, value: &impl Fn(Atom) -> bool) -> bool {
        match self {
            Formula::Atom(a) => value(*a),
            Formula::Not(f) => !f.eval(value),
            Formula::And(args) => args.iter().all(|f| f.eval(value)),
            Formula::Or(args) => args.iter().any(|f| f.eval(value)),
            Formula::Implies(a, b) => !a.eval(value) || b.eval(value),
            Formula::Eq(a, b) => a.eval(value) == b.eval(value),
        }
    }

    /// Top-level conjuncts (the formula itself if it is not a conjunction).
    pub fn conjuncts(&self) -> &[Formula] {
        match self {
            Formula::And(args) => args,
            f => std::slice::from_ref(f),
        }
    }

    /// The set of atoms occurring in the formula.
    pub fn atoms(&self) -> BTreeSet<Atom> {
        let mut res = BTreeSet::new();
        self.collect_atoms(&mut res);
        res
    }

    fn collect_atoms(&self, acc: &mut BTreeSet<Atom>) {
        match self {
            Formula::Atom(a) => {
                acc.insert(*a);
            }
            Formula::Not(f) => f.collect_atoms(acc),
            Formula::And(args) | Formula::Or(args) => {
                for f in args {
                    f.collect_atoms(acc);
                }
            }
            Formula::Implies(a, b) | Formula::Eq(a, b) => {
                a.collect_atoms(acc);
                b.collect_atoms(acc);
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Formula::Atom(_) => 1,
            Formula::Not(f) => 1 + f.size(),
            Formula::And(args) | Formula::Or(args) => 1 + args.iter().map(|f| f.size()).sum::<usize>(),
            Formula::Implies(a, b) | Formula::Eq(a, b) => 1 + a.size() + b.size(),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, args: &[Formula], op: &str, empty: &str) -> fmt::Result {
            if args.is_empty() {
                return write!(f, "{}", empty);
            }
            write!(f, "(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")
        }

        match self {
            Formula::Atom(a) => write!(f, "{}", a),
            Formula::Not(g) => write!(f, "¬{}", g),
            Formula::And(args) => join(f, args, "∧", "⊤"),
            Formula::Or(args) => join(f, args, "∨", "⊥"),
            Formula::Implies(a, b) => write!(f, "({} → {})", a, b),
            Formula::Eq(a, b) => write!(f, "({} ↔ {})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::atom::{AtomKey, AtomRegistry};

    fn atoms(n: usize) -> (AtomRegistry, Vec<Atom>) {
        let reg = AtomRegistry::new();
        let xs = (0..n).map(|i| reg.atom_for(AtomKey::state(i, 0, 0))).collect();
        (reg, xs)
    }

    fn assignments(n: usize) -> impl Iterator<Item = Vec<bool>> {
        (0..1u32 << n).map(move |m| (0..n).map(|i| m & (1 << i) != 0).collect())
    }

    #[test]
    fn test_constants() {
        let no = |_: Atom| false;
        assert!(Formula::top().eval(&no));
        assert!(!Formula::bottom().eval(&no));
        assert!(Formula::top().is_top());
        assert!(Formula::bottom().is_bottom());
    }

    #[test]
    fn test_double_negation() {
        let (_, xs) = atoms(1);
        let x = Formula::atom(xs[0]);
        assert_eq!(Formula::not(Formula::not(x.clone())), x);
    }

    #[test]
    fn test_flattening() {
        let (_, xs) = atoms(3);
        let f = Formula::and([
            Formula::and2(xs[0], xs[1]),
            Formula::atom(xs[2]),
        ]);
        assert_eq!(f.conjuncts().len(), 3);
        assert_eq!(Formula::and([Formula::atom(xs[0])]), Formula::atom(xs[0]));
        assert_eq!(Formula::or([Formula::atom(xs[1])]), Formula::atom(xs[1]));
    }

    #[test]
    fn test_implies_and_eq() {
        let (_, xs) = atoms(2);
        let imp = Formula::implies(xs[0], xs[1]);
        let eq = Formula::eq(xs[0], xs[1]);
        let xor = Formula::xor2(xs[0], xs[1]);
        for bits in assignments(2) {
            let v = |a: Atom| bits[a.index()];
            assert_eq!(imp.eval(&v), !bits[0] || bits[1]);
            assert_eq!(eq.eval(&v), bits[0] == bits[1]);
            assert_eq!(xor.eval(&v), bits[0] != bits[1]);
        }
    }

    #[test]
    fn test_exactly_one_exhaustive() {
        for n in 0..=7 {
            let (_, xs) = atoms(n);
            let lits: Vec<Formula> = xs.iter().map(|&a| a.into()).collect();
            let eo = Formula::exactly_one(lits.clone());
            let amo = Formula::at_most_one(lits);
            for bits in assignments(n) {
                let v = |a: Atom| bits[a.index()];
                let ones = bits.iter().filter(|&&b| b).count();
                assert_eq!(eo.eval(&v), ones == 1, "n = {}, bits = {:?}", n, bits);
                assert_eq!(amo.eval(&v), ones <= 1, "n = {}, bits = {:?}", n, bits);
            }
        }
    }

    #[test]
    fn test_exactly_one_is_subquadratic() {
        let (_, xs) = atoms(64);
        let eo = Formula::exactly_one(xs.iter().map(|&a| a.into()));
        // Pairwise exclusion alone would need 64*63/2 = 2016 clauses of 4 nodes each.
        assert!(eo.size() < 2016 * 4, "size = {}", eo.size());
        assert_eq!(eo.atoms().len(), 64);
    }

    #[test]
    fn test_display() {
        let (_, xs) = atoms(2);
        let f = Formula::implies(xs[0], Formula::or2(xs[1], Formula::not(xs[0])));
        assert_eq!(f.to_string(), "(a0 → (a1 ∨ ¬a0))");
        assert_eq!(Formula::top().to_string(), "⊤");
    }
}
