//! Reduced ordered BDDs with complement edges, used as a satisfiability oracle.
//!
//! All operations go through the [`Bdd`] manager, which hash-conses nodes
//! (so equal functions share one [`Ref`]) and memoizes ITE results in a lossy
//! computed cache. Variables are 1-indexed; a smaller variable sits closer to
//! the root.
//!
//! [`BddSolver`] compiles a [`Formula`] into a BDD and extracts a model from
//! any path to the *one* terminal.
//!
//! ```
//! use tunnel_rs::bdd::Bdd;
//!
//! let bdd = Bdd::default();
//! let x1 = bdd.mk_var(1);
//! let x2 = bdd.mk_var(2);
//! let f = bdd.apply_and(x1, -x2);
//!
//! assert!(!bdd.is_zero(f));
//! assert_eq!(bdd.one_sat(f), Some(vec![1, -2]));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;

use log::debug;
use num_bigint::BigUint;

use crate::atom::{Atom, AtomRegistry};
use crate::cache::Cache;
use crate::error::SolverError;
use crate::formula::Formula;
use crate::reference::Ref;
use crate::solver::{Assignment, SolveResult, Solver};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

/// Sizing of the BDD manager.
#[derive(Debug, Clone)]
pub struct BddConfig {
    /// The computed cache has `2^cache_bits` slots.
    pub cache_bits: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self { cache_bits: 16 }
    }
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<Cache<(Ref, Ref, Ref), Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn new(config: &BddConfig) -> Self {
        // Index 0 is a sentinel, index 1 is the terminal node.
        let sentinel = Node {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        };
        let one = Ref::positive(1);
        let terminal = Node {
            variable: 0,
            low: one,
            high: one,
        };
        Self {
            nodes: RefCell::new(vec![sentinel, terminal]),
            unique: RefCell::new(HashMap::new()),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            zero: -one,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(&BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("nodes", &self.num_nodes())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    /// Number of allocated nodes, terminal included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 1
    }

    fn node(&self, index: u32) -> Node {
        self.nodes.borrow()[index as usize]
    }

    /// Variable labelling the node, 0 for the terminal.
    pub fn variable(&self, node: Ref) -> u32 {
        self.node(node.index()).variable
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.node(node.index()).low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.node(node.index()).high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if low == high {
            return low;
        }

        // Canonical form: the high edge is never complemented.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        let node = Node { variable: v, low, high };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }
        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        nodes.push(node);
        self.unique.borrow_mut().insert(node, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, self.zero, self.one)
    }

    fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || self.variable(node) != v {
            return (node, node);
        }
        (self.low_node(node), self.high_node(node))
    }

    fn top_variable(&self, node: Ref) -> u32 {
        if self.is_terminal(node) {
            u32::MAX
        } else {
            self.variable(node)
        }
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero
        } else {
            g
        };
        let h = if h == f {
            self.zero
        } else if h == -f {
            self.one
        } else {
            h
        };

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, n) = if g.is_negated() { (-g, -h, true) } else { (g, h, false) };

        let key = (f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if n { -res } else { res };
        }

        let m = self
            .top_variable(f)
            .min(self.top_variable(g))
            .min(self.top_variable(h));
        debug_assert_ne!(m, u32::MAX);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if n {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    /// Conjunction of all nodes, stopping early once it becomes *zero*.
    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
            if self.is_zero(res) {
                break;
            }
        }
        res
    }

    /// Disjunction of all nodes, stopping early once it becomes *one*.
    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node);
            if self.is_one(res) {
                break;
            }
        }
        res
    }

    /// Returns one satisfying partial assignment as signed variable literals,
    /// or `None` if `node` is *zero*.
    ///
    /// The walk prefers low edges, so unmentioned variables can be taken as false.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<i32>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;
        while !self.is_one(current) {
            let var = self.variable(current) as i32;
            let low = self.low_node(current);
            if !self.is_zero(low) {
                path.push(-var);
                current = low;
            } else {
                path.push(var);
                current = self.high_node(current);
            }
        }
        Some(path)
    }

    /// Number of satisfying assignments over variables `1..=num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u32) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_(node, &max, &mut cache)
    }

    fn sat_count_(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        } else if self.is_one(node) {
            return max.clone();
        }

        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let regular = Ref::positive(node.index());
        let count_low = self.sat_count_(self.low_node(regular), max, cache);
        let count_high = self.sat_count_(self.high_node(regular), max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }

    /// Number of distinct nodes reachable from `node`, terminal included.
    pub fn size(&self, node: Ref) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![node.index()];
        while let Some(i) = stack.pop() {
            if !seen.insert(i) {
                continue;
            }
            let n = self.node(i);
            if n.variable != 0 {
                stack.push(n.low.index());
                stack.push(n.high.index());
            }
        }
        seen.len()
    }
}

/// Solver oracle that decides formulas by building their BDD.
///
/// BDD variables follow the position-major order of the atoms' keys, so that
/// constraints linking positions `p` and `p + 1` stay local in the diagram.
#[derive(Debug, Default, Clone)]
pub struct BddSolver {
    config: BddConfig,
}

/// A formula compiled into a BDD, together with the variable mapping.
pub struct Compiled {
    pub bdd: Bdd,
    pub root: Ref,
    vars: Vec<Atom>,
}

impl Compiled {
    /// The atom mapped to BDD variable `v`.
    pub fn atom(&self, v: u32) -> Atom {
        self.vars[v as usize - 1]
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }
}

impl BddSolver {
    pub fn new(config: BddConfig) -> Self {
        Self { config }
    }

    /// Builds the BDD of `formula`.
    pub fn compile(&self, formula: &Formula, atoms: &AtomRegistry) -> Compiled {
        let mut entries = atoms.entries();
        entries.sort_by_key(|(_, key)| key.order_key());
        let vars: Vec<Atom> = entries.into_iter().map(|(a, _)| a).collect();
        let mut index = HashMap::with_capacity(vars.len());
        for (i, &a) in vars.iter().enumerate() {
            index.insert(a, i as u32 + 1);
        }

        let bdd = Bdd::new(&self.config);
        let root = build(&bdd, formula, &index);
        debug!(
            "compiled formula of size {} into BDD of size {} over {} vars",
            formula.size(),
            bdd.size(root),
            vars.len()
        );
        Compiled { bdd, root, vars }
    }

    /// Number of satisfying assignments of `formula` over all registered atoms.
    pub fn count_models(&self, formula: &Formula, atoms: &AtomRegistry) -> BigUint {
        let compiled = self.compile(formula, atoms);
        compiled.bdd.sat_count(compiled.root, compiled.num_vars())
    }
}

fn build(bdd: &Bdd, formula: &Formula, index: &HashMap<Atom, u32>) -> Ref {
    match formula {
        // Atoms missing from the registry cannot occur: formulas are built through it.
        Formula::Atom(a) => match index.get(a) {
            Some(&v) => bdd.mk_var(v),
            None => bdd.zero,
        },
        Formula::Not(f) => bdd.apply_not(build(bdd, f, index)),
        Formula::And(args) => {
            let mut res = bdd.one;
            for f in args {
                res = bdd.apply_and(res, build(bdd, f, index));
                if bdd.is_zero(res) {
                    break;
                }
            }
            res
        }
        Formula::Or(args) => {
            let mut res = bdd.zero;
            for f in args {
                res = bdd.apply_or(res, build(bdd, f, index));
                if bdd.is_one(res) {
                    break;
                }
            }
            res
        }
        Formula::Implies(a, b) => bdd.apply_imply(build(bdd, a, index), build(bdd, b, index)),
        Formula::Eq(a, b) => bdd.apply_eq(build(bdd, a, index), build(bdd, b, index)),
    }
}

impl Solver for BddSolver {
    fn solve(&mut self, formula: &Formula, atoms: &AtomRegistry) -> Result<SolveResult, SolverError> {
        let compiled = self.compile(formula, atoms);
        debug!("bdd = {:?}", compiled.bdd);
        match compiled.bdd.one_sat(compiled.root) {
            None => Ok(SolveResult::Unsat),
            Some(path) => {
                let model: Assignment = path
                    .into_iter()
                    .filter(|&lit| lit > 0)
                    .map(|lit| compiled.atom(lit as u32))
                    .collect();
                Ok(SolveResult::Sat(model))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::atom::AtomKey;
    use crate::solver::Model;

    #[test]
    fn test_terminals() {
        let bdd = Bdd::default();
        assert!(bdd.is_one(bdd.one));
        assert!(bdd.is_zero(-bdd.one));
        assert!(bdd.is_terminal(bdd.zero));
    }

    #[test]
    fn test_hash_consing() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_and(x, y);
        let g = bdd.apply_and(y, x);
        assert_eq!(f, g);
        assert_eq!(bdd.mk_var(1), x);
    }

    #[test]
    fn test_basic_identities() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        assert!(bdd.is_zero(bdd.apply_and(x, -x)));
        assert!(bdd.is_one(bdd.apply_or(x, -x)));
        assert!(bdd.is_one(bdd.apply_imply(bdd.apply_and(x, y), x)));
        assert!(bdd.is_one(bdd.apply_eq(x, x)));
        // De Morgan
        let lhs = -bdd.apply_and(x, y);
        let rhs = bdd.apply_or(-x, -y);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_ite() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, y, z);
        let expected = bdd.apply_or(bdd.apply_and(x, y), bdd.apply_and(-x, z));
        assert_eq!(f, expected);
    }

    #[test]
    fn test_one_sat() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_and_many([x, -y, z]);
        assert_eq!(bdd.one_sat(f), Some(vec![1, -2, 3]));
        assert_eq!(bdd.one_sat(bdd.zero), None);
        assert_eq!(bdd.one_sat(bdd.one), Some(vec![]));

        let g = bdd.apply_or_many([x, y]);
        assert_eq!(bdd.one_sat(g), Some(vec![-1, 2]));
    }

    #[test]
    fn test_sat_count() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        assert_eq!(bdd.sat_count(bdd.zero, 3), BigUint::from(0u32));
        assert_eq!(bdd.sat_count(bdd.one, 3), BigUint::from(8u32));
        assert_eq!(bdd.sat_count(x, 2), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(bdd.apply_or(x, y), 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(-bdd.apply_and(x, y), 3), BigUint::from(6u32));
    }

    #[test]
    fn test_size() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        assert_eq!(bdd.size(bdd.one), 1);
        assert_eq!(bdd.size(x), 2);
        assert_eq!(bdd.size(bdd.apply_and(x, y)), 3);
    }

    #[test]
    fn test_solver() {
        let reg = AtomRegistry::new();
        let a = reg.atom_for(AtomKey::state(0, 0, 0));
        let b = reg.atom_for(AtomKey::state(1, 0, 0));
        let c = reg.atom_for(AtomKey::state(2, 0, 0));

        let mut solver = BddSolver::default();

        let f = Formula::and([Formula::exactly_one([a.into(), b.into(), c.into()]), Formula::not(a), Formula::not(c)]);
        let model = solver.solve(&f, &reg).unwrap().model().unwrap();
        assert!(!model.value_of(a));
        assert!(model.value_of(b));
        assert!(!model.value_of(c));
        assert!(model.satisfies(&f));

        let g = Formula::and2(a, Formula::not(a));
        assert_eq!(solver.solve(&g, &reg).unwrap(), SolveResult::Unsat);
    }

    #[test]
    fn test_count_models() {
        let reg = AtomRegistry::new();
        let xs: Vec<Formula> = (0..4).map(|i| reg.atom_for(AtomKey::state(i, 0, 0)).into()).collect();
        let solver = BddSolver::default();
        assert_eq!(solver.count_models(&Formula::exactly_one(xs.clone()), &reg), BigUint::from(4u32));
        assert_eq!(solver.count_models(&Formula::at_most_one(xs), &reg), BigUint::from(5u32));
    }
}
