//! Constraint families characterizing valid bounded paths.
//!
//! For a network and a bound `length`, a satisfying assignment of the
//! conjunction of all families describes exactly one simple path of
//! `length` transitions from `(initial, 0)` to `(final, 0)` that respects
//! the stack discipline, and every such path has a satisfying assignment.
//!
//! | Family                           | Meaning                                            |
//! |----------------------------------|----------------------------------------------------|
//! | [`Family::StateUniqueness`]  φ₁  | exactly one `(node, height)` per position          |
//! | [`Family::Boundary`]         φ₂  | start at `(initial, 0)`, end at `(final, 0)`, bottom cell `A` |
//! | [`Family::Transitions`]      φ₃  | edges, height deltas, and top-of-stack/action agreement (φ₅) |
//! | [`Family::StackWellDefined`] φ₄  | used cells hold exactly one symbol                 |
//! | [`Family::StackEvolution`]   φ₆  | cells below the touched one are preserved          |
//! | [`Family::SimplePath`]       φ₈  | no `(node, height)` is visited twice               |

use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use crate::atom::AtomRegistry;
use crate::formula::Formula;
use crate::network::Network;
use crate::scheme::Scheme;
use crate::types::{Action, ActionKind, Symbol};

/// One of the constraint families.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Family {
    StateUniqueness,
    Boundary,
    Transitions,
    StackWellDefined,
    StackEvolution,
    SimplePath,
}

impl Family {
    /// All families, in the order they are conjoined.
    pub const ALL: [Family; 6] = [
        Family::StateUniqueness,
        Family::Boundary,
        Family::Transitions,
        Family::StackWellDefined,
        Family::StackEvolution,
        Family::SimplePath,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Family::StateUniqueness => "φ₁",
            Family::Boundary => "φ₂",
            Family::Transitions => "φ₃",
            Family::StackWellDefined => "φ₄",
            Family::StackEvolution => "φ₆",
            Family::SimplePath => "φ₈",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::StateUniqueness => "state uniqueness",
            Family::Boundary => "boundary",
            Family::Transitions => "transitions",
            Family::StackWellDefined => "stack well-definedness",
            Family::StackEvolution => "stack evolution",
            Family::SimplePath => "simple path",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.name())
    }
}

/// Builds the constraint families for one network and one bound.
///
/// All atoms are obtained through the shared [`AtomRegistry`], so the same
/// state mentioned by two families is the same atom.
pub struct ConstraintBuilder<'a> {
    network: &'a Network,
    scheme: Scheme,
    atoms: &'a AtomRegistry,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(network: &'a Network, length: usize, atoms: &'a AtomRegistry) -> Self {
        Self {
            network,
            scheme: Scheme::new(length),
            atoms,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    fn num_nodes(&self) -> usize {
        self.network.num_nodes()
    }

    /// `x[node, pos, h]`
    fn x(&self, node: usize, pos: usize, h: usize) -> Formula {
        Formula::atom(self.atoms.state(node, pos, h))
    }

    /// `y[pos, h, symbol]`
    fn y(&self, pos: usize, h: usize, symbol: Symbol) -> Formula {
        Formula::atom(self.atoms.symbol(pos, h, symbol))
    }

    /// Both cells `(p, k)` and `(p + 1, k)` hold the same symbol, for all `k` in `cells`.
    fn preserve(&self, p: usize, cells: std::ops::Range<usize>) -> Formula {
        Formula::and(cells.flat_map(|k| {
            Symbol::ALL
                .into_iter()
                .map(move |s| Formula::eq(self.y(p, k, s), self.y(p + 1, k, s)))
        }))
    }

    /// Builds the given family.
    pub fn family(&self, family: Family) -> Formula {
        let f = match family {
            Family::StateUniqueness => self.state_uniqueness(),
            Family::Boundary => self.boundary(),
            Family::Transitions => self.transitions(),
            Family::StackWellDefined => self.stack_well_defined(),
            Family::StackEvolution => self.stack_evolution(),
            Family::SimplePath => self.simple_path(),
        };
        debug!(
            "{}: {} conjuncts, size {}",
            family,
            f.conjuncts().len(),
            f.size()
        );
        f
    }

    /// φ₁: at every position exactly one `(node, height)` pair holds.
    pub fn state_uniqueness(&self) -> Formula {
        Formula::and(self.scheme.positions().map(|p| {
            let candidates = (0..self.num_nodes())
                .flat_map(|n| self.scheme.heights().map(move |h| (n, h)))
                .map(|(n, h)| self.x(n, p, h));
            Formula::exactly_one(candidates)
        }))
    }

    /// φ₂: the path starts at `(initial, 0)` and ends at `(final, 0)`,
    /// with `A` in the bottom cell at both ends.
    pub fn boundary(&self) -> Formula {
        let length = self.scheme.length;
        Formula::and([
            self.x(self.network.initial(), 0, 0),
            self.y(0, 0, Symbol::A),
            self.x(self.network.final_node(), length, 0),
            self.y(length, 0, Symbol::A),
        ])
    }

    /// φ₃ (with φ₅): legal transitions.
    ///
    /// For every `(u, p, h)`:
    /// - successors whose height differs by more than one are forbidden;
    /// - successors that are not neighbours of `u` are forbidden;
    /// - a transmit/push/pop move to a neighbour implies that the stack top agrees
    ///   with one of the enabled actions of that kind (forbidden if there is none);
    /// - if `u` has legal successors, occupying `(u, p, h)` implies occupying one of them.
    pub fn transitions(&self) -> Formula {
        let n = self.num_nodes();
        let cap = self.scheme.capacity;
        let mut constraints = Vec::with_capacity(self.scheme.length * n * n * cap * 4);

        for p in self.scheme.transitions() {
            for u in 0..n {
                for h in self.scheme.heights() {
                    self.height_jumps(u, p, h, &mut constraints);
                    for v in 0..n {
                        if self.network.is_edge(u, v) {
                            self.moves(u, v, p, h, &mut constraints);
                        } else {
                            self.non_edge(u, v, p, h, &mut constraints);
                        }
                    }
                    if let Some(totality) = self.totality(u, p, h) {
                        constraints.push(totality);
                    }
                }
            }
        }

        Formula::and(constraints)
    }

    fn height_jumps(&self, u: usize, p: usize, h: usize, out: &mut Vec<Formula>) {
        for v in 0..self.num_nodes() {
            for h2 in self.scheme.heights() {
                if h2.abs_diff(h) > 1 {
                    out.push(Formula::nand2(self.x(u, p, h), self.x(v, p + 1, h2)));
                }
            }
        }
    }

    /// Heights reachable from `h` by an action of the given kind.
    fn next_height(&self, kind: ActionKind, h: usize) -> Option<usize> {
        match kind {
            ActionKind::Transmit => Some(h),
            ActionKind::Push => self.scheme.push_height(h),
            ActionKind::Pop => self.scheme.pop_height(h),
        }
    }

    fn non_edge(&self, u: usize, v: usize, p: usize, h: usize, out: &mut Vec<Formula>) {
        for kind in ActionKind::ALL {
            if let Some(h2) = self.next_height(kind, h) {
                out.push(Formula::nand2(self.x(u, p, h), self.x(v, p + 1, h2)));
            }
        }
    }

    /// Stack condition under which `action` may fire at `(p, h)`.
    fn action_condition(&self, action: Action, p: usize, h: usize) -> Formula {
        match action {
            Action::Transmit(s) => self.y(p, h, s),
            Action::Push { read, write } => Formula::and2(self.y(p, h, read), self.y(p + 1, h + 1, write)),
            Action::Pop { top, below } => Formula::and2(self.y(p, h, top), self.y(p, h - 1, below)),
        }
    }

    fn moves(&self, u: usize, v: usize, p: usize, h: usize, out: &mut Vec<Formula>) {
        for kind in ActionKind::ALL {
            let Some(h2) = self.next_height(kind, h) else {
                continue;
            };
            let transition = Formula::and2(self.x(u, p, h), self.x(v, p + 1, h2));
            let conditions: Vec<Formula> = self
                .network
                .actions_of_kind(u, kind)
                .map(|a| self.action_condition(a, p, h))
                .collect();
            if conditions.is_empty() {
                out.push(Formula::not(transition));
            } else {
                out.push(Formula::implies(transition, Formula::or(conditions)));
            }
        }
    }

    fn totality(&self, u: usize, p: usize, h: usize) -> Option<Formula> {
        let mut successors = Vec::new();
        for v in self.network.successors(u) {
            for kind in ActionKind::ALL {
                if !self.network.has_kind(u, kind) {
                    continue;
                }
                if let Some(h2) = self.next_height(kind, h) {
                    successors.push(self.x(v, p + 1, h2));
                }
            }
        }
        if successors.is_empty() {
            None
        } else {
            Some(Formula::implies(self.x(u, p, h), Formula::or(successors)))
        }
    }

    /// φ₄: if some node is at height `h` at position `p`, every cell `0..=h`
    /// holds exactly one of `A`, `B`.
    pub fn stack_well_defined(&self) -> Formula {
        let mut constraints = Vec::with_capacity((self.scheme.length + 1) * self.scheme.capacity);
        for p in self.scheme.positions() {
            for h in self.scheme.heights() {
                let occupied = Formula::or((0..self.num_nodes()).map(|n| self.x(n, p, h)));
                let cells = Formula::and(
                    (0..=h).map(|k| Formula::xor2(self.y(p, k, Symbol::A), self.y(p, k, Symbol::B))),
                );
                constraints.push(Formula::implies(occupied, cells));
            }
        }
        Formula::and(constraints)
    }

    /// φ₆: every legal move preserves the cells it does not touch.
    ///
    /// - transmit keeps cells `0..=h`;
    /// - push keeps cells `0..=h` and puts one of the declared write symbols in cell `h + 1`;
    /// - pop keeps cells `0..h`.
    pub fn stack_evolution(&self) -> Formula {
        let n = self.num_nodes();
        let mut constraints = Vec::with_capacity(self.scheme.length * self.network.num_edges() * self.scheme.capacity * 3);

        for p in self.scheme.transitions() {
            for u in 0..n {
                let writes: BTreeSet<Symbol> = self
                    .network
                    .actions_of_kind(u, ActionKind::Push)
                    .map(|a| a.resulting_top())
                    .collect();

                for v in self.network.successors(u) {
                    for h in self.scheme.heights() {
                        if self.network.has_kind(u, ActionKind::Transmit) {
                            let transition = Formula::and2(self.x(u, p, h), self.x(v, p + 1, h));
                            constraints.push(Formula::implies(transition, self.preserve(p, 0..h + 1)));
                        }

                        if let Some(h2) = self.scheme.push_height(h) {
                            if !writes.is_empty() {
                                let transition = Formula::and2(self.x(u, p, h), self.x(v, p + 1, h2));
                                let new_top = Formula::or(writes.iter().map(|&w| self.y(p + 1, h2, w)));
                                constraints.push(Formula::implies(
                                    transition,
                                    Formula::and([self.preserve(p, 0..h + 1), new_top]),
                                ));
                            }
                        }

                        if let Some(h2) = self.scheme.pop_height(h) {
                            if self.network.has_kind(u, ActionKind::Pop) {
                                let transition = Formula::and2(self.x(u, p, h), self.x(v, p + 1, h2));
                                constraints.push(Formula::implies(transition, self.preserve(p, 0..h)));
                            }
                        }
                    }
                }
            }
        }

        Formula::and(constraints)
    }

    /// φ₈: no `(node, height)` pair is occupied at two distinct positions.
    pub fn simple_path(&self) -> Formula {
        let positions: Vec<usize> = self.scheme.positions().collect();
        let mut constraints = Vec::new();
        for u in 0..self.num_nodes() {
            for h in self.scheme.heights() {
                for (idx, &i) in positions.iter().enumerate() {
                    for &j in &positions[idx + 1..] {
                        constraints.push(Formula::nand2(self.x(u, i, h), self.x(u, j, h)));
                    }
                }
            }
        }
        Formula::and(constraints)
    }
}
