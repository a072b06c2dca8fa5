//! Human-readable dump of a model, position by position.
//!
//! Intended for inspection only: unlike [`decode`][crate::decode::decode],
//! the dump never fails and prints warnings for whatever it cannot make
//! sense of.

use std::fmt;

use crate::atom::{AtomKey, AtomRegistry};
use crate::network::Network;
use crate::scheme::Scheme;
use crate::solver::Model;
use crate::types::Symbol;

/// What the model says about one position.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PositionInfo {
    pub position: usize,
    /// All `(node, height)` pairs that are true.
    pub states: Vec<(usize, usize)>,
    /// Content of every cell: `None` when the cell holds both symbols or none.
    pub cells: Vec<Option<Symbol>>,
}

impl PositionInfo {
    /// The state, if exactly one is true.
    pub fn state(&self) -> Option<(usize, usize)> {
        match self.states.as_slice() {
            &[state] => Some(state),
            _ => None,
        }
    }

    /// Cells that are part of the stack at this position.
    fn used_cells(&self) -> &[Option<Symbol>] {
        match self.state() {
            Some((_, h)) => &self.cells[..(h + 1).min(self.cells.len())],
            None => {
                let last = self.cells.iter().rposition(|c| c.is_some()).map_or(0, |i| i + 1);
                &self.cells[..last]
            }
        }
    }
}

/// Dump of a whole model.
pub struct ModelDump<'a> {
    network: &'a Network,
    pub positions: Vec<PositionInfo>,
}

impl<'a> ModelDump<'a> {
    pub fn new<M>(model: &M, atoms: &AtomRegistry, network: &'a Network, length: usize) -> Self
    where
        M: Model + ?Sized,
    {
        let scheme = Scheme::new(length);
        let positions = scheme
            .positions()
            .map(|p| {
                let states = (0..network.num_nodes())
                    .flat_map(|n| scheme.heights().map(move |h| (n, h)))
                    .filter(|&(n, h)| model.value_of_key(atoms, AtomKey::state(n, p, h)))
                    .collect();
                let cells = scheme
                    .heights()
                    .map(|h| {
                        let a = model.value_of_key(atoms, AtomKey::symbol(p, h, Symbol::A));
                        let b = model.value_of_key(atoms, AtomKey::symbol(p, h, Symbol::B));
                        match (a, b) {
                            (true, false) => Some(Symbol::A),
                            (false, true) => Some(Symbol::B),
                            _ => None,
                        }
                    })
                    .collect();
                PositionInfo {
                    position: p,
                    states,
                    cells,
                }
            })
            .collect();
        Self { network, positions }
    }

    /// Whether the dump found anything to warn about.
    pub fn has_warnings(&self) -> bool {
        self.positions
            .iter()
            .any(|info| info.state().is_none() || info.used_cells().iter().any(|c| c.is_none()))
    }
}

impl fmt::Display for ModelDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for info in &self.positions {
            writeln!(f, "At pos {}:", info.position)?;
            match info.states.as_slice() {
                [] => writeln!(f, "  warning: no state")?,
                &[(node, h)] => writeln!(f, "  State: {} (height {})", self.network.node_name(node), h)?,
                states => {
                    let names: Vec<String> = states
                        .iter()
                        .map(|&(n, h)| format!("{}@{}", self.network.node_name(n), h))
                        .collect();
                    writeln!(f, "  warning: several states: {}", names.join(", "))?;
                }
            }

            write!(f, "  Stack: |")?;
            for cell in info.used_cells() {
                match cell {
                    Some(s) => write!(f, "{}|", s)?,
                    None => write!(f, "?|")?,
                }
            }
            writeln!(f)?;
            for (h, _) in info.used_cells().iter().enumerate().filter(|(_, c)| c.is_none()) {
                writeln!(f, "  warning: stack cell {} is ill-defined", h)?;
            }
        }
        Ok(())
    }
}
