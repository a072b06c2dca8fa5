//! Reduction of bounded path search to satisfiability, and the search loop
//! over increasing bounds.

use log::{debug, info};

use crate::atom::AtomRegistry;
use crate::bdd::BddSolver;
use crate::constraints::{ConstraintBuilder, Family};
use crate::decode::decode_with;
use crate::diagnostics::{Diagnostics, Silent};
use crate::error::Error;
use crate::formula::Formula;
use crate::network::Network;
use crate::path::Path;
use crate::scheme::Scheme;
use crate::solver::{Assignment, SolveResult, Solver};

/// The formula for one bound, together with the registry that names its atoms.
#[derive(Debug)]
pub struct Reduction {
    pub length: usize,
    pub formula: Formula,
    pub atoms: AtomRegistry,
}

impl Reduction {
    pub fn scheme(&self) -> Scheme {
        Scheme::new(self.length)
    }
}

/// Builds the conjunction of all constraint families for `length`.
pub fn reduce(network: &Network, length: usize) -> Reduction {
    reduce_with(network, length, &Silent)
}

pub fn reduce_with(network: &Network, length: usize, diagnostics: &dyn Diagnostics) -> Reduction {
    diagnostics.reduction_started(network, length);

    let scheme = Scheme::new(length);
    let atoms = AtomRegistry::with_capacity(scheme.num_state_atoms(network.num_nodes()) + scheme.num_symbol_atoms());
    let formula = {
        let builder = ConstraintBuilder::new(network, length, &atoms);
        let families: Vec<Formula> = Family::ALL
            .iter()
            .map(|&family| {
                let f = builder.family(family);
                diagnostics.family_built(family, &f);
                f
            })
            .collect();
        Formula::and(families)
    };

    diagnostics.reduction_finished(length, atoms.len(), &formula);
    Reduction { length, formula, atoms }
}

/// Bounds tried by the search loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SearchConfig {
    /// First bound tried.
    pub min_length: usize,
    /// Last bound tried (inclusive).
    pub max_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 10,
        }
    }
}

impl SearchConfig {
    pub fn up_to(max_length: usize) -> Self {
        Self {
            max_length,
            ..Self::default()
        }
    }
}

/// A path found at the smallest satisfiable bound.
#[derive(Debug)]
pub struct Solution {
    pub length: usize,
    pub path: Path,
    pub model: Assignment,
    pub reduction: Reduction,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Found(Solution),
    /// Every bound in the configured range is unsatisfiable.
    NotFound { max_length: usize },
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SearchOutcome::Found(s) => Some(s),
            SearchOutcome::NotFound { .. } => None,
        }
    }
}

/// Tries bounds `min_length..=max_length` in order and decodes the first model found.
///
/// Each bound gets a fresh reduction; the previous one is dropped before the next is built.
pub fn find_path<S>(
    network: &Network,
    config: &SearchConfig,
    solver: &mut S,
    diagnostics: &dyn Diagnostics,
) -> Result<SearchOutcome, Error>
where
    S: Solver + ?Sized,
{
    for length in config.min_length..=config.max_length {
        let reduction = reduce_with(network, length, diagnostics);
        let result = solver.solve(&reduction.formula, &reduction.atoms)?;
        diagnostics.oracle_answered(length, result.is_sat());
        match result {
            SolveResult::Unsat => {
                debug!("No path of length {}", length);
            }
            SolveResult::Sat(model) => {
                let path = decode_with(&model, &reduction.atoms, network, length, diagnostics)?;
                info!("Found path of length {}", length);
                return Ok(SearchOutcome::Found(Solution {
                    length,
                    path,
                    model,
                    reduction,
                }));
            }
        }
    }
    Ok(SearchOutcome::NotFound {
        max_length: config.max_length,
    })
}

/// Searches bounds `1..=max_length` with the BDD oracle.
pub fn search(network: &Network, max_length: usize) -> Result<SearchOutcome, Error> {
    let mut solver = BddSolver::default();
    find_path(network, &SearchConfig::up_to(max_length), &mut solver, &Silent)
}
