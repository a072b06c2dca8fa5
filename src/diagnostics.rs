//! Observation hooks for the reduction pipeline.
//!
//! The reduction, the search loop and the decoder report their progress
//! through a [`Diagnostics`] implementation instead of printing. [`Silent`]
//! ignores everything; [`LogDiagnostics`] forwards to the `log` facade.

use log::{debug, info, trace};

use crate::constraints::Family;
use crate::formula::Formula;
use crate::network::Network;
use crate::path::PathStep;

pub trait Diagnostics {
    fn reduction_started(&self, _network: &Network, _length: usize) {}
    fn family_built(&self, _family: Family, _formula: &Formula) {}
    fn reduction_finished(&self, _length: usize, _num_atoms: usize, _formula: &Formula) {}
    fn oracle_answered(&self, _length: usize, _sat: bool) {}
    fn state_decoded(&self, _position: usize, _node: usize, _height: usize) {}
    fn step_decoded(&self, _position: usize, _step: &PathStep) {}
}

/// Discards every event.
#[derive(Debug, Default, Copy, Clone)]
pub struct Silent;

impl Diagnostics for Silent {}

/// Reports events through the `log` macros.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn reduction_started(&self, network: &Network, length: usize) {
        debug!(
            "Reducing network with {} nodes and {} edges for length {}",
            network.num_nodes(),
            network.num_edges(),
            length
        );
        for (u, v) in network.edges() {
            trace!("  edge {} -> {}", network.node_name(u), network.node_name(v));
        }
        for u in 0..network.num_nodes() {
            let actions: Vec<String> = network.actions(u).iter().map(|a| a.to_string()).collect();
            trace!("  node {}: {}", network.node_name(u), actions.join(", "));
        }
    }

    fn family_built(&self, family: Family, formula: &Formula) {
        debug!("Built {} with {} conjuncts", family, formula.conjuncts().len());
    }

    fn reduction_finished(&self, length: usize, num_atoms: usize, formula: &Formula) {
        debug!(
            "Reduction for length {}: {} atoms, formula size {}",
            length,
            num_atoms,
            formula.size()
        );
    }

    fn oracle_answered(&self, length: usize, sat: bool) {
        info!(
            "Length {}: {}",
            length,
            if sat { "SAT" } else { "UNSAT" }
        );
    }

    fn state_decoded(&self, position: usize, node: usize, height: usize) {
        trace!("At pos {}: node {} height {}", position, node, height);
    }

    fn step_decoded(&self, position: usize, step: &PathStep) {
        debug!("Step {}: {} -({})-> {}", position, step.from, step.action, step.to);
    }
}
