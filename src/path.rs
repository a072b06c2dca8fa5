//! Decoded paths.

use std::collections::HashSet;
use std::fmt;

use crate::network::Network;
use crate::types::{Action, Symbol};

/// One transition between consecutive positions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PathStep {
    pub action: Action,
    pub from: usize,
    pub to: usize,
}

impl PathStep {
    pub fn new(action: Action, from: usize, to: usize) -> Self {
        Self { action, from, to }
    }
}

/// An ordered sequence of [`PathStep`]s.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathStep> {
        self.steps.iter()
    }

    /// Visited nodes, including the start node.
    pub fn nodes(&self) -> Vec<usize> {
        let mut nodes = Vec::with_capacity(self.steps.len() + 1);
        if let Some(first) = self.steps.first() {
            nodes.push(first.from);
        }
        nodes.extend(self.steps.iter().map(|s| s.to));
        nodes
    }

    /// Renders the path with node names, e.g. `s -(A↑AB)-> m -(AB↓A)-> t`.
    pub fn display<'a>(&'a self, network: &'a Network) -> DisplayPath<'a> {
        DisplayPath { path: self, network }
    }

    /// Executes the path on `network` starting from `(initial, [A])`.
    ///
    /// Checks edges, enabled actions, stack tops, that no `(node, height)`
    /// state is visited twice, and that the run ends at `(final, [A])`.
    /// Returns the sequence of stack contents, one per position.
    pub fn replay(&self, network: &Network) -> Result<Vec<Vec<Symbol>>, ReplayError> {
        let mut node = network.initial();
        let mut stack = vec![Symbol::A];
        let mut visited = HashSet::new();
        visited.insert((node, 0));
        let mut trace = vec![stack.clone()];

        for (i, step) in self.steps.iter().enumerate() {
            if step.from != node {
                return Err(ReplayError::Disconnected { step: i });
            }
            if !network.is_edge(step.from, step.to) {
                return Err(ReplayError::MissingEdge { step: i });
            }
            if !network.has_action(step.from, step.action) {
                return Err(ReplayError::ActionNotEnabled { step: i });
            }
            let top = stack.last().copied();
            if top != Some(step.action.required_top()) {
                return Err(ReplayError::WrongTop { step: i });
            }
            match step.action {
                Action::Transmit(_) => {}
                Action::Push { write, .. } => stack.push(write),
                Action::Pop { below, .. } => {
                    if stack.len() < 2 {
                        return Err(ReplayError::WrongTop { step: i });
                    }
                    stack.pop();
                    if stack.last() != Some(&below) {
                        return Err(ReplayError::WrongTop { step: i });
                    }
                }
            }
            node = step.to;
            if !visited.insert((node, stack.len() - 1)) {
                return Err(ReplayError::Revisit { step: i });
            }
            trace.push(stack.clone());
        }

        if node != network.final_node() || stack.len() != 1 {
            return Err(ReplayError::WrongEnd);
        }
        Ok(trace)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Why a path cannot be executed on a network.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReplayError {
    /// The step does not start where the previous one ended.
    Disconnected { step: usize },
    MissingEdge { step: usize },
    ActionNotEnabled { step: usize },
    /// The stack top does not match the action.
    WrongTop { step: usize },
    /// A `(node, height)` state is visited twice.
    Revisit { step: usize },
    /// The run does not end at the final node with height 0.
    WrongEnd,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Disconnected { step } => write!(f, "step {} is disconnected", step),
            ReplayError::MissingEdge { step } => write!(f, "step {} follows a missing edge", step),
            ReplayError::ActionNotEnabled { step } => write!(f, "step {} uses a disabled action", step),
            ReplayError::WrongTop { step } => write!(f, "step {} does not match the stack", step),
            ReplayError::Revisit { step } => write!(f, "step {} revisits a state", step),
            ReplayError::WrongEnd => write!(f, "path does not end at the final node with an empty stack"),
        }
    }
}

impl std::error::Error for ReplayError {}

pub struct DisplayPath<'a> {
    path: &'a Path,
    network: &'a Network,
}

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut steps = self.path.steps.iter();
        let Some(first) = steps.next() else {
            return write!(f, "{}", self.network.node_name(self.network.initial()));
        };
        write!(
            f,
            "{} -({})-> {}",
            self.network.node_name(first.from),
            first.action,
            self.network.node_name(first.to)
        )?;
        for step in steps {
            write!(f, " -({})-> {}", step.action, self.network.node_name(step.to))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::network::NetworkBuilder;

    fn push_pop() -> Network {
        let mut b = NetworkBuilder::new();
        let s = b.add_node("s");
        let m = b.add_node("m");
        let t = b.add_node("t");
        b.add_edge(s, m).unwrap();
        b.add_edge(m, t).unwrap();
        b.add_action(s, Action::push(Symbol::A, Symbol::B)).unwrap();
        b.add_action(m, Action::pop(Symbol::B, Symbol::A)).unwrap();
        b.set_initial(s).set_final(t);
        b.build().unwrap()
    }

    fn push_pop_path() -> Path {
        Path::new(vec![
            PathStep::new(Action::push(Symbol::A, Symbol::B), 0, 1),
            PathStep::new(Action::pop(Symbol::B, Symbol::A), 1, 2),
        ])
    }

    #[test]
    fn test_display() {
        let net = push_pop();
        let path = push_pop_path();
        assert_eq!(path.display(&net).to_string(), "s -(A↑AB)-> m -(AB↓A)-> t");
        assert_eq!(path.nodes(), vec![0, 1, 2]);
        assert_eq!(Path::default().display(&net).to_string(), "s");
    }

    #[test]
    fn test_replay() {
        let net = push_pop();
        let trace = push_pop_path().replay(&net).unwrap();
        assert_eq!(
            trace,
            vec![vec![Symbol::A], vec![Symbol::A, Symbol::B], vec![Symbol::A]]
        );
    }

    #[test]
    fn test_replay_rejects() {
        let net = push_pop();

        let path = Path::new(vec![PathStep::new(Action::push(Symbol::A, Symbol::B), 0, 1)]);
        assert_eq!(path.replay(&net), Err(ReplayError::WrongEnd));

        let path = Path::new(vec![PathStep::new(Action::transmit(Symbol::A), 0, 1)]);
        assert_eq!(path.replay(&net), Err(ReplayError::ActionNotEnabled { step: 0 }));

        let path = Path::new(vec![PathStep::new(Action::push(Symbol::A, Symbol::B), 0, 2)]);
        assert_eq!(path.replay(&net), Err(ReplayError::MissingEdge { step: 0 }));

        let path = Path::new(vec![
            PathStep::new(Action::push(Symbol::A, Symbol::B), 0, 1),
            PathStep::new(Action::pop(Symbol::B, Symbol::A), 0, 2),
        ]);
        assert_eq!(path.replay(&net), Err(ReplayError::Disconnected { step: 1 }));
    }
}
