//! Tunnel networks.
//!
//! A [`Network`] is a directed graph over nodes `0..n` with a distinguished
//! initial and final node, where every node carries a set of enabled
//! [`Action`]s. Networks are immutable once built; use [`NetworkBuilder`]
//! to construct one.
//!
//! ```
//! use tunnel_rs::network::NetworkBuilder;
//! use tunnel_rs::types::{Action, Symbol};
//!
//! let mut builder = NetworkBuilder::new();
//! let s = builder.add_node("s");
//! let t = builder.add_node("t");
//! builder.add_action(s, Action::transmit(Symbol::A)).unwrap();
//! builder.add_edge(s, t).unwrap();
//! builder.set_initial(s);
//! builder.set_final(t);
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.num_nodes(), 2);
//! assert!(network.is_edge(s, t));
//! assert!(!network.is_edge(t, s));
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::error::NetworkError;
use crate::types::{Action, ActionKind};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Network {
    names: Vec<String>,
    successors: Vec<BTreeSet<usize>>,
    actions: Vec<BTreeSet<Action>>,
    initial: usize,
    final_: usize,
}

impl Network {
    pub fn num_nodes(&self) -> usize {
        self.names.len()
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn final_node(&self) -> usize {
        self.final_
    }

    pub fn is_edge(&self, u: usize, v: usize) -> bool {
        self.successors.get(u).is_some_and(|s| s.contains(&v))
    }

    /// Nodes reachable from `u` by one edge, in increasing order.
    pub fn successors(&self, u: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors[u].iter().copied()
    }

    /// All edges `(u, v)`, sorted.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(u, succ)| succ.iter().map(move |&v| (u, v)))
    }

    pub fn num_edges(&self) -> usize {
        self.successors.iter().map(|s| s.len()).sum()
    }

    /// The set of actions enabled on `node`.
    pub fn actions(&self, node: usize) -> &BTreeSet<Action> {
        &self.actions[node]
    }

    pub fn has_action(&self, node: usize, action: Action) -> bool {
        self.actions[node].contains(&action)
    }

    /// Enabled actions of `node` with the given kind.
    pub fn actions_of_kind(&self, node: usize, kind: ActionKind) -> impl Iterator<Item = Action> + '_ {
        self.actions[node].iter().copied().filter(move |a| a.kind() == kind)
    }

    /// Whether `node` enables at least one action of the given kind.
    pub fn has_kind(&self, node: usize, kind: ActionKind) -> bool {
        self.actions_of_kind(node, kind).next().is_some()
    }

    pub fn node_name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn node_by_name(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Incremental constructor for [`Network`].
#[derive(Debug, Default, Clone)]
pub struct NetworkBuilder {
    names: Vec<String>,
    index: HashMap<String, usize>,
    successors: Vec<BTreeSet<usize>>,
    actions: Vec<BTreeSet<Action>>,
    initial: Option<usize>,
    final_: Option<usize>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its index.
    ///
    /// Adding a name that already exists returns the existing node.
    pub fn add_node(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            return i;
        }
        let i = self.names.len();
        self.index.insert(name.clone(), i);
        self.names.push(name);
        self.successors.push(BTreeSet::new());
        self.actions.push(BTreeSet::new());
        i
    }

    /// Adds a fresh node, failing if the name is taken.
    pub fn add_new_node(&mut self, name: impl Into<String>) -> Result<usize, NetworkError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(NetworkError::DuplicateName(name));
        }
        Ok(self.add_node(name))
    }

    pub fn node(&self, name: &str) -> Result<usize, NetworkError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode(name.to_string()))
    }

    pub fn num_nodes(&self) -> usize {
        self.names.len()
    }

    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<&mut Self, NetworkError> {
        let n = self.names.len();
        if u >= n || v >= n {
            return Err(NetworkError::EdgeOutOfRange {
                from: u,
                to: v,
                num_nodes: n,
            });
        }
        self.successors[u].insert(v);
        Ok(self)
    }

    pub fn add_action(&mut self, node: usize, action: Action) -> Result<&mut Self, NetworkError> {
        let n = self.names.len();
        let actions = self
            .actions
            .get_mut(node)
            .ok_or(NetworkError::NodeOutOfRange { node, num_nodes: n })?;
        actions.insert(action);
        Ok(self)
    }

    pub fn set_initial(&mut self, node: usize) -> &mut Self {
        self.initial = Some(node);
        self
    }

    pub fn set_final(&mut self, node: usize) -> &mut Self {
        self.final_ = Some(node);
        self
    }

    /// Validates and freezes the network.
    pub fn build(self) -> Result<Network, NetworkError> {
        let num_nodes = self.names.len();
        if num_nodes == 0 {
            return Err(NetworkError::Empty);
        }
        let initial = self.initial.ok_or(NetworkError::MissingInitial)?;
        let final_ = self.final_.ok_or(NetworkError::MissingFinal)?;
        if initial >= num_nodes {
            return Err(NetworkError::InitialOutOfRange { initial, num_nodes });
        }
        if final_ >= num_nodes {
            return Err(NetworkError::FinalOutOfRange { final_, num_nodes });
        }
        log::debug!(
            "built network with {} nodes, {} edges",
            num_nodes,
            self.successors.iter().map(|s| s.len()).sum::<usize>()
        );
        Ok(Network {
            names: self.names,
            successors: self.successors,
            actions: self.actions,
            initial,
            final_,
        })
    }
}
