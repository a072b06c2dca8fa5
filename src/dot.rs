//! Network to DOT (Graphviz) conversion.
//!
//! - Every node is labelled with its name and its enabled actions.
//! - The initial node uses [`DotConfig::initial_shape`], the final node
//!   [`DotConfig::final_shape`].
//! - When a path is given, its edges are highlighted and labelled with the
//!   action taken.
//!
//! ```
//! use tunnel_rs::parse::parse_network;
//!
//! let network = parse_network("node s transmit(A)\nedge s t\ninitial s\nfinal t\n").unwrap();
//! let dot = network.to_dot().unwrap();
//! assert!(dot.starts_with("digraph {"));
//! // Render with: dot -Tpng network.dot -o network.png
//! ```

use std::collections::HashMap;

use crate::network::Network;
use crate::path::Path;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for ordinary nodes (default: "circle")
    pub node_shape: &'static str,
    /// Shape for the initial node (default: "box")
    pub initial_shape: &'static str,
    /// Shape for the final node (default: "doublecircle")
    pub final_shape: &'static str,
    /// Color of edges taken by the highlighted path (default: "red")
    pub path_color: &'static str,
    /// Whether to list enabled actions under the node name (default: true)
    pub show_actions: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            initial_shape: "box",
            final_shape: "doublecircle",
            path_color: "red",
            show_actions: true,
        }
    }
}

impl Network {
    /// Converts the network to DOT format.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(None, &DotConfig::default())
    }

    /// Converts the network to DOT format, highlighting `path` if given.
    pub fn to_dot_with_config(&self, path: Option<&Path>, config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        // Edge -> labels of the path steps taking it.
        let mut taken = HashMap::<(usize, usize), Vec<String>>::new();
        if let Some(path) = path {
            for (i, step) in path.iter().enumerate() {
                taken
                    .entry((step.from, step.to))
                    .or_default()
                    .push(format!("{}: {}", i + 1, step.action));
            }
        }

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        for u in 0..self.num_nodes() {
            let shape = if u == self.initial() {
                config.initial_shape
            } else if u == self.final_node() {
                config.final_shape
            } else {
                config.node_shape
            };
            let mut label = escape(self.node_name(u));
            if config.show_actions && !self.actions(u).is_empty() {
                let actions: Vec<String> = self.actions(u).iter().map(|a| a.to_string()).collect();
                label.push_str("\\n");
                label.push_str(&actions.join(" "));
            }
            let peripheries = if u == self.initial() { ", peripheries=2" } else { "" };
            writeln!(dot, "{} [shape={}, label=\"{}\"{}];", u, shape, label, peripheries)?;
        }

        for (u, v) in self.edges() {
            match taken.get(&(u, v)) {
                Some(labels) => writeln!(
                    dot,
                    "{} -> {} [color={}, penwidth=2, label=\"{}\"];",
                    u,
                    v,
                    config.path_color,
                    labels.join(", ")
                )?,
                None => writeln!(dot, "{} -> {};", u, v)?,
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::network::NetworkBuilder;
    use crate::path::PathStep;
    use crate::types::{Action, Symbol};

    fn network() -> Network {
        let mut b = NetworkBuilder::new();
        let s = b.add_node("s");
        let t = b.add_node("t\"q");
        b.add_edge(s, t).unwrap();
        b.add_edge(t, s).unwrap();
        b.add_action(s, Action::transmit(Symbol::A)).unwrap();
        b.set_initial(s).set_final(t);
        b.build().unwrap()
    }

    #[test]
    fn test_to_dot_basic() {
        let dot = network().to_dot().unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("0 [shape=box, label=\"s\\nA→A\", peripheries=2];"));
        assert!(dot.contains("1 [shape=doublecircle, label=\"t\\\"q\"];"));
        assert!(dot.contains("0 -> 1;"));
        assert!(dot.contains("1 -> 0;"));
    }

    #[test]
    fn test_to_dot_with_path() {
        let net = network();
        let path = Path::new(vec![PathStep::new(Action::transmit(Symbol::A), 0, 1)]);
        let config = DotConfig {
            show_actions: false,
            ..DotConfig::default()
        };
        let dot = net.to_dot_with_config(Some(&path), &config).unwrap();
        assert!(dot.contains("0 -> 1 [color=red, penwidth=2, label=\"1: A→A\"];"));
        assert!(dot.contains("1 -> 0;"));
        assert!(dot.contains("label=\"s\", peripheries=2"));
    }
}
