//! Line-oriented text format for networks.
//!
//! ```text
//! # comment
//! node s push(A,B)
//! node m pop(B,A)
//! node t
//! edge s m
//! edge m t
//! initial s
//! final t
//! ```
//!
//! Nodes are numbered in order of first mention; an `edge` line declares
//! its endpoints implicitly. A node may be declared by several `node` lines,
//! the actions accumulate. `initial` and `final` are resolved once the whole
//! input is read, so they may name a node mentioned further down.

use std::str::FromStr;

use crate::error::ParseError;
use crate::network::{Network, NetworkBuilder};
use crate::types::Action;

/// Reads a network from its textual description.
pub fn parse_network(input: &str) -> Result<Network, ParseError> {
    let mut builder = NetworkBuilder::new();
    let mut initial = None;
    let mut final_ = None;

    for (i, raw) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = match raw.split_once('#') {
            Some((content, _)) => content,
            None => raw,
        };
        let tokens = tokenize(line);
        let Some((keyword, args)) = tokens.split_first() else {
            continue;
        };
        let err = |message: String| ParseError::new(line_no, message);

        match keyword.to_ascii_lowercase().as_str() {
            "node" => {
                let (name, actions) = args
                    .split_first()
                    .ok_or_else(|| err("'node' needs a name".to_string()))?;
                let node = builder.add_node(name.as_str());
                for token in actions {
                    let action = Action::from_str(token).map_err(|e| err(e.to_string()))?;
                    builder.add_action(node, action).map_err(|e| err(e.to_string()))?;
                }
            }
            "edge" => {
                let [from, to] = args else {
                    return Err(err("'edge' needs exactly two node names".to_string()));
                };
                let u = builder.add_node(from.as_str());
                let v = builder.add_node(to.as_str());
                builder.add_edge(u, v).map_err(|e| err(e.to_string()))?;
            }
            "initial" | "final" => {
                let [name] = args else {
                    return Err(err(format!("'{}' needs exactly one node name", keyword)));
                };
                let slot = if keyword.eq_ignore_ascii_case("initial") {
                    &mut initial
                } else {
                    &mut final_
                };
                *slot = Some((line_no, name.clone()));
            }
            other => return Err(err(format!("unknown keyword '{}'", other))),
        }
    }

    if let Some((line_no, name)) = initial {
        let node = builder.node(&name).map_err(|e| ParseError::new(line_no, e.to_string()))?;
        builder.set_initial(node);
    }
    if let Some((line_no, name)) = final_ {
        let node = builder.node(&name).map_err(|e| ParseError::new(line_no, e.to_string()))?;
        builder.set_final(node);
    }

    Ok(builder.build()?)
}

/// Splits a line on whitespace, keeping parenthesised groups together so
/// that `push(A, B)` is one token.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in line.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() => {}
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

impl FromStr for Network {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_network(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::NetworkError;
    use crate::types::Symbol;

    #[test]
    fn test_parse() {
        let input = "
            # push then pop
            node s push(A, B)
            node m POP(B,A)
            edge s m
            edge m t   # t is declared here
            initial s
            final t
        ";
        let net = parse_network(input).unwrap();
        assert_eq!(net.num_nodes(), 3);
        assert_eq!(net.node_by_name("t"), Some(2));
        assert_eq!(net.initial(), 0);
        assert_eq!(net.final_node(), 2);
        assert!(net.is_edge(0, 1));
        assert!(net.is_edge(1, 2));
        assert!(net.has_action(0, Action::push(Symbol::A, Symbol::B)));
        assert!(net.has_action(1, Action::pop(Symbol::B, Symbol::A)));
        assert!(net.actions(2).is_empty());
    }

    #[test]
    fn test_actions_accumulate() {
        let input = "node s transmit(A)\nnode s transmit(B)\ninitial s\nfinal s\n";
        let net: Network = input.parse().unwrap();
        assert_eq!(net.num_nodes(), 1);
        assert_eq!(net.actions(0).len(), 2);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("node s push( A , B )  pop(B,A)"), vec!["node", "s", "push(A,B)", "pop(B,A)"]);
    }

    #[test]
    fn test_endpoints_before_nodes() {
        let input = "initial s\nfinal t\nnode s push(A,B)\nedge s t\n";
        let net = parse_network(input).unwrap();
        assert_eq!(net.initial(), net.node_by_name("s").unwrap());
        assert_eq!(net.final_node(), net.node_by_name("t").unwrap());
    }

    #[test]
    fn test_errors() {
        let e = parse_network("node s\nfrobnicate s\n").unwrap_err();
        assert_eq!(e.line(), Some(2));

        let e = parse_network("node s jump(A)\n").unwrap_err();
        assert_eq!(e.line(), Some(1));

        let e = parse_network("edge s\n").unwrap_err();
        assert_eq!(e.line(), Some(1));

        let e = parse_network("node s\ninitial t\nfinal s\n").unwrap_err();
        assert_eq!(e, ParseError::new(2, "unknown node 't'"));

        let e = parse_network("node s\ninitial s\n").unwrap_err();
        assert_eq!(e, ParseError::Network(NetworkError::MissingFinal));
        assert_eq!(e.line(), None);
        assert_eq!(e.to_string(), "invalid network: final node is not set");

        assert_eq!(parse_network("").unwrap_err(), ParseError::Network(NetworkError::Empty));
    }
}
