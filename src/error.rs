//! Error types.
//!
//! "No path up to the bound" is a normal outcome and is not represented here,
//! see [`SearchOutcome`][crate::reduction::SearchOutcome].

use std::fmt;
use std::io;

use crate::types::Action;

/// A network rejected before any formula is built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NetworkError {
    /// The network has no nodes.
    Empty,
    /// The initial node index is out of range.
    InitialOutOfRange { initial: usize, num_nodes: usize },
    /// The final node index is out of range.
    FinalOutOfRange { final_: usize, num_nodes: usize },
    /// An edge endpoint is out of range.
    EdgeOutOfRange { from: usize, to: usize, num_nodes: usize },
    /// A node index is out of range.
    NodeOutOfRange { node: usize, num_nodes: usize },
    /// Two nodes share the same name.
    DuplicateName(String),
    /// A name does not refer to any declared node.
    UnknownNode(String),
    /// The initial node was never set.
    MissingInitial,
    /// The final node was never set.
    MissingFinal,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Empty => write!(f, "network has no nodes"),
            NetworkError::InitialOutOfRange { initial, num_nodes } => {
                write!(f, "initial node {} out of range 0..{}", initial, num_nodes)
            }
            NetworkError::FinalOutOfRange { final_, num_nodes } => {
                write!(f, "final node {} out of range 0..{}", final_, num_nodes)
            }
            NetworkError::EdgeOutOfRange { from, to, num_nodes } => {
                write!(f, "edge {} -> {} out of range 0..{}", from, to, num_nodes)
            }
            NetworkError::NodeOutOfRange { node, num_nodes } => {
                write!(f, "node {} out of range 0..{}", node, num_nodes)
            }
            NetworkError::DuplicateName(name) => write!(f, "duplicate node name '{}'", name),
            NetworkError::UnknownNode(name) => write!(f, "unknown node '{}'", name),
            NetworkError::MissingInitial => write!(f, "initial node is not set"),
            NetworkError::MissingFinal => write!(f, "final node is not set"),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Error in a network description.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    /// A line that cannot be read.
    Syntax { line: usize, message: String },
    /// The description is well-formed but the network it describes is invalid.
    Network(NetworkError),
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// 1-based line number of a syntax error.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. } => Some(*line),
            ParseError::Network(_) => None,
        }
    }
}

impl From<NetworkError> for ParseError {
    fn from(e: NetworkError) -> Self {
        ParseError::Network(e)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { line, message } => write!(f, "parse error at line {}: {}", line, message),
            ParseError::Network(e) => write!(f, "invalid network: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Syntax { .. } => None,
            ParseError::Network(e) => Some(e),
        }
    }
}

/// An assignment that does not describe a path.
///
/// Raised only when the oracle returns a model violating the invariants the
/// constraints enforce, i.e. a bug in the constraint builder or in the oracle.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// No `(node, height)` pair is true at the position.
    NoState { position: usize },
    /// Several `(node, height)` pairs are true at the position.
    MultipleStates {
        position: usize,
        states: Vec<(usize, usize)>,
    },
    /// A used stack cell holds both symbols or none.
    IllDefinedCell { position: usize, height: usize },
    /// Consecutive heights differ by more than one.
    HeightJump {
        position: usize,
        from: usize,
        to: usize,
    },
    /// Consecutive nodes are not joined by an edge.
    MissingEdge {
        position: usize,
        from: usize,
        to: usize,
    },
    /// The inferred action is not enabled on the node it fires from.
    ActionNotEnabled {
        position: usize,
        node: usize,
        action: Action,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NoState { position } => {
                write!(f, "no state is true at position {}", position)
            }
            DecodeError::MultipleStates { position, states } => {
                write!(f, "several states are true at position {}: {:?}", position, states)
            }
            DecodeError::IllDefinedCell { position, height } => write!(
                f,
                "stack cell {} at position {} does not hold exactly one symbol",
                height, position
            ),
            DecodeError::HeightJump { position, from, to } => write!(
                f,
                "height jumps from {} to {} after position {}",
                from, to, position
            ),
            DecodeError::MissingEdge { position, from, to } => write!(
                f,
                "no edge {} -> {} for the step after position {}",
                from, to, position
            ),
            DecodeError::ActionNotEnabled {
                position,
                node,
                action,
            } => write!(
                f,
                "action {} inferred after position {} is not enabled on node {}",
                action, position, node
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Failure of the satisfiability oracle itself (not UNSAT).
#[derive(Debug)]
pub enum SolverError {
    Io(io::Error),
    /// The external solver produced output that could not be understood.
    Output(String),
    /// The external solver exited without reporting an answer.
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl From<io::Error> for SolverError {
    fn from(e: io::Error) -> Self {
        SolverError::Io(e)
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Io(e) => write!(f, "solver I/O error: {}", e),
            SolverError::Output(msg) => write!(f, "unexpected solver output: {}", msg),
            SolverError::Failed { command, status, stderr } => {
                write!(f, "solver '{}' failed", command)?;
                match status {
                    Some(code) => write!(f, " with exit code {}", code)?,
                    None => write!(f, " (terminated by signal)")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Io(e) => Some(e),
            SolverError::Output(_) | SolverError::Failed { .. } => None,
        }
    }
}

/// Crate-level error.
#[derive(Debug)]
pub enum Error {
    Network(NetworkError),
    Parse(ParseError),
    Decode(DecodeError),
    Solver(SolverError),
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Error::Network(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<SolverError> for Error {
    fn from(e: SolverError) -> Self {
        Error::Solver(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network(e) => write!(f, "invalid network: {}", e),
            Error::Parse(e) => write!(f, "{}", e),
            Error::Decode(e) => write!(f, "decoding inconsistency: {}", e),
            Error::Solver(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Network(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::Solver(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::from(NetworkError::InitialOutOfRange {
            initial: 5,
            num_nodes: 2,
        });
        assert_eq!(e.to_string(), "invalid network: initial node 5 out of range 0..2");

        let e = Error::from(DecodeError::NoState { position: 3 });
        assert_eq!(e.to_string(), "decoding inconsistency: no state is true at position 3");

        let e = ParseError::new(7, "unexpected token");
        assert_eq!(e.to_string(), "parse error at line 7: unexpected token");

        let e = SolverError::Failed {
            command: "kissat".to_string(),
            status: Some(1),
            stderr: "bad header".to_string(),
        };
        assert_eq!(e.to_string(), "solver 'kissat' failed with exit code 1: bad header");
    }

    #[test]
    fn test_source() {
        use std::error::Error as _;
        let e = Error::from(SolverError::Output("garbage".to_string()));
        assert!(e.source().is_some());
    }
}
