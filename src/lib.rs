//! # tunnel-rs: simple paths in tunnel networks via SAT
//!
//! A **tunnel network** is a directed graph whose nodes carry stack actions over
//! the alphabet `{A, B}`: *transmit* keeps the stack, *push* adds a symbol,
//! *pop* removes one. A path is valid when every step is enabled on the node it
//! leaves, the stack top matches the action, and the path starts and ends with
//! the bare bottom symbol `A`. A path is *simple* when it never visits the same
//! `(node, stack height)` state twice.
//!
//! **`tunnel-rs`** decides whether a simple valid path from the initial to the
//! final node exists by reducing the bounded question "is there one with exactly
//! `L` steps?" to propositional satisfiability, for `L = 1, 2, …` up to a cap.
//! A satisfying assignment is decoded back into the sequence of steps.
//!
//! ## Basic Usage
//!
//! ```rust
//! use tunnel_rs::parse::parse_network;
//! use tunnel_rs::reduction::{search, SearchOutcome};
//!
//! let network = parse_network(
//!     "node s push(A,B)
//!      node m pop(B,A)
//!      edge s m
//!      edge m t
//!      initial s
//!      final t",
//! )
//! .unwrap();
//!
//! match search(&network, 10).unwrap() {
//!     SearchOutcome::Found(solution) => {
//!         assert_eq!(solution.length, 2);
//!         assert_eq!(solution.path.display(&network).to_string(), "s -(A↑AB)-> m -(AB↓A)-> t");
//!     }
//!     SearchOutcome::NotFound { .. } => unreachable!(),
//! }
//! ```
//!
//! ## Core Components
//!
//! - **[`network`]**, **[`types`]**, **[`parse`]**: the input model and its text format.
//! - **[`atom`]**, **[`scheme`]**: propositional variables `x[node, pos, h]` and `y[pos, h, S]`.
//! - **[`constraints`]**: the constraint families characterizing valid bounded paths.
//! - **[`reduction`]**: one formula per bound, and the search loop over bounds.
//! - **[`solver`]**, **[`bdd`]**, **[`cnf`]**: the satisfiability oracle interface and two oracles.
//! - **[`decode`]**, **[`path`]**, **[`debug`]**: from models back to paths and dumps.

pub mod atom;
pub mod bdd;
pub mod cache;
pub mod cnf;
pub mod constraints;
pub mod debug;
pub mod decode;
pub mod diagnostics;
pub mod dot;
pub mod error;
pub mod formula;
pub mod network;
pub mod parse;
pub mod path;
pub mod reduction;
pub mod reference;
pub mod scheme;
pub mod solver;
pub mod types;
pub mod utils;
