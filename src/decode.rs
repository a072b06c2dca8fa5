//! Decoding of satisfying assignments into paths.
//!
//! The decoder trusts nothing: every property the constraints are meant to
//! guarantee and that the decoder relies on is re-checked, and a violation is
//! reported as a [`DecodeError`] rather than silently patched up.

use crate::atom::{AtomKey, AtomRegistry};
use crate::diagnostics::{Diagnostics, Silent};
use crate::error::DecodeError;
use crate::network::Network;
use crate::path::{Path, PathStep};
use crate::scheme::Scheme;
use crate::solver::Model;
use crate::types::{Action, ActionKind, Symbol};

/// Decodes `model` into the path of `length` transitions it describes.
pub fn decode<M>(model: &M, atoms: &AtomRegistry, network: &Network, length: usize) -> Result<Path, DecodeError>
where
    M: Model + ?Sized,
{
    decode_with(model, atoms, network, length, &Silent)
}

/// Same as [`decode`], reporting every decoded state and step to `diagnostics`.
pub fn decode_with<M>(
    model: &M,
    atoms: &AtomRegistry,
    network: &Network,
    length: usize,
    diagnostics: &dyn Diagnostics,
) -> Result<Path, DecodeError>
where
    M: Model + ?Sized,
{
    let decoder = Decoder {
        model,
        atoms,
        network,
        scheme: Scheme::new(length),
    };

    let states = decoder.states()?;
    for (p, &(node, height)) in states.iter().enumerate() {
        diagnostics.state_decoded(p, node, height);
    }

    let mut steps = Vec::with_capacity(length);
    for (p, pair) in states.windows(2).enumerate() {
        let step = decoder.step(p, pair[0], pair[1])?;
        diagnostics.step_decoded(p, &step);
        steps.push(step);
    }
    Ok(Path::new(steps))
}

/// The unique `(node, height)` pair of every position `0..=length`.
pub fn decode_states<M>(
    model: &M,
    atoms: &AtomRegistry,
    network: &Network,
    length: usize,
) -> Result<Vec<(usize, usize)>, DecodeError>
where
    M: Model + ?Sized,
{
    Decoder {
        model,
        atoms,
        network,
        scheme: Scheme::new(length),
    }
    .states()
}

struct Decoder<'a, M: ?Sized> {
    model: &'a M,
    atoms: &'a AtomRegistry,
    network: &'a Network,
    scheme: Scheme,
}

impl<M: Model + ?Sized> Decoder<'_, M> {
    fn is_true(&self, key: AtomKey) -> bool {
        self.model.value_of_key(self.atoms, key)
    }

    fn state_at(&self, position: usize) -> Result<(usize, usize), DecodeError> {
        let mut found = Vec::new();
        for node in 0..self.network.num_nodes() {
            for height in self.scheme.heights() {
                if self.is_true(AtomKey::state(node, position, height)) {
                    found.push((node, height));
                }
            }
        }
        match found.len() {
            0 => Err(DecodeError::NoState { position }),
            1 => Ok(found[0]),
            _ => Err(DecodeError::MultipleStates {
                position,
                states: found,
            }),
        }
    }

    fn states(&self) -> Result<Vec<(usize, usize)>, DecodeError> {
        self.scheme.positions().map(|p| self.state_at(p)).collect()
    }

    /// The symbol held by stack cell `height` at `position`.
    fn cell(&self, position: usize, height: usize) -> Result<Symbol, DecodeError> {
        let a = self.is_true(AtomKey::symbol(position, height, Symbol::A));
        let b = self.is_true(AtomKey::symbol(position, height, Symbol::B));
        match (a, b) {
            (true, false) => Ok(Symbol::A),
            (false, true) => Ok(Symbol::B),
            _ => Err(DecodeError::IllDefinedCell { position, height }),
        }
    }

    fn step(&self, p: usize, (u, h): (usize, usize), (v, h2): (usize, usize)) -> Result<PathStep, DecodeError> {
        let delta = h2 as isize - h as isize;
        let kind = ActionKind::from_delta(delta).ok_or(DecodeError::HeightJump {
            position: p,
            from: h,
            to: h2,
        })?;
        if !self.network.is_edge(u, v) {
            return Err(DecodeError::MissingEdge {
                position: p,
                from: u,
                to: v,
            });
        }

        let action = match kind {
            ActionKind::Transmit => Action::transmit(self.cell(p, h)?),
            ActionKind::Push => Action::push(self.cell(p, h)?, self.cell(p + 1, h2)?),
            ActionKind::Pop => Action::pop(self.cell(p, h)?, self.cell(p, h2)?),
        };
        if !self.network.has_action(u, action) {
            return Err(DecodeError::ActionNotEnabled {
                position: p,
                node: u,
                action,
            });
        }
        Ok(PathStep::new(action, u, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::network::NetworkBuilder;
    use crate::solver::Assignment;

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

    fn push_pop_model(atoms: &AtomRegistry) -> Assignment {
        [
            atoms.state(0, 0, 0),
            atoms.state(1, 1, 1),
            atoms.state(2, 2, 0),
            atoms.symbol(0, 0, Symbol::A),
            atoms.symbol(1, 0, Symbol::A),
            atoms.symbol(1, 1, Symbol::B),
            atoms.symbol(2, 0, Symbol::A),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_decode_push_pop() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let model = push_pop_model(&atoms);
        let path = decode(&model, &atoms, &net, 2).unwrap();
        assert_eq!(
            path.steps(),
            &[
                PathStep::new(Action::push(Symbol::A, Symbol::B), 0, 1),
                PathStep::new(Action::pop(Symbol::B, Symbol::A), 1, 2),
            ]
        );
        assert_eq!(decode_states(&model, &atoms, &net, 2).unwrap(), vec![(0, 0), (1, 1), (2, 0)]);
    }

    #[test]
    fn test_decode_no_state() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let mut model = push_pop_model(&atoms);
        model.set(atoms.state(1, 1, 1), false);
        assert_eq!(
            decode(&model, &atoms, &net, 2),
            Err(DecodeError::NoState { position: 1 })
        );
    }

    #[test]
    fn test_decode_multiple_states() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let mut model = push_pop_model(&atoms);
        model.set(atoms.state(2, 1, 0), true);
        assert_eq!(
            decode(&model, &atoms, &net, 2),
            Err(DecodeError::MultipleStates {
                position: 1,
                states: vec![(1, 1), (2, 0)],
            })
        );
    }

    #[test]
    fn test_decode_ill_defined_cell() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let mut model = push_pop_model(&atoms);
        model.set(atoms.symbol(1, 1, Symbol::A), true);
        assert_eq!(
            decode(&model, &atoms, &net, 2),
            Err(DecodeError::IllDefinedCell { position: 1, height: 1 })
        );
    }

    #[test]
    fn test_decode_wrong_variant() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let mut model = push_pop_model(&atoms);
        // The model claims push(A,A), which s does not enable.
        model.set(atoms.symbol(1, 1, Symbol::B), false);
        model.set(atoms.symbol(1, 1, Symbol::A), true);
        assert_eq!(
            decode(&model, &atoms, &net, 2),
            Err(DecodeError::ActionNotEnabled {
                position: 0,
                node: 0,
                action: Action::push(Symbol::A, Symbol::A),
            })
        );
    }

    #[test]
    fn test_decode_missing_edge() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let model: Assignment = [atoms.state(0, 0, 0), atoms.state(2, 1, 0), atoms.symbol(0, 0, Symbol::A)]
            .into_iter()
            .collect();
        assert_eq!(
            decode(&model, &atoms, &net, 1),
            Err(DecodeError::MissingEdge {
                position: 0,
                from: 0,
                to: 2,
            })
        );
    }

    #[test]
    fn test_decode_height_jump() {
        let net = push_pop();
        let atoms = AtomRegistry::new();
        let model: Assignment = [atoms.state(0, 0, 2), atoms.state(1, 1, 0)].into_iter().collect();
        assert_eq!(
            decode(&model, &atoms, &net, 4),
            Err(DecodeError::NoState { position: 2 })
        );
        let model: Assignment = [
            atoms.state(0, 0, 2),
            atoms.state(1, 1, 0),
            atoms.state(2, 2, 0),
            atoms.state(0, 3, 0),
            atoms.state(1, 4, 0),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            decode(&model, &atoms, &net, 4),
            Err(DecodeError::HeightJump {
                position: 0,
                from: 2,
                to: 0,
            })
        );
    }
}
