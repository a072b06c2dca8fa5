//! Variable addressing for a reduction of bound `length`.
//!
//! Two atom families are used:
//!
//! - `x[node, pos, h]`: the path is at `node` with stack height `h` at position `pos`,
//!   for `pos ∈ 0..=length`, `h ∈ 0..capacity`;
//! - `y[pos, h, S]`: at position `pos`, stack cell `h` holds symbol `S`.
//!
//! A path of length `L` starts and ends at height 0, so it pushes at most
//! `L/2` times. Hence `L/2 + 1` cells always suffice.

use std::ops::{Range, RangeInclusive};

/// Number of stack cells needed for paths of the given length.
pub fn stack_capacity(length: usize) -> usize {
    length / 2 + 1
}

/// Geometry of a reduction: bound and derived stack capacity.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Scheme {
    pub length: usize,
    pub capacity: usize,
}

impl Scheme {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            capacity: stack_capacity(length),
        }
    }

    /// All path positions `0..=length`.
    pub fn positions(&self) -> RangeInclusive<usize> {
        0..=self.length
    }

    /// Positions that have a successor, `0..length`.
    pub fn transitions(&self) -> Range<usize> {
        0..self.length
    }

    /// Valid stack heights `0..capacity`.
    pub fn heights(&self) -> Range<usize> {
        0..self.capacity
    }

    pub fn is_valid_height(&self, h: usize) -> bool {
        h < self.capacity
    }

    /// Height after a push from `h`, if it stays in range.
    pub fn push_height(&self, h: usize) -> Option<usize> {
        Some(h + 1).filter(|&h| self.is_valid_height(h))
    }

    /// Height after a pop from `h`, if the stack is not at its bottom.
    pub fn pop_height(&self, h: usize) -> Option<usize> {
        h.checked_sub(1)
    }

    /// Upper bound on the number of state atoms.
    pub fn num_state_atoms(&self, num_nodes: usize) -> usize {
        (self.length + 1) * num_nodes * self.capacity
    }

    /// Upper bound on the number of stack-cell atoms.
    pub fn num_symbol_atoms(&self) -> usize {
        (self.length + 1) * self.capacity * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_capacity() {
        assert_eq!(stack_capacity(0), 1);
        assert_eq!(stack_capacity(1), 1);
        assert_eq!(stack_capacity(2), 2);
        assert_eq!(stack_capacity(3), 2);
        assert_eq!(stack_capacity(4), 3);
        assert_eq!(stack_capacity(9), 5);
    }

    #[test]
    fn test_height_boundaries() {
        let s = Scheme::new(2);
        assert_eq!(s.heights(), 0..2);
        assert_eq!(s.push_height(0), Some(1));
        assert_eq!(s.push_height(1), None);
        assert_eq!(s.pop_height(1), Some(0));
        assert_eq!(s.pop_height(0), None);
    }

    #[test]
    fn test_ranges() {
        let s = Scheme::new(3);
        assert_eq!(s.positions().count(), 4);
        assert_eq!(s.transitions().count(), 3);
        assert_eq!(s.num_state_atoms(5), 4 * 5 * 2);
        assert_eq!(s.num_symbol_atoms(), 4 * 2 * 2);
    }
}
