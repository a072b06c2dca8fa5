//! Stack alphabet and node actions.
//!
//! A tunnel network works over a two-symbol stack alphabet `{A, B}`.
//! Every node carries a set of enabled [`Action`]s, each of which either
//! keeps the stack height ([`Action::Transmit`]), grows it by one
//! ([`Action::Push`]) or shrinks it by one ([`Action::Pop`]).
use std::fmt;
use std::str::FromStr;

/// A stack symbol.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Symbol {
    A,
    B,
}

impl Symbol {
    /// Both symbols, in canonical order.
    pub const ALL: [Symbol; 2] = [Symbol::A, Symbol::B];

    /// Returns the other symbol.
    pub fn other(self) -> Symbol {
        match self {
            Symbol::A => Symbol::B,
            Symbol::B => Symbol::A,
        }
    }

    /// Returns the single-character token of the symbol.
    pub fn as_char(self) -> char {
        match self {
            Symbol::A => 'A',
            Symbol::B => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Symbol> {
        match c {
            'A' | 'a' => Some(Symbol::A),
            'B' | 'b' => Some(Symbol::B),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The kind of an action, i.e. its effect on the stack height.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ActionKind {
    Transmit,
    Push,
    Pop,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Transmit, ActionKind::Push, ActionKind::Pop];

    /// Height change caused by an action of this kind.
    pub fn delta(self) -> isize {
        match self {
            ActionKind::Transmit => 0,
            ActionKind::Push => 1,
            ActionKind::Pop => -1,
        }
    }

    /// Returns the kind whose height change is `delta`, if any.
    pub fn from_delta(delta: isize) -> Option<ActionKind> {
        match delta {
            0 => Some(ActionKind::Transmit),
            1 => Some(ActionKind::Push),
            -1 => Some(ActionKind::Pop),
            _ => None,
        }
    }
}

/// A stack action enabled on a node.
///
/// # Notation
///
/// | Action            | Label  | Effect                                   |
/// |-------------------|--------|------------------------------------------|
/// | `Transmit(S)`     | `S→S`  | top must be `S`, height unchanged        |
/// | `Push(R, W)`      | `R↑RW` | top must be `R`, `W` is pushed on top    |
/// | `Pop(T, R)`       | `RT↓R` | top must be `T`, the cell below is `R`   |
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Action {
    Transmit(Symbol),
    Push { read: Symbol, write: Symbol },
    Pop { top: Symbol, below: Symbol },
}

impl Action {
    pub fn transmit(symbol: Symbol) -> Self {
        Action::Transmit(symbol)
    }

    pub fn push(read: Symbol, write: Symbol) -> Self {
        Action::Push { read, write }
    }

    pub fn pop(top: Symbol, below: Symbol) -> Self {
        Action::Pop { top, below }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Transmit(_) => ActionKind::Transmit,
            Action::Push { .. } => ActionKind::Push,
            Action::Pop { .. } => ActionKind::Pop,
        }
    }

    /// The symbol the action requires on top of the stack before it fires.
    pub fn required_top(&self) -> Symbol {
        match *self {
            Action::Transmit(s) => s,
            Action::Push { read, .. } => read,
            Action::Pop { top, .. } => top,
        }
    }

    /// The symbol on top of the stack after the action fired.
    pub fn resulting_top(&self) -> Symbol {
        match *self {
            Action::Transmit(s) => s,
            Action::Push { write, .. } => write,
            Action::Pop { below, .. } => below,
        }
    }

    /// All ten actions over the alphabet.
    pub fn all() -> impl Iterator<Item = Action> {
        let transmits = Symbol::ALL.into_iter().map(Action::Transmit);
        let pushes = Symbol::ALL
            .into_iter()
            .flat_map(|r| Symbol::ALL.into_iter().map(move |w| Action::push(r, w)));
        let pops = Symbol::ALL
            .into_iter()
            .flat_map(|t| Symbol::ALL.into_iter().map(move |b| Action::pop(t, b)));
        transmits.chain(pushes).chain(pops)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Action::Transmit(s) => write!(f, "{}→{}", s, s),
            Action::Push { read, write } => write!(f, "{}↑{}{}", read, read, write),
            Action::Pop { top, below } => write!(f, "{}{}↓{}", below, top, below),
        }
    }
}

/// Error returned when an action literal cannot be parsed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseActionError(pub String);

impl fmt::Display for ParseActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid action '{}'", self.0)
    }
}

impl std::error::Error for ParseActionError {}

impl FromStr for Action {
    type Err = ParseActionError;

    /// Parses `transmit(A)`, `push(A,B)` or `pop(B,A)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseActionError(s.to_string());

        let (name, rest) = s.split_once('(').ok_or_else(err)?;
        let args = rest.strip_suffix(')').ok_or_else(err)?;
        let symbols = args
            .split(',')
            .map(|a| {
                let a = a.trim();
                let mut chars = a.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Symbol::from_char(c),
                    _ => None,
                }
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(err)?;

        match (name.trim().to_ascii_lowercase().as_str(), symbols.as_slice()) {
            ("transmit", &[s]) => Ok(Action::transmit(s)),
            ("push", &[r, w]) => Ok(Action::push(r, w)),
            ("pop", &[t, b]) => Ok(Action::pop(t, b)),
            _ => Err(err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Action::transmit(Symbol::A).to_string(), "A→A");
        assert_eq!(Action::push(Symbol::A, Symbol::B).to_string(), "A↑AB");
        assert_eq!(Action::pop(Symbol::B, Symbol::A).to_string(), "AB↓A");
        assert_eq!(Action::pop(Symbol::A, Symbol::B).to_string(), "BA↓B");
    }

    #[test]
    fn test_tops() {
        let push = Action::push(Symbol::A, Symbol::B);
        assert_eq!(push.required_top(), Symbol::A);
        assert_eq!(push.resulting_top(), Symbol::B);

        let pop = Action::pop(Symbol::B, Symbol::A);
        assert_eq!(pop.required_top(), Symbol::B);
        assert_eq!(pop.resulting_top(), Symbol::A);
    }

    #[test]
    fn test_all_actions() {
        let all: Vec<Action> = Action::all().collect();
        assert_eq!(all.len(), 10);
        assert_eq!(all.iter().filter(|a| a.kind() == ActionKind::Transmit).count(), 2);
        assert_eq!(all.iter().filter(|a| a.kind() == ActionKind::Push).count(), 4);
        assert_eq!(all.iter().filter(|a| a.kind() == ActionKind::Pop).count(), 4);
    }

    #[test]
    fn test_parse() {
        assert_eq!("transmit(A)".parse(), Ok(Action::transmit(Symbol::A)));
        assert_eq!("Push(a, b)".parse(), Ok(Action::push(Symbol::A, Symbol::B)));
        assert_eq!("pop(B,A)".parse(), Ok(Action::pop(Symbol::B, Symbol::A)));
        assert!("pop(B)".parse::<Action>().is_err());
        assert!("jump(A)".parse::<Action>().is_err());
        assert!("push(A,C)".parse::<Action>().is_err());
        assert!("push(AB,A)".parse::<Action>().is_err());
    }

    #[test]
    fn test_delta() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_delta(kind.delta()), Some(kind));
        }
        assert_eq!(ActionKind::from_delta(2), None);
    }
}
