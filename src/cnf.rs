//! Clausal form and the external DIMACS solver oracle.
//!
//! [`Cnf::from_formula`] applies the Tseitin transformation: atoms keep their
//! DIMACS numbers `1..=n` (see [`Atom::to_dimacs`]), auxiliary variables are
//! numbered from `n + 1`. The result is equisatisfiable with the formula, and
//! every model of the CNF restricted to `1..=n` is a model of the formula.

use std::fmt::Write as _;
use std::io::Write as _;
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::atom::{Atom, AtomRegistry};
use crate::error::SolverError;
use crate::formula::Formula;
use crate::solver::{Assignment, SolveResult, Solver};

/// DIMACS literal: a non-zero variable number, negative when negated.
pub type Lit = i32;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Cnf {
    num_vars: u32,
    num_atoms: u32,
    clauses: Vec<Vec<Lit>>,
    true_lit: Option<Lit>,
}

impl Cnf {
    /// Tseitin-transforms `formula`, whose atoms all come from `atoms`.
    pub fn from_formula(formula: &Formula, atoms: &AtomRegistry) -> Self {
        let num_atoms = atoms.len() as u32;
        let mut cnf = Cnf {
            num_vars: num_atoms,
            num_atoms,
            clauses: Vec::new(),
            true_lit: None,
        };
        cnf.assert(formula);
        debug!(
            "CNF: {} vars ({} atoms), {} clauses",
            cnf.num_vars,
            cnf.num_atoms,
            cnf.clauses.len()
        );
        cnf
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn num_atoms(&self) -> u32 {
        self.num_atoms
    }

    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    fn fresh(&mut self) -> Lit {
        self.num_vars += 1;
        self.num_vars as Lit
    }

    fn add_clause(&mut self, clause: Vec<Lit>) {
        self.clauses.push(clause);
    }

    fn true_lit(&mut self) -> Lit {
        if let Some(t) = self.true_lit {
            return t;
        }
        let t = self.fresh();
        self.add_clause(vec![t]);
        self.true_lit = Some(t);
        t
    }

    /// Adds clauses forcing `formula` to be true.
    fn assert(&mut self, formula: &Formula) {
        match formula {
            Formula::And(args) => {
                for f in args {
                    self.assert(f);
                }
            }
            Formula::Or(args) => {
                let clause = args.iter().map(|f| self.encode(f)).collect();
                self.add_clause(clause);
            }
            Formula::Not(inner) => match &**inner {
                Formula::And(args) => {
                    let clause = args.iter().map(|f| -self.encode(f)).collect();
                    self.add_clause(clause);
                }
                Formula::Or(args) => {
                    for f in args {
                        let l = self.encode(f);
                        self.add_clause(vec![-l]);
                    }
                }
                _ => {
                    let l = self.encode(formula);
                    self.add_clause(vec![l]);
                }
            },
            Formula::Implies(lhs, rhs) => {
                let a = self.encode(lhs);
                match &**rhs {
                    Formula::And(args) => {
                        for f in args {
                            let b = self.encode(f);
                            self.add_clause(vec![-a, b]);
                        }
                    }
                    Formula::Or(args) => {
                        let mut clause = Vec::with_capacity(args.len() + 1);
                        clause.push(-a);
                        for f in args {
                            clause.push(self.encode(f));
                        }
                        self.add_clause(clause);
                    }
                    f => {
                        let b = self.encode(f);
                        self.add_clause(vec![-a, b]);
                    }
                }
            }
            _ => {
                let l = self.encode(formula);
                self.add_clause(vec![l]);
            }
        }
    }

    /// Returns a literal equivalent to `formula`.
    fn encode(&mut self, formula: &Formula) -> Lit {
        match formula {
            Formula::Atom(a) => a.to_dimacs() as Lit,
            Formula::Not(f) => -self.encode(f),
            Formula::And(args) => {
                if args.is_empty() {
                    return self.true_lit();
                }
                let lits: Vec<Lit> = args.iter().map(|f| self.encode(f)).collect();
                self.define_and(&lits)
            }
            Formula::Or(args) => {
                if args.is_empty() {
                    return -self.true_lit();
                }
                let lits: Vec<Lit> = args.iter().map(|f| -self.encode(f)).collect();
                -self.define_and(&lits)
            }
            Formula::Implies(a, b) => {
                let lits = [self.encode(a), -self.encode(b)];
                -self.define_and(&lits)
            }
            Formula::Eq(a, b) => {
                let (a, b) = (self.encode(a), self.encode(b));
                let g = self.fresh();
                self.add_clause(vec![-g, -a, b]);
                self.add_clause(vec![-g, a, -b]);
                self.add_clause(vec![g, a, b]);
                self.add_clause(vec![g, -a, -b]);
                g
            }
        }
    }

    /// Fresh `g` with `g ↔ (l₁ ∧ … ∧ lₙ)`.
    fn define_and(&mut self, lits: &[Lit]) -> Lit {
        if let &[l] = lits {
            return l;
        }
        let g = self.fresh();
        let mut long = Vec::with_capacity(lits.len() + 1);
        long.push(g);
        for &l in lits {
            self.add_clause(vec![-g, l]);
            long.push(-l);
        }
        self.add_clause(long);
        g
    }

    /// Renders the CNF in DIMACS format, with one comment line per atom naming its key.
    pub fn to_dimacs(&self, atoms: &AtomRegistry) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_dimacs(&mut out, atoms);
        out
    }

    fn write_dimacs(&self, out: &mut String, atoms: &AtomRegistry) -> std::fmt::Result {
        for (atom, key) in atoms.entries() {
            writeln!(out, "c {} {}", atom.to_dimacs(), key)?;
        }
        writeln!(out, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(out, "{} ", lit)?;
            }
            writeln!(out, "0")?;
        }
        Ok(())
    }
}

/// Parses SAT-competition solver output (`s` and `v` lines).
///
/// Only positive literals of atom variables `1..=num_atoms` end up in the model.
pub fn parse_output(output: &str, num_atoms: u32) -> Result<SolveResult, SolverError> {
    let mut status = None;
    let mut model = Assignment::new();
    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("s ") {
            status = match rest.trim() {
                "SATISFIABLE" => Some(true),
                "UNSATISFIABLE" => Some(false),
                other => return Err(SolverError::Output(format!("unknown status '{}'", other))),
            };
        } else if let Some(rest) = line.strip_prefix("v ") {
            for token in rest.split_whitespace() {
                let lit: i64 = token
                    .parse()
                    .map_err(|_| SolverError::Output(format!("bad literal '{}'", token)))?;
                if lit > 0 && lit <= num_atoms as i64 {
                    if let Some(atom) = Atom::from_dimacs(lit as u32) {
                        model.set(atom, true);
                    }
                }
            }
        }
    }
    match status {
        Some(true) => Ok(SolveResult::Sat(model)),
        Some(false) => Ok(SolveResult::Unsat),
        None => Err(SolverError::Output("missing status line".to_string())),
    }
}

/// Oracle backed by an external DIMACS solver binary.
///
/// The CNF is fed on the solver's standard input; the answer is read from its
/// standard output in SAT-competition format.
#[derive(Debug, Clone)]
pub struct DimacsSolver {
    command: String,
    args: Vec<String>,
}

impl DimacsSolver {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Solver for DimacsSolver {
    fn solve(&mut self, formula: &Formula, atoms: &AtomRegistry) -> Result<SolveResult, SolverError> {
        let cnf = Cnf::from_formula(formula, atoms);
        let input = cnf.to_dimacs(atoms);

        debug!("Running '{}' with {:?}", self.command, self.args);
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        // The solver may exit before reading all of its input.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            warn!("{}: {}", self.command, stderr);
        }
        if let Err(e) = &written {
            debug!("Writing CNF to '{}' failed: {}", self.command, e);
        }

        match parse_output(&String::from_utf8_lossy(&output.stdout), cnf.num_atoms()) {
            Ok(result) if written.is_ok() => Ok(result),
            Ok(_) | Err(SolverError::Output(_)) if written.is_err() || !output.status.success() => {
                Err(SolverError::Failed {
                    command: self.command.clone(),
                    status: output.status.code(),
                    stderr,
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::atom::AtomKey;
    use crate::solver::Model;
    use crate::types::Symbol;

    fn clause_holds(clause: &[Lit], value: &impl Fn(u32) -> bool) -> bool {
        clause.iter().any(|&l| value(l.unsigned_abs()) == (l > 0))
    }

    /// Brute force: is there an extension of the atom values to all CNF variables?
    fn extends(cnf: &Cnf, atom_bits: u32) -> bool {
        let n = cnf.num_atoms();
        let aux = cnf.num_vars() - n;
        (0..1u32 << aux).any(|aux_bits| {
            let value = |v: u32| {
                if v <= n {
                    atom_bits >> (v - 1) & 1 == 1
                } else {
                    aux_bits >> (v - n - 1) & 1 == 1
                }
            };
            cnf.clauses().iter().all(|c| clause_holds(c, &value))
        })
    }

    fn check_equisatisfiable(formula: &Formula, atoms: &AtomRegistry) {
        let cnf = Cnf::from_formula(formula, atoms);
        let n = atoms.len() as u32;
        for bits in 0..1u32 << n {
            let model: Assignment = (0..n)
                .filter(|i| bits >> i & 1 == 1)
                .filter_map(|i| Atom::from_dimacs(i + 1))
                .collect();
            assert_eq!(model.satisfies(formula), extends(&cnf, bits), "{} under {:b}", formula, bits);
        }
    }

    #[test]
    fn test_tseitin_equisatisfiable() {
        let atoms = AtomRegistry::new();
        let x: Vec<Formula> = (0..4).map(|i| Formula::atom(atoms.state(i, 0, 0))).collect();

        check_equisatisfiable(&Formula::exactly_one(x.clone()), &atoms);
        check_equisatisfiable(&Formula::xor2(x[0].clone(), x[1].clone()), &atoms);
        check_equisatisfiable(
            &Formula::implies(Formula::and2(x[0].clone(), x[1].clone()), Formula::or2(x[2].clone(), x[3].clone())),
            &atoms,
        );
        check_equisatisfiable(
            &Formula::and([
                Formula::eq(x[0].clone(), Formula::not(x[1].clone())),
                Formula::nand2(x[2].clone(), x[3].clone()),
                Formula::not(Formula::or2(x[0].clone(), x[3].clone())),
            ]),
            &atoms,
        );
        check_equisatisfiable(&Formula::implies(x[0].clone(), Formula::bottom()), &atoms);
        check_equisatisfiable(&Formula::or2(Formula::top(), x[1].clone()), &atoms);
    }

    #[test]
    fn test_to_dimacs() {
        let atoms = AtomRegistry::new();
        let a = atoms.state(0, 0, 0);
        let b = atoms.symbol(0, 0, Symbol::A);
        let f = Formula::and2(a, Formula::or2(Formula::not(a), b));
        let cnf = Cnf::from_formula(&f, &atoms);
        assert_eq!(cnf.num_vars(), 2);
        let text = cnf.to_dimacs(&atoms);
        let expected = format!(
            "c 1 {}\nc 2 {}\np cnf 2 2\n1 0\n-1 2 0\n",
            AtomKey::state(0, 0, 0),
            AtomKey::symbol(0, 0, Symbol::A)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_parse_output() {
        let out = "c comment\ns SATISFIABLE\nv 1 -2 3\nv 7 0\n";
        let result = parse_output(out, 3).unwrap();
        let model = result.model().unwrap();
        assert!(model.value_of(Atom::from_dimacs(1).unwrap()));
        assert!(!model.value_of(Atom::from_dimacs(2).unwrap()));
        assert!(model.value_of(Atom::from_dimacs(3).unwrap()));
        assert_eq!(model.num_true(), 2);

        assert_eq!(parse_output("s UNSATISFIABLE\n", 3).unwrap(), SolveResult::Unsat);
        assert!(parse_output("nothing here", 3).is_err());
        assert!(parse_output("s SATISFIABLE\nv x 0\n", 3).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_external_solver() {
        let atoms = AtomRegistry::new();
        let a = atoms.state(0, 0, 0);
        let b = atoms.state(1, 0, 0);
        let f = Formula::and2(a, Formula::not(b));

        let mut solver = DimacsSolver::new("sh")
            .arg("-c")
            .arg("cat > /dev/null; echo 's SATISFIABLE'; echo 'v 1 -2 0'");
        let model = solver.solve(&f, &atoms).unwrap().model().unwrap();
        assert!(model.value_of(a));
        assert!(!model.value_of(b));

        let mut missing = DimacsSolver::new("this-solver-does-not-exist");
        assert!(matches!(missing.solve(&f, &atoms), Err(SolverError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_solver_crash() {
        let atoms = AtomRegistry::new();
        let f = Formula::and((0..5000).map(|n| Formula::or2(atoms.state(n, 0, 0), atoms.state(n, 1, 0))));

        let mut solver = DimacsSolver::new("sh")
            .arg("-c")
            .arg("echo 'c solver crashed: bad header' >&2; exit 1");
        match solver.solve(&f, &atoms) {
            Err(SolverError::Failed { command, status, stderr }) => {
                assert_eq!(command, "sh");
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "c solver crashed: bad header");
            }
            other => panic!("expected a solver failure, got {:?}", other),
        }
    }
}
