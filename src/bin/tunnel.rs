use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, WrapErr};
use log::info;

use tunnel_rs::bdd::{BddConfig, BddSolver};
use tunnel_rs::cnf::{Cnf, DimacsSolver};
use tunnel_rs::debug::ModelDump;
use tunnel_rs::diagnostics::LogDiagnostics;
use tunnel_rs::dot::DotConfig;
use tunnel_rs::parse::parse_network;
use tunnel_rs::reduction::{find_path, reduce_with, SearchConfig, SearchOutcome};
use tunnel_rs::solver::Solver;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum SolverKind {
    /// Built-in BDD oracle.
    Bdd,
    /// External DIMACS solver (see `--solver-cmd`).
    Dimacs,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Search for simple paths in tunnel networks")]
struct Cli {
    /// Network description.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Largest path length to try.
    #[arg(long, value_name = "INT", default_value = "10")]
    max_length: usize,

    /// Smallest path length to try.
    #[arg(long, value_name = "INT", default_value = "1")]
    min_length: usize,

    /// Satisfiability oracle.
    #[arg(long, value_enum, default_value = "bdd")]
    solver: SolverKind,

    /// External solver binary, reading DIMACS on stdin.
    #[arg(long, value_name = "PROG", default_value = "kissat")]
    solver_cmd: String,

    /// BDD computed cache size (in bits).
    #[arg(long, value_name = "INT", default_value = "16", value_parser = clap::value_parser!(u8).range(0..=31))]
    cache_bits: u8,

    /// Print the model of the found path, position by position.
    #[arg(long)]
    dump_model: bool,

    /// Write the CNF for `--max-length` to this file and exit.
    #[arg(long, value_name = "OUT")]
    dimacs: Option<PathBuf>,

    /// Write the network (and the found path) as Graphviz.
    #[arg(long, value_name = "OUT")]
    dot: Option<PathBuf>,

    /// Count satisfying assignments at the found length (BDD oracle only).
    #[arg(long)]
    count: bool,

    /// More logging (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = if args.quiet {
        simplelog::LevelFilter::Error
    } else {
        match args.verbose {
            0 => simplelog::LevelFilter::Warn,
            1 => simplelog::LevelFilter::Info,
            2 => simplelog::LevelFilter::Debug,
            _ => simplelog::LevelFilter::Trace,
        }
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let text = std::fs::read_to_string(&args.input).wrap_err_with(|| format!("reading {}", args.input.display()))?;
    let network = parse_network(&text)?;
    info!("Loaded network with {} nodes, {} edges", network.num_nodes(), network.num_edges());

    if let Some(out) = &args.dimacs {
        let reduction = reduce_with(&network, args.max_length, &LogDiagnostics);
        let cnf = Cnf::from_formula(&reduction.formula, &reduction.atoms);
        std::fs::write(out, cnf.to_dimacs(&reduction.atoms)).wrap_err_with(|| format!("writing {}", out.display()))?;
        println!(
            "Wrote CNF for length {} ({} vars, {} clauses) to {}",
            args.max_length,
            cnf.num_vars(),
            cnf.clauses().len(),
            out.display()
        );
        return Ok(());
    }

    if args.count && args.solver != SolverKind::Bdd {
        bail!("--count requires the BDD oracle");
    }

    let bdd_config = BddConfig {
        cache_bits: usize::from(args.cache_bits),
    };
    let mut solver: Box<dyn Solver> = match args.solver {
        SolverKind::Bdd => Box::new(BddSolver::new(bdd_config.clone())),
        SolverKind::Dimacs => Box::new(DimacsSolver::new(args.solver_cmd.clone())),
    };

    let config = SearchConfig {
        min_length: args.min_length,
        max_length: args.max_length,
    };
    let time_search = std::time::Instant::now();
    let outcome = find_path(&network, &config, &mut solver, &LogDiagnostics)?;
    info!("Search done in {:.3} s", time_search.elapsed().as_secs_f64());

    match &outcome {
        SearchOutcome::NotFound { max_length } => {
            println!("No simple path of length <= {}", max_length);
        }
        SearchOutcome::Found(solution) => {
            println!("Path of length {}: {}", solution.length, solution.path.display(&network));
            if args.dump_model {
                let dump = ModelDump::new(&solution.model, &solution.reduction.atoms, &network, solution.length);
                print!("{}", dump);
            }
            if args.count {
                let count = BddSolver::new(bdd_config).count_models(&solution.reduction.formula, &solution.reduction.atoms);
                println!("Satisfying assignments at length {}: {}", solution.length, count);
            }
        }
    }

    if let Some(out) = &args.dot {
        let path = outcome.solution().map(|s| &s.path);
        let dot = network.to_dot_with_config(path, &DotConfig::default())?;
        std::fs::write(out, dot).wrap_err_with(|| format!("writing {}", out.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_bits_range() {
        let args = Cli::try_parse_from(["tunnel", "net.txt", "--cache-bits", "31"]).unwrap();
        assert_eq!(args.cache_bits, 31);
        let args = Cli::try_parse_from(["tunnel", "net.txt"]).unwrap();
        assert_eq!(args.cache_bits, 16);
        assert!(Cli::try_parse_from(["tunnel", "net.txt", "--cache-bits", "32"]).is_err());
        assert!(Cli::try_parse_from(["tunnel", "net.txt", "--cache-bits", "64"]).is_err());
    }
}
