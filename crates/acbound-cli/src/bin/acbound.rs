//! acbound CLI - evaluate arithmetic circuits and compute interventional bounds
//!
//! Usage:
//!   acbound <file>                       # Evaluate the circuit
//!   acbound <file> --mode sum            # Evaluate and differentiate
//!   acbound <file> --bound               # Upper bound under the file's intervention
//!   acbound <file> --terms -o json       # Term count, JSON output

use acbound_core::{
    count_terms, Calculator, CalcError, Circuit, CircuitTables, DiffMode, Evidence,
    InterventionMaps, NormalCalculator, RelaxationSummary,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::process;

#[derive(Parser)]
#[command(name = "acbound")]
#[command(version)]
#[command(about = "acbound - arithmetic circuit evaluation and interventional upper bounds")]
#[command(long_about = "Evaluate, differentiate and bound compiled arithmetic circuits given as JSON tables")]
struct Cli {
    /// Input problem file (JSON)
    #[arg(value_name = "FILE")]
    file: String,

    /// Differentiate in the given semiring: sum or max
    #[arg(short, long, value_name = "MODE")]
    mode: Option<String>,

    /// Compute the relaxed upper bound for the file's intervention
    #[arg(short, long)]
    bound: bool,

    /// Count additive terms of the root
    #[arg(short, long)]
    terms: bool,

    /// Output format: summary or json
    #[arg(short, long, default_value = "summary", value_name = "FORMAT")]
    output: String,
}

/// Problem file layout.
#[derive(Deserialize)]
struct Problem {
    circuit: CircuitTables,
    negative_weights: Vec<f64>,
    positive_weights: Vec<f64>,
    #[serde(default)]
    intervention: Option<Intervention>,
}

#[derive(Deserialize)]
struct Intervention {
    #[serde(flatten)]
    maps: InterventionMaps,
    free: Vec<bool>,
}

#[derive(Serialize, Debug)]
struct Report {
    nodes: usize,
    edges: usize,
    root_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<DiffMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partials: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    posteriors: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bound: Option<RelaxationSummary>,
    /// Outer `None`: not requested. Inner `None`: untracked (MAX or CONSTANT
    /// below the root), written as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    terms: Option<Option<u128>>,
}

fn main() {
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.file, e);
            process::exit(1);
        }
    };

    let problem: Problem = match serde_json::from_str(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error parsing '{}': {}", cli.file, e);
            process::exit(1);
        }
    };

    let mode = match cli.mode.as_deref() {
        None => None,
        Some("sum") => Some(DiffMode::Sum),
        Some("max") => Some(DiffMode::Max),
        Some(other) => {
            eprintln!("Unknown mode '{}': expected sum or max", other);
            process::exit(1);
        }
    };

    let report = match run(&cli, problem, mode) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match cli.output.as_str() {
        "json" => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        },
        _ => print_summary(&report),
    }
}

fn run(cli: &Cli, problem: Problem, mode: Option<DiffMode>) -> Result<Report, CalcError> {
    let circuit = Circuit::from_tables(problem.circuit)?;
    let evidence = Evidence::from_weights(problem.negative_weights, problem.positive_weights)?;
    let mut calc = NormalCalculator::new(circuit.len(), mode.is_some());

    calc.evaluate(&circuit, &evidence)?;
    let mut report = Report {
        nodes: circuit.len(),
        edges: circuit.num_edges(),
        root_value: calc.root_value(),
        mode,
        partials: None,
        posteriors: None,
        bound: None,
        terms: None,
    };

    if let Some(mode) = mode {
        calc.differentiate(&circuit, mode)?;
        report.partials = (0..circuit.len()).map(|n| calc.node_partial(n)).collect();
        report.posteriors = (0..circuit.len()).map(|n| calc.node_posterior(n)).collect();
    }

    if cli.terms {
        report.terms = Some(count_terms(&circuit)?.root());
    }

    if cli.bound {
        let intervention = problem.intervention.ok_or_else(|| {
            CalcError::ValidationError("--bound needs an 'intervention' object in the input".into())
        })?;
        report.bound = Some(calc.bubble_up(
            &circuit,
            &evidence,
            &intervention.maps,
            &intervention.free,
        )?);
    }

    Ok(report)
}

fn print_summary(report: &Report) {
    println!("✓ Circuit evaluated: {} nodes, {} edges\n", report.nodes, report.edges);
    println!("Root value = {:.6e}", report.root_value);

    if let (Some(mode), Some(partials)) = (report.mode, &report.partials) {
        println!("\nPartials ({}):", mode);
        for (n, d) in partials.iter().enumerate() {
            println!("  node {} = {:.6e}", n, d);
        }
    }

    if let Some(terms) = report.terms {
        println!("\n{}", terms_line(terms));
    } else if report.bound.is_none() && report.mode.is_none() {
        println!("\nRun with --mode, --bound or --terms for more");
    }

    if let Some(bound) = &report.bound {
        println!("\nInterventional upper bound = {:.6e}", bound.bound);
        println!("  sum nodes relaxed: {}", bound.relaxed_sum_nodes);
        println!("  parameters neutralized: {}", bound.neutralized_parameters);
    }
}

fn terms_line(terms: Option<u128>) -> String {
    match terms {
        Some(count) => format!("Num terms: {}", count),
        None => "Num terms: untracked".to_string(),
    }
}
