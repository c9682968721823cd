use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use mine_inference::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Proves safe cells and computes exact mine probabilities. Board format: # closed, F flagged, 0-8 open")]
struct Args {
    /// Board file, one row per line.
    #[arg(short, long)]
    file: PathBuf,

    /// Total number of mines on the board.
    #[arg(short, long)]
    mines: usize,

    /// Seed for the random tie-break between equally good moves.
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct Report {
    known: Vec<KnownEntry>,
    probabilities: Vec<ProbabilityEntry>,
    best_move: Option<Point>,
}

#[derive(Serialize)]
struct KnownEntry {
    x: usize,
    y: usize,
    mine: bool,
}

#[derive(Serialize)]
struct ProbabilityEntry {
    x: usize,
    y: usize,
    /// Exact value as "numerator/denominator".
    exact: String,
    approx: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let board = Board::parse(&text, args.mines).context("failed to parse board")?;
    board.validate().context("invalid board")?;

    let mut ctx = SolveContext::new();
    if let Some(ms) = args.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(ms));
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut solver = SatSolver::default();
    let known = solver.known_cells(&board, &ctx)?;
    info!("proved {} cells", known.len());
    let probabilities = solver.probabilities(&board, &ctx)?;
    let best = solver.best_move(&board, &mut rng, &ctx)?;

    match args.format {
        Format::Text => print_report(&board, &known, &probabilities, best),
        Format::Json => {
            let report = build_report(&known, &probabilities, best);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn build_report(known: &KnownCells, probabilities: &Probabilities, best_move: Option<Point>) -> Report {
    let mut known: Vec<KnownEntry> = known
        .iter()
        .map(|(p, &mine)| KnownEntry { x: p.x, y: p.y, mine })
        .collect();
    known.sort_by_key(|e| (e.y, e.x));

    let mut probabilities: Vec<ProbabilityEntry> = probabilities
        .iter()
        .map(|(p, prob)| ProbabilityEntry {
            x: p.x,
            y: p.y,
            exact: prob.to_string(),
            approx: approximate(prob),
        })
        .collect();
    probabilities.sort_by_key(|e| (e.y, e.x));

    Report {
        known,
        probabilities,
        best_move,
    }
}

fn print_report(board: &Board, known: &KnownCells, probabilities: &Probabilities, best: Option<Point>) {
    println!("Legend: * proven mine, s proven safe, @ recommended move");
    print_board(board, known, best);

    let mut rows: Vec<(&Point, f64, String)> = probabilities
        .iter()
        .map(|(p, prob)| (p, approximate(prob), prob.to_string()))
        .collect();
    rows.sort_by_key(|(p, _, _)| p.row_major());
    println!("Mine probabilities:");
    for (p, approx, exact) in rows {
        let at = p.to_string();
        println!("  {at:<10} {approx:>8.4}  ({exact})");
    }

    match best {
        Some(p) => println!("Best move: reveal {p}"),
        None => println!("No closed cells left to reveal."),
    }
}

fn print_board(board: &Board, known: &HashMap<Point, bool>, best: Option<Point>) {
    // Print header
    print!("   ");
    for x in 0..board.width {
        print!("{:^3}", x);
    }
    println!("\n  +{}", "---".repeat(board.width));

    // Print rows
    for (y, row) in board.cells.iter().enumerate() {
        print!("{:^2}|", y);
        for (x, cell) in row.iter().enumerate() {
            let point = Point { x, y };
            let display = match (cell, known.get(&point)) {
                _ if best == Some(point) => " @ ".to_string(),
                (Cell::Open(n), _) => format!(" {} ", n),
                (Cell::Flagged, _) => " F ".to_string(),
                (Cell::Closed, Some(true)) => " * ".to_string(),
                (Cell::Closed, Some(false)) => " s ".to_string(),
                (Cell::Closed, None) => " ■ ".to_string(),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
