//! Certainty and exact probability inference for minesweeper boards.
//!
//! Given a partially revealed board, the engine
//! 1. splits the closed cells into *shore* (touching a revealed number) and
//!    *sea* (touching none),
//! 2. encodes the revealed numbers and the mine budget as pseudo-Boolean
//!    constraints, with the sea represented by a single binary counter,
//! 3. proves cells safe or mined by asking a SAT oracle whether the opposite
//!    is still satisfiable, and
//! 4. when nothing is certain, enumerates every shore configuration, weights
//!    it by the number of ways to spread the remaining mines over the sea, and
//!    reports exact rational probabilities.
//!
//! The three entry points below run the default `varisat`-backed
//! [`SatSolver`]. Use [`Solver`] directly for cancellation, deadlines or a
//! different oracle.

pub mod board;
pub mod certainty;
pub mod constraint;
pub mod context;
pub mod encoder;
pub mod error;
pub mod oracle;
pub mod probability;
pub mod region;
pub mod select;
pub mod solver;

use num_rational::BigRational;
use num_traits::ToPrimitive;
use rand::RngCore;

pub use board::{Board, Cell, Point};
pub use certainty::KnownCells;
pub use context::SolveContext;
pub use error::{BoardError, SolveError};
pub use probability::Probabilities;
pub use solver::{BruteForceSolver, SatSolver, Solver};

/// Cells that are provably mines (`true`) or provably safe (`false`).
pub fn known_cells(board: &Board) -> Result<KnownCells, SolveError> {
    SatSolver::default().known_cells(board, &SolveContext::new())
}

/// Exact mine probability of every unflagged closed cell.
pub fn probabilities(board: &Board) -> Result<Probabilities, SolveError> {
    SatSolver::default().probabilities(board, &SolveContext::new())
}

/// The recommended next cell to reveal.
pub fn best_move(board: &Board, rng: &mut dyn RngCore) -> Result<Option<Point>, SolveError> {
    SatSolver::default().best_move(board, rng, &SolveContext::new())
}

/// Nearest `f64` to an exact probability, for display only.
pub fn approximate(probability: &BigRational) -> f64 {
    probability.to_f64().unwrap_or(f64::NAN)
}
