use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use rand::RngCore;

use crate::board::{Board, Cell, Point};
use crate::certainty::{self, KnownCells};
use crate::context::SolveContext;
use crate::error::SolveError;
use crate::oracle::{Oracle, VarisatOracle};
use crate::probability::{self, Probabilities};
use crate::select::{certainties_as_probabilities, select_move};

/// Something that can reason about a board snapshot.
pub trait Solver {
    /// Cells proven to be mines (`true`) or safe (`false`).
    fn known_cells(&mut self, board: &Board, ctx: &SolveContext<'_>) -> Result<KnownCells, SolveError>;

    /// Exact mine probability of every unflagged closed cell.
    fn probabilities(&mut self, board: &Board, ctx: &SolveContext<'_>) -> Result<Probabilities, SolveError>;

    /// The recommended cell to reveal, `None` when nothing is left to reveal.
    ///
    /// Proven safe cells are preferred; only when there are none are the full
    /// probabilities computed.
    fn best_move(
        &mut self,
        board: &Board,
        rng: &mut dyn RngCore,
        ctx: &SolveContext<'_>,
    ) -> Result<Option<Point>, SolveError> {
        let known = self.known_cells(board, ctx)?;
        if known.values().any(|&mine| !mine) {
            return Ok(select_move(board, &certainties_as_probabilities(&known), rng));
        }
        let probabilities = self.probabilities(board, ctx)?;
        Ok(select_move(board, &probabilities, rng))
    }
}

/// The satisfiability-based solver.
pub struct SatSolver<O = VarisatOracle> {
    oracle: O,
}

impl<O: Oracle> SatSolver<O> {
    pub fn new(oracle: O) -> Self {
        SatSolver { oracle }
    }

    pub fn into_inner(self) -> O {
        self.oracle
    }
}

impl Default for SatSolver<VarisatOracle> {
    fn default() -> Self {
        SatSolver::new(VarisatOracle::new())
    }
}

impl<O: Oracle> Solver for SatSolver<O> {
    fn known_cells(&mut self, board: &Board, ctx: &SolveContext<'_>) -> Result<KnownCells, SolveError> {
        certainty::known_cells(&mut self.oracle, board, ctx)
    }

    fn probabilities(&mut self, board: &Board, ctx: &SolveContext<'_>) -> Result<Probabilities, SolveError> {
        probability::probabilities(&mut self.oracle, board, ctx)
    }
}

/// Tries every placement of the mines over the closed cells.
///
/// Only usable on tiny boards, where it serves as ground truth for
/// [`SatSolver`].
#[derive(Debug, Clone, Copy)]
pub struct BruteForceSolver {
    max_closed: usize,
}

impl BruteForceSolver {
    pub fn new(max_closed: usize) -> Self {
        BruteForceSolver { max_closed }
    }

    /// Number of consistent placements in total and per closed cell.
    fn count(&self, board: &Board, ctx: &SolveContext<'_>) -> Result<(BigInt, HashMap<Point, BigInt>), SolveError> {
        board.validate()?;
        let closed: Vec<Point> = board.points().filter(|&p| board.get(p).is_unrevealed()).collect();
        if closed.len() > self.max_closed {
            return Err(SolveError::Intractable {
                closed: closed.len(),
                limit: self.max_closed,
            });
        }
        let numbers: Vec<(Point, u8)> = board
            .points()
            .filter_map(|p| match board.get(p) {
                Cell::Open(n) => Some((p, n)),
                _ => None,
            })
            .collect();

        let mut total = BigInt::zero();
        let mut per_cell: HashMap<Point, BigInt> = closed.iter().map(|&p| (p, BigInt::zero())).collect();
        let mut is_mine = vec![false; board.width * board.height];
        for placement in closed.iter().copied().combinations(board.mines) {
            ctx.checkpoint()?;
            for &p in &placement {
                is_mine[p.y * board.width + p.x] = true;
            }
            let consistent = numbers.iter().all(|&(at, n)| {
                board
                    .neighbors(at)
                    .filter(|q| is_mine[q.y * board.width + q.x])
                    .count()
                    == n as usize
            });
            if consistent {
                total += BigInt::one();
                for p in &placement {
                    if let Some(count) = per_cell.get_mut(p) {
                        *count += BigInt::one();
                    }
                }
            }
            for &p in &placement {
                is_mine[p.y * board.width + p.x] = false;
            }
        }

        if total.is_zero() {
            return Err(SolveError::Inconsistent);
        }
        debug!("{}{} consistent placements", ctx.tag(), total);
        per_cell.retain(|&p, _| board.get(p) != Cell::Flagged);
        Ok((total, per_cell))
    }
}

impl Default for BruteForceSolver {
    fn default() -> Self {
        BruteForceSolver::new(20)
    }
}

impl Solver for BruteForceSolver {
    fn known_cells(&mut self, board: &Board, ctx: &SolveContext<'_>) -> Result<KnownCells, SolveError> {
        Ok(self
            .probabilities(board, ctx)?
            .into_iter()
            .filter_map(|(p, prob)| {
                if prob.is_zero() {
                    Some((p, false))
                } else if prob.is_one() {
                    Some((p, true))
                } else {
                    None
                }
            })
            .collect())
    }

    fn probabilities(&mut self, board: &Board, ctx: &SolveContext<'_>) -> Result<Probabilities, SolveError> {
        let (total, per_cell) = self.count(board, ctx)?;
        Ok(per_cell
            .into_iter()
            .map(|(p, count)| (p, BigRational::new(count, total.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const BOARDS: &[(&str, usize)] = &[
        ("###\n220\n###", 2),
        ("1###\n####\n####", 2),
        ("#1##\n#2##\n####", 3),
        ("0###\n####\n####", 2),
        ("#1#\n###\n#1#", 2),
        ("##1#\n####\n1###", 3),
        ("F1##\n#2##\n####", 2),
        ("####\n####\n####", 4),
        ("#2#\n###\n###", 2),
        ("1#1\n###\n###", 1),
    ];

    #[test]
    fn test_probabilities_match_brute_force() {
        let ctx = SolveContext::new();
        for &(text, mines) in BOARDS {
            let board = Board::parse(text, mines).unwrap();
            let expected = BruteForceSolver::default().probabilities(&board, &ctx).unwrap();
            let actual = SatSolver::default().probabilities(&board, &ctx).unwrap();
            assert_eq!(actual, expected, "{text}");
        }
    }

    #[test]
    fn test_known_cells_match_brute_force() {
        let ctx = SolveContext::new();
        for &(text, mines) in BOARDS {
            let board = Board::parse(text, mines).unwrap();
            let expected = BruteForceSolver::default().known_cells(&board, &ctx).unwrap();
            let actual = SatSolver::default().known_cells(&board, &ctx).unwrap();
            assert_eq!(actual, expected, "{text}");
        }
    }

    #[test]
    fn test_brute_force_limit() {
        let board = Board::new(5, 5, 4);
        assert_eq!(
            BruteForceSolver::new(20).probabilities(&board, &SolveContext::new()),
            Err(SolveError::Intractable { closed: 25, limit: 20 })
        );
    }

    #[test]
    fn test_best_move_takes_a_proven_safe_cell() {
        let board = Board::parse("###\n220\n###", 2).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let chosen = SatSolver::default()
            .best_move(&board, &mut rng, &SolveContext::new())
            .unwrap()
            .unwrap();
        assert_ne!(chosen.x, 0);
    }

    #[test]
    fn test_best_move_is_minimal_and_reproducible() {
        let ctx = SolveContext::new();
        for &(text, mines) in BOARDS {
            let board = Board::parse(text, mines).unwrap();
            let probs = SatSolver::default().probabilities(&board, &ctx).unwrap();
            let lowest = probs.values().min().unwrap();

            let first = SatSolver::default()
                .best_move(&board, &mut StdRng::seed_from_u64(5), &ctx)
                .unwrap()
                .unwrap();
            let second = SatSolver::default()
                .best_move(&board, &mut StdRng::seed_from_u64(5), &ctx)
                .unwrap()
                .unwrap();
            assert_eq!(first, second, "{text}");
            assert_eq!(&probs[&first], lowest, "{text}");
        }
    }

    #[test]
    fn test_best_move_on_fully_open_board() {
        let board = Board::parse("00\n00", 0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            SatSolver::default().best_move(&board, &mut rng, &SolveContext::new()),
            Ok(None)
        );
    }
}
