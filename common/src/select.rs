use num_bigint::BigInt;
use num_rational::BigRational;
use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::board::{Board, Point};
use crate::certainty::KnownCells;
use crate::probability::Probabilities;

/// Picks the cell to reveal next.
///
/// Lowest mine probability first. Among equally risky cells, the one with the
/// fewest closed neighbours wins. Whatever is still tied is drawn uniformly
/// from `rng` out of the row-major ordered candidates, so a seeded generator
/// always makes the same choice.
pub fn select_move<R: Rng + ?Sized>(
    board: &Board,
    probabilities: &Probabilities,
    rng: &mut R,
) -> Option<Point> {
    let lowest = probabilities.values().min()?;
    let mut candidates: Vec<Point> = probabilities
        .iter()
        .filter(|&(_, p)| p == lowest)
        .map(|(&point, _)| point)
        .collect();

    let fewest = candidates
        .iter()
        .map(|&p| board.closed_neighbor_count(p))
        .min()?;
    candidates.retain(|&p| board.closed_neighbor_count(p) == fewest);
    candidates.sort_by_key(Point::row_major);

    candidates.choose(rng).copied()
}

/// Reads proven cells as probabilities: 1 for mines, 0 for safe cells.
pub fn certainties_as_probabilities(known: &KnownCells) -> Probabilities {
    known
        .iter()
        .map(|(&point, &mine)| (point, BigRational::from_integer(BigInt::from(mine as u8))))
        .collect()
}
