use std::collections::HashMap;

use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::board::{Board, Cell, Point};
use crate::constraint::Literal;
use crate::context::SolveContext;
use crate::encoder::encode;
use crate::error::SolveError;
use crate::oracle::{Oracle, SatOutcome};
use crate::region::Regions;

/// Exact mine probability of every unflagged closed cell.
pub type Probabilities = HashMap<Point, BigRational>;

/// `n choose k`, zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> BigInt {
    if k > n {
        return BigInt::zero();
    }
    let k = k.min(n - k);
    let mut acc = BigInt::one();
    for i in 0..k {
        // acc is C(n, i) here, so the division is exact.
        acc = acc * BigInt::from(n - i) / BigInt::from(i + 1);
    }
    acc
}

/// Computes exact mine probabilities by enumerating every shore
/// configuration the constraints allow.
///
/// Each configuration found by the oracle is blocked before asking for the
/// next one. A configuration with `m` shore mines stands for
/// `C(|sea|, mines - m)` full placements, because the remaining mines can sit
/// anywhere in the interchangeable sea.
pub fn probabilities<O: Oracle + ?Sized>(
    oracle: &mut O,
    board: &Board,
    ctx: &SolveContext<'_>,
) -> Result<Probabilities, SolveError> {
    board.validate()?;
    let regions = Regions::classify(board);
    let system = encode(board, &regions);
    system.install(oracle)?;
    let tag = ctx.tag();

    let shore: Vec<(Point, Literal)> = regions
        .shore
        .iter()
        .map(|&p| (p, Literal::positive(board.literal_id(p))))
        .collect();
    let sea = regions.sea.len();

    let mut total = BigInt::zero();
    let mut shore_weight: HashMap<Point, BigInt> = HashMap::new();
    // Σ weight · mines left for the sea
    let mut sea_weight = BigInt::zero();
    let mut models = 0usize;

    loop {
        ctx.checkpoint()?;
        let model = match oracle.solve() {
            SatOutcome::Satisfiable(model) => model,
            SatOutcome::Unsatisfiable => break,
            SatOutcome::Timeout => return Err(SolveError::Timeout),
        };
        models += 1;

        let shore_mines: Vec<Point> = shore
            .iter()
            .filter(|&&(_, lit)| model.satisfies(lit))
            .map(|&(p, _)| p)
            .collect();
        let remaining = board
            .mines
            .checked_sub(shore_mines.len())
            .ok_or(SolveError::Inconsistent)?;

        let weight = if sea > 0 {
            binomial(sea, remaining)
        } else {
            BigInt::one()
        };
        total += &weight;
        for p in shore_mines {
            *shore_weight.entry(p).or_default() += &weight;
        }
        if sea > 0 {
            sea_weight += BigInt::from(remaining) * &weight;
        }

        if shore.is_empty() {
            break;
        }
        let assignment: Vec<Literal> = shore
            .iter()
            .map(|&(_, lit)| if model.satisfies(lit) { lit } else { !lit })
            .collect();
        oracle.add_blocking_clause(&assignment);
    }

    debug!("{tag}enumerated {models} shore configurations over {sea} sea cells");
    if total.is_zero() {
        return Err(SolveError::Inconsistent);
    }

    let mut result = Probabilities::new();
    for &p in &regions.shore {
        if board.get(p) == Cell::Flagged {
            continue;
        }
        let weight = shore_weight.remove(&p).unwrap_or_default();
        result.insert(p, BigRational::new(weight, total.clone()));
    }
    if sea > 0 {
        let per_cell = BigRational::new(sea_weight, &total * BigInt::from(sea));
        for &p in &regions.sea {
            if board.get(p) != Cell::Flagged {
                result.insert(p, per_cell.clone());
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::certainty::known_cells;
    use crate::oracle::VarisatOracle;
    use crate::oracle::testing::TimeoutAfter;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn solve(board: &Board) -> Result<Probabilities, SolveError> {
        probabilities(&mut VarisatOracle::new(), board, &SolveContext::new())
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 0), BigInt::from(1));
        assert_eq!(binomial(5, 2), BigInt::from(10));
        assert_eq!(binomial(5, 5), BigInt::from(1));
        assert_eq!(binomial(3, 4), BigInt::zero());
        assert_eq!(binomial(0, 0), BigInt::from(1));
        assert_eq!(
            binomial(100, 50).to_string(),
            "100891344545564193334812497256"
        );
    }

    #[test]
    fn test_worked_example_probabilities() {
        let board = Board::parse("###\n220\n###", 2).unwrap();
        let probs = solve(&board).unwrap();
        assert_eq!(probs.len(), 6);
        for (p, prob) in &probs {
            let expected = if p.x == 0 { ratio(1, 1) } else { ratio(0, 1) };
            assert_eq!(*prob, expected, "{p}");
        }
    }

    #[test]
    fn test_symmetric_sea_is_uniform() {
        let board = Board::new(4, 4, 5);
        let probs = solve(&board).unwrap();
        assert_eq!(probs.len(), 16);
        assert!(probs.values().all(|p| *p == ratio(5, 16)));
    }

    #[test]
    fn test_large_sea_is_exact() {
        // C(480, 99) is far beyond f64 integer precision.
        let board = Board::new(30, 16, 99);
        let probs = solve(&board).unwrap();
        assert_eq!(probs.len(), 480);
        assert!(probs.values().all(|p| *p == ratio(99, 480)));
    }

    #[test]
    fn test_shore_and_sea_mix() {
        // The 1 puts exactly one mine on its three shore cells and the other
        // one in the 8-cell sea: 3 shore configurations of weight C(8, 1).
        let board = Board::parse("1###\n####\n####", 2).unwrap();
        let probs = solve(&board).unwrap();
        assert_eq!(probs[&Point::new(1, 0)], ratio(1, 3));
        assert_eq!(probs[&Point::new(3, 2)], ratio(1, 8));
    }

    #[test]
    fn test_no_sea_has_unit_weights() {
        let board = Board::parse("#1#\n###", 1).unwrap();
        let probs = solve(&board).unwrap();
        assert_eq!(probs.len(), 5);
        assert!(probs.values().all(|p| *p == ratio(1, 5)));
    }

    #[test]
    fn test_agrees_with_certainty() {
        for (text, mines) in [
            ("###\n220\n###", 2),
            ("#1##\n#2##\n####", 3),
            ("0###\n####\n####", 2),
            ("1#\n##\n##\n##", 1),
        ] {
            let board = Board::parse(text, mines).unwrap();
            let probs = solve(&board).unwrap();
            let known = known_cells(&mut VarisatOracle::new(), &board, &SolveContext::new()).unwrap();
            for (p, mine) in known {
                let expected = if mine { ratio(1, 1) } else { ratio(0, 1) };
                assert_eq!(probs[&p], expected, "{text} at {p}");
            }
            // And nothing else is certain.
            let certain = probs
                .values()
                .filter(|p| p.is_zero() || p.is_one())
                .count();
            let known = known_cells(&mut VarisatOracle::new(), &board, &SolveContext::new()).unwrap();
            assert_eq!(certain, known.len(), "{text}");
        }
    }

    #[test]
    fn test_flags_are_left_out() {
        let board = Board::parse("F1#\n###", 1).unwrap();
        let probs = solve(&board).unwrap();
        assert!(!probs.contains_key(&Point::new(0, 0)));
        assert_eq!(probs.len(), 4);
        assert!(probs.values().all(|p| *p == ratio(1, 5)));
    }

    #[test]
    fn test_inconsistent_board() {
        let board = Board::parse("#1#\n#0#", 1).unwrap();
        assert_eq!(solve(&board), Err(SolveError::Inconsistent));
    }

    #[test]
    fn test_timeout_discards_partial_results() {
        let board = Board::parse("#1##\n#2##\n####", 3).unwrap();
        let mut oracle = TimeoutAfter::new(VarisatOracle::new(), 2);
        assert_eq!(
            probabilities(&mut oracle, &board, &SolveContext::new()),
            Err(SolveError::Timeout)
        );
    }

    #[test]
    fn test_cancellation() {
        let board = Board::new(3, 3, 2);
        let cancel = AtomicBool::new(true);
        let ctx = SolveContext::new().with_cancel(&cancel);
        assert_eq!(
            probabilities(&mut VarisatOracle::new(), &board, &ctx),
            Err(SolveError::Cancelled)
        );
    }
}
