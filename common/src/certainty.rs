use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::board::{Board, Cell, Point};
use crate::constraint::PbConstraint;
use crate::context::SolveContext;
use crate::encoder::encode;
use crate::error::SolveError;
use crate::oracle::{Contradiction, Oracle, SatOutcome};
use crate::region::Regions;

/// Cells whose content is proven: `true` for a mine, `false` for safe.
/// A missing cell is undetermined, not safe.
pub type KnownCells = HashMap<Point, bool>;

/// Proves, cell by cell, which unflagged closed cells are forced mines or
/// forced safe.
///
/// Every shore cell is tested on its own. The sea is tested once through a
/// representative and the verdict, if any, is shared by all sea cells.
pub fn known_cells<O: Oracle + ?Sized>(
    oracle: &mut O,
    board: &Board,
    ctx: &SolveContext<'_>,
) -> Result<KnownCells, SolveError> {
    board.validate()?;
    let regions = Regions::classify(board);
    let system = encode(board, &regions);
    system.install(oracle)?;
    let tag = ctx.tag();

    match oracle.solve() {
        SatOutcome::Satisfiable(_) => {}
        SatOutcome::Unsatisfiable => return Err(SolveError::Inconsistent),
        SatOutcome::Timeout => return Err(SolveError::Timeout),
    }

    let mut known = KnownCells::new();
    for &cell in &regions.shore {
        if board.get(cell) == Cell::Flagged {
            continue;
        }
        ctx.checkpoint()?;
        if let Some(mine) = prove(oracle, board.literal_id(cell), ctx) {
            trace!("{tag}{cell} is {}", if mine { "a mine" } else { "safe" });
            known.insert(cell, mine);
        }
    }

    if let Some(&representative) = regions.sea.first() {
        ctx.checkpoint()?;
        if let Some(mine) = prove(oracle, board.literal_id(representative), ctx) {
            trace!("{tag}every sea cell is {}", if mine { "a mine" } else { "safe" });
            for &cell in &regions.sea {
                if board.get(cell) != Cell::Flagged {
                    known.insert(cell, mine);
                }
            }
        }
    }

    debug!(
        "{tag}proved {} of {} closed cells ({} shore, {} sea)",
        known.len(),
        regions.closed_count(),
        regions.shore.len(),
        regions.sea.len()
    );
    Ok(known)
}

/// Tests `var = 0` and then `var = 1`. When one hypothesis is infeasible the
/// other one is proven and returned.
fn prove<O: Oracle + ?Sized>(oracle: &mut O, var: u32, ctx: &SolveContext<'_>) -> Option<bool> {
    for hypothesis in [false, true] {
        let handle = match oracle.add_constraint(&PbConstraint::assign(var, hypothesis)) {
            Ok(handle) => handle,
            Err(Contradiction) => return Some(!hypothesis),
        };
        let outcome = oracle.solve();
        oracle.remove_constraint(handle);
        match outcome {
            SatOutcome::Unsatisfiable => return Some(!hypothesis),
            SatOutcome::Satisfiable(_) => {}
            SatOutcome::Timeout => {
                warn!("{}oracle timed out testing variable {var} = {}", ctx.tag(), hypothesis as u8);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::oracle::VarisatOracle;
    use crate::oracle::testing::TimeoutAfter;

    fn solve(text: &str, mines: usize) -> Result<KnownCells, SolveError> {
        let board = Board::parse(text, mines).unwrap();
        known_cells(&mut VarisatOracle::new(), &board, &SolveContext::new())
    }

    fn p(x: usize, y: usize) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_worked_example_is_fully_resolved() {
        // Two 2s and a 0 in the middle row, two mines in total.
        let known = solve("###\n220\n###", 2).unwrap();
        let expected = KnownCells::from([
            (p(0, 0), true),
            (p(1, 0), false),
            (p(2, 0), false),
            (p(0, 2), true),
            (p(1, 2), false),
            (p(2, 2), false),
        ]);
        assert_eq!(known, expected);
    }

    #[test]
    fn test_neighbours_of_a_zero_are_safe() {
        let known = solve("0###\n####\n####\n####", 3).unwrap();
        assert_eq!(
            known,
            KnownCells::from([(p(1, 0), false), (p(0, 1), false), (p(1, 1), false)])
        );
    }

    #[test]
    fn test_one_in_a_corner() {
        // Each 1 sees the same single closed cell, which must be the mine.
        let known = solve("#1\n11", 1).unwrap();
        assert_eq!(known, KnownCells::from([(p(0, 0), true)]));
    }

    #[test]
    fn test_sea_verdict_is_shared() {
        // No information at all: undecided unless the budget is 0 or full.
        assert!(solve("###\n###", 3).unwrap().is_empty());

        let none = solve("###\n###", 0).unwrap();
        assert_eq!(none.len(), 6);
        assert!(none.values().all(|&mine| !mine));

        let all = solve("###\n###", 6).unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.values().all(|&mine| mine));
    }

    #[test]
    fn test_sea_resolved_through_the_global_count() {
        // The 1 takes the only mine, so the far sea column is safe.
        let known = solve("1#\n##\n##\n##", 1).unwrap();
        assert_eq!(known.get(&p(0, 3)), Some(&false));
        assert_eq!(known.get(&p(1, 3)), Some(&false));
        assert_eq!(known.get(&p(0, 1)), None);
    }

    #[test]
    fn test_flagged_cells_are_not_reported() {
        let known = solve("F##\n220\n###", 2).unwrap();
        assert!(!known.contains_key(&p(0, 0)));
        assert_eq!(known.get(&p(0, 2)), Some(&true));
    }

    #[test]
    fn test_repeated_calls_agree() {
        let board = Board::parse("#1##\n#2##\n####", 3).unwrap();
        let mut oracle = VarisatOracle::new();
        let ctx = SolveContext::new();
        let first = known_cells(&mut oracle, &board, &ctx).unwrap();
        let second = known_cells(&mut oracle, &board, &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_inconsistent_board() {
        // The 0 clears every neighbour of the 1.
        assert_eq!(solve("#1#\n#0#", 1), Err(SolveError::Inconsistent));
    }

    #[test]
    fn test_invalid_board_fails_fast() {
        assert!(matches!(
            solve("###\n###", 7),
            Err(SolveError::InvalidBoard(_))
        ));
    }

    #[test]
    fn test_timeouts_leave_cells_undetermined() {
        let board = Board::parse("###\n#1#\n###", 1).unwrap();
        let mut oracle = TimeoutAfter::new(VarisatOracle::new(), 1);
        let known = known_cells(&mut oracle, &board, &SolveContext::new()).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn test_contradictions_still_prove_under_timeouts() {
        let board = Board::parse("0###\n####", 1).unwrap();
        let mut oracle = TimeoutAfter::new(VarisatOracle::new(), 1);
        let known = known_cells(&mut oracle, &board, &SolveContext::new()).unwrap();
        assert_eq!(
            known,
            KnownCells::from([(p(1, 0), false), (p(0, 1), false), (p(1, 1), false)])
        );
    }

    #[test]
    fn test_base_timeout_is_reported() {
        let board = Board::parse("###\n#1#\n###", 1).unwrap();
        let mut oracle = TimeoutAfter::new(VarisatOracle::new(), 0);
        assert_eq!(
            known_cells(&mut oracle, &board, &SolveContext::new()),
            Err(SolveError::Timeout)
        );
    }

    #[test]
    fn test_cancellation() {
        let board = Board::parse("###\n#1#\n###", 1).unwrap();
        let cancel = AtomicBool::new(true);
        let ctx = SolveContext::new().with_cancel(&cancel);
        assert_eq!(
            known_cells(&mut VarisatOracle::new(), &board, &ctx),
            Err(SolveError::Cancelled)
        );
    }
}
