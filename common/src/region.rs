use crate::board::{Board, Cell, Point};

/// Partition of the board into revealed land, closed shore and closed sea.
///
/// Every point is in exactly one set, and each set is in row-major order.
/// Flagged cells are closed for classification purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    /// Open cells.
    pub land: Vec<Point>,
    /// Closed cells touching at least one open cell.
    pub shore: Vec<Point>,
    /// Closed cells touching no open cell. These are interchangeable in every constraint.
    pub sea: Vec<Point>,
}

impl Regions {
    pub fn classify(board: &Board) -> Self {
        let mut regions = Regions::default();
        for point in board.points() {
            match board.get(point) {
                Cell::Open(_) => regions.land.push(point),
                Cell::Closed | Cell::Flagged => {
                    let touches_land = board
                        .neighbors(point)
                        .any(|n| matches!(board.get(n), Cell::Open(_)));
                    if touches_land {
                        regions.shore.push(point);
                    } else {
                        regions.sea.push(point);
                    }
                }
            }
        }
        regions
    }

    pub fn closed_count(&self) -> usize {
        self.shore.len() + self.sea.len()
    }
}
