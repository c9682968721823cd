use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Represents a 2D coordinate on the board. This is the identity of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }

    /// Key that orders points row by row.
    pub fn row_major(&self) -> (usize, usize) {
        (self.y, self.x)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The visible state of a single cell, as reported by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Closed,
    Open(u8), // The u8 is the number of adjacent mines.
    /// A player mark. The engine does not trust it and reasons about the cell as closed.
    Flagged,
}

impl Cell {
    /// Closed or flagged: the cell's content is still unknown.
    pub fn is_unrevealed(&self) -> bool {
        !matches!(self, Cell::Open(_))
    }
}

/// Read-only snapshot of a board handed to the engine by the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    /// The total number of mines the board contains. This acts as a global constraint.
    pub mines: usize,
    /// Row-major cells, `cells[y][x]`.
    pub cells: Vec<Vec<Cell>>,
}

impl Board {
    /// A board with every cell closed.
    pub fn new(width: usize, height: usize, mines: usize) -> Self {
        Board {
            width,
            height,
            mines,
            cells: vec![vec![Cell::Closed; width]; height],
        }
    }

    /// Builds a board from rows, checking only that the grid is rectangular.
    pub fn from_rows(mines: usize, cells: Vec<Vec<Cell>>) -> Result<Self, BoardError> {
        let height = cells.len();
        let width = cells.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(BoardError::Empty);
        }
        if let Some((row, found)) = cells
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != width)
        {
            return Err(BoardError::RaggedRow {
                row,
                expected: width,
                found,
            });
        }
        Ok(Board {
            width,
            height,
            mines,
            cells,
        })
    }

    /// Parses the text form: one row per line, `#` closed, `F` flagged and
    /// `0`-`8` for open cells. Blank lines and surrounding whitespace are ignored.
    pub fn parse(text: &str, mines: usize) -> Result<Self, BoardError> {
        let mut rows = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .chars()
                .enumerate()
                .map(|(column, symbol)| match symbol {
                    '#' | '?' => Ok(Cell::Closed),
                    'F' | 'f' => Ok(Cell::Flagged),
                    '0'..='8' => Ok(Cell::Open(symbol as u8 - b'0')),
                    _ => Err(BoardError::UnknownSymbol {
                        line: line_no + 1,
                        column: column + 1,
                        symbol,
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Board::from_rows(mines, rows)
    }

    pub fn get(&self, at: Point) -> Cell {
        self.cells[at.y][at.x]
    }

    pub fn set(&mut self, at: Point, cell: Cell) {
        self.cells[at.y][at.x] = cell;
    }

    /// All points, row by row.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Point { x, y }))
    }

    /// All valid neighbour coordinates of `point`, handling edges and corners.
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> + use<> {
        let width = self.width;
        let height = self.height;

        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    return None;
                }

                let nx = point.x as isize + dx;
                let ny = point.y as isize + dy;

                if nx >= 0 && nx < width as isize && ny >= 0 && ny < height as isize {
                    Some(Point {
                        x: nx as usize,
                        y: ny as usize,
                    })
                } else {
                    None
                }
            })
        })
    }

    /// Number of closed, unflagged neighbours of `point`.
    pub fn closed_neighbor_count(&self, point: Point) -> usize {
        self.neighbors(point)
            .filter(|&n| self.get(n) == Cell::Closed)
            .count()
    }

    /// Variable id of the "is a mine" indicator of `point`. Ids start at 1.
    pub fn literal_id(&self, point: Point) -> u32 {
        (point.y * self.width + point.x + 1) as u32
    }

    /// Inverse of [`Board::literal_id`]; `None` for ids outside the grid.
    pub fn point_of(&self, id: u32) -> Option<Point> {
        let index = (id as usize).checked_sub(1)?;
        (index < self.width * self.height).then(|| Point {
            x: index % self.width,
            y: index / self.width,
        })
    }

    /// Largest cell variable id. Auxiliary variables are allocated above it.
    pub fn max_literal_id(&self) -> u32 {
        (self.width * self.height) as u32
    }

    /// Checks every precondition the solvers rely on.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.width == 0 || self.height == 0 || self.cells.is_empty() {
            return Err(BoardError::Empty);
        }
        if self.cells.len() != self.height {
            return Err(BoardError::CellCountMismatch {
                expected: self.height,
                found: self.cells.len(),
            });
        }
        for (row, cells) in self.cells.iter().enumerate() {
            if cells.len() != self.width {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: self.width,
                    found: cells.len(),
                });
            }
        }

        let total = self.width * self.height;
        if self.mines > total {
            return Err(BoardError::TooManyMines {
                mines: self.mines,
                cells: total,
            });
        }

        let mut closed = 0;
        for at in self.points() {
            match self.get(at) {
                Cell::Open(number) => {
                    if number > 8 {
                        return Err(BoardError::InvalidNumber { at, number });
                    }
                    let unrevealed = self
                        .neighbors(at)
                        .filter(|&n| self.get(n).is_unrevealed())
                        .count();
                    if number as usize > unrevealed {
                        return Err(BoardError::NumberExceedsClosedNeighbors {
                            at,
                            number,
                            closed: unrevealed,
                        });
                    }
                }
                Cell::Closed | Cell::Flagged => closed += 1,
            }
        }
        if self.mines > closed {
            return Err(BoardError::MinesExceedClosed {
                mines: self.mines,
                closed,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let symbol = match cell {
                    Cell::Closed => '#',
                    Cell::Flagged => 'F',
                    Cell::Open(n) => (b'0' + n) as char,
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_neighbors() {
        let board = Board::new(3, 3, 1);

        // Corner cell (0,0) should have 3 neighbors
        assert_eq!(board.neighbors(Point::new(0, 0)).count(), 3);
        // Center cell (1,1) should have 8 neighbors
        assert_eq!(board.neighbors(Point::new(1, 1)).count(), 8);
        // Edge cell (1,0) should have 5 neighbors
        assert_eq!(board.neighbors(Point::new(1, 0)).count(), 5);
    }

    #[test]
    fn test_literal_ids_are_a_bijection() {
        let board = Board::new(4, 3, 2);
        let ids: Vec<u32> = board.points().map(|p| board.literal_id(p)).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
        for p in board.points() {
            assert_eq!(board.point_of(board.literal_id(p)), Some(p));
        }
        assert_eq!(board.point_of(0), None);
        assert_eq!(board.point_of(13), None);
        assert_eq!(board.max_literal_id(), 12);
    }

    #[test]
    fn test_parse_and_display() {
        let text = "#F1\n220\n###\n";
        let board = Board::parse(text, 2).unwrap();
        assert_eq!((board.width, board.height, board.mines), (3, 3, 2));
        assert_eq!(board.get(Point::new(1, 0)), Cell::Flagged);
        assert_eq!(board.get(Point::new(1, 1)), Cell::Open(2));
        assert_eq!(board.to_string(), text);
    }

    #[test]
    fn test_parse_rejects_unknown_symbols() {
        let err = Board::parse("#x\n##", 1).unwrap_err();
        assert_eq!(
            err,
            BoardError::UnknownSymbol {
                line: 1,
                column: 2,
                symbol: 'x'
            }
        );
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = Board::parse("###\n##", 1).unwrap_err();
        assert!(matches!(err, BoardError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn test_validate_mine_budget() {
        assert!(Board::new(3, 3, 9).validate().is_ok());
        assert!(matches!(
            Board::new(3, 3, 10).validate(),
            Err(BoardError::TooManyMines { .. })
        ));
        let board = Board::parse("###\n#1#\n###", 8).unwrap();
        assert!(board.validate().is_ok());
        let board = Board::parse("##\n#1", 4).unwrap();
        assert_eq!(
            board.validate(),
            Err(BoardError::MinesExceedClosed { mines: 4, closed: 3 })
        );
    }

    #[test]
    fn test_validate_numbers() {
        let board = Board::parse("1#\n11", 1).unwrap();
        assert!(board.validate().is_ok());

        let board = Board::parse("2#\n11", 1).unwrap();
        assert_eq!(
            board.validate(),
            Err(BoardError::NumberExceedsClosedNeighbors {
                at: Point::new(0, 0),
                number: 2,
                closed: 1
            })
        );

        let mut board = Board::new(2, 2, 1);
        board.set(Point::new(0, 0), Cell::Open(9));
        assert!(matches!(
            board.validate(),
            Err(BoardError::InvalidNumber { number: 9, .. })
        ));
    }

    #[test]
    fn test_closed_neighbor_count_ignores_flags() {
        let board = Board::parse("#F#\n#1#\n###", 1).unwrap();
        assert_eq!(board.closed_neighbor_count(Point::new(1, 1)), 7);
    }
}
