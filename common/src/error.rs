use thiserror::Error;

use crate::board::Point;

/// A board snapshot that cannot describe any real game position.
///
/// These are caller bugs and are reported before any constraint is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board must have a positive width and height")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{mines} mines do not fit on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
    #[error("{mines} mines but only {closed} cells are still closed")]
    MinesExceedClosed { mines: usize, closed: usize },
    #[error("open cell ({}, {}) shows {number}, which is not a neighbour count", .at.x, .at.y)]
    InvalidNumber { at: Point, number: u8 },
    #[error("open cell ({}, {}) shows {number} but has only {closed} closed neighbours", .at.x, .at.y)]
    NumberExceedsClosedNeighbors { at: Point, number: u8, closed: usize },
    #[error("unknown symbol {symbol:?} at line {line}, column {column}")]
    UnknownSymbol {
        line: usize,
        column: usize,
        symbol: char,
    },
    #[error("expected {expected} cells, got {found}")]
    CellCountMismatch { expected: usize, found: usize },
}

/// Everything a solve call can report back to its caller.
///
/// Contradictions raised while building constraints never show up here; they
/// are proofs and are consumed by the solvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("invalid board: {0}")]
    InvalidBoard(#[from] BoardError),
    #[error("no mine placement is consistent with the revealed cells")]
    Inconsistent,
    #[error("the satisfiability oracle ran out of time")]
    Timeout,
    #[error("the solve was cancelled")]
    Cancelled,
    #[error("{closed} closed cells exceed the exhaustive search limit of {limit}")]
    Intractable { closed: usize, limit: usize },
}
