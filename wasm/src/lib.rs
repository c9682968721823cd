use mine_inference as mi;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

// Cell codes shared with the JS side: -1 closed, -2 flagged, 0..=8 open.
const CLOSED: i8 = -1;
const FLAGGED: i8 = -2;

fn decode(width: usize, height: usize, mines: usize, cells: &[i8]) -> Result<mi::Board, String> {
    if width == 0 || height == 0 {
        return Err(mi::BoardError::Empty.to_string());
    }
    if cells.len() != width * height {
        return Err(mi::BoardError::CellCountMismatch {
            expected: width * height,
            found: cells.len(),
        }
        .to_string());
    }
    let rows = cells
        .chunks(width)
        .map(|row| {
            row.iter()
                .map(|&code| match code {
                    CLOSED => Ok(mi::Cell::Closed),
                    FLAGGED => Ok(mi::Cell::Flagged),
                    0..=8 => Ok(mi::Cell::Open(code as u8)),
                    _ => Err(format!("unknown cell code {code}")),
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    let board = mi::Board::from_rows(mines, rows).map_err(|e| e.to_string())?;
    board.validate().map_err(|e| e.to_string())?;
    Ok(board)
}

fn index(board: &mi::Board, p: mi::Point) -> usize {
    p.y * board.width + p.x
}

/// Per cell: 1 proven mine, 0 proven safe, -1 unknown or not closed.
#[wasm_bindgen]
pub fn known_cells(width: usize, height: usize, mines: usize, cells: Vec<i8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = decode(width, height, mines, &cells)?;
    let known = mi::known_cells(&board).map_err(|e| e.to_string())?;
    let mut out = vec![-1; cells.len()];
    for (p, mine) in known {
        out[index(&board, p)] = mine as i8;
    }
    Ok(out)
}

/// Per cell mine probability, NaN for open and flagged cells.
#[wasm_bindgen]
pub fn probabilities(width: usize, height: usize, mines: usize, cells: Vec<i8>) -> Result<Vec<f64>, String> {
    console_error_panic_hook::set_once();

    let board = decode(width, height, mines, &cells)?;
    let probs = mi::probabilities(&board).map_err(|e| e.to_string())?;
    let mut out = vec![f64::NAN; cells.len()];
    for (p, prob) in &probs {
        out[index(&board, *p)] = mi::approximate(prob);
    }
    Ok(out)
}

/// Row-major index of the cell to reveal next, if any.
#[wasm_bindgen]
pub fn best_move(width: usize, height: usize, mines: usize, cells: Vec<i8>, seed: u64) -> Result<Option<u32>, String> {
    console_error_panic_hook::set_once();

    let board = decode(width, height, mines, &cells)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let chosen = mi::best_move(&board, &mut rng).map_err(|e| e.to_string())?;
    Ok(chosen.map(|p| index(&board, p) as u32))
}
