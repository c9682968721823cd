use crate::board::{Board, Cell, Point};
use crate::constraint::{Comparison, Literal, PbConstraint};
use crate::error::SolveError;
use crate::oracle::Oracle;
use crate::region::Regions;

/// The base constraint system of one solve call.
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    pub constraints: Vec<PbConstraint>,
    /// Binary digits of the number of mines in the sea, least significant first.
    pub sea_bits: Vec<Literal>,
}

impl ConstraintSystem {
    /// Adds every constraint to a freshly reset oracle. A contradiction among
    /// the base constraints means the revealed numbers cannot all hold.
    pub fn install<O: Oracle + ?Sized>(&self, oracle: &mut O) -> Result<(), SolveError> {
        oracle.reset();
        for constraint in &self.constraints {
            oracle
                .add_constraint(constraint)
                .map_err(|_| SolveError::Inconsistent)?;
        }
        Ok(())
    }
}

/// Number of binary digits needed to count up to `n`, i.e. `ceil(log2(n + 1))`.
pub fn bits_for(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}

/// Translates the board into pseudo-Boolean constraints over one "is a mine"
/// variable per cell plus the sea counter digits.
///
/// Sea cells appear in a single symmetric sum, tied to the counter digits,
/// so the global mine count is stated over the shore cells and the counter.
pub fn encode(board: &Board, regions: &Regions) -> ConstraintSystem {
    let mut constraints = Vec::new();
    let cell = |p: Point| Literal::positive(board.literal_id(p));

    // Open cells are never mines.
    for &land in &regions.land {
        constraints.push(PbConstraint::assign(board.literal_id(land), false));
    }

    // Each revealed number counts the mines among its unrevealed neighbours.
    for &land in &regions.land {
        let Cell::Open(number) = board.get(land) else {
            continue;
        };
        let neighbours: Vec<Literal> = board
            .neighbors(land)
            .filter(|&n| board.get(n).is_unrevealed())
            .map(cell)
            .collect();
        if !neighbours.is_empty() {
            constraints.push(PbConstraint::exactly(neighbours, number as usize));
        }
    }

    let first_aux = board.max_literal_id() + 1;
    let sea_bits: Vec<Literal> = (0..bits_for(regions.sea.len()))
        .map(|bit| Literal::positive(first_aux + bit as u32))
        .collect();
    let weighted_bits = || {
        sea_bits
            .iter()
            .enumerate()
            .map(|(bit, &lit)| (1i64 << bit, lit))
    };

    if !regions.sea.is_empty() {
        let sea = regions.sea.len() as i64;
        constraints.push(PbConstraint::new(
            weighted_bits().collect(),
            Comparison::AtMost,
            sea,
        ));

        // Σ sea - Σ 2^i·b_i = 0
        let link = regions
            .sea
            .iter()
            .map(|&p| (1, cell(p)))
            .chain(weighted_bits().map(|(w, lit)| (-w, lit)))
            .collect();
        constraints.push(PbConstraint::new(link, Comparison::Equal, 0));
    }

    let global = regions
        .shore
        .iter()
        .map(|&p| (1, cell(p)))
        .chain(weighted_bits())
        .collect();
    constraints.push(PbConstraint::new(
        global,
        Comparison::Equal,
        board.mines as i64,
    ));

    ConstraintSystem {
        constraints,
        sea_bits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_for() {
        assert_eq!(bits_for(0), 0);
        assert_eq!(bits_for(1), 1);
        assert_eq!(bits_for(3), 2);
        assert_eq!(bits_for(4), 3);
        assert_eq!(bits_for(255), 8);
        assert_eq!(bits_for(256), 9);
    }

    #[test]
    fn test_encoding_without_sea() {
        let board = Board::parse("###\n220\n###", 2).unwrap();
        let regions = Regions::classify(&board);
        let system = encode(&board, &regions);

        assert!(system.sea_bits.is_empty());
        // 3 safety pins, 3 neighbour sums, 1 global count.
        assert_eq!(system.constraints.len(), 7);

        let global = system.constraints.last().unwrap();
        assert_eq!(global.comparison, Comparison::Equal);
        assert_eq!(global.degree, 2);
        assert_eq!(global.terms.len(), 6);
        assert!(global.terms.iter().all(|&(c, _)| c == 1));

        // The 0 in the middle row constrains its four closed neighbours.
        let zero = &system.constraints[5];
        assert_eq!(zero.degree, 0);
        let ids: Vec<u32> = zero.terms.iter().map(|(_, l)| l.var()).collect();
        let expected: Vec<u32> = [(1, 0), (2, 0), (1, 2), (2, 2)]
            .iter()
            .map(|&(x, y)| board.literal_id(Point::new(x, y)))
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_sea_counter_digits() {
        let board = Board::new(3, 2, 2);
        let regions = Regions::classify(&board);
        let system = encode(&board, &regions);

        // Six sea cells need three digits, allocated after the cell ids.
        assert_eq!(
            system.sea_bits,
            vec![
                Literal::positive(7),
                Literal::positive(8),
                Literal::positive(9)
            ]
        );

        let bound = &system.constraints[0];
        assert_eq!(bound.comparison, Comparison::AtMost);
        assert_eq!(bound.degree, 6);
        assert_eq!(
            bound.terms.iter().map(|&(c, _)| c).collect::<Vec<_>>(),
            vec![1, 2, 4]
        );

        let link = &system.constraints[1];
        assert_eq!(link.degree, 0);
        assert_eq!(link.terms.len(), 9);
        assert_eq!(link.terms.iter().map(|&(c, _)| c).sum::<i64>(), 6 - 7);

        let global = &system.constraints[2];
        assert_eq!(global.degree, 2);
        assert_eq!(global.terms.len(), 3);
    }
}
