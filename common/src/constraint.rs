use std::fmt;
use std::ops::Not;

/// A signed Boolean variable reference. Variable ids start at 1; a positive
/// literal reads "this variable is true" (for cells: "this cell is a mine").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(i64);

impl Literal {
    pub fn positive(var: u32) -> Self {
        debug_assert!(var > 0, "variable ids start at 1");
        Literal(var as i64)
    }

    pub fn negative(var: u32) -> Self {
        !Literal::positive(var)
    }

    /// The literal asserting `var == value`.
    pub fn with_value(var: u32, value: bool) -> Self {
        if value {
            Literal::positive(var)
        } else {
            Literal::negative(var)
        }
    }

    pub fn var(&self) -> u32 {
        self.0.unsigned_abs() as u32
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal(-self.0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    AtMost,
    AtLeast,
}

/// A linear (in)equality over 0/1 variables: `Σ coef·lit <cmp> degree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbConstraint {
    pub terms: Vec<(i64, Literal)>,
    pub comparison: Comparison,
    pub degree: i64,
}

impl PbConstraint {
    pub fn new(terms: Vec<(i64, Literal)>, comparison: Comparison, degree: i64) -> Self {
        PbConstraint {
            terms,
            comparison,
            degree,
        }
    }

    /// Exactly `k` of `lits` are true.
    pub fn exactly(lits: impl IntoIterator<Item = Literal>, k: usize) -> Self {
        Self::cardinality(lits, Comparison::Equal, k)
    }

    pub fn at_most(lits: impl IntoIterator<Item = Literal>, k: usize) -> Self {
        Self::cardinality(lits, Comparison::AtMost, k)
    }

    pub fn at_least(lits: impl IntoIterator<Item = Literal>, k: usize) -> Self {
        Self::cardinality(lits, Comparison::AtLeast, k)
    }

    /// Pins a single variable to `value`.
    pub fn assign(var: u32, value: bool) -> Self {
        Self::exactly([Literal::positive(var)], value as usize)
    }

    fn cardinality(lits: impl IntoIterator<Item = Literal>, comparison: Comparison, k: usize) -> Self {
        PbConstraint {
            terms: lits.into_iter().map(|lit| (1, lit)).collect(),
            comparison,
            degree: k as i64,
        }
    }

    /// Rewrites the constraint with strictly positive coefficients and decides
    /// the cases that need no encoding at all.
    pub(crate) fn reduce(&self) -> Reduced {
        let mut degree = self.degree;
        let mut terms = Vec::with_capacity(self.terms.len());
        for &(coef, lit) in &self.terms {
            match coef {
                0 => {}
                c if c > 0 => terms.push((c as u64, lit)),
                // c·l = c + |c|·¬l
                c => {
                    degree -= c;
                    terms.push((c.unsigned_abs(), !lit));
                }
            }
        }
        let total: i64 = terms.iter().map(|&(c, _)| c as i64).sum();

        let reduced = match self.comparison {
            Comparison::AtMost if degree < 0 => Reduced::Infeasible,
            Comparison::AtMost if degree >= total => Reduced::Tautology,
            Comparison::AtMost if degree == 0 => Reduced::Fixed(pinned(&terms, false)),
            Comparison::AtLeast if degree <= 0 => Reduced::Tautology,
            Comparison::AtLeast if degree > total => Reduced::Infeasible,
            Comparison::AtLeast if degree == total => Reduced::Fixed(pinned(&terms, true)),
            Comparison::Equal if degree < 0 || degree > total => Reduced::Infeasible,
            Comparison::Equal if degree == 0 => Reduced::Fixed(pinned(&terms, false)),
            Comparison::Equal if degree == total => Reduced::Fixed(pinned(&terms, true)),
            comparison => Reduced::Linear {
                terms,
                comparison,
                degree: degree as u64,
            },
        };

        match reduced {
            Reduced::Fixed(lits) if lits.iter().any(|&l| lits.contains(&!l)) => Reduced::Infeasible,
            other => other,
        }
    }
}

fn pinned(terms: &[(u64, Literal)], value: bool) -> Vec<Literal> {
    terms
        .iter()
        .map(|&(_, lit)| if value { lit } else { !lit })
        .collect()
}

/// Outcome of [`PbConstraint::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reduced {
    /// Satisfied by every assignment.
    Tautology,
    /// Satisfied by no assignment.
    Infeasible,
    /// Satisfied exactly when every listed literal is true.
    Fixed(Vec<Literal>),
    /// Positive coefficients, `0 < degree < Σ coef`.
    Linear {
        terms: Vec<(u64, Literal)>,
        comparison: Comparison,
        degree: u64,
    },
}
