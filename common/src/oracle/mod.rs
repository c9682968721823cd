//! The satisfiability oracle the solvers drive.
//!
//! The solvers only talk to the [`Oracle`] trait. [`VarisatOracle`] is the
//! production implementation on top of `varisat`; tests swap in wrappers that
//! time out on purpose.

mod cnf;
mod sat;

use std::collections::HashSet;

use thiserror::Error;

use crate::constraint::{Literal, PbConstraint};

pub use sat::VarisatOracle;

/// Identifies a constraint so it can be retracted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u64);

/// Raised when a constraint cannot be added because it directly conflicts
/// with the active ones. This is a proof, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("constraint contradicts the active constraints")]
pub struct Contradiction;

/// The variables a satisfying assignment sets to true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    true_vars: HashSet<u32>,
}

impl Model {
    pub fn from_true_vars(vars: impl IntoIterator<Item = u32>) -> Self {
        Model {
            true_vars: vars.into_iter().collect(),
        }
    }

    pub fn value(&self, var: u32) -> bool {
        self.true_vars.contains(&var)
    }

    pub fn satisfies(&self, lit: Literal) -> bool {
        self.value(lit.var()) == lit.is_positive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
    Satisfiable(Model),
    Unsatisfiable,
    /// The oracle gave up without an answer.
    Timeout,
}

/// An incremental pseudo-Boolean satisfiability oracle.
pub trait Oracle {
    /// Adds a retractable constraint to the active set.
    fn add_constraint(&mut self, constraint: &PbConstraint) -> Result<ConstraintHandle, Contradiction>;

    /// Retracts a constraint. Unknown handles are ignored.
    fn remove_constraint(&mut self, handle: ConstraintHandle);

    /// Permanently forbids the given assignment: at least one of the literals
    /// must be false in every later model.
    fn add_blocking_clause(&mut self, assignment: &[Literal]);

    /// Decides the active constraints plus all blocking clauses.
    fn solve(&mut self) -> SatOutcome;

    /// Forgets every constraint and clause.
    fn reset(&mut self);
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn add_constraint(&mut self, constraint: &PbConstraint) -> Result<ConstraintHandle, Contradiction> {
        (**self).add_constraint(constraint)
    }

    fn remove_constraint(&mut self, handle: ConstraintHandle) {
        (**self).remove_constraint(handle)
    }

    fn add_blocking_clause(&mut self, assignment: &[Literal]) {
        (**self).add_blocking_clause(assignment)
    }

    fn solve(&mut self) -> SatOutcome {
        (**self).solve()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
