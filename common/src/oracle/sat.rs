use std::collections::{BTreeMap, HashMap};

use log::warn;
use varisat::{ExtendFormula, Lit, Solver, Var};

use super::cnf::GuardedCnf;
use super::{ConstraintHandle, Contradiction, Model, Oracle, SatOutcome};
use crate::constraint::{Literal, PbConstraint, Reduced};

/// A constraint that is currently in force.
struct Scope {
    /// Assumed true while the constraint is active; every clause of the
    /// constraint is disabled by it being false.
    selector: Var,
    /// Literals the constraint forces on its own.
    pinned: Vec<Literal>,
}

/// [`Oracle`] backed by the `varisat` CDCL solver.
///
/// Retraction uses selector variables: a constraint's clauses are all guarded
/// by its selector, which is passed as an assumption to every solve call while
/// the constraint is active and fixed to false once it is removed.
pub struct VarisatOracle {
    solver: Solver<'static>,
    /// Engine variable id to solver variable.
    vars: HashMap<u32, Var>,
    /// Solver variable index back to engine variable id.
    ids: HashMap<usize, u32>,
    active: BTreeMap<ConstraintHandle, Scope>,
    next_handle: u64,
    /// An empty blocking clause was added; nothing is satisfiable any more.
    exhausted: bool,
}

impl VarisatOracle {
    pub fn new() -> Self {
        VarisatOracle {
            solver: Solver::new(),
            vars: HashMap::new(),
            ids: HashMap::new(),
            active: BTreeMap::new(),
            next_handle: 0,
            exhausted: false,
        }
    }

    fn lit(&mut self, literal: Literal) -> Lit {
        let id = literal.var();
        let var = match self.vars.get(&id) {
            Some(&var) => var,
            None => {
                let var = self.solver.new_var();
                self.vars.insert(id, var);
                self.ids.insert(var.index(), id);
                var
            }
        };
        Lit::from_var(var, literal.is_positive())
    }

    fn is_pinned(&self, literal: Literal) -> bool {
        self.active
            .values()
            .any(|scope| scope.pinned.contains(&literal))
    }

    fn decode(&self, model: &[Lit]) -> Model {
        Model::from_true_vars(
            model
                .iter()
                .filter(|lit| lit.is_positive())
                .filter_map(|lit| self.ids.get(&lit.var().index()).copied()),
        )
    }
}

impl Default for VarisatOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl Oracle for VarisatOracle {
    fn add_constraint(&mut self, constraint: &PbConstraint) -> Result<ConstraintHandle, Contradiction> {
        let reduced = constraint.reduce();
        let pinned = match &reduced {
            Reduced::Infeasible => return Err(Contradiction),
            Reduced::Fixed(lits) => lits.clone(),
            Reduced::Tautology | Reduced::Linear { .. } => Vec::new(),
        };
        if pinned.iter().any(|&lit| self.is_pinned(!lit)) {
            return Err(Contradiction);
        }

        let selector = self.solver.new_var();
        let guard = Lit::from_var(selector, true);
        match reduced {
            Reduced::Tautology | Reduced::Infeasible => {}
            Reduced::Fixed(lits) => {
                for literal in lits {
                    let lit = self.lit(literal);
                    self.solver.add_clause(&[lit, !guard]);
                }
            }
            Reduced::Linear {
                terms,
                comparison,
                degree,
            } => {
                let terms: Vec<(u64, Lit)> = terms
                    .into_iter()
                    .map(|(coef, literal)| (coef, self.lit(literal)))
                    .collect();
                GuardedCnf::new(&mut self.solver, guard).linear(&terms, comparison, degree);
            }
        }

        let handle = ConstraintHandle(self.next_handle);
        self.next_handle += 1;
        self.active.insert(handle, Scope { selector, pinned });
        Ok(handle)
    }

    fn remove_constraint(&mut self, handle: ConstraintHandle) {
        if let Some(scope) = self.active.remove(&handle) {
            self.solver
                .add_clause(&[Lit::from_var(scope.selector, false)]);
        }
    }

    fn add_blocking_clause(&mut self, assignment: &[Literal]) {
        if assignment.is_empty() {
            self.exhausted = true;
            return;
        }
        let clause: Vec<Lit> = assignment.iter().map(|&literal| !self.lit(literal)).collect();
        self.solver.add_clause(&clause);
    }

    fn solve(&mut self) -> SatOutcome {
        if self.exhausted {
            return SatOutcome::Unsatisfiable;
        }

        let assumptions: Vec<Lit> = self
            .active
            .values()
            .map(|scope| Lit::from_var(scope.selector, true))
            .collect();
        self.solver.assume(&assumptions);

        match self.solver.solve() {
            Ok(true) => match self.solver.model() {
                Some(model) => SatOutcome::Satisfiable(self.decode(&model)),
                None => {
                    warn!("varisat reported sat without a model");
                    SatOutcome::Timeout
                }
            },
            Ok(false) => SatOutcome::Unsatisfiable,
            Err(err) => {
                warn!("varisat gave up: {err:?}");
                SatOutcome::Timeout
            }
        }
    }

    fn reset(&mut self) {
        *self = VarisatOracle::new();
    }
}
