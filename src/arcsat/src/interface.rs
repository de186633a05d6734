/* Main Interface */

use crate::clause::lbool;
use crate::constr::ConstrId;
use crate::errors::{ContradictionError, TimeoutError};

/// The public face of the solver: declare variables, load constraints,
/// solve (optionally under assumptions), and read the verdict back.
///
/// Literals are exchanged in the external DIMACS encoding: a non-zero
/// `i32` whose absolute value is the variable id and whose sign is the
/// polarity. `0` is rejected.
pub trait SolverInterface {
    /// Number of variables declared by the caller (or seen so far).
    fn n_vars(&self) -> u32;

    /// Number of variables actually allocated, including auxiliary
    /// variables handed out by `next_free_var_id`.
    fn real_n_vars(&self) -> u32;

    /// Number of tracked constraints.
    fn n_constraints(&self) -> usize;

    /// Declare that variables `1..=n` exist. Returns `n`.
    fn new_vars(&mut self, n: u32) -> u32;

    /// Allocate (or merely peek at) the next auxiliary variable id.
    fn next_free_var_id(&mut self, reserve: bool) -> i32;

    /// Make sure the variable behind a DIMACS literal exists.
    fn register_literal(&mut self, p: i32);

    /// Add a clause (disjunction of literals).
    ///
    /// Returns `None` when the clause is discarded as trivially satisfied;
    /// fails when it is empty or conflicts at the root level.
    fn add_clause(&mut self, lits: &[i32]) -> Result<Option<ConstrId>, ContradictionError>;

    /// Require at least `degree` of `lits` to be true.
    fn add_at_least(
        &mut self,
        lits: &[i32],
        degree: i32,
    ) -> Result<Option<ConstrId>, ContradictionError>;

    /// Require at most `degree` of `lits` to be true.
    fn add_at_most(
        &mut self,
        lits: &[i32],
        degree: i32,
    ) -> Result<Option<ConstrId>, ContradictionError>;

    /// Require exactly `n` of `lits` to be true. Returns the handles of
    /// the underlying constraints.
    fn add_exactly(&mut self, lits: &[i32], n: i32) -> Result<Vec<ConstrId>, ContradictionError>;

    /// Remove a tracked constraint. Clears all learned clauses.
    fn remove_constr(&mut self, id: ConstrId) -> bool;

    /// Remove the most recently added constraint (cheaper: the learned
    /// clauses survive). Panics if `id` is not the last one added.
    fn remove_subsumed_constr(&mut self, id: ConstrId) -> bool;

    fn is_satisfiable(&mut self) -> Result<bool, TimeoutError>;

    /// Solve under the given assumption literals; they hold for this call
    /// only.
    fn is_satisfiable_under(&mut self, assumps: &[i32]) -> Result<bool, TimeoutError>;

    /// Solve and hand the model back, or `None` when unsatisfiable.
    fn find_model(&mut self, assumps: &[i32]) -> Result<Option<Vec<i32>>, TimeoutError>;

    /// The satisfying assignment found by the last successful solve, as
    /// signed DIMACS variables. Panics if no model is available.
    fn model(&self) -> &[i32];

    /// Value of a declared variable in the last model. Panics when no
    /// model is available or the variable id is out of range.
    fn model_value(&self, var: i32) -> bool;

    /// Shrink the last model to a prime implicant.
    fn prime_implicant(&mut self) -> Vec<i32>;

    /// After an unsatisfiable answer: a subset of the assumption vector
    /// whose conjunction with the constraints is unsatisfiable. Panics if
    /// the last solve did not answer `false`.
    fn unsat_explanation(&self) -> &[i32];

    /// Current root-level knowledge about a literal.
    fn truth_value(&self, lit: i32) -> lbool;

    /// Forget constraints, learned clauses and variables.
    fn reset(&mut self);

    /// Ask a running solve call to give up; safe from any thread.
    fn stop(&self);
}
