//! Observer hooks into the search.
//!
//! A listener watches the search without steering it: every method has a
//! no-op default, and all state it sees is read-only. The single feedback
//! channel is the return value of [`SearchListener::solution_found`]: a
//! listener may hand back a blocking clause, which the solver adds before
//! resuming the search. This is how model enumeration works — listeners
//! never call back into the solver, so there is no reentrancy.
//!
//! Literal arguments use the external DIMACS encoding.

use crate::clause::{lbool, Lit};
use crate::constr::ConstrRef;

pub trait SearchListener {
    /// A solve call is being set up.
    fn init(&mut self, _n_vars: usize) {}
    /// The search is starting.
    fn start(&mut self) {}
    /// The search ended with the given verdict (`UNDEF` on timeout).
    fn end(&mut self, _status: lbool) {}
    /// A decision literal is being assumed.
    fn assuming(&mut self, _p: i32) {}
    /// A literal is being propagated.
    fn propagating(&mut self, _p: i32) {}
    /// A decision literal is being undone.
    fn backtracking(&mut self, _p: i32) {}
    /// The asserting literal of a learned constraint is being added.
    fn adding(&mut self, _p: i32) {}
    /// A constraint was learned.
    fn learn(&mut self, _clause: &[Lit]) {}
    /// A propagation-time conflict was found.
    fn conflict_found(&mut self, _confl: ConstrRef, _decision_level: u32, _trail_size: usize) {}
    /// An assumption was directly conflicting.
    fn assumption_conflict(&mut self, _p: i32) {}
    /// Top of the search loop.
    fn begin_loop(&mut self) {}
    /// A model was found. Return a blocking clause (DIMACS literals) to
    /// reject it and continue the search, or `None` to accept it.
    fn solution_found(&mut self, _model: &[i32]) -> Option<Vec<i32>> {
        None
    }
    /// The solver jumps back to the given decision level.
    fn backjump(&mut self, _level: u32) {}
    /// The learned database is about to be cleaned.
    fn cleaning(&mut self) {}
    /// The solver restarts.
    fn restarting(&mut self) {}
}

/// The silent default listener.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoidTracing;

impl SearchListener for VoidTracing {}

/// Enumerates models by blocking each one as it is found.
///
/// The search then terminates with a `false` verdict once the blocked
/// formula is refuted, at which point `n_solutions` holds the count.
#[derive(Debug, Default)]
pub struct SearchEnumerator {
    n_solutions: u64,
    models: Vec<Vec<i32>>,
    keep_models: bool,
}

impl SearchEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record every model instead of just counting them.
    pub fn keeping_models() -> Self {
        SearchEnumerator {
            keep_models: true,
            ..Default::default()
        }
    }

    pub fn n_solutions(&self) -> u64 {
        self.n_solutions
    }

    pub fn models(&self) -> &[Vec<i32>] {
        &self.models
    }
}

impl SearchListener for SearchEnumerator {
    fn solution_found(&mut self, model: &[i32]) -> Option<Vec<i32>> {
        self.n_solutions += 1;
        if self.keep_models {
            self.models.push(model.to_vec());
        }
        Some(model.iter().map(|&l| -l).collect())
    }

    fn end(&mut self, status: lbool) {
        debug_assert!(status != lbool::TRUE || self.n_solutions > 0);
    }
}
