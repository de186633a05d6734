//! Search statistics and constraint tallies.

use std::fmt;

/// Counters accumulated across all solve calls (until `reset`).
#[derive(Debug, Default, Clone)]
pub struct SolverStats {
    /// Number of restart epochs entered.
    pub starts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub propagations: u64,
    /// Watcher-list entries inspected during propagation.
    pub inspects: u64,
    pub conflicts: u64,
    pub learned_clauses: u64,
    pub learned_binary_clauses: u64,
    pub learned_ternary_clauses: u64,
    /// Learned clauses of length one.
    pub learned_literals: u64,
    /// Literals dropped by reason simplification.
    pub reduced_literals: u64,
    /// Root-level database simplification passes.
    pub root_simplifications: u64,
    /// Learned-database deletion sweeps.
    pub reduced_db: u64,
    /// Relocating garbage collections of the clause arena.
    pub garbage_collections: u64,
    pub solves: u64,
}

impl SolverStats {
    pub fn reset(&mut self) {
        *self = SolverStats::default();
    }
}

impl fmt::Display for SolverStats {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        writeln!(out, "c starts\t\t: {}", self.starts)?;
        writeln!(out, "c conflicts\t\t: {}", self.conflicts)?;
        writeln!(
            out,
            "c decisions\t\t: {} ({} random)",
            self.decisions, self.rnd_decisions
        )?;
        writeln!(out, "c propagations\t\t: {}", self.propagations)?;
        writeln!(out, "c inspects\t\t: {}", self.inspects)?;
        writeln!(
            out,
            "c learned clauses\t: {} ({} binary, {} ternary, {} units)",
            self.learned_clauses,
            self.learned_binary_clauses,
            self.learned_ternary_clauses,
            self.learned_literals
        )?;
        writeln!(out, "c reduced literals\t: {}", self.reduced_literals)?;
        writeln!(out, "c reduced DB\t\t: {}", self.reduced_db)?;
        write!(
            out,
            "c root simplifications\t: {}",
            self.root_simplifications
        )
    }
}

/// How many constraints of each kind the solver currently tracks.
#[derive(Debug, Default, Clone)]
pub struct ConstrTypeTallies {
    pub clauses: u64,
    pub cardinalities: u64,
    /// Constraints that were already satisfied at the root and ignored.
    pub ignored_satisfied: u64,
}

impl ConstrTypeTallies {
    pub fn reset(&mut self) {
        *self = ConstrTypeTallies::default();
    }
}

impl fmt::Display for ConstrTypeTallies {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        writeln!(out, "c clauses => {}", self.clauses)?;
        writeln!(out, "c cardinality constraints => {}", self.cardinalities)?;
        write!(
            out,
            "c ignored satisfied constraints => {}",
            self.ignored_satisfied
        )
    }
}
