/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::card::CardConstr,
    crate::clause::{
        lbool, CRef, ClauseAllocator, DeletePred, LMap, Lit, OccLists, OccListsData, VMap, Var,
    },
    crate::constr::{ConstrId, ConstrKind, ConstrRef},
    crate::errors::{ContradictionError, TimeoutError},
    crate::interface::SolverInterface,
    crate::intmap::{Comparator, Heap, HeapData},
    crate::listener::SearchListener,
    crate::reduce::{ConflictTimerAdapter, LbdFlags, LearnedDeletion, ReduceTimer, TimerEvent},
    crate::restart::{RestartPolicy, Restarter},
    crate::stats::{ConstrTypeTallies, SolverStats},
    std::{
        cmp, mem,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    },
};

#[cfg(feature = "logging")]
use crate::clause::display::Print;

/// The main solver structure.
///
/// A `Solver` holds the whole engine state: the assignment, the clause
/// arena, the cardinality pool, the learned database and the pluggable
/// restart/deletion/simplification strategies. It is parametrized by a
/// [`SearchListener`] observing the search.
pub struct Solver<L: SearchListener> {
    /// If the problem is satisfiable, the model as signed DIMACS variables.
    model: Vec<i32>,
    has_model: bool,
    /// Dense model indexed by variable (0-based), over all allocated variables.
    boolean_model: Vec<bool>,
    /// Model including auxiliary variables beyond the declared maximum.
    full_model: Vec<i32>,
    /// Model literals that were decisions / implications, for the prime
    /// implicant computation.
    decisions_in_model: Vec<i32>,
    implied_in_model: Vec<i32>,
    /// After an unsatisfiable answer, the subset of the assumptions that
    /// already conflicts with the constraints.
    unsat_explanation: Option<Vec<i32>>,

    listener: L,

    /// Flipped by the timeout timer or by `stop()`; checked at the top of
    /// every search iteration.
    expire: Arc<AtomicBool>,
    timer: Option<TimerHandle>,
    conflict_timeout: Option<ConflictTimerAdapter>,
    global_armed: bool,
    timeout: TimeoutSpec,

    /// Tracked constraints; slots are cleared on removal so that the
    /// `ConstrId` handles handed to the caller stay stable.
    constrs: Vec<Option<ConstrRef>>,
    /// Learned clauses, subject to the deletion strategy.
    learnts: Vec<CRef>,
    /// Level-0 literals learned in previous solve calls, stashed between
    /// calls and replayed at the start of the next one.
    learned_literals: Vec<Lit>,

    restarter: Restarter,
    reduce_timer: ReduceTimer,
    need_reduce: bool,
    lbd_flags: LbdFlags,

    root_level: u32,
    /// Cleared when the decision heuristic runs dry while the assignment
    /// is incomplete: the next root-level conflict then proves nothing.
    last_conflict_means_unsat: bool,

    analysis: AnalysisResult,
    preason: Vec<Lit>,

    opts: SolverOpts,
    tallies: ConstrTypeTallies,

    v: SolverV,
}

/// Per-variable bookkeeping: assignment, reason, level, activity, phase.
struct VarState {
    ass: VMap<lbool>,
    vardata: VMap<VarData>,
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// The last polarity each variable was assigned with.
    polarity: VMap<bool>,
    /// Amount to bump the next touched variable with.
    var_inc: f64,
    /// Multiplier applied to `var_inc` on decay (reciprocal of the decay
    /// parameter, so the increment grows).
    var_decay: f64,

    /// Assignment stack; stores all assignments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for the decision levels in `trail`.
    trail_lim: Vec<i32>,
}

struct SolverV {
    vars: VarState,

    /// `watches[lit]` watchers to run when `lit` becomes true.
    watches_data: OccListsData<Lit, Watcher>,
    /// Per-literal undo records for counter-based constraints.
    undos: LMap<Vec<u32>>,
    cards: Vec<CardConstr>,
    ca: ClauseAllocator,
    order_heap_data: HeapData<Var>,
    seen: VMap<bool>,
    analyze_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,

    /// Head of the propagation queue, as an index into the trail.
    qhead: i32,
    /// If `false`, the constraints are already unsatisfiable at the root.
    ok: bool,

    /// Amount to bump the next learned clause with, and its growth factor.
    cla_inc: f64,
    cla_decay: f64,

    random_seed: f64,
    random_var_freq: f64,

    next_var: Var,
    declared_max_var: u32,

    stats: SolverStats,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: ConstrRef,
    level: i32,
}

impl VarData {
    const UNASSIGNED: VarData = VarData {
        reason: ConstrRef::UNDEF,
        level: -1,
    };
}

impl Default for VarData {
    fn default() -> Self {
        VarData::UNASSIGNED
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Watcher {
    cref: ConstrRef,
    /// For clause watchers, a literal whose truth satisfies the clause
    /// without inspecting it. `Lit::UNDEF` for cardinality watchers.
    blocker: Lit,
}

impl Watcher {
    const DUMMY: Watcher = Watcher {
        cref: ConstrRef::UNDEF,
        blocker: Lit::UNDEF,
    };
    fn new(cref: ConstrRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

impl PartialEq for Watcher {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.cref == rhs.cref
    }
}
impl Eq for Watcher {}

/// Predicate to test whether a constraint has been removed from some
/// literal's watch list.
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
    cards: &'a [CardConstr],
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        match w.cref.as_card() {
            Some(ci) => self.cards[ci].is_removed(),
            None => {
                let cr = w.cref.as_clause().expect("undef watcher");
                self.ca.get_ref(cr).mark() == 1
            }
        }
    }
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs]).expect("NaN activity")
    }
}

/// Result of the first-UIP derivation, reused between conflicts.
#[derive(Default)]
struct AnalysisResult {
    learnt: Vec<Lit>,
    btlevel: i32,
    lbd: u32,
}

struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeoutSpec {
    Off,
    WallClockMs(u64),
    Conflicts(u64),
}

/// Reason-simplification applied to learned clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplificationKind {
    /// Keep the first-UIP clause as derived.
    None,
    /// Drop literals whose reason is entirely subsumed by the clause.
    Simple,
    /// Recursive reachability check over the implication graph.
    Expensive,
    /// Like `Expensive`, but trusts the watched-literal layout and skips
    /// each reason's asserting literal.
    ExpensiveWlonly,
}

/// Tunable search parameters.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub var_decay: f64,
    pub clause_decay: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            var_decay: 0.95,
            clause_decay: 0.999,
        }
    }
}

/// Solver configuration. All fields can also be changed later through the
/// corresponding setters on [`Solver`].
#[derive(Debug, Clone)]
pub struct SolverOpts {
    pub params: SearchParams,
    pub simplifier: SimplificationKind,
    pub restart: RestartPolicy,
    pub deletion: LearnedDeletion,
    pub db_simplification_allowed: bool,
    pub random_var_freq: f64,
    pub random_seed: f64,
    /// The fraction of wasted arena space that triggers a garbage collection.
    pub garbage_frac: f64,
    /// Arena byte watermark for the memory-based deletion strategy.
    pub memory_bound: usize,
    pub verbosity: bool,
}

impl Default for SolverOpts {
    fn default() -> Self {
        SolverOpts {
            params: SearchParams::default(),
            simplifier: SimplificationKind::Expensive,
            restart: RestartPolicy::default(),
            deletion: LearnedDeletion::default(),
            db_simplification_allowed: false,
            random_var_freq: 0.0,
            random_seed: 91_648_253.0,
            garbage_frac: 0.20,
            memory_bound: 256 * 1024 * 1024,
            verbosity: false,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.params.var_decay && self.params.var_decay < 1.0)
            && (0.0 < self.params.clause_decay && self.params.clause_decay < 1.0)
            && (0.0..=1.0).contains(&self.random_var_freq)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && self.memory_bound > 0
    }
}

impl<L: SearchListener + Default> Default for Solver<L> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), L::default())
    }
}

// public API
impl<L: SearchListener> SolverInterface for Solver<L> {
    fn n_vars(&self) -> u32 {
        if self.v.declared_max_var == 0 {
            self.v.next_var.idx()
        } else {
            self.v.declared_max_var
        }
    }

    fn real_n_vars(&self) -> u32 {
        self.v.next_var.idx()
    }

    fn n_constraints(&self) -> usize {
        self.constrs.iter().filter(|c| c.is_some()).count()
    }

    fn new_vars(&mut self, n: u32) -> u32 {
        if n > 0 {
            self.v.var_of_int(n - 1);
        }
        self.v.declared_max_var = n;
        n
    }

    fn next_free_var_id(&mut self, reserve: bool) -> i32 {
        let next = self.v.next_var.idx();
        if reserve {
            self.v.new_var();
        }
        (next + 1) as i32
    }

    fn register_literal(&mut self, p: i32) {
        self.lit_of_dimacs(p);
    }

    fn add_clause(&mut self, lits: &[i32]) -> Result<Option<ConstrId>, ContradictionError> {
        let vlits = self.dimacs_to_internal(lits);
        self.add_clause_internal(vlits)
    }

    fn add_at_least(
        &mut self,
        lits: &[i32],
        degree: i32,
    ) -> Result<Option<ConstrId>, ContradictionError> {
        let vlits = self.dimacs_to_internal(lits);
        self.add_at_least_internal(vlits, degree)
    }

    fn add_at_most(
        &mut self,
        lits: &[i32],
        degree: i32,
    ) -> Result<Option<ConstrId>, ContradictionError> {
        let opposite: Vec<i32> = lits.iter().map(|&l| -l).collect();
        self.add_at_least(&opposite, lits.len() as i32 - degree)
    }

    fn add_exactly(&mut self, lits: &[i32], n: i32) -> Result<Vec<ConstrId>, ContradictionError> {
        let mut group = Vec::with_capacity(2);
        if let Some(id) = self.add_at_most(lits, n)? {
            group.push(id);
        }
        if let Some(id) = self.add_at_least(lits, n)? {
            group.push(id);
        }
        Ok(group)
    }

    fn remove_constr(&mut self, id: ConstrId) -> bool {
        let slot = id.0 as usize;
        let cref = self
            .constrs
            .get(slot)
            .copied()
            .flatten()
            .expect("reference to a tracked constraint needed");
        self.detach_constr(cref);
        self.constrs[slot] = None;
        self.tally_dec(constr_kind(cref));
        self.clear_learnt_clauses();
        true
    }

    fn remove_subsumed_constr(&mut self, id: ConstrId) -> bool {
        let last = self
            .constrs
            .iter()
            .rposition(|c| c.is_some())
            .expect("reference to a tracked constraint needed");
        assert!(
            last == id.0 as usize,
            "can only remove the latest added constraint"
        );
        let cref = self.constrs[last].take().expect("checked above");
        self.constrs.truncate(last);
        self.detach_constr(cref);
        self.tally_dec(constr_kind(cref));
        true
    }

    fn is_satisfiable(&mut self) -> Result<bool, TimeoutError> {
        self.is_satisfiable_under(&[])
    }

    fn is_satisfiable_under(&mut self, assumps: &[i32]) -> Result<bool, TimeoutError> {
        self.solve_internal(assumps, false)
    }

    fn find_model(&mut self, assumps: &[i32]) -> Result<Option<Vec<i32>>, TimeoutError> {
        if self.solve_internal(assumps, false)? {
            Ok(Some(self.model.clone()))
        } else {
            Ok(None)
        }
    }

    fn model(&self) -> &[i32] {
        assert!(self.has_model, "call the solve method first");
        &self.model
    }

    fn model_value(&self, var: i32) -> bool {
        assert!(
            var > 0 && var as u32 <= self.real_n_vars(),
            "use a valid variable id as argument"
        );
        assert!(self.has_model, "call the solve method first");
        self.boolean_model[(var - 1) as usize]
    }

    fn prime_implicant(&mut self) -> Vec<i32> {
        assert!(self.has_model, "call the solve method first");
        let current_d = self.decisions_in_model.clone();
        let mut assumptions: Vec<i32> = Vec::with_capacity(self.model.len());
        assumptions.extend_from_slice(&self.implied_in_model);
        assumptions.extend_from_slice(&current_d);
        let mut prime = self.implied_in_model.clone();
        for p in current_d {
            let pos = assumptions
                .iter()
                .position(|&x| x == p)
                .expect("decision literal in assumptions");
            assumptions.remove(pos);
            assumptions.push(-p);
            match self.is_satisfiable_under(&assumptions) {
                Ok(true) => {
                    assumptions.pop();
                    assumptions.push(-p);
                }
                Ok(false) => {
                    prime.push(p);
                    assumptions.pop();
                    assumptions.push(p);
                }
                Err(e) => panic!("prime implicant computation must not time out: {}", e),
            }
        }
        prime
    }

    fn unsat_explanation(&self) -> &[i32] {
        self.unsat_explanation
            .as_deref()
            .expect("only valid after an unsatisfiable answer")
    }

    fn truth_value(&self, lit: i32) -> lbool {
        let p = Lit::from_dimacs(lit);
        if p.var().idx() >= self.v.next_var.idx() {
            return lbool::UNDEF;
        }
        self.v.vars.value_lit(p)
    }

    fn reset(&mut self) {
        self.disarm_timer();
        self.conflict_timeout = None;
        self.global_armed = false;
        self.expire.store(false, Ordering::SeqCst);
        self.v = SolverV::new(&self.opts);
        self.constrs.clear();
        self.learnts.clear();
        self.learned_literals.clear();
        self.model.clear();
        self.has_model = false;
        self.boolean_model.clear();
        self.full_model.clear();
        self.decisions_in_model.clear();
        self.implied_in_model.clear();
        self.unsat_explanation = None;
        self.tallies.reset();
        self.restarter = Restarter::from_policy(self.opts.restart);
        self.reduce_timer = ReduceTimer::for_strategy(self.opts.deletion);
        self.need_reduce = false;
        self.root_level = 0;
    }

    fn stop(&self) {
        self.expire.store(true, Ordering::SeqCst);
    }
}

impl<L: SearchListener> Drop for Solver<L> {
    fn drop(&mut self) {
        // don't leave the timer thread sleeping behind
        self.disarm_timer();
    }
}

fn constr_kind(cref: ConstrRef) -> ConstrKind {
    if cref.as_card().is_some() {
        ConstrKind::Cardinality
    } else {
        ConstrKind::Clause
    }
}

// construction and configuration
impl<L: SearchListener> Solver<L> {
    pub fn new(opts: SolverOpts, listener: L) -> Self {
        assert!(opts.check());
        Self {
            model: vec![],
            has_model: false,
            boolean_model: vec![],
            full_model: vec![],
            decisions_in_model: vec![],
            implied_in_model: vec![],
            unsat_explanation: None,
            listener,
            expire: Arc::new(AtomicBool::new(false)),
            timer: None,
            conflict_timeout: None,
            global_armed: false,
            timeout: TimeoutSpec::Off,
            constrs: vec![],
            learnts: vec![],
            learned_literals: vec![],
            restarter: Restarter::from_policy(opts.restart),
            reduce_timer: ReduceTimer::for_strategy(opts.deletion),
            need_reduce: false,
            lbd_flags: LbdFlags::default(),
            root_level: 0,
            last_conflict_means_unsat: true,
            analysis: AnalysisResult::default(),
            preason: vec![],
            tallies: ConstrTypeTallies::default(),
            v: SolverV::new(&opts),
            opts,
        }
    }

    /// Wall-clock timeout in seconds.
    pub fn set_timeout(&mut self, seconds: u64) {
        self.timeout = TimeoutSpec::WallClockMs(seconds * 1000);
    }

    /// Wall-clock timeout in milliseconds.
    pub fn set_timeout_ms(&mut self, ms: u64) {
        self.timeout = TimeoutSpec::WallClockMs(ms);
    }

    /// Give up after the given number of conflicts instead of after a
    /// wall-clock delay.
    pub fn set_timeout_on_conflicts(&mut self, conflicts: u64) {
        self.timeout = TimeoutSpec::Conflicts(conflicts);
    }

    pub fn clear_timeout(&mut self) {
        self.timeout = TimeoutSpec::Off;
    }

    pub fn set_restart_policy(&mut self, policy: RestartPolicy) {
        self.opts.restart = policy;
        self.restarter = Restarter::from_policy(policy);
    }

    /// Swap the learned-constraint deletion strategy; allowed between and
    /// during solve calls.
    pub fn set_learned_deletion(&mut self, strategy: LearnedDeletion) {
        self.opts.deletion = strategy;
        self.reduce_timer = ReduceTimer::for_strategy(strategy);
    }

    pub fn set_simplifier(&mut self, kind: SimplificationKind) {
        self.opts.simplifier = kind;
    }

    pub fn set_search_params(&mut self, params: SearchParams) {
        self.opts.params = params;
    }

    pub fn set_db_simplification_allowed(&mut self, allowed: bool) {
        self.opts.db_simplification_allowed = allowed;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.opts.verbosity = verbose;
    }

    pub fn stats(&self) -> &SolverStats {
        &self.v.stats
    }

    pub fn constr_tallies(&self) -> &ConstrTypeTallies {
        &self.tallies
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Model including auxiliary variables allocated beyond the declared
    /// maximum.
    pub fn model_with_internal_variables(&self) -> &[i32] {
        assert!(self.has_model, "call the solve method first");
        &self.full_model
    }

    /// Like `is_satisfiable_under`, but the timeout budget is shared
    /// across consecutive global calls instead of rearmed on each one.
    pub fn is_satisfiable_global(&mut self, assumps: &[i32]) -> Result<bool, TimeoutError> {
        self.solve_internal(assumps, true)
    }

    /// Same as `stop()`: expire the current deadline.
    pub fn expire_timeout(&mut self) {
        self.expire.store(true, Ordering::SeqCst);
        self.disarm_timer();
        self.conflict_timeout = None;
        self.global_armed = false;
    }
}

// constraint loading (the data-structure factory of the solver)
impl<L: SearchListener> Solver<L> {
    fn lit_of_dimacs(&mut self, lit: i32) -> Lit {
        let p = Lit::from_dimacs(lit);
        self.v.var_of_int(p.var().idx());
        p
    }

    fn dimacs_to_internal(&mut self, lits: &[i32]) -> Vec<Lit> {
        lits.iter().map(|&l| self.lit_of_dimacs(l)).collect()
    }

    fn push_constr(&mut self, cref: ConstrRef) -> ConstrId {
        let id = ConstrId(self.constrs.len() as u32);
        self.constrs.push(Some(cref));
        match constr_kind(cref) {
            ConstrKind::Clause => self.tallies.clauses += 1,
            ConstrKind::Cardinality => self.tallies.cardinalities += 1,
        }
        id
    }

    fn tally_dec(&mut self, kind: ConstrKind) {
        match kind {
            ConstrKind::Clause => self.tallies.clauses -= 1,
            ConstrKind::Cardinality => self.tallies.cardinalities -= 1,
        }
    }

    fn add_clause_internal(
        &mut self,
        mut clause: Vec<Lit>,
    ) -> Result<Option<ConstrId>, ContradictionError> {
        if !self.v.ok {
            return Err(ContradictionError);
        }
        debug_assert_eq!(self.v.decision_level(), 0);
        clause.sort_unstable();

        // remove duplicates, tautologies and literals already decided at
        // the root
        let mut last_lit = Lit::ERROR;
        let mut j = 0;
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.vars.value_lit(lit_i);
            let lvl = self.v.vars.level(lit_i.var());
            if (value == lbool::TRUE && lvl == 0) || lit_i == !last_lit {
                self.tallies.ignored_satisfied += 1;
                return Ok(None);
            } else if !(value == lbool::FALSE && lvl == 0) && lit_i != last_lit {
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);

        match clause.len() {
            0 => {
                self.v.ok = false;
                Err(ContradictionError)
            }
            1 => {
                if self.v.vars.enqueue(clause[0], ConstrRef::UNDEF) {
                    Ok(None)
                } else {
                    self.v.ok = false;
                    Err(ContradictionError)
                }
            }
            _ => {
                let cr = self.v.ca.alloc_with_learnt(&clause, false);
                self.v.attach_clause(cr);
                Ok(Some(self.push_constr(ConstrRef::from_clause(cr))))
            }
        }
    }

    fn add_at_least_internal(
        &mut self,
        mut lits: Vec<Lit>,
        degree: i32,
    ) -> Result<Option<ConstrId>, ContradictionError> {
        if !self.v.ok {
            return Err(ContradictionError);
        }
        debug_assert_eq!(self.v.decision_level(), 0);
        if degree <= 0 {
            self.tallies.ignored_satisfied += 1;
            return Ok(None);
        }
        let mut degree = degree as u32;

        // literals decided at the root are folded into the degree
        let mut j = 0;
        for i in 0..lits.len() {
            let l = lits[i];
            let value = self.v.vars.value_lit(l);
            let lvl = self.v.vars.level(l.var());
            if value == lbool::TRUE && lvl == 0 {
                if degree == 1 {
                    self.tallies.ignored_satisfied += 1;
                    return Ok(None);
                }
                degree -= 1;
            } else if !(value == lbool::FALSE && lvl == 0) {
                lits[j] = l;
                j += 1;
            }
        }
        lits.truncate(j);

        if (lits.len() as u32) < degree {
            self.v.ok = false;
            return Err(ContradictionError);
        }
        if lits.len() as u32 == degree {
            // every remaining literal is forced
            for &l in &lits {
                if !self.v.vars.enqueue(l, ConstrRef::UNDEF) {
                    self.v.ok = false;
                    return Err(ContradictionError);
                }
            }
            return Ok(None);
        }
        if degree == 1 {
            return self.add_clause_internal(lits);
        }

        let ci = self.v.cards.len();
        self.v.cards.push(CardConstr::new(lits, degree));
        self.v.attach_card(ci);
        Ok(Some(self.push_constr(ConstrRef::from_card(ci))))
    }

    fn detach_constr(&mut self, cref: ConstrRef) {
        match cref.as_card() {
            Some(ci) => self.v.remove_card(ci),
            None => {
                let cr = cref.as_clause().expect("undef constraint");
                self.v.detach_clause(cr, true);
                self.v.finalize_removed_clause(cr);
            }
        }
    }

    pub fn clear_learnt_clauses(&mut self) {
        let learnts = mem::take(&mut self.learnts);
        for cr in learnts {
            self.v.remove_clause(cr);
        }
        self.learned_literals.clear();
    }
}

// search driver
impl<L: SearchListener> Solver<L> {
    #[inline]
    fn undertimeout(&self) -> bool {
        !self.expire.load(Ordering::Relaxed)
    }

    fn solve_internal(&mut self, assumps: &[i32], global: bool) -> Result<bool, TimeoutError> {
        debug_assert_eq!(self.v.decision_level(), 0);
        let mut status = lbool::UNDEF;
        for &a in assumps {
            self.lit_of_dimacs(a);
        }
        self.model.clear();
        self.has_model = false;
        self.boolean_model.clear();
        self.full_model.clear();
        self.decisions_in_model.clear();
        self.implied_in_model.clear();
        self.unsat_explanation = None;
        self.listener.init(self.n_vars() as usize);
        self.listener.start();
        self.v.stats.solves += 1;
        info!("solve.start (vars: {}, constraints: {})", self.n_vars(), self.n_constraints());
        self.v.rebuild_order_heap();
        let _ = self.reduce_timer.reset();

        let learned_literals_limit = self.v.vars.trail.len();

        // The whole trail is propagated again from scratch, so undo
        // actions accumulated for its literals must be replayed first.
        self.v.qhead = 0;
        for i in (0..learned_literals_limit).rev() {
            let p = self.v.vars.trail[i];
            let undos = &mut self.v.undos[p];
            while let Some(ci) = undos.pop() {
                self.v.cards[ci as usize].undo();
            }
        }

        // push previously learned literals
        let replay = mem::take(&mut self.learned_literals);
        for &l in &replay {
            if !self.v.vars.enqueue(l, ConstrRef::UNDEF) {
                // a constraint added since the last call contradicts a
                // previously proven literal
                self.unsat_explanation = Some(vec![]);
                self.listener.end(lbool::FALSE);
                self.cancel_until(0);
                self.cancel_learnt_literals(learned_literals_limit);
                return Ok(false);
            }
        }

        // propagate constraints
        if let Some(confl) = self.v.propagate(&mut self.listener) {
            self.analyze_at_root_level(confl);
            self.unsat_explanation = Some(vec![]);
            self.listener.conflict_found(confl, 0, 0);
            self.listener.end(lbool::FALSE);
            self.cancel_until(0);
            self.cancel_learnt_literals(learned_literals_limit);
            return Ok(false);
        }

        // push incremental assumptions
        for &assump in assumps {
            let p = Lit::from_dimacs(assump);
            if self.v.vars.value_lit(p) != lbool::TRUE && !self.assume(p) {
                self.listener.assumption_conflict(assump);
                let mut expl = self.analyze_final_assumps(ConstrRef::UNDEF, assumps, p);
                expl.push(assump);
                self.unsat_explanation = Some(expl);
                self.listener.end(lbool::FALSE);
                self.cancel_until(0);
                self.cancel_learnt_literals(learned_literals_limit);
                return Ok(false);
            }
            if let Some(confl) = self.v.propagate(&mut self.listener) {
                self.listener.conflict_found(
                    confl,
                    self.v.decision_level(),
                    self.v.vars.trail.len(),
                );
                let expl = self.analyze_final_assumps(confl, assumps, Lit::UNDEF);
                self.unsat_explanation = Some(expl);
                self.listener.end(lbool::FALSE);
                self.cancel_until(0);
                self.cancel_learnt_literals(learned_literals_limit);
                return Ok(false);
            }
        }
        self.root_level = self.v.decision_level();
        // rebuilt on purpose: assumptions may have introduced variables
        self.v.rebuild_order_heap();

        // arm the deadline
        let fresh = !global || !self.global_armed;
        if fresh {
            self.expire.store(false, Ordering::SeqCst);
            self.disarm_timer();
            self.conflict_timeout = None;
            match self.timeout {
                TimeoutSpec::Off => {}
                TimeoutSpec::WallClockMs(ms) => self.arm_timer(ms),
                TimeoutSpec::Conflicts(n) => {
                    self.conflict_timeout = Some(ConflictTimerAdapter::new(n));
                }
            }
            self.restarter.init();
            self.global_armed = global;
        }

        self.need_reduce = false;
        // allows the solver to be incomplete when a heuristic is limited
        // to a subset of the variables
        self.last_conflict_means_unsat = true;

        while status == lbool::UNDEF && self.undertimeout() && self.last_conflict_means_unsat {
            status = self.search(assumps);
            if status == lbool::UNDEF {
                self.restarter.on_restart();
                self.listener.restarting();
            }
        }

        let expired = !self.undertimeout();
        self.cancel_until(0);
        self.cancel_learnt_literals(learned_literals_limit);
        if !global {
            self.disarm_timer();
            self.global_armed = false;
        }
        self.listener.end(status);
        if expired {
            return Err(match self.timeout {
                TimeoutSpec::WallClockMs(ms) => TimeoutError::WallClock(ms),
                TimeoutSpec::Conflicts(n) => TimeoutError::Conflicts(n),
                TimeoutSpec::Off => TimeoutError::Stopped,
            });
        }
        if status == lbool::UNDEF && !self.last_conflict_means_unsat {
            return Err(TimeoutError::Undecided);
        }
        Ok(status == lbool::TRUE)
    }

    /// One restart epoch of the CDCL loop.
    fn search(&mut self, assumps: &[i32]) -> lbool {
        debug_assert_eq!(self.root_level, self.v.decision_level());
        self.v.stats.starts += 1;
        self.v.vars.var_decay = 1.0 / self.opts.params.var_decay;
        self.v.cla_decay = 1.0 / self.opts.params.clause_decay;

        loop {
            self.listener.begin_loop();
            let mut confl = self.v.propagate(&mut self.listener);
            debug_assert_eq!(self.v.vars.trail.len(), self.v.qhead as usize);

            if confl.is_none() {
                if self.v.decision_level() == 0 && self.opts.db_simplification_allowed {
                    self.v.stats.root_simplifications += 1;
                    self.simplify_db();
                }
                debug_assert!(self.v.num_assigns() <= self.v.next_var.idx());
                if self.v.num_assigns() == self.v.next_var.idx() {
                    self.model_found();
                    match self.listener.solution_found(&self.model) {
                        None => return lbool::TRUE,
                        Some(block) => {
                            // enumeration: reject the model and go on
                            if self.block_model_and_continue(&block, assumps).is_err() {
                                return lbool::FALSE;
                            }
                            continue;
                        }
                    }
                }
                if self.restarter.should_restart() {
                    // the conflict budget of this epoch is spent
                    self.cancel_until(self.root_level);
                    return lbool::UNDEF;
                }
                if self.need_reduce {
                    self.reduce_db();
                    self.need_reduce = false;
                }
                // new variable decision
                self.v.stats.decisions += 1;
                let p = self.v.pick_branch_lit();
                if p == Lit::UNDEF {
                    confl = Some(self.prevent_same_decisions());
                    self.last_conflict_means_unsat = false;
                } else {
                    self.listener.assuming(p.to_dimacs());
                    let ok = self.assume(p);
                    debug_assert!(ok);
                }
            }

            if let Some(confl) = confl {
                self.v.stats.conflicts += 1;
                self.listener
                    .conflict_found(confl, self.v.decision_level(), self.v.vars.trail.len());
                self.new_conflict_event();

                if self.v.decision_level() == self.root_level {
                    if self.last_conflict_means_unsat {
                        // the formula is inconsistent
                        let expl = self.analyze_final_assumps(confl, assumps, Lit::UNDEF);
                        self.unsat_explanation = Some(expl);
                        return lbool::FALSE;
                    }
                    return lbool::UNDEF;
                }

                self.analyze(confl);
                debug_assert!(self.analysis.btlevel < self.v.decision_level() as i32);
                let backjump = cmp::max(self.analysis.btlevel, self.root_level as i32) as u32;
                self.listener.backjump(backjump);
                self.cancel_until(backjump);
                debug_assert!(self.v.decision_level() >= self.root_level);
                if backjump == self.root_level {
                    self.restarter.on_backjump_to_root_level();
                }
                if self.analysis.learnt.is_empty() {
                    return lbool::FALSE;
                }
                self.record();
                self.decay_activities();
            }

            if !self.undertimeout() {
                return lbool::UNDEF;
            }
        }
    }

    /// Dispatch one conflict to every subscribed timer: the restart
    /// strategy, the deletion-strategy timer and the conflict timeout.
    fn new_conflict_event(&mut self) {
        self.restarter.new_conflict();
        match self.reduce_timer.new_conflict() {
            TimerEvent::Reduce => self.need_reduce = true,
            TimerEvent::CheckMemory => {
                if self.v.ca.size_in_bytes() > self.opts.memory_bound {
                    self.need_reduce = true;
                }
            }
            TimerEvent::None => {}
        }
        if let Some(t) = &mut self.conflict_timeout {
            if t.new_conflict() {
                self.expire.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Hook for subclass-style customization of root-level conflicts; the
    /// default solver does nothing here.
    fn analyze_at_root_level(&mut self, _confl: ConstrRef) {}

    fn assume(&mut self, p: Lit) -> bool {
        debug_assert_eq!(self.v.vars.trail.len(), self.v.qhead as usize);
        self.v
            .vars
            .trail_lim
            .push(self.v.vars.trail.len() as i32);
        self.v.vars.enqueue(p, ConstrRef::UNDEF)
    }

    /// Revert to the state before the last decision.
    fn cancel(&mut self) {
        let lim = *self.v.vars.trail_lim.last().expect("no decision to cancel") as usize;
        // analysis may already have consumed the whole level
        if self.v.vars.trail.len() > lim {
            let decision = self.v.vars.trail[lim];
            self.listener.backtracking(decision.to_dimacs());
            for _ in 0..(self.v.vars.trail.len() - lim) {
                self.v.undo_one();
            }
        }
        self.v.vars.trail_lim.pop();
    }

    /// Cancel decision levels until `decisionLevel() == level`.
    fn cancel_until(&mut self, level: u32) {
        while self.v.decision_level() > level {
            self.cancel();
        }
        self.v.qhead = self.v.vars.trail.len() as i32;
    }

    /// Stash the level-0 literals proven during this call so the next
    /// call can replay them.
    fn cancel_learnt_literals(&mut self, limit: usize) {
        self.learned_literals.clear();
        while self.v.vars.trail.len() > limit {
            let p = *self.v.vars.trail.last().expect("trail underflow");
            self.learned_literals.push(p);
            self.v.undo_one();
        }
    }

    fn decay_activities(&mut self) {
        self.v.vars.var_decay_activity();
        self.v.cla_decay_activity();
    }

    /// The decision heuristic has no candidate left although the
    /// assignment is incomplete: block the current set of decisions so
    /// the search does not revisit it.
    fn prevent_same_decisions(&mut self) -> ConstrRef {
        let mut clause: Vec<Lit> = vec![];
        let start = if self.root_level == 0 {
            0
        } else {
            self.v.vars.trail_lim[(self.root_level - 1) as usize] as usize
        };
        for i in (start..self.v.vars.trail.len()).rev() {
            let p = self.v.vars.trail[i];
            if self.v.reason(p.var()).is_undef() {
                clause.push(!p);
            }
        }
        let cr = self.v.ca.alloc_with_learnt(&clause, true);
        ConstrRef::from_clause(cr)
    }

    /// A model is on the trail: extract it and return to the root level.
    fn model_found(&mut self) {
        let declared = self.n_vars();
        let real = self.v.next_var.idx();
        self.boolean_model = vec![false; real as usize];
        self.decisions_in_model.clear();
        self.implied_in_model.clear();
        let mut tmp: Vec<i32> = Vec::with_capacity(real as usize);
        for i in 0..declared.min(real) {
            let v = Var::from_idx(i);
            let val = self.v.vars.value(v);
            if val != lbool::UNDEF {
                let d = if val == lbool::TRUE {
                    v.to_dimacs()
                } else {
                    -v.to_dimacs()
                };
                tmp.push(d);
                self.boolean_model[i as usize] = val == lbool::TRUE;
                if self.v.reason(v).is_undef() {
                    self.decisions_in_model.push(d);
                } else {
                    self.implied_in_model.push(d);
                }
            }
        }
        self.model = tmp.clone();
        if real > declared {
            for i in declared..real {
                let v = Var::from_idx(i);
                let val = self.v.vars.value(v);
                if val != lbool::UNDEF {
                    tmp.push(if val == lbool::TRUE {
                        v.to_dimacs()
                    } else {
                        -v.to_dimacs()
                    });
                    self.boolean_model[i as usize] = val == lbool::TRUE;
                }
            }
        }
        self.full_model = tmp;
        self.has_model = true;
        debug!("model found: {:?}", self.model);
        self.cancel_until(self.root_level);
    }

    /// Add a blocking clause returned by the listener and keep searching.
    /// Fails when the blocked formula is refuted on the spot.
    fn block_model_and_continue(&mut self, block: &[i32], assumps: &[i32]) -> Result<(), ()> {
        let mut lits = self.dimacs_to_internal(block);
        lits.sort_unstable();
        lits.dedup();
        // the blocking clause becomes a regular constraint: it must
        // survive learned-database reductions for the enumeration count
        // to stay exact
        let mut j = 0;
        for i in 0..lits.len() {
            let l = lits[i];
            let value = self.v.vars.value_lit(l);
            let lvl = self.v.vars.level(l.var());
            if value == lbool::TRUE && lvl == 0 {
                return Ok(());
            }
            if !(value == lbool::FALSE && lvl == 0) {
                lits[j] = l;
                j += 1;
            }
        }
        lits.truncate(j);
        if lits.is_empty() {
            self.note_blocking_refutation(assumps);
            return Err(());
        }
        self.v.sort_clause_lits(&mut lits);
        if lits.len() == 1 {
            if self.v.vars.value_lit(lits[0]) == lbool::FALSE {
                self.note_blocking_refutation(assumps);
                return Err(());
            }
            let ok = self.v.vars.enqueue(lits[0], ConstrRef::UNDEF);
            debug_assert!(ok);
            return Ok(());
        }
        let cr = self.v.ca.alloc_with_learnt(&lits, false);
        self.v.attach_clause(cr);
        self.push_constr(ConstrRef::from_clause(cr));
        let c0 = self.v.ca.get_ref(cr).lits()[0];
        let c1 = self.v.ca.get_ref(cr).lits()[1];
        if self.v.vars.value_lit(c0) == lbool::FALSE {
            self.note_blocking_refutation(assumps);
            return Err(());
        }
        if self.v.vars.value_lit(c0) == lbool::UNDEF && self.v.vars.value_lit(c1) == lbool::FALSE {
            let ok = self.v.vars.enqueue(c0, ConstrRef::from_clause(cr));
            debug_assert!(ok);
        }
        Ok(())
    }

    fn note_blocking_refutation(&mut self, assumps: &[i32]) {
        // every assumption qualifies as an explanation superset
        self.unsat_explanation = Some(assumps.to_vec());
    }

    /// Insert the learned constraint of the last analysis into the
    /// database and assert its first literal.
    fn record(&mut self) {
        let lits = mem::take(&mut self.analysis.learnt);
        let lbd = self.analysis.lbd;
        self.listener.adding(lits[0].to_dimacs());
        if lits.len() == 1 {
            let ok = self.v.vars.enqueue(lits[0], ConstrRef::UNDEF);
            debug_assert!(ok);
            self.v.stats.learned_literals += 1;
        } else {
            let cr = self.v.ca.alloc_with_learnt(&lits, true);
            self.v.attach_clause(cr);
            self.learnts.push(cr);
            match self.opts.deletion {
                // the LBD is the ranking: lower is better
                LearnedDeletion::Lbd => self.v.ca.get_mut(cr).set_activity(lbd as f64),
                _ => self.v.cla_bump_activity(&self.learnts, cr),
            }
            let ok = self.v.vars.enqueue(lits[0], ConstrRef::from_clause(cr));
            debug_assert!(ok);
            self.listener.learn(&lits);
            trace!("learn {}", lits.pp_dimacs());
            self.v.stats.learned_clauses += 1;
            match lits.len() {
                2 => self.v.stats.learned_binary_clauses += 1,
                3 => self.v.stats.learned_ternary_clauses += 1,
                _ => {}
            }
        }
        self.restarter
            .new_learned_clause(self.v.vars.trail.len(), lbd);
        self.analysis.learnt = lits;
    }
}

// conflict analysis
impl<L: SearchListener> Solver<L> {
    /// First-UIP conflict analysis.
    ///
    /// Fills `self.analysis` with the learned clause (asserting literal
    /// first, a literal of the backjump level second), the backjump level
    /// and the LBD of the clause. Unwinds the trail down to the UIP.
    fn analyze(&mut self, mut confl: ConstrRef) {
        let conflict_level = self.v.decision_level() as i32;
        for (_, s) in self.v.seen.iter_mut() {
            *s = false;
        }

        let mut out = mem::take(&mut self.analysis.learnt);
        let mut preason = mem::take(&mut self.preason);
        out.clear();
        out.push(Lit::UNDEF); // room for the asserting literal
        let mut out_btlevel = 0i32;
        let mut counter = 0i32;
        let mut p = Lit::UNDEF;
        let mut prev_confl = ConstrRef::UNDEF;

        loop {
            debug_assert!(!confl.is_undef(), "no reason during conflict analysis");
            // constraints able to propagate twice come back unchanged;
            // their reason must not be expanded again
            if prev_confl != confl {
                preason.clear();
                self.v.calc_reason(confl, p, &mut preason);
                self.on_conflict_analysis(confl);
                for i in 0..preason.len() {
                    let q = preason[i];
                    self.v.var_bump_activity(q.var());
                    if !self.v.seen[q.var()] {
                        self.v.seen[q.var()] = true;
                        let lvl = self.v.vars.level(q.var());
                        if lvl == conflict_level {
                            counter += 1;
                        } else if lvl > 0 {
                            // only literals assigned after the root level
                            // belong in the explanation
                            out.push(!q);
                            out_btlevel = cmp::max(out_btlevel, lvl);
                        }
                    }
                }
            }
            prev_confl = confl;
            // select the next trail literal to resolve on
            loop {
                p = *self
                    .v
                    .vars
                    .trail
                    .last()
                    .expect("trail exhausted during analysis");
                confl = self.v.reason(p.var());
                self.v.undo_one();
                if self.v.seen[p.var()] {
                    break;
                }
            }
            counter -= 1;
            if counter <= 0 {
                break;
            }
        }
        out[0] = !p;
        self.preason = preason;
        self.simplify_learnt(&mut out);

        // the LBD of the clause, counting the asserting level once
        let lbd = {
            self.lbd_flags.ensure_levels(conflict_level as usize + 1);
            let vars = &self.v.vars;
            self.lbd_flags
                .lbd_with_asserting(out[1..].iter().map(|l| vars.level(l.var())))
        };

        // put a literal of the backjump level in the second watch slot
        if out.len() > 2 {
            let mut max_i = 1;
            let mut max_level = self.v.vars.level(out[1].var());
            for i in 2..out.len() {
                let level = self.v.vars.level(out[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            out.swap(1, max_i);
        }

        debug_assert!(out_btlevel >= 0);
        self.analysis.learnt = out;
        self.analysis.btlevel = out_btlevel;
        self.analysis.lbd = lbd;
    }

    /// Deletion-strategy hook ran for each constraint met during analysis.
    fn on_conflict_analysis(&mut self, confl: ConstrRef) {
        if self.opts.deletion == LearnedDeletion::MemoryBased {
            if let Some(cr) = confl.as_clause() {
                if self.v.ca.get_ref(cr).learnt() {
                    self.v.cla_bump_activity(&self.learnts, cr);
                }
            }
        }
    }

    fn simplify_learnt(&mut self, out: &mut Vec<Lit>) {
        match self.opts.simplifier {
            SimplificationKind::None => {}
            SimplificationKind::Simple => self.simple_simplification(out),
            SimplificationKind::Expensive => self.expensive_simplification(out, false),
            SimplificationKind::ExpensiveWlonly => self.expensive_simplification(out, true),
        }
    }

    /// Drop a literal when its whole reason is already in the clause.
    fn simple_simplification(&mut self, out: &mut Vec<Lit>) {
        let mut j = 1;
        for i in 1..out.len() {
            let l = out[i];
            let r = self.v.reason(l.var());
            let keep = if r.is_undef() || self.v.can_propagate_multiple_times(r) {
                true
            } else {
                let mut keep = false;
                for k in 0..self.v.constr_size(r) {
                    let q = self.v.constr_get(r, k);
                    if !self.v.seen[q.var()]
                        && self.v.vars.value_lit(q) == lbool::FALSE
                        && self.v.vars.level(q.var()) != 0
                    {
                        keep = true;
                        break;
                    }
                }
                keep
            };
            if keep {
                out[j] = l;
                j += 1;
            }
        }
        let removed = out.len() - j;
        out.truncate(j);
        self.v.stats.reduced_literals += removed as u64;
    }

    /// Drop a literal when it is recursively implied by the clause and
    /// root-level facts.
    fn expensive_simplification(&mut self, out: &mut Vec<Lit>, wl_only: bool) {
        self.v.analyze_toclear.clear();
        self.v.analyze_toclear.extend_from_slice(out);
        let mut j = 1;
        for i in 1..out.len() {
            let l = out[i];
            if self.v.reason(l.var()).is_undef() || !self.analyze_removable(l, wl_only) {
                out[j] = l;
                j += 1;
            }
        }
        let removed = out.len() - j;
        out.truncate(j);
        self.v.stats.reduced_literals += removed as u64;
    }

    /// Check whether `p` is redundant in the current learned clause,
    /// with an explicit stack instead of recursion.
    fn analyze_removable(&mut self, p: Lit, wl_only: bool) -> bool {
        debug_assert!(!self.v.reason(p.var()).is_undef());
        self.v.analyze_stack.clear();
        self.v.analyze_stack.push(p);
        let top = self.v.analyze_toclear.len();
        while let Some(q) = self.v.analyze_stack.pop() {
            let c = self.v.reason(q.var());
            debug_assert!(!c.is_undef());
            if self.v.can_propagate_multiple_times(c) {
                self.unwind_seen(top);
                return false;
            }
            let start = usize::from(wl_only);
            for k in start..self.v.constr_size(c) {
                let l = self.v.constr_get(c, k);
                if self.v.seen[l.var()] || self.v.vars.level(l.var()) == 0 {
                    continue;
                }
                if !wl_only && self.v.vars.value_lit(l) != lbool::FALSE {
                    continue;
                }
                if self.v.reason(l.var()).is_undef() {
                    self.unwind_seen(top);
                    return false;
                }
                self.v.seen[l.var()] = true;
                self.v.analyze_stack.push(l);
                self.v.analyze_toclear.push(l);
            }
        }
        true
    }

    fn unwind_seen(&mut self, top: usize) {
        for i in top..self.v.analyze_toclear.len() {
            let l = self.v.analyze_toclear[i];
            self.v.seen[l.var()] = false;
        }
        self.v.analyze_toclear.truncate(top);
    }

    /// Derive the subset of the assumptions responsible for the final
    /// conflict at the root level.
    ///
    /// `confl` is the conflicting constraint (or `UNDEF` when an
    /// assumption literal was falsified outright, in which case
    /// `conflicting` names it). Unwinds the trail.
    fn analyze_final_assumps(
        &mut self,
        confl: ConstrRef,
        assumps: &[i32],
        conflicting: Lit,
    ) -> Vec<i32> {
        let mut out: Vec<i32> = vec![];
        if assumps.is_empty() {
            return out;
        }
        // a conflict met while assuming leaves an empty level behind
        while let Some(&last) = self.v.vars.trail_lim.last() {
            if last as usize == self.v.vars.trail.len() {
                self.v.vars.trail_lim.pop();
            } else {
                break;
            }
        }
        if self.v.decision_level() == 0 {
            // conflict among unit clauses: no assumption involved
            return out;
        }
        for (_, s) in self.v.seen.iter_mut() {
            *s = false;
        }
        let mut confl = confl;
        if confl.is_undef() {
            self.v.seen[conflicting.var()] = true;
        }

        // walk the decision prefix until a real reason shows up
        let mut p = Lit::UNDEF;
        while confl.is_undef()
            && !self.v.vars.trail.is_empty()
            && !self.v.vars.trail_lim.is_empty()
        {
            p = *self.v.vars.trail.last().expect("checked non-empty");
            confl = self.v.reason(p.var());
            self.v.undo_one();
            if confl.is_undef() && p == !conflicting {
                out.push(p.to_dimacs());
            }
            if let Some(&last) = self.v.vars.trail_lim.last() {
                if self.v.vars.trail.len() <= last as usize {
                    self.v.vars.trail_lim.pop();
                }
            }
        }
        if confl.is_undef() {
            return out;
        }

        let mut preason = mem::take(&mut self.preason);
        loop {
            preason.clear();
            self.v.calc_reason(confl, p, &mut preason);
            for &q in &preason {
                if !self.v.seen[q.var()] {
                    self.v.seen[q.var()] = true;
                    // reasonless literals above the root are assumptions,
                    // except units learned by this very search, which the
                    // constraints entail on their own
                    if self.v.reason(q.var()).is_undef()
                        && self.v.vars.level(q.var()) > 0
                        && assumps.contains(&q.to_dimacs())
                    {
                        out.push(q.to_dimacs());
                    }
                }
            }

            // select the next reason to look at
            loop {
                if self.v.vars.trail.is_empty() {
                    confl = ConstrRef::UNDEF;
                    break;
                }
                p = *self.v.vars.trail.last().expect("checked non-empty");
                confl = self.v.reason(p.var());
                self.v.undo_one();
                if self.v.decision_level() > 0 {
                    if let Some(&last) = self.v.vars.trail_lim.last() {
                        if self.v.vars.trail.len() <= last as usize {
                            self.v.vars.trail_lim.pop();
                        }
                    }
                }
                if !(!self.v.vars.trail.is_empty()
                    && self.v.decision_level() > 0
                    && (!self.v.seen[p.var()] || confl.is_undef()))
                {
                    break;
                }
            }
            if self.v.decision_level() == 0 || confl.is_undef() {
                break;
            }
        }
        self.preason = preason;
        out
    }
}

// learned-database maintenance
impl<L: SearchListener> Solver<L> {
    fn sort_learnts_on_activity(&mut self) {
        let ca = &self.v.ca;
        self.learnts.sort_unstable_by(|&x, &y| {
            PartialOrd::partial_cmp(&ca.get_ref(x).activity(), &ca.get_ref(y).activity())
                .expect("NaN activity")
        });
    }

    /// Run the active deletion strategy over the learned database.
    fn reduce_db(&mut self) {
        self.v.stats.reduced_db += 1;
        self.listener.cleaning();
        let _before = self.learnts.len();
        match self.opts.deletion {
            LearnedDeletion::FixedSize(k) => self.reduce_fixed(k),
            LearnedDeletion::MemoryBased => self.reduce_lowest_half(),
            LearnedDeletion::Lbd => self.reduce_worst_half(),
        }
        if self.opts.verbosity {
            info!(
                "cleaning {} clauses out of {}",
                _before - self.learnts.len(),
                _before
            );
        }
        self.check_garbage();
    }

    /// Keep binary and locked constraints and whatever fits under the
    /// budget; the tail of the list is kept unconditionally once the
    /// budget scan ends.
    fn reduce_fixed(&mut self, maxsize: usize) {
        let n = self.learnts.len();
        let mut removed = 0;
        let mut i = 0;
        let mut j = 0;
        while i < n && n - removed > maxsize {
            let cr = self.learnts[i];
            let keep = self.v.ca.get_ref(cr).size() == 2 || self.v.locked_clause(cr);
            if keep {
                self.learnts[j] = cr;
                j += 1;
            } else {
                self.v.remove_clause(cr);
                removed += 1;
            }
            i += 1;
        }
        while i < n {
            self.learnts[j] = self.learnts[i];
            j += 1;
            i += 1;
        }
        self.learnts.truncate(j);
    }

    /// Memory pressure: delete the less active half.
    fn reduce_lowest_half(&mut self) {
        self.sort_learnts_on_activity();
        let n = self.learnts.len();
        let mut j = 0;
        for i in 0..n {
            let cr = self.learnts[i];
            let keep = i >= n / 2 || self.v.ca.get_ref(cr).size() == 2 || self.v.locked_clause(cr);
            if keep {
                self.learnts[j] = cr;
                j += 1;
            } else {
                self.v.remove_clause(cr);
            }
        }
        self.learnts.truncate(j);
    }

    /// LBD ranking: activities are block distances, so the upper half of
    /// the ascending order is the worse one; spare what is locked, binary
    /// or of distance two or less.
    fn reduce_worst_half(&mut self) {
        self.sort_learnts_on_activity();
        let n = self.learnts.len();
        let mut j = n / 2;
        for i in (n / 2)..n {
            let cr = self.learnts[i];
            let keep = {
                let c = self.v.ca.get_ref(cr);
                c.activity() <= 2.0 || c.size() == 2 || self.v.locked_clause(cr)
            };
            if keep {
                self.learnts[j] = cr;
                j += 1;
            } else {
                self.v.remove_clause(cr);
            }
        }
        self.learnts.truncate(j);
    }

    /// Remove constraints satisfied at the root level.
    pub fn simplify_db(&mut self) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);
        for idx in 0..self.constrs.len() {
            let Some(cref) = self.constrs[idx] else {
                continue;
            };
            if self.v.constr_simplify(cref) {
                self.detach_constr(cref);
                self.constrs[idx] = None;
                self.tally_dec(constr_kind(cref));
            }
        }
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cr = self.learnts[i];
            if self.v.constr_simplify(ConstrRef::from_clause(cr)) {
                self.v.remove_clause(cr);
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }
        self.learnts.truncate(j);
        true
    }

    /// Relocate live clauses into a fresh arena when too much space is
    /// wasted by deleted ones.
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.opts.garbage_frac {
            self.garbage_collect();
        }
    }

    fn garbage_collect(&mut self) {
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());
        self.reloc_all(&mut to);
        debug!(
            "garbage collection: {} -> {} lits",
            self.v.ca.len(),
            to.len()
        );
        self.v.stats.garbage_collections += 1;
        self.v.ca = to;
    }

    fn reloc_all(&mut self, to: &mut ClauseAllocator) {
        // watchers
        self.v.watches().clean_all();
        for idx in 0..self.v.next_var.idx() {
            for sign in 0..2 {
                let p = Lit::new(Var::from_idx(idx), sign != 0);
                for watch in &mut self.v.watches_data[p] {
                    if let Some(cr) = watch.cref.as_clause() {
                        let mut cr2 = cr;
                        self.v.ca.reloc(&mut cr2, to);
                        watch.cref = ConstrRef::from_clause(cr2);
                    }
                }
            }
        }

        // reasons
        for i in 0..self.v.vars.trail.len() {
            let v = self.v.vars.trail[i].var();
            // keeping a dangling reason is fine as long as it is never
            // dereferenced; only relocate reasons of locked clauses
            if let Some(cr) = self.v.reason(v).as_clause() {
                let keep = self.v.ca.get_ref(cr).reloced() || self.v.locked_clause(cr);
                if keep {
                    let mut cr2 = cr;
                    self.v.ca.reloc(&mut cr2, to);
                    self.v.vars.vardata[v].reason = ConstrRef::from_clause(cr2);
                }
            }
        }

        // learned clauses
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let mut cr = self.learnts[i];
            if self.v.ca.get_ref(cr).mark() != 1 {
                self.v.ca.reloc(&mut cr, to);
                self.learnts[j] = cr;
                j += 1;
            }
        }
        self.learnts.truncate(j);

        // tracked constraints
        for slot in &mut self.constrs {
            if let Some(cref) = slot {
                if let Some(cr) = cref.as_clause() {
                    let mut cr2 = cr;
                    self.v.ca.reloc(&mut cr2, to);
                    *cref = ConstrRef::from_clause(cr2);
                }
            }
        }
    }

    fn arm_timer(&mut self, ms: u64) {
        let expire = Arc::clone(&self.expire);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::Builder::new()
            .name("arcsat-timeout".into())
            .spawn(move || {
                let deadline = Instant::now() + Duration::from_millis(ms);
                loop {
                    if flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        expire.store(true, Ordering::SeqCst);
                        return;
                    }
                    thread::sleep(cmp::min(Duration::from_millis(25), deadline - now));
                }
            })
            .expect("failed to spawn the timeout timer");
        self.timer = Some(TimerHandle { cancelled });
    }

    fn disarm_timer(&mut self) {
        if let Some(t) = self.timer.take() {
            t.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

impl SolverV {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState {
                ass: VMap::new(),
                vardata: VMap::new(),
                activity: VMap::new(),
                polarity: VMap::new(),
                var_inc: 1.0,
                var_decay: 1.0 / opts.params.var_decay,
                trail: vec![],
                trail_lim: vec![],
            },
            watches_data: OccListsData::new(),
            undos: LMap::new(),
            cards: vec![],
            ca: ClauseAllocator::new(),
            order_heap_data: HeapData::new(),
            seen: VMap::new(),
            analyze_stack: vec![],
            analyze_toclear: vec![],
            qhead: 0,
            ok: true,
            cla_inc: 1.0,
            cla_decay: 1.0 / opts.params.clause_decay,
            random_seed: opts.random_seed,
            random_var_freq: opts.random_var_freq,
            next_var: Var::from_idx(0),
            declared_max_var: 0,
            stats: SolverStats::default(),
        }
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.vars.trail.len() as u32
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> ConstrRef {
        self.vars.vardata[x].reason
    }

    fn watches(&mut self) -> OccLists<Lit, Watcher, WatcherDeleted> {
        self.watches_data.promote(WatcherDeleted {
            ca: &self.ca,
            cards: &self.cards,
        })
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap_data.in_heap(x) {
            self.order_heap().insert(x);
        }
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for idx in 0..self.next_var.idx() {
            let v = Var::from_idx(idx);
            if self.vars.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap().build(&vs);
    }

    fn new_var(&mut self) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(v.idx() + 1);
        self.watches_data.init(Lit::new(v, false));
        self.watches_data.init(Lit::new(v, true));
        self.undos.insert_default(Lit::new(v, false), vec![]);
        self.undos.insert_default(Lit::new(v, true), vec![]);
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars.vardata.insert_default(v, VarData::UNASSIGNED);
        self.vars.activity.insert_default(v, 0.0);
        self.vars.polarity.insert_default(v, false);
        self.seen.insert_default(v, false);
        self.insert_var_order(v);
        v
    }

    fn var_of_int(&mut self, v_idx: u32) -> Var {
        while v_idx >= self.next_var.idx() {
            self.new_var();
        }
        Var::from_idx(v_idx)
    }

    /// Pick the next decision literal: highest activity first, with the
    /// saved phase; occasionally a random one.
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let idx = utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32);
            next = self.order_heap_data[idx as usize];
            if self.vars.value(next) == lbool::UNDEF {
                self.stats.rnd_decisions += 1;
            }
        }

        while next == Var::UNDEF || self.vars.value(next) != lbool::UNDEF {
            let mut order_heap = self.order_heap();
            if order_heap.is_empty() {
                next = Var::UNDEF;
                break;
            } else {
                next = order_heap.remove_min();
            }
        }

        if next == Var::UNDEF {
            Lit::UNDEF
        } else {
            Lit::new(next, self.vars.polarity[next])
        }
    }

    fn var_bump_activity(&mut self, v: Var) {
        self.vars.activity[v] += self.vars.var_inc;
        if self.vars.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.vars.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.vars.var_inc *= 1e-100;
        }
        if self.order_heap_data.in_heap(v) {
            self.order_heap().decrease(v);
        }
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let a = c.activity() + self.cla_inc;
            c.set_activity(a);
            a
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts {
                let mut c = self.ca.get_mut(learnt);
                let a = c.activity() * 1e-20;
                c.set_activity(a);
            }
            self.cla_inc *= 1e-20;
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= self.cla_decay;
    }

    /// Undo the last assignment on the trail.
    fn undo_one(&mut self) {
        let p = *self.vars.trail.last().expect("trail underflow");
        let x = p.var();
        self.vars.ass[x] = lbool::UNDEF;
        self.vars.vardata[x] = VarData::UNASSIGNED;
        self.vars.polarity[x] = p.sign();
        self.insert_var_order(x);
        self.vars.trail.pop();
        // counter-based constraints roll their falsified counts back
        let undos = &mut self.undos[p];
        while let Some(ci) = undos.pop() {
            self.cards[ci as usize].undo();
        }
    }

    /// Propagates all enqueued facts; returns the conflicting constraint
    /// if one is found. The propagation queue is empty afterwards either
    /// way.
    fn propagate<L: SearchListener>(&mut self, listener: &mut L) -> Option<ConstrRef> {
        let mut confl = None;

        while (self.qhead as usize) < self.vars.trail.len() {
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            self.stats.propagations += 1;
            listener.propagating(p.to_dimacs());

            let watches_data_ptr: *mut OccListsData<Lit, Watcher> = &mut self.watches_data;
            let ws = self.watches_data.lookup_mut_pred(
                p,
                &WatcherDeleted {
                    ca: &self.ca,
                    cards: &self.cards,
                },
            );
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            'watchers: while i < end {
                self.stats.inspects += 1;
                let w = ws[i];

                // try to skip the clause inspection entirely
                if w.blocker != Lit::UNDEF && self.vars.value_lit(w.blocker) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    i += 1;
                    continue 'watchers;
                }

                if let Some(ci) = w.cref.as_card() {
                    // cardinality constraints watch all their literals and
                    // stay registered
                    ws[j] = w;
                    j += 1;
                    i += 1;
                    let max_unsat = self.cards[ci].max_unsatisfied();
                    if self.cards[ci].n_falsified() == max_unsat {
                        // this falsification is one too many
                        confl = Some(w.cref);
                        self.qhead = self.vars.trail.len() as i32;
                        while i < end {
                            ws[j] = ws[i];
                            j += 1;
                            i += 1;
                        }
                        break 'watchers;
                    }
                    self.cards[ci].note_falsified();
                    self.undos[p].push(ci as u32);
                    if self.cards[ci].n_falsified() == max_unsat {
                        // every unassigned literal is now implied
                        let mut failed = false;
                        for k in 0..self.cards[ci].size() {
                            let q = self.cards[ci].lit(k);
                            if self.vars.value_lit(q) == lbool::UNDEF
                                && !self.vars.enqueue(q, w.cref)
                            {
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            confl = Some(w.cref);
                            self.qhead = self.vars.trail.len() as i32;
                            while i < end {
                                ws[j] = ws[i];
                                j += 1;
                                i += 1;
                            }
                            break 'watchers;
                        }
                    }
                    continue 'watchers;
                }

                // two-watched-literal clause
                let cr = w.cref.as_clause().expect("undef watcher");
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // if the first watch is true, the clause is satisfied
                let first = c[0];
                let w2 = Watcher::new(w.cref, first);
                if first != w.blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w2;
                    j += 1;
                    continue 'watchers;
                }

                // look for a replacement watch
                let size = c.size();
                for k in 2..size {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        let lk = c[k];
                        c[1] = lk;
                        c[k] = false_lit;
                        // safe: `!lk != p`, so the two lists are distinct
                        debug_assert_ne!(!lk, p);
                        unsafe { &mut (&mut (*watches_data_ptr))[!lk] }.push(w2);
                        continue 'watchers;
                    }
                }

                // no replacement: unit under assignment, or conflicting
                ws[j] = w2;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(w.cref);
                    self.qhead = self.vars.trail.len() as i32;
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    let ok = self.vars.enqueue(first, w.cref);
                    debug_assert!(ok);
                }
            }
            ws.resize(j, Watcher::DUMMY);
        }

        confl
    }

    /// Literals whose conjunction entailed `p` through `confl` (the whole
    /// conflict when `p` is undefined).
    fn calc_reason(&self, confl: ConstrRef, p: Lit, out: &mut Vec<Lit>) {
        if let Some(ci) = confl.as_card() {
            // every falsified literal takes part in the implication
            for &l in self.cards[ci].lits() {
                if self.vars.value_lit(l) == lbool::FALSE {
                    out.push(!l);
                }
            }
        } else {
            let cr = confl.as_clause().expect("reason of a decision");
            let c = self.ca.get_ref(cr);
            debug_assert!(p == Lit::UNDEF || p == c[0]);
            let start = if p == Lit::UNDEF { 0 } else { 1 };
            for k in start..c.size() {
                out.push(!c[k]);
            }
        }
    }

    fn constr_size(&self, cref: ConstrRef) -> usize {
        match cref.as_card() {
            Some(ci) => self.cards[ci].size(),
            None => self
                .ca
                .get_ref(cref.as_clause().expect("undef constraint"))
                .size() as usize,
        }
    }

    fn constr_get(&self, cref: ConstrRef, k: usize) -> Lit {
        match cref.as_card() {
            Some(ci) => self.cards[ci].lit(k),
            None => self
                .ca
                .get_ref(cref.as_clause().expect("undef constraint"))
                .lits()[k],
        }
    }

    fn can_propagate_multiple_times(&self, cref: ConstrRef) -> bool {
        cref.as_card().is_some()
    }

    /// Is the constraint satisfied at the root level?
    fn constr_simplify(&self, cref: ConstrRef) -> bool {
        debug_assert_eq!(self.decision_level(), 0);
        match cref.as_card() {
            Some(ci) => {
                let card = &self.cards[ci];
                let n_satisfied = card
                    .lits()
                    .iter()
                    .filter(|&&l| self.vars.value_lit(l) == lbool::TRUE)
                    .count() as u32;
                n_satisfied >= card.degree()
            }
            None => {
                let cr = cref.as_clause().expect("undef constraint");
                self.ca
                    .get_ref(cr)
                    .iter()
                    .any(|&l| self.vars.value_lit(l) == lbool::TRUE)
            }
        }
    }

    /// Attach a clause to the watcher lists.
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1])
        };
        let cref = ConstrRef::from_clause(cr);
        self.watches_data[!c0].push(Watcher::new(cref, c1));
        self.watches_data[!c1].push(Watcher::new(cref, c0));
    }

    /// Register a cardinality constraint on the negation of each literal.
    fn attach_card(&mut self, ci: usize) {
        let cref = ConstrRef::from_card(ci);
        for k in 0..self.cards[ci].size() {
            let l = self.cards[ci].lit(k);
            self.watches_data[!l].push(Watcher::new(cref, Lit::UNDEF));
        }
    }

    /// Detach a clause from the watcher lists.
    ///
    /// `strict` removes the watchers eagerly instead of marking the lists
    /// dirty.
    fn detach_clause(&mut self, cr: CRef, strict: bool) {
        let (c0, c1) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1])
        };
        let cref = ConstrRef::from_clause(cr);
        if strict {
            let mut watches = self.watches();
            let pos = watches[!c0]
                .iter()
                .position(|w| w.cref == cref)
                .expect("watcher not found");
            watches[!c0].remove(pos);
            let pos = watches[!c1]
                .iter()
                .position(|w| w.cref == cref)
                .expect("watcher not found");
            watches[!c1].remove(pos);
        } else {
            let mut watches = self.watches();
            watches.smudge(!c0);
            watches.smudge(!c1);
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr, false);
        self.finalize_removed_clause(cr);
    }

    fn finalize_removed_clause(&mut self, cr: CRef) {
        // don't leave a dangling reason behind
        if self.locked_clause(cr) {
            let v = self.ca.get_ref(cr).lits()[0].var();
            self.vars.vardata[v].reason = ConstrRef::UNDEF;
        }
        self.ca.get_mut(cr).set_mark(1);
        self.ca.free(cr);
    }

    /// Mark a cardinality constraint removed; the watcher lists clean
    /// themselves up lazily.
    fn remove_card(&mut self, ci: usize) {
        for k in 0..self.cards[ci].size() {
            let l = self.cards[ci].lit(k);
            self.watches_data.smudge(!l);
        }
        for k in 0..self.cards[ci].size() {
            let l = self.cards[ci].lit(k);
            if self.vars.value_lit(l) == lbool::TRUE
                && self.reason(l.var()) == ConstrRef::from_card(ci)
            {
                self.vars.vardata[l.var()].reason = ConstrRef::UNDEF;
            }
        }
        self.cards[ci].set_removed();
    }

    /// Is this constraint the reason of a current assignment?
    fn locked_clause(&self, cr: CRef) -> bool {
        let c0 = self.ca.get_ref(cr).lits()[0];
        self.vars.value_lit(c0) == lbool::TRUE
            && self.reason(c0.var()) == ConstrRef::from_clause(cr)
    }

    /// Sort literals so that unassigned ones come first, then by
    /// decreasing assignment level; the result is a valid watch order.
    fn sort_clause_lits(&self, clause: &mut [Lit]) {
        clause.sort_unstable_by(|&lit1, &lit2| {
            let has_val1 = self.vars.value_lit(lit1) != lbool::UNDEF;
            let has_val2 = self.vars.value_lit(lit2) != lbool::UNDEF;
            if has_val1 && !has_val2 {
                return cmp::Ordering::Greater;
            }
            if !has_val1 && has_val2 {
                return cmp::Ordering::Less;
            }
            let lvl1 = self.vars.level(lit1.var());
            let lvl2 = self.vars.level(lit2.var());
            if lvl1 != lvl2 {
                lvl2.cmp(&lvl1)
            } else {
                lit1.cmp(&lit2)
            }
        });
    }
}

impl VarState {
    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= self.var_decay;
    }

    /// Record a new fact, unless it is already known or contradicted.
    fn enqueue(&mut self, p: Lit, from: ConstrRef) -> bool {
        let v = self.value_lit(p);
        if v == lbool::TRUE {
            // already satisfied, skip
            return true;
        }
        if v == lbool::FALSE {
            // conflicting enqueued assignment
            return false;
        }
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData {
            reason: from,
            level: self.decision_level() as i32,
        };
        self.trail.push(p);
        true
    }
}

mod utils {
    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::listener::{SearchEnumerator, VoidTracing};
    use crate::BasicSolver;

    fn solver() -> BasicSolver {
        Solver::new(SolverOpts::default(), VoidTracing)
    }

    #[test]
    fn test_trivial_sat() {
        let mut s = solver();
        s.add_clause(&[1, 2]).unwrap();
        s.add_clause(&[-1, 2]).unwrap();
        s.add_clause(&[1, -2]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        assert_eq!(s.model(), &[1, 2]);
        assert!(s.model_value(1));
        assert!(s.model_value(2));
    }

    #[test]
    fn test_unit_contradiction() {
        let mut s = solver();
        s.add_clause(&[1]).unwrap();
        assert_eq!(s.add_clause(&[-1]), Err(ContradictionError));
    }

    #[test]
    fn test_unsat_without_assumptions() {
        let mut s = solver();
        s.add_clause(&[1, 2]).unwrap();
        s.add_clause(&[1, -2]).unwrap();
        s.add_clause(&[-1, 3]).unwrap();
        s.add_clause(&[-1, -3]).unwrap();
        assert!(!s.is_satisfiable().unwrap());
        assert!(s.unsat_explanation().is_empty());
    }

    #[test]
    fn test_assumption_core() {
        let mut s = solver();
        s.add_clause(&[1, 2]).unwrap();
        s.add_clause(&[-1, 2]).unwrap();
        s.add_clause(&[1, -2]).unwrap();
        assert!(!s.is_satisfiable_under(&[-2]).unwrap());
        assert!(s.unsat_explanation().contains(&-2));
        // the instance stays satisfiable without the assumption
        assert!(s.is_satisfiable().unwrap());
    }

    #[test]
    fn test_incremental_idempotence() {
        let mut s = solver();
        s.add_clause(&[1, 2, 3]).unwrap();
        s.add_clause(&[-1, -2]).unwrap();
        s.add_clause(&[-2, -3]).unwrap();
        let first = s.is_satisfiable().unwrap();
        let model1 = s.model().to_vec();
        let second = s.is_satisfiable().unwrap();
        assert_eq!(first, second);
        assert_eq!(model1, s.model());
    }

    #[test]
    fn test_at_least_propagation() {
        let mut s = solver();
        // at least 2 of {1, 2, 3}; forbid 1: both others are forced
        s.add_at_least(&[1, 2, 3], 2).unwrap();
        s.add_clause(&[-1]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        assert!(!s.model_value(1));
        assert!(s.model_value(2));
        assert!(s.model_value(3));
    }

    #[test]
    fn test_at_most() {
        let mut s = solver();
        s.add_at_most(&[1, 2, 3], 1).unwrap();
        s.add_clause(&[1]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        let m: Vec<i32> = s.model().to_vec();
        assert!(m.contains(&1));
        assert!(m.contains(&-2));
        assert!(m.contains(&-3));
    }

    #[test]
    fn test_exactly_unsat_with_clause() {
        let mut s = solver();
        s.add_exactly(&[1, 2], 1).unwrap();
        s.add_clause(&[1]).unwrap();
        s.add_clause(&[2]).unwrap();
        assert!(!s.is_satisfiable().unwrap());
    }

    #[test]
    fn test_cardinality_degree_too_high() {
        let mut s = solver();
        assert_eq!(
            s.add_at_least(&[1, 2], 3),
            Err(ContradictionError)
        );
    }

    #[test]
    fn test_enumeration_counts_models() {
        let mut s: Solver<SearchEnumerator> =
            Solver::new(SolverOpts::default(), SearchEnumerator::new());
        s.new_vars(2);
        s.add_clause(&[1, 2]).unwrap();
        // enumeration ends on a refutation of the blocked formula
        assert!(!s.is_satisfiable().unwrap());
        assert_eq!(s.listener().n_solutions(), 3);
    }

    #[test]
    fn test_pigeonhole_enumeration_is_empty() {
        // 3 pigeons in 2 holes: every hole assignment conflicts
        let mut s: Solver<SearchEnumerator> =
            Solver::new(SolverOpts::default(), SearchEnumerator::new());
        // pij: pigeon i sits in hole j; vars 1..=6
        let p = |i: i32, j: i32| (i - 1) * 2 + j;
        for i in 1..=3 {
            s.add_clause(&[p(i, 1), p(i, 2)]).unwrap();
        }
        for j in 1..=2 {
            for i1 in 1..=3 {
                for i2 in (i1 + 1)..=3 {
                    s.add_clause(&[-p(i1, j), -p(i2, j)]).unwrap();
                }
            }
        }
        assert!(!s.is_satisfiable().unwrap());
        assert_eq!(s.listener().n_solutions(), 0);
    }

    #[test]
    fn test_prime_implicant_covers_formula() {
        let mut s = solver();
        s.add_clause(&[1, 2]).unwrap();
        s.add_clause(&[2, 3]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        let prime = s.prime_implicant();
        // the implicant must hit both clauses
        assert!(prime.contains(&1) || prime.contains(&2));
        assert!(prime.contains(&2) || prime.contains(&3));
    }

    #[test]
    fn test_conflict_timeout() {
        let mut s = solver();
        // hard pigeonhole: 5 pigeons, 4 holes
        let p = |i: i32, j: i32| (i - 1) * 4 + j;
        for i in 1..=5 {
            let c: Vec<i32> = (1..=4).map(|j| p(i, j)).collect();
            s.add_clause(&c).unwrap();
        }
        for j in 1..=4 {
            for i1 in 1..=5 {
                for i2 in (i1 + 1)..=5 {
                    s.add_clause(&[-p(i1, j), -p(i2, j)]).unwrap();
                }
            }
        }
        s.set_timeout_on_conflicts(3);
        assert_eq!(
            s.is_satisfiable(),
            Err(TimeoutError::Conflicts(3))
        );
        // a later unrestricted call may finish
        s.clear_timeout();
        assert!(!s.is_satisfiable().unwrap());
    }

    #[test]
    fn test_remove_constr() {
        let mut s = solver();
        let _c1 = s.add_clause(&[1, 2]).unwrap().unwrap();
        let c2 = s.add_clause(&[-1, -2]).unwrap().unwrap();
        s.add_clause(&[1]).unwrap();
        s.add_clause(&[2]).unwrap();
        assert!(!s.is_satisfiable().unwrap());
        s.remove_constr(c2);
        assert!(s.is_satisfiable().unwrap());
    }

    #[test]
    fn test_remove_subsumed_requires_last() {
        let mut s = solver();
        let c1 = s.add_clause(&[1, 2]).unwrap().unwrap();
        let c2 = s.add_clause(&[1, 2, 3]).unwrap().unwrap();
        assert!(s.remove_subsumed_constr(c2));
        assert_eq!(s.n_constraints(), 1);
        assert!(std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut s2 = solver();
            let d1 = s2.add_clause(&[1, 2]).unwrap().unwrap();
            s2.add_clause(&[3, 4]).unwrap().unwrap();
            s2.remove_subsumed_constr(d1);
        }))
        .is_err());
        let _ = c1;
    }

    #[test]
    fn test_reset() {
        let mut s = solver();
        s.add_clause(&[1]).unwrap();
        s.add_clause(&[-1, 2]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        s.reset();
        assert_eq!(s.n_constraints(), 0);
        assert_eq!(s.real_n_vars(), 0);
        // a previously contradictory instance is forgotten
        s.add_clause(&[-1]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        assert!(!s.model_value(1));
    }

    #[test]
    fn test_model_before_solve_panics() {
        let s = solver();
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| s.model().len()));
        assert!(result.is_err());
    }

    #[test]
    fn test_deletion_strategies_agree() {
        for deletion in [
            LearnedDeletion::FixedSize(10),
            LearnedDeletion::MemoryBased,
            LearnedDeletion::Lbd,
        ] {
            let mut opts = SolverOpts::default();
            opts.deletion = deletion;
            let mut s: BasicSolver = Solver::new(opts, VoidTracing);
            let p = |i: i32, j: i32| (i - 1) * 3 + j;
            for i in 1..=4 {
                let c: Vec<i32> = (1..=3).map(|j| p(i, j)).collect();
                s.add_clause(&c).unwrap();
            }
            for j in 1..=3 {
                for i1 in 1..=4 {
                    for i2 in (i1 + 1)..=4 {
                        s.add_clause(&[-p(i1, j), -p(i2, j)]).unwrap();
                    }
                }
            }
            assert!(!s.is_satisfiable().unwrap(), "{:?}", deletion);
        }
    }

    #[test]
    fn test_truth_value_at_root() {
        let mut s = solver();
        s.add_clause(&[1]).unwrap();
        s.add_clause(&[-1, 2]).unwrap();
        assert_eq!(s.truth_value(1), lbool::TRUE);
        assert_eq!(s.truth_value(-1), lbool::FALSE);
        // not propagated yet, only enqueued units are visible
        assert_eq!(s.truth_value(3), lbool::UNDEF);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut s = solver();
        s.add_clause(&[1, 2]).unwrap();
        s.add_clause(&[-1, 2]).unwrap();
        s.add_clause(&[1, -2]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        assert!(s.stats().propagations > 0);
        assert!(s.stats().decisions > 0);
        assert_eq!(s.stats().solves, 1);
    }
}
