//! End-to-end scenarios through the public interface.

use arcsat::{
    BasicSolver, ContradictionError, LearnedDeletion, RestartPolicy, SearchEnumerator,
    SimplificationKind, Solver, SolverInterface, SolverOpts, TimeoutError, VoidTracing,
};

fn solver() -> BasicSolver {
    BasicSolver::default()
}

/// Pigeonhole principle: `pigeons` pigeons in `pigeons - 1` holes, as
/// clauses. Unsatisfiable and reasonably hard for its size.
fn pigeonhole(s: &mut BasicSolver, pigeons: i32) {
    let holes = pigeons - 1;
    let p = |i: i32, j: i32| (i - 1) * holes + j;
    for i in 1..=pigeons {
        let c: Vec<i32> = (1..=holes).map(|j| p(i, j)).collect();
        s.add_clause(&c).unwrap();
    }
    for j in 1..=holes {
        for i1 in 1..=pigeons {
            for i2 in (i1 + 1)..=pigeons {
                s.add_clause(&[-p(i1, j), -p(i2, j)]).unwrap();
            }
        }
    }
}

#[test]
fn s1_simple_sat() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    s.add_clause(&[-1, 2]).unwrap();
    s.add_clause(&[1, -2]).unwrap();
    assert!(s.is_satisfiable().unwrap());
    assert!(s.model_value(1));
    assert!(s.model_value(2));
    assert_eq!(s.model(), &[1, 2]);
}

#[test]
fn s2_unit_contradiction_on_add() {
    let mut s = solver();
    s.add_clause(&[1]).unwrap();
    assert_eq!(s.add_clause(&[-1]), Err(ContradictionError));
}

#[test]
fn s2_root_refutation_without_units() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    s.add_clause(&[1, -2]).unwrap();
    s.add_clause(&[-1, 2]).unwrap();
    s.add_clause(&[-1, -2]).unwrap();
    assert!(!s.is_satisfiable().unwrap());
}

#[test]
fn s3_unsat_with_empty_explanation() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    s.add_clause(&[1, -2]).unwrap();
    s.add_clause(&[-1, 3]).unwrap();
    s.add_clause(&[-1, -3]).unwrap();
    assert!(!s.is_satisfiable().unwrap());
    assert!(s.unsat_explanation().is_empty());
}

#[test]
fn s4_assumption_core() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    s.add_clause(&[-1, 2]).unwrap();
    s.add_clause(&[1, -2]).unwrap();
    assert!(!s.is_satisfiable_under(&[-2]).unwrap());
    assert!(s.unsat_explanation().contains(&-2));
    // assumptions are retracted after the call
    assert!(s.is_satisfiable().unwrap());
    assert_eq!(s.model(), &[1, 2]);
}

#[test]
fn s5_enumeration_of_pigeonhole_is_empty() {
    let mut s: Solver<SearchEnumerator> =
        Solver::new(SolverOpts::default(), SearchEnumerator::new());
    // P(3, 2), inlined since the helper is typed for the basic solver
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
fn s5_enumeration_counts_and_blocks() {
    let mut s: Solver<SearchEnumerator> =
        Solver::new(SolverOpts::default(), SearchEnumerator::keeping_models());
    s.new_vars(3);
    s.add_clause(&[1, 2]).unwrap();
    s.add_clause(&[-3]).unwrap();
    assert!(!s.is_satisfiable().unwrap());
    let models = s.listener().models().to_vec();
    assert_eq!(models.len(), 3);
    for m in &models {
        // each enumerated model satisfies the formula
        assert!(m.contains(&1) || m.contains(&2));
        assert!(m.contains(&-3));
    }
    // all enumerated models are distinct
    for i in 0..models.len() {
        for j in (i + 1)..models.len() {
            assert_ne!(models[i], models[j]);
        }
    }
}

#[test]
fn s6_prime_implicant() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    s.add_clause(&[2, 3]).unwrap();
    assert!(s.is_satisfiable().unwrap());
    let model = s.model().to_vec();
    let prime = s.prime_implicant();
    // the implicant is a subset of the model entailing the formula
    for l in &prime {
        assert!(model.contains(l));
    }
    assert!(prime.contains(&1) || prime.contains(&2));
    assert!(prime.contains(&2) || prime.contains(&3));
}

#[test]
fn incremental_solving_keeps_constraints() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    assert!(s.is_satisfiable().unwrap());
    let first = s.model().to_vec();
    // block the first model and ask again
    let blocking: Vec<i32> = first.iter().map(|&l| -l).collect();
    s.add_clause(&blocking).unwrap();
    assert!(s.is_satisfiable().unwrap());
    assert_ne!(s.model(), first.as_slice());
    assert!(s.model().contains(&1) || s.model().contains(&2));
}

#[test]
fn assumptions_do_not_leak_between_calls() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    assert!(s.is_satisfiable_under(&[-1]).unwrap());
    assert!(s.model().contains(&2));
    assert!(s.is_satisfiable_under(&[-2]).unwrap());
    assert!(s.model().contains(&1));
    assert!(!s.is_satisfiable_under(&[-1, -2]).unwrap());
    let core = s.unsat_explanation().to_vec();
    assert!(!core.is_empty());
    for l in &core {
        assert!([-1, -2].contains(l));
    }
}

#[test]
fn direct_assumption_conflict_names_the_culprit() {
    let mut s = solver();
    s.add_clause(&[1]).unwrap();
    assert!(!s.is_satisfiable_under(&[-1, 2]).unwrap());
    let core = s.unsat_explanation();
    assert!(core.contains(&-1));
    assert!(!core.contains(&2));
}

#[test]
fn cardinality_mix() {
    let mut s = solver();
    // pick exactly two of four, but never both of {1, 2}, and not 3
    s.add_exactly(&[1, 2, 3, 4], 2).unwrap();
    s.add_at_most(&[1, 2], 1).unwrap();
    s.add_clause(&[-3]).unwrap();
    assert!(s.is_satisfiable().unwrap());
    let m = s.model();
    let chosen = [1, 2, 3, 4]
        .iter()
        .filter(|&&v| m.contains(&v))
        .count();
    assert_eq!(chosen, 2);
    assert!(!(m.contains(&1) && m.contains(&2)));
    assert!(m.contains(&-3));
    assert!(m.contains(&4));
}

#[test]
fn cardinality_conflicts_are_explained() {
    let mut s = solver();
    s.add_at_least(&[1, 2, 3], 2).unwrap();
    assert!(!s.is_satisfiable_under(&[-1, -2]).unwrap());
    let core = s.unsat_explanation();
    assert!(core.contains(&-1) || core.contains(&-2));
}

#[test]
fn wall_clock_timeout_expires() {
    let mut s = solver();
    pigeonhole(&mut s, 9);
    s.set_timeout_ms(20);
    match s.is_satisfiable() {
        Err(TimeoutError::WallClock(ms)) => assert_eq!(ms, 20),
        other => panic!("expected a wall-clock timeout, got {:?}", other),
    }
}

#[test]
fn conflict_timeout_expires_and_recovers() {
    let mut s = solver();
    pigeonhole(&mut s, 5);
    s.set_timeout_on_conflicts(2);
    assert_eq!(s.is_satisfiable(), Err(TimeoutError::Conflicts(2)));
    s.clear_timeout();
    assert!(!s.is_satisfiable().unwrap());
}

#[test]
fn restart_policies_all_refute() {
    for restart in [
        RestartPolicy::Luby { factor: 4 },
        RestartPolicy::Geometric {
            first: 10,
            inc: 1.5,
        },
        RestartPolicy::Dynamic,
        RestartPolicy::Never,
    ] {
        let mut opts = SolverOpts::default();
        opts.restart = restart;
        let mut s: BasicSolver = Solver::new(opts, VoidTracing);
        pigeonhole(&mut s, 5);
        assert!(!s.is_satisfiable().unwrap(), "{:?}", restart);
    }
}

#[test]
fn simplifiers_all_agree() {
    for simplifier in [
        SimplificationKind::None,
        SimplificationKind::Simple,
        SimplificationKind::Expensive,
        SimplificationKind::ExpensiveWlonly,
    ] {
        let mut opts = SolverOpts::default();
        opts.simplifier = simplifier;
        let mut s: BasicSolver = Solver::new(opts, VoidTracing);
        pigeonhole(&mut s, 5);
        assert!(!s.is_satisfiable().unwrap(), "{:?}", simplifier);

        let mut s = BasicSolver::default();
        s.set_simplifier(simplifier);
        s.add_clause(&[1, 2, 3]).unwrap();
        s.add_clause(&[-1, 2]).unwrap();
        s.add_clause(&[-2, 3]).unwrap();
        assert!(s.is_satisfiable().unwrap());
        assert!(s.model().contains(&3));
    }
}

#[test]
fn deletion_strategies_survive_long_runs() {
    for deletion in [
        LearnedDeletion::FixedSize(20),
        LearnedDeletion::MemoryBased,
        LearnedDeletion::Lbd,
    ] {
        let mut opts = SolverOpts::default();
        opts.deletion = deletion;
        let mut s: BasicSolver = Solver::new(opts, VoidTracing);
        pigeonhole(&mut s, 6);
        assert!(!s.is_satisfiable().unwrap(), "{:?}", deletion);
    }
}

#[test]
fn deletion_strategy_swappable_between_calls() {
    let mut s = solver();
    pigeonhole(&mut s, 5);
    s.set_learned_deletion(LearnedDeletion::FixedSize(8));
    assert!(!s.is_satisfiable().unwrap());
    s.set_learned_deletion(LearnedDeletion::Lbd);
    assert!(!s.is_satisfiable().unwrap());
}

#[test]
fn auxiliary_variables_stay_internal() {
    let mut s = solver();
    s.new_vars(2);
    let aux = s.next_free_var_id(true);
    assert_eq!(aux, 3);
    // aux <-> (1 or 2), used positively
    s.add_clause(&[-aux, 1, 2]).unwrap();
    s.add_clause(&[aux, -1]).unwrap();
    s.add_clause(&[aux, -2]).unwrap();
    s.add_clause(&[aux]).unwrap();
    assert!(s.is_satisfiable().unwrap());
    assert_eq!(s.model().len(), 2);
    assert_eq!(s.model_with_internal_variables().len(), 3);
    assert!(s.model_with_internal_variables().contains(&aux));
}

#[test]
fn root_simplification_keeps_answers_correct() {
    let mut s = solver();
    s.set_db_simplification_allowed(true);
    s.add_clause(&[1]).unwrap();
    s.add_clause(&[1, 2]).unwrap(); // satisfied at the root, removable
    s.add_clause(&[-1, 3]).unwrap();
    assert!(s.is_satisfiable().unwrap());
    assert!(s.model_value(1));
    assert!(s.model_value(3));
}

#[test]
fn tallies_track_constraint_kinds() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    s.add_at_least(&[1, 2, 3], 2).unwrap();
    assert_eq!(s.constr_tallies().clauses, 1);
    assert_eq!(s.constr_tallies().cardinalities, 1);
    assert_eq!(s.n_constraints(), 2);
}

#[test]
fn find_model_convenience() {
    let mut s = solver();
    s.add_clause(&[1, 2]).unwrap();
    let m = s.find_model(&[-1]).unwrap().unwrap();
    assert!(m.contains(&2));
    s.add_clause(&[-2]).unwrap();
    assert_eq!(s.find_model(&[-1]).unwrap(), None);
}
