//! Randomized properties, cross-checked against a brute-force oracle on
//! small instances.

use arcsat::{BasicSolver, SolverInterface};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct Cnf {
    n_vars: u32,
    clauses: Vec<Vec<i32>>,
}

fn cnf_strategy(max_vars: u32, max_clauses: usize) -> impl Strategy<Value = Cnf> {
    (1..=max_vars).prop_flat_map(move |nv| {
        let lit = (1..=nv as i32).prop_flat_map(|v| prop_oneof![Just(v), Just(-v)]);
        let clause = prop::collection::vec(lit, 1..=3);
        prop::collection::vec(clause, 1..=max_clauses)
            .prop_map(move |clauses| Cnf { n_vars: nv, clauses })
    })
}

/// Truth of a literal under the assignment encoded in `bits`.
fn lit_true(bits: u32, l: i32) -> bool {
    let b = bits & (1 << (l.unsigned_abs() - 1)) != 0;
    if l > 0 {
        b
    } else {
        !b
    }
}

/// Exhaustive check over all assignments of `n_vars` variables.
fn brute_force_sat(n_vars: u32, clauses: &[Vec<i32>], forced: &[i32]) -> bool {
    assert!(n_vars <= 20);
    'outer: for bits in 0u32..(1u32 << n_vars) {
        for c in clauses {
            if !c.iter().any(|&l| lit_true(bits, l)) {
                continue 'outer;
            }
        }
        for &l in forced {
            if !lit_true(bits, l) {
                continue 'outer;
            }
        }
        return true;
    }
    false
}

fn model_satisfies(clauses: &[Vec<i32>], model: &[i32]) -> bool {
    clauses
        .iter()
        .all(|c| c.iter().any(|&l| model.contains(&l)))
}

/// Load a formula; `Err` means a contradiction was already detected
/// while adding, which the oracle must confirm.
fn load(cnf: &Cnf) -> Result<BasicSolver, ()> {
    let mut s = BasicSolver::default();
    s.new_vars(cnf.n_vars);
    for c in &cnf.clauses {
        if s.add_clause(c).is_err() {
            return Err(());
        }
    }
    Ok(s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_verdict_matches_brute_force(cnf in cnf_strategy(8, 26)) {
        let expected = brute_force_sat(cnf.n_vars, &cnf.clauses, &[]);
        match load(&cnf) {
            Err(()) => prop_assert!(!expected),
            Ok(mut s) => {
                let sat = s.is_satisfiable().unwrap();
                prop_assert_eq!(sat, expected);
                if sat {
                    prop_assert!(model_satisfies(&cnf.clauses, s.model()));
                }
                // solving twice in a row yields the same verdict
                let again = s.is_satisfiable().unwrap();
                prop_assert_eq!(again, sat);
                if sat {
                    prop_assert!(model_satisfies(&cnf.clauses, s.model()));
                }
            }
        }
    }

    #[test]
    fn prop_assumption_cores_are_sound(
        cnf in cnf_strategy(6, 18),
        signs in prop::collection::vec(prop::bool::ANY, 3),
    ) {
        // three assumption literals over distinct variables
        let assumps: Vec<i32> = signs
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                let v = (i + 1) as i32;
                if pos { v } else { -v }
            })
            .collect();
        let n_vars = cnf.n_vars.max(3);
        let Ok(mut s) = load(&cnf) else { return Ok(()); };
        s.new_vars(n_vars);
        let expected = brute_force_sat(n_vars, &cnf.clauses, &assumps);
        let sat = s.is_satisfiable_under(&assumps).unwrap();
        prop_assert_eq!(sat, expected);
        if sat {
            let model = s.model().to_vec();
            prop_assert!(model_satisfies(&cnf.clauses, &model));
            for a in &assumps {
                prop_assert!(model.contains(a), "assumption {} not honored", a);
            }
        } else {
            let core = s.unsat_explanation().to_vec();
            // the core is a subset of the assumptions...
            for l in &core {
                prop_assert!(assumps.contains(l));
            }
            // ...that already refutes the formula on its own
            prop_assert!(!brute_force_sat(n_vars, &cnf.clauses, &core));
        }
    }

    #[test]
    fn prop_at_least_matches_counting_oracle(
        cnf in cnf_strategy(6, 10),
        degree in 1u32..=3,
    ) {
        // an "at least degree of all variables" side constraint
        let card_lits: Vec<i32> = (1..=cnf.n_vars as i32).collect();
        if (card_lits.len() as u32) < degree {
            return Ok(());
        }
        let Ok(mut s) = load(&cnf) else { return Ok(()); };
        if s.add_at_least(&card_lits, degree as i32).is_err() {
            // only possible when units already pin too many to false
            prop_assert!(!brute_force_card(&cnf, &card_lits, degree));
            return Ok(());
        }
        let expected = brute_force_card(&cnf, &card_lits, degree);
        let sat = s.is_satisfiable().unwrap();
        prop_assert_eq!(sat, expected);
        if sat {
            let model = s.model();
            prop_assert!(model_satisfies(&cnf.clauses, model));
            let n_true = card_lits.iter().filter(|l| model.contains(l)).count() as u32;
            prop_assert!(n_true >= degree);
        }
    }

    #[test]
    fn prop_prime_implicant_is_a_consistent_model_subset(cnf in cnf_strategy(7, 20)) {
        let Ok(mut s) = load(&cnf) else { return Ok(()); };
        if !s.is_satisfiable().unwrap() {
            return Ok(());
        }
        let model = s.model().to_vec();
        let prime = s.prime_implicant();
        // only literals of the model survive, each at most once
        for (i, l) in prime.iter().enumerate() {
            prop_assert!(model.contains(l));
            prop_assert!(!prime[..i].contains(l));
        }
        prop_assert!(prime.len() <= model.len());
    }
}

fn brute_force_card(cnf: &Cnf, card_lits: &[i32], degree: u32) -> bool {
    'outer: for bits in 0u32..(1u32 << cnf.n_vars) {
        for c in &cnf.clauses {
            if !c.iter().any(|&l| lit_true(bits, l)) {
                continue 'outer;
            }
        }
        let n_true = card_lits.iter().filter(|&&l| lit_true(bits, l)).count() as u32;
        if n_true >= degree {
            return true;
        }
    }
    false
}
