//! Property tests for chain truth and traversal completeness.
//!
//! Covers:
//! - Chain truthiness equals the AND of pairwise comparisons
//! - Approximate equivalence is reflexive and symmetric
//! - Every leaf of a randomly shaped deterministic tree is visited exactly
//!   once, in declaration order, with one pass per leaf
//! - Subcase accounting equals nodes ever active
//! - De-duplication collapses k failures into one record with count k

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use casewalk::{check, compare::approx_eq, Driver, Registry, RunReport, TestCx};

fn run_case(
    name: &'static str,
    body: impl Fn(&mut TestCx) + Send + Sync + 'static,
) -> RunReport {
    let mut registry = Registry::new();
    registry.case(name, body);
    Driver::default().run(&registry).expect("engine error")
}

// ============================================================================
// Chain truthiness
// ============================================================================

proptest! {
    #[test]
    fn lt_chain_matches_pairwise_and(a in any::<i64>(), b in any::<i64>(), c in any::<i64>()) {
        let expected = a < b && b < c;
        let report = run_case("lt-chain", move |cx| {
            check!(cx, a < b < c);
        });
        prop_assert_eq!(report.success(), expected);
    }

    #[test]
    fn mixed_op_chain_matches_pairwise_and(
        a in -50_i64..50,
        b in -50_i64..50,
        c in -50_i64..50,
        d in -50_i64..50,
    ) {
        let expected = a <= b && b == c && c > d;
        let report = run_case("mixed-chain", move |cx| {
            check!(cx, a <= b == c > d);
        });
        prop_assert_eq!(report.success(), expected);
    }

    #[test]
    fn two_element_chain_matches_operator(a in any::<i32>(), b in any::<i32>()) {
        let report = run_case("pairs", move |cx| {
            check!(cx, a == b);
            check!(cx, a != b);
            check!(cx, a < b);
            check!(cx, a <= b);
            check!(cx, a >= b);
            check!(cx, a > b);
        });
        let expected_failures = u64::from(a != b)
            + u64::from(a == b)
            + u64::from(!(a < b))
            + u64::from(!(a <= b))
            + u64::from(!(a >= b))
            + u64::from(!(a > b));
        prop_assert_eq!(report.results.failures, expected_failures);
    }
}

// ============================================================================
// Approximate equivalence
// ============================================================================

proptest! {
    #[test]
    fn approx_is_reflexive(a in -1e9_f64..1e9, p in 1e-12_f64..1e-3) {
        prop_assert!(approx_eq(&a, &a, p));
    }

    #[test]
    fn approx_is_symmetric(a in -1e6_f64..1e6, b in -1e6_f64..1e6, p in 1e-12_f64..1e-3) {
        prop_assert_eq!(approx_eq(&a, &b, p), approx_eq(&b, &a, p));
    }
}

// ============================================================================
// Traversal completeness over random trees
// ============================================================================

#[derive(Debug, Clone)]
struct Tree(Vec<Tree>);

fn tree_strategy() -> impl Strategy<Value = Tree> {
    let leaf = Just(Tree(Vec::new()));
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop::collection::vec(inner, 0..3).prop_map(Tree)
    })
}

fn declare(cx: &mut TestCx, node: &Tree, path: &str, visits: &Mutex<Vec<String>>) {
    if node.0.is_empty() {
        visits.lock().unwrap().push(path.to_string());
        return;
    }
    for (i, child) in node.0.iter().enumerate() {
        let name = format!("n{i}");
        let child_path = format!("{path}/{i}");
        cx.subcase(&name, |cx| declare(cx, child, &child_path, visits));
    }
}

fn expected_leaves(node: &Tree, path: &str, out: &mut Vec<String>) {
    if node.0.is_empty() {
        out.push(path.to_string());
        return;
    }
    for (i, child) in node.0.iter().enumerate() {
        expected_leaves(child, &format!("{path}/{i}"), out);
    }
}

fn node_count(node: &Tree) -> u64 {
    1 + node.0.iter().map(node_count).sum::<u64>()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_leaf_visited_exactly_once_in_order(tree in tree_strategy()) {
        let visits: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let passes = Arc::new(AtomicU64::new(0));

        let visits_in = Arc::clone(&visits);
        let passes_in = Arc::clone(&passes);
        let body_tree = tree.clone();

        let report = run_case("tree", move |cx| {
            passes_in.fetch_add(1, Ordering::SeqCst);
            declare(cx, &body_tree, "", &visits_in);
        });

        let mut expected = Vec::new();
        expected_leaves(&tree, "", &mut expected);

        let visited = visits.lock().unwrap().clone();
        prop_assert_eq!(&visited, &expected, "leaves in declaration order");
        prop_assert_eq!(passes.load(Ordering::SeqCst), expected.len() as u64);
        prop_assert_eq!(report.results.subcases, node_count(&tree));
        prop_assert!(report.success());
    }
}

// ============================================================================
// De-duplication
// ============================================================================

proptest! {
    #[test]
    fn k_failures_collapse_into_one_record(k in 2_u64..10) {
        let report = run_case("dedup-prop", move |cx| {
            for _ in 0..k {
                check!(cx, 1 == 2);
            }
        });
        prop_assert_eq!(report.results.failures, k);
        prop_assert_eq!(report.failures.len(), 1);
        prop_assert_eq!(report.failures[0].count, k);
    }
}
