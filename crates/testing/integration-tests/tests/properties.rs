//! Fixpoint properties over every worked example.

use fc_borrowck::{ActiveLoans, BorrowckConfig};
use fc_index::Idx;
use fc_liveness::Liveness;
use fc_mir::{BasicBlock, Body};
use fc_region::ReachabilityMode;
use integration_tests::{analyze, errors_of, programs};
use proptest::prelude::*;

/// Upper bound on blocks in any worked example.
const MAX_BLOCKS: usize = 4;

fn bodies() -> Vec<Body> {
    programs::all().unwrap()
}

#[test]
fn test_checking_twice_gives_identical_diagnostics() {
    for body in bodies() {
        assert_eq!(errors_of(&body), errors_of(&body), "{}", body.fn_name());
    }
}

#[test]
fn test_pass_counts_stay_within_the_lattice_height() {
    for body in bodies() {
        let facts = analyze(&body, &BorrowckConfig::default()).unwrap();
        let points = facts.points.len();
        let liveness_bound = facts.liveness.places().len() * points + 1;
        let active_bound = facts.loans.len() * points + 1;
        assert!(facts.liveness.passes() <= liveness_bound, "{}", body.fn_name());
        assert!(facts.active.passes() <= active_bound, "{}", body.fn_name());
        assert!(facts.liveness.passes() >= 1);
    }
}

#[test]
fn test_loops_need_more_than_one_pass() {
    let body = programs::loop_reborrow().unwrap();
    let facts = analyze(&body, &BorrowckConfig::default()).unwrap();
    assert!(facts.active.passes() >= 2);
}

#[test]
fn test_scc_and_direct_reachability_agree() {
    let mut direct = BorrowckConfig::default();
    direct.region.reachability = ReachabilityMode::Direct;
    for body in bodies() {
        let scc_facts = analyze(&body, &BorrowckConfig::default()).unwrap();
        let direct_facts = analyze(&body, &direct).unwrap();
        for origin in body.origins.indices() {
            for point in scc_facts.points.points() {
                assert_eq!(
                    scc_facts.regions.loans_in(origin, point),
                    direct_facts.regions.loans_in(origin, point),
                    "{} {origin} at {}",
                    body.fn_name(),
                    scc_facts.points.location(point)
                );
            }
        }
        assert_eq!(scc_facts.errors, direct_facts.errors);
    }
}

fn visiting_order() -> impl Strategy<Value = (usize, Vec<usize>)> {
    let program_count = bodies().len();
    (
        0..program_count,
        Just((0..MAX_BLOCKS).collect::<Vec<_>>()).prop_shuffle(),
        0..=MAX_BLOCKS,
    )
        .prop_map(|(index, order, keep)| (index, order.into_iter().take(keep).collect::<Vec<_>>()))
}

fn blocks_of(body: &Body, order: &[usize]) -> Vec<BasicBlock> {
    order
        .iter()
        .filter(|&&block| block < body.basic_blocks.len())
        .map(|&block| BasicBlock::new(block))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_liveness_does_not_depend_on_visiting_order((index, order) in visiting_order()) {
        let bodies = bodies();
        let body = &bodies[index];
        let facts = analyze(body, &BorrowckConfig::default()).unwrap();
        let reordered = Liveness::compute_with_order(body, &facts.points, &blocks_of(body, &order));
        for point in facts.points.points() {
            prop_assert_eq!(
                facts.liveness.live_place_set(point),
                reordered.live_place_set(point)
            );
        }
    }

    #[test]
    fn test_active_loans_do_not_depend_on_visiting_order((index, order) in visiting_order()) {
        let bodies = bodies();
        let body = &bodies[index];
        let facts = analyze(body, &BorrowckConfig::default()).unwrap();
        let reordered = ActiveLoans::compute_with_order(
            body,
            &facts.points,
            &facts.liveness,
            &facts.loans,
            &facts.regions,
            &blocks_of(body, &order),
        );
        for point in facts.points.points() {
            prop_assert_eq!(
                facts.active.active_on_entry(point),
                reordered.active_on_entry(point)
            );
        }
    }
}
