use triplestore::kve::Cf;
use triplestore::pattern::Binding::{Bound, Free};
use triplestore::pattern::{Filter, Pattern, select_index, triple_matches_pattern};

#[test]
fn every_bound_shape_resolves_to_the_expected_index_and_prefix_length() {
    let cases = [
        (Pattern::new(Bound(1), Bound(2), Bound(3)), Cf::Spo, 24),
        (Pattern::new(Bound(1), Bound(2), Free), Cf::Spo, 16),
        (Pattern::new(Bound(1), Free, Free), Cf::Spo, 8),
        (Pattern::new(Free, Bound(2), Bound(3)), Cf::Pos, 16),
        (Pattern::new(Free, Bound(2), Free), Cf::Pos, 8),
        (Pattern::new(Free, Free, Bound(3)), Cf::Osp, 8),
        (Pattern::new(Bound(1), Free, Bound(3)), Cf::Osp, 16),
        (Pattern::new(Free, Free, Free), Cf::Spo, 0),
    ];
    for (pattern, expected_index, expected_len) in cases {
        let plan = select_index(&pattern);
        assert_eq!(plan.index, expected_index, "pattern {pattern:?}");
        assert_eq!(plan.prefix.len(), expected_len, "pattern {pattern:?}");
    }
}

#[test]
fn only_s_o_shape_carries_a_residual_filter() {
    let s_o = Pattern::new(Bound(1), Free, Bound(3));
    assert_eq!(select_index(&s_o).filter, Filter::Residual(s_o));

    let others = [
        Pattern::new(Bound(1), Bound(2), Bound(3)),
        Pattern::new(Bound(1), Bound(2), Free),
        Pattern::new(Bound(1), Free, Free),
        Pattern::new(Free, Bound(2), Bound(3)),
        Pattern::new(Free, Bound(2), Free),
        Pattern::new(Free, Free, Bound(3)),
        Pattern::new(Free, Free, Free),
    ];
    for pattern in others {
        assert_eq!(
            select_index(&pattern).filter,
            Filter::None,
            "pattern {pattern:?}"
        );
    }
}

#[test]
fn triple_matches_pattern_treats_free_positions_as_wildcards() {
    let pattern = Pattern::new(Bound(1), Free, Bound(3));
    assert!(triple_matches_pattern((1, 999, 3), &pattern));
    assert!(!triple_matches_pattern((1, 999, 4), &pattern));
    assert!(!triple_matches_pattern((2, 999, 3), &pattern));
}
