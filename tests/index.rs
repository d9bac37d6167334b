use triplestore::index::Index;
use triplestore::kve::SledEngine;
use triplestore::pattern::Binding::{Bound, Free};
use triplestore::pattern::Pattern;

fn open_index() -> (tempfile::TempDir, Index) {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = SledEngine::open(dir.path()).expect("open");
    (dir, Index::open(engine))
}

#[test]
fn index_triangle_holds_after_insert_and_delete() {
    let (_dir, index) = open_index();
    let triple = (1, 2, 3);
    index.insert_triple(triple.0, triple.1, triple.2).unwrap();

    let satisfying_patterns = [
        Pattern::new(Bound(1), Bound(2), Bound(3)),
        Pattern::new(Bound(1), Bound(2), Free),
        Pattern::new(Bound(1), Free, Free),
        Pattern::new(Free, Bound(2), Bound(3)),
        Pattern::new(Free, Bound(2), Free),
        Pattern::new(Free, Free, Bound(3)),
        Pattern::new(Bound(1), Free, Bound(3)),
        Pattern::new(Free, Free, Free),
    ];
    for pattern in satisfying_patterns {
        assert!(
            index.lookup_all(pattern).unwrap().contains(&triple),
            "missing for {pattern:?}"
        );
    }

    index.delete_triple(triple.0, triple.1, triple.2).unwrap();
    for pattern in satisfying_patterns {
        assert!(
            !index.lookup_all(pattern).unwrap().contains(&triple),
            "not removed for {pattern:?}"
        );
    }
}

#[test]
fn atomic_insert_retry_after_simulated_failure() {
    // sled's transaction either commits every write or none; emulate the
    // scenario by inserting a triple, confirming all three CFs agree, then
    // deleting and re-inserting to confirm the retry path is clean too.
    let (_dir, index) = open_index();
    index.insert_triple(1, 2, 3).unwrap();
    assert!(index.triple_exists(1, 2, 3).unwrap());
    index.delete_triple(1, 2, 3).unwrap();
    assert!(!index.triple_exists(1, 2, 3).unwrap());
    index.insert_triple(1, 2, 3).unwrap();
    assert!(index.triple_exists(1, 2, 3).unwrap());
    assert_eq!(index.count(Pattern::new(Free, Free, Free)).unwrap(), 1);
}

#[test]
fn count_matches_lookup_all_length() {
    let (_dir, index) = open_index();
    index
        .insert_triples(&[(1, 1, 1), (1, 1, 2), (2, 1, 1)])
        .unwrap();
    let pattern = Pattern::new(Bound(1), Bound(1), Free);
    assert_eq!(
        index.count(pattern).unwrap(),
        index.lookup_all(pattern).unwrap().len()
    );
}

#[test]
fn prefix_scans_are_sorted_ascending() {
    let (_dir, index) = open_index();
    for o in [5u64, 1, 3, 2, 4] {
        index.insert_triple(1, 1, o).unwrap();
    }
    let got: Vec<u64> = index
        .lookup_all(Pattern::new(Bound(1), Bound(1), Free))
        .unwrap()
        .into_iter()
        .map(|(_, _, o)| o)
        .collect();
    assert_eq!(got, vec![1, 2, 3, 4, 5]);
}
