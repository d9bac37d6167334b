use triplestore::dict::{Literal, Term, encode_integer};
use triplestore::kve::SledEngine;
use triplestore::pattern::Binding::{Bound, Free};
use triplestore::pattern::Pattern;
use triplestore::{Store, StoreConfig};

fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(StoreConfig::new(dir.path())).expect("open");
    (dir, store)
}

#[test]
fn scenario_inline_integer_path() {
    let id = encode_integer(42).unwrap();
    let (_dir, store) = open_store();
    let term = store.dictionary().lookup_term(id).unwrap().unwrap();
    assert_eq!(
        term,
        Term::Literal(Literal::typed(
            "42",
            "http://www.w3.org/2001/XMLSchema#integer"
        ))
    );
    assert!(encode_integer(1i64 << 59).is_err());
}

#[test]
fn scenario_uri_allocation_and_mirror() {
    let (_dir, store) = open_store();
    let uri = Term::Uri("http://example.org/a".into());
    let first = store.get_or_create_id(&uri).unwrap();
    let second = store.get_or_create_id(&uri).unwrap();
    assert_eq!(first, second);
}

#[test]
fn scenario_all_eight_pattern_shapes_over_knows_and_likes() {
    let (_dir, store) = open_store();
    let subject = Term::Uri("http://example.org/1".into());
    let knows = Term::Uri("http://example.org/knows".into());
    let likes = Term::Uri("http://example.org/likes".into());
    let two = Term::Uri("http://example.org/2".into());
    let pizza = Term::Literal(Literal::plain("pizza"));

    store.insert(&subject, &knows, &two).unwrap();
    store.insert(&subject, &likes, &pizza).unwrap();

    let subject_id = store.get_or_create_id(&subject).unwrap();
    let pizza_id = store.get_or_create_id(&pizza).unwrap();
    let likes_id = store.get_or_create_id(&likes).unwrap();

    // S?O: (subject=1, object=pizza) must return only (1, likes, pizza),
    // dropping (1, knows, 2) via the residual filter.
    let s_o_results: Vec<_> = store
        .lookup(Pattern::new(Bound(subject_id), Free, Bound(pizza_id)))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(s_o_results.len(), 1);
    assert_eq!(s_o_results[0].1, likes_id);
}

#[test]
fn scenario_atomic_insert_leaves_no_partial_triple() {
    let (_dir, index) = {
        let dir = tempfile::tempdir().unwrap();
        let engine = SledEngine::open(dir.path()).unwrap();
        (dir, triplestore::index::Index::open(engine))
    };
    // a successful batch is visible in all three families at once.
    index.insert_triples(&[(1, 2, 3), (4, 5, 6)]).unwrap();
    assert!(index.triple_exists(1, 2, 3).unwrap());
    assert!(index.triple_exists(4, 5, 6).unwrap());
    assert_eq!(index.count(Pattern::new(Free, Free, Free)).unwrap(), 2);
}

#[test]
fn scenario_sequence_safety_margin_across_a_simulated_crash() {
    let dir = tempfile::tempdir().unwrap();
    let engine = SledEngine::open(dir.path()).unwrap();
    {
        let dict = triplestore::dict::Dictionary::open(engine.clone()).unwrap();
        for i in 0..2500 {
            dict.get_or_create_id(&Term::Uri(format!("http://example.org/n/{i}")))
                .unwrap();
        }
        // no explicit checkpoint: periodic checkpoints at 1000/2000 already
        // landed; drop `dict` here to simulate the crash.
    }
    let restarted = triplestore::dict::Dictionary::open(engine).unwrap();
    let id = restarted
        .get_or_create_id(&Term::Uri("http://example.org/after-crash".into()))
        .unwrap();
    // sequence value must be strictly greater than any id allocated before
    // the simulated crash (2500), thanks to the checkpoint + safety margin.
    let decoded = triplestore::dict::decode_id(id);
    assert!(decoded.value > 2500);
}

#[test]
fn scenario_iterator_survives_store_close() {
    let dir = tempfile::tempdir().unwrap();
    let engine = SledEngine::open(dir.path()).unwrap();
    let index = triplestore::index::Index::open(engine.clone());
    for i in 0..100u64 {
        index.insert_triple(1, i, i).unwrap();
    }
    let iter = index.lookup(Pattern::new(Bound(1), Free, Free));
    engine.close();
    let results: Vec<_> = iter.collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(results.len(), 100);
}
