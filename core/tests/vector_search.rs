mod common;

use common::write_doc;
use search_core::normalize::Lemmatizer;
use search_core::persist::{self, IndexPaths};
use search_core::ranker::VectorIndex;
use search_core::stats::CorpusStats;
use search_core::store::Store;
use tempfile::tempdir;

const EPS: f64 = 1e-9;

/// Run the full batch pipeline into an index directory and load the
/// query-time structures back, the way the binaries wire it.
fn build_and_load(store: &Store, out: &std::path::Path) -> VectorIndex {
    let paths = IndexPaths::new(out);
    let stats = CorpusStats::compute(store).unwrap();
    for &num in store.doc_nums() {
        let doc = store.load(num).unwrap();
        persist::save_weights(&paths.token_weights(num), &stats.token_weights(&doc)).unwrap();
        persist::save_weights(&paths.lemma_weights(num), &stats.lemma_weights(&doc)).unwrap();
    }
    VectorIndex::load(&paths).unwrap()
}

#[test]
fn two_doc_example_matches_only_the_dog_document() {
    let store_dir = tempdir().unwrap();
    write_doc(
        store_dir.path(),
        1,
        &["кот", "собака"],
        &[("кот", &["кот"]), ("собака", &["собака"])],
    );
    write_doc(
        store_dir.path(),
        2,
        &["кот", "кота", "птица"],
        &[("кот", &["кот", "кота"]), ("птица", &["птица"])],
    );
    let store = Store::open(store_dir.path()).unwrap();
    let lemmatizer = Lemmatizer::from_store(&store).unwrap();

    let out = tempdir().unwrap();
    let vectors = build_and_load(&store, out.path());
    assert_eq!(vectors.num_docs(), 2);
    assert!((vectors.idf("собака").unwrap() - 2f64.ln()).abs() < EPS);

    // doc2 shares only кот with the query, whose weight is zero, so
    // its dot product is zero and it is excluded, not scored 0.
    let hits = vectors.search("собака", &lemmatizer, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, "page-1");
    assert!(hits[0].score > 0.0);
}

#[test]
fn document_queried_with_its_own_content_ranks_itself_first() {
    let store_dir = tempdir().unwrap();
    write_doc(
        store_dir.path(),
        1,
        &["красный", "кот", "кота"],
        &[("красный", &["красный"]), ("кот", &["кот", "кота"])],
    );
    write_doc(
        store_dir.path(),
        2,
        &["красный", "дом"],
        &[("красный", &["красный"]), ("дом", &["дом"])],
    );
    write_doc(store_dir.path(), 3, &["сад"], &[("сад", &["сад"])]);
    let store = Store::open(store_dir.path()).unwrap();
    let lemmatizer = Lemmatizer::from_store(&store).unwrap();

    let out = tempdir().unwrap();
    let vectors = build_and_load(&store, out.path());

    // Same lemmatized content and multiplicities as doc1.
    let hits = vectors.search("красный кот кота", &lemmatizer, 10);
    assert_eq!(hits[0].doc_id, "page-1");
    assert!((hits[0].score - 1.0).abs() < EPS);
    for hit in &hits[1..] {
        assert!(hit.score <= hits[0].score + EPS);
    }
}

#[test]
fn empty_and_unknown_queries_return_no_results() {
    let store_dir = tempdir().unwrap();
    write_doc(store_dir.path(), 1, &["кот"], &[("кот", &["кот"])]);
    let store = Store::open(store_dir.path()).unwrap();
    let lemmatizer = Lemmatizer::from_store(&store).unwrap();
    let out = tempdir().unwrap();
    let vectors = build_and_load(&store, out.path());

    assert!(vectors.search("", &lemmatizer, 10).is_empty());
    // Terms absent from the IDF table are dropped; the query vector
    // has norm zero.
    assert!(vectors.search("слон жираф", &lemmatizer, 10).is_empty());
    let (weights, norm) = vectors.query_vector("слон", &lemmatizer);
    assert!(weights.is_empty());
    assert_eq!(norm, 0.0);
}

#[test]
fn ranking_is_order_stable_and_ties_break_by_doc_id() {
    let store_dir = tempdir().unwrap();
    // Two identical documents tie exactly; a third shares nothing.
    for num in [1, 2] {
        write_doc(
            store_dir.path(),
            num,
            &["кот", "мышь"],
            &[("кот", &["кот"]), ("мышь", &["мышь"])],
        );
    }
    write_doc(store_dir.path(), 3, &["дом"], &[("дом", &["дом"])]);
    let store = Store::open(store_dir.path()).unwrap();
    let lemmatizer = Lemmatizer::from_store(&store).unwrap();
    let out = tempdir().unwrap();
    let vectors = build_and_load(&store, out.path());

    let first = vectors.search("мышь", &lemmatizer, 10);
    let second = vectors.search("мышь", &lemmatizer, 10);
    assert_eq!(first, second);

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].doc_id, "page-1");
    assert_eq!(first[1].doc_id, "page-2");
    assert!((first[0].score - first[1].score).abs() < EPS);
}

#[test]
fn k_truncates_the_ranked_list() {
    let store_dir = tempdir().unwrap();
    for num in 1..=5 {
        write_doc(
            store_dir.path(),
            num,
            &["кот", "мышь"],
            &[("кот", &["кот"]), ("мышь", &["мышь"])],
        );
    }
    // Break the кот/мышь symmetry so DF varies across the corpus.
    write_doc(store_dir.path(), 6, &["кот"], &[("кот", &["кот"])]);
    let store = Store::open(store_dir.path()).unwrap();
    let lemmatizer = Lemmatizer::from_store(&store).unwrap();
    let out = tempdir().unwrap();
    let vectors = build_and_load(&store, out.path());

    assert_eq!(vectors.search("мышь", &lemmatizer, 3).len(), 3);
    assert_eq!(vectors.rank("мышь", &lemmatizer).len(), 5);
}

#[test]
fn loaded_index_agrees_with_in_memory_construction() {
    let store_dir = tempdir().unwrap();
    write_doc(
        store_dir.path(),
        1,
        &["кот", "собака"],
        &[("кот", &["кот"]), ("собака", &["собака"])],
    );
    write_doc(store_dir.path(), 2, &["кот"], &[("кот", &["кот"])]);
    let store = Store::open(store_dir.path()).unwrap();
    let lemmatizer = Lemmatizer::from_store(&store).unwrap();

    let out = tempdir().unwrap();
    let loaded = build_and_load(&store, out.path());

    let stats = CorpusStats::compute(&store).unwrap();
    let mut doc_vectors = std::collections::BTreeMap::new();
    for &num in store.doc_nums() {
        let doc = store.load(num).unwrap();
        let weights = stats
            .lemma_weights(&doc)
            .into_iter()
            .map(|l| (l.term, l.tfidf))
            .collect();
        doc_vectors.insert(Store::doc_id(num), weights);
    }
    let in_memory = VectorIndex::from_vectors(doc_vectors, stats.lemma_idf_table());

    assert_eq!(
        loaded.search("собака", &lemmatizer, 10),
        in_memory.search("собака", &lemmatizer, 10)
    );
}
