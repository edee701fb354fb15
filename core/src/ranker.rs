//! Vector-space ranking over the persisted lemma-space TF-IDF vectors:
//! sparse dot products, cosine similarity, descending top-k.

use crate::normalize::Lemmatizer;
use crate::persist::{self, IndexPaths};
use crate::store::Store;
use crate::DocId;
use anyhow::Result;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct DocVector {
    weights: HashMap<String, f64>,
    norm: f64,
}

/// Query-time view of the corpus: per-document sparse TF-IDF vectors
/// with precomputed L2 norms, plus the corpus-wide IDF table.
/// Immutable after load; safe to share across query threads.
#[derive(Debug, Default, Clone)]
pub struct VectorIndex {
    docs: BTreeMap<DocId, DocVector>,
    idf: HashMap<String, f64>,
}

impl VectorIndex {
    /// Load every persisted lemma-space weight file. The IDF table is
    /// corpus-wide: the first-seen value for a term wins (in a correct
    /// run every document agrees for a given N).
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let nums = persist::weight_file_nums(&paths.lemma_weights_dir(), "tfidf_lemmas_")?;
        let mut index = Self::default();
        for num in nums {
            let lines = persist::load_weights(&paths.lemma_weights(num))?;
            let mut weights = HashMap::with_capacity(lines.len());
            for line in lines {
                weights.insert(line.term.clone(), line.tfidf);
                index.idf.entry(line.term).or_insert(line.idf);
            }
            index.insert(Store::doc_id(num), weights);
        }
        tracing::debug!(
            num_docs = index.docs.len(),
            num_terms = index.idf.len(),
            "loaded tf-idf vectors"
        );
        Ok(index)
    }

    /// Assemble an index from in-memory vectors (same layout the weight
    /// files carry).
    pub fn from_vectors(
        doc_vectors: BTreeMap<DocId, HashMap<String, f64>>,
        idf: HashMap<String, f64>,
    ) -> Self {
        let mut index = Self {
            docs: BTreeMap::new(),
            idf,
        };
        for (doc_id, weights) in doc_vectors {
            index.insert(doc_id, weights);
        }
        index
    }

    fn insert(&mut self, doc_id: DocId, weights: HashMap<String, f64>) {
        let norm = l2_norm(&weights);
        self.docs.insert(doc_id, DocVector { weights, norm });
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// Build the query-side vector with the lemma-space TF formula:
    /// occurrences over total query tokens. Lemmas absent from the
    /// corpus IDF table are dropped. An empty query yields an empty
    /// vector with norm 0.
    pub fn query_vector(
        &self,
        query: &str,
        lemmatizer: &Lemmatizer,
    ) -> (HashMap<String, f64>, f64) {
        let terms = lemmatizer.lemmatize_text(query);
        if terms.is_empty() {
            return (HashMap::new(), 0.0);
        }
        let total = terms.len() as f64;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in terms {
            *counts.entry(term).or_insert(0) += 1;
        }
        let mut weights = HashMap::new();
        for (term, count) in counts {
            if let Some(&idf) = self.idf.get(&term) {
                weights.insert(term, (f64::from(count) / total) * idf);
            }
        }
        let norm = l2_norm(&weights);
        (weights, norm)
    }

    /// Score every comparable document against the query, descending
    /// similarity, ties broken by ascending document id. Documents
    /// whose dot product with the query is zero are excluded rather
    /// than scored 0, as are zero-norm documents and queries.
    pub fn rank(&self, query: &str, lemmatizer: &Lemmatizer) -> Vec<ScoredDoc> {
        let (q_weights, q_norm) = self.query_vector(query, lemmatizer);
        if q_norm == 0.0 {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (doc_id, doc) in &self.docs {
            let dot: f64 = q_weights
                .iter()
                .filter_map(|(term, q_w)| doc.weights.get(term).map(|d_w| q_w * d_w))
                .sum();
            if dot > 0.0 && doc.norm > 0.0 {
                hits.push(ScoredDoc {
                    doc_id: doc_id.clone(),
                    score: dot / (q_norm * doc.norm),
                });
            }
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        hits
    }

    /// Top-k cosine search (k defaults to [`DEFAULT_TOP_K`] at the API
    /// surface).
    pub fn search(&self, query: &str, lemmatizer: &Lemmatizer, k: usize) -> Vec<ScoredDoc> {
        let mut hits = self.rank(query, lemmatizer);
        hits.truncate(k);
        hits
    }
}

fn l2_norm(weights: &HashMap<String, f64>) -> f64 {
    weights.values().map(|w| w * w).sum::<f64>().sqrt()
}
