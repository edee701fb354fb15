//! Two-pass TF-IDF computation. Pass one accumulates corpus-wide
//! document frequencies; pass two emits per-document weight lines
//! against the frozen DF tables, so every IDF in a run divides by the
//! same corpus size N.
//!
//! The two term spaces intentionally use different TF formulas:
//! token-space TF is the raw occurrence count, lemma-space TF is the
//! document-length-normalized share of lemmatized occurrences.
//! Downstream consumers rely on this distinction.

use crate::store::{DocTerms, Store, StoreError};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One `(term, idf, tfidf)` output line.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightLine {
    pub term: String,
    pub idf: f64,
    pub tfidf: f64,
}

/// Corpus-wide document frequencies for both term spaces, plus the
/// fixed corpus size N. Immutable after `compute`.
pub struct CorpusStats {
    num_docs: u32,
    token_df: HashMap<String, u32>,
    lemma_df: HashMap<String, u32>,
}

impl CorpusStats {
    /// Pass one: scan the full declared corpus and count, per term,
    /// the documents containing it at least once.
    pub fn compute(store: &Store) -> Result<Self, StoreError> {
        let mut token_df: HashMap<String, u32> = HashMap::new();
        let mut lemma_df: HashMap<String, u32> = HashMap::new();
        for doc in store.iter() {
            let doc = doc?;
            let unique: BTreeSet<&str> = doc.tokens.iter().map(String::as_str).collect();
            for token in unique {
                *token_df.entry(token.to_string()).or_insert(0) += 1;
            }
            for lemma in doc.lemmas.keys() {
                *lemma_df.entry(lemma.clone()).or_insert(0) += 1;
            }
        }
        tracing::debug!(
            num_docs = store.num_docs(),
            token_terms = token_df.len(),
            lemma_terms = lemma_df.len(),
            "accumulated document frequencies"
        );
        Ok(Self {
            num_docs: store.num_docs(),
            token_df,
            lemma_df,
        })
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn token_df(&self, term: &str) -> Option<u32> {
        self.token_df.get(term).copied()
    }

    pub fn lemma_df(&self, term: &str) -> Option<u32> {
        self.lemma_df.get(term).copied()
    }

    /// Corpus-wide lemma IDF table, as the ranker consumes it.
    pub fn lemma_idf_table(&self) -> HashMap<String, f64> {
        self.lemma_df
            .iter()
            .map(|(term, &df)| (term.clone(), self.idf(df)))
            .collect()
    }

    fn idf(&self, df: u32) -> f64 {
        (f64::from(self.num_docs) / f64::from(df)).ln()
    }

    // Every term seen in pass two was counted in pass one; a miss here
    // means the passes scanned different stores.
    fn df_or_one(df: Option<u32>, term: &str) -> u32 {
        debug_assert!(df.is_some(), "term {term:?} missing from DF table");
        df.unwrap_or(1)
    }

    /// Token-space weights for one document, sorted by term. TF is the
    /// raw occurrence count, never normalized by document length.
    pub fn token_weights(&self, doc: &DocTerms) -> Vec<WeightLine> {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for token in &doc.tokens {
            *counts.entry(token).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(term, count)| {
                let df = Self::df_or_one(self.token_df(term), term);
                let idf = self.idf(df);
                WeightLine {
                    term: term.to_string(),
                    idf,
                    tfidf: f64::from(count) * idf,
                }
            })
            .collect()
    }

    /// Lemma-space weights for one document, sorted by term. TF is the
    /// share of the document's lemmatized token occurrences realizing
    /// the lemma; a document with zero lemmatized occurrences gets
    /// TF = 0 for every lemma.
    pub fn lemma_weights(&self, doc: &DocTerms) -> Vec<WeightLine> {
        let total: u32 = doc.lemmas.values().map(|forms| forms.len() as u32).sum();
        doc.lemmas
            .iter()
            .map(|(lemma, forms)| {
                let df = Self::df_or_one(self.lemma_df(lemma), lemma);
                let idf = self.idf(df);
                let tf = if total > 0 {
                    forms.len() as f64 / f64::from(total)
                } else {
                    0.0
                };
                WeightLine {
                    term: lemma.clone(),
                    idf,
                    tfidf: tf * idf,
                }
            })
            .collect()
    }
}
