use crate::store::{Store, StoreError};
use crate::DocId;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead, Write};

/// Lemma-space inverted index plus the universal document set.
/// Immutable after construction; safe to share across query threads.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeSet<DocId>>,
    universe: BTreeSet<DocId>,
}

impl InvertedIndex {
    /// Scan the store once: for each document, for each distinct lemma,
    /// record document-level presence. Rerunning over an unchanged
    /// store yields an identical index.
    pub fn build(store: &Store) -> Result<Self, StoreError> {
        let mut index = Self::default();
        for doc in store.iter() {
            let doc = doc?;
            index.universe.insert(doc.doc_id.clone());
            for lemma in doc.lemmas.keys() {
                index
                    .postings
                    .entry(lemma.clone())
                    .or_default()
                    .insert(doc.doc_id.clone());
            }
        }
        tracing::debug!(
            num_terms = index.postings.len(),
            num_docs = index.universe.len(),
            "built inverted index"
        );
        Ok(index)
    }

    /// Posting set for a term. A term absent from the index denotes
    /// zero occurrences, not an error.
    pub fn postings(&self, term: &str) -> Option<&BTreeSet<DocId>> {
        self.postings.get(term)
    }

    pub fn universe(&self) -> &BTreeSet<DocId> {
        &self.universe
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn num_docs(&self) -> usize {
        self.universe.len()
    }

    /// Write the sorted text listing: one `term: doc1, doc2, …` line
    /// per term, terms lexicographic, document ids sorted.
    pub fn write_listing<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (term, docs) in &self.postings {
            let list = docs.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            writeln!(w, "{term}: {list}")?;
        }
        Ok(())
    }

    /// Load an index from its persisted listing. The universe is the
    /// full document set of the corpus, which a listing alone cannot
    /// recover (a document with no lemmas appears in no posting line),
    /// so the caller supplies it; posting-set members are merged in.
    pub fn read_listing<R: BufRead>(reader: R, universe: BTreeSet<DocId>) -> io::Result<Self> {
        let mut index = Self {
            postings: BTreeMap::new(),
            universe,
        };
        for line in reader.lines() {
            let line = line?;
            let Some((term, rest)) = line.split_once(':') else {
                continue;
            };
            let docs: BTreeSet<DocId> = rest
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
            index.universe.extend(docs.iter().cloned());
            index.postings.insert(term.trim().to_string(), docs);
        }
        Ok(index)
    }
}
