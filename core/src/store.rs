use crate::DocId;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A document declared by the store is missing one of its files.
    /// Fatal for any batch run: DF/IDF are only correct over the full
    /// corpus, so a document is never silently skipped.
    #[error("missing corpus file {path}")]
    MissingDocFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("store directory {0} contains no documents")]
    Empty(PathBuf),
    #[error("failed to scan store directory")]
    Io(#[from] std::io::Error),
}

/// Normalized contents of one document, as written by the tokenizer
/// stage. Immutable once produced.
#[derive(Debug, Clone)]
pub struct DocTerms {
    pub doc_id: DocId,
    /// Surface tokens, one per line in the store file (sorted and
    /// deduplicated by the producer).
    pub tokens: Vec<String>,
    /// Lemma mapped to the surface tokens realizing it in this document.
    pub lemmas: BTreeMap<String, BTreeSet<String>>,
}

/// Read-only view of the lemma/token store: a flat directory of
/// `tokens_{n}.txt` / `lemmas_{n}.txt` pairs. The set of documents is
/// fixed once the store is opened.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    nums: Vec<u32>,
}

impl Store {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        // A document is declared by either of its halves; an unpaired
        // file must fail the run rather than shrink the corpus.
        let mut nums = std::collections::BTreeSet::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            for prefix in ["tokens_", "lemmas_"] {
                if let Some(rest) = name
                    .strip_prefix(prefix)
                    .and_then(|r| r.strip_suffix(".txt"))
                {
                    if let Ok(n) = rest.parse::<u32>() {
                        nums.insert(n);
                    }
                }
            }
        }
        if nums.is_empty() {
            return Err(StoreError::Empty(root));
        }

        let store = Self {
            root,
            nums: nums.into_iter().collect(),
        };
        // Both halves of every document must be present before any
        // batch run starts.
        for &n in &store.nums {
            for path in [store.tokens_path(n), store.lemmas_path(n)] {
                if let Err(source) = fs::metadata(&path) {
                    return Err(StoreError::MissingDocFile { path, source });
                }
            }
        }
        tracing::debug!(num_docs = store.nums.len(), "opened token/lemma store");
        Ok(store)
    }

    /// Numeric page indices present in the store, ascending.
    pub fn doc_nums(&self) -> &[u32] {
        &self.nums
    }

    pub fn num_docs(&self) -> u32 {
        self.nums.len() as u32
    }

    pub fn doc_id(num: u32) -> DocId {
        format!("page-{num}")
    }

    pub fn doc_ids(&self) -> BTreeSet<DocId> {
        self.nums.iter().map(|&n| Self::doc_id(n)).collect()
    }

    fn tokens_path(&self, num: u32) -> PathBuf {
        self.root.join(format!("tokens_{num}.txt"))
    }

    fn lemmas_path(&self, num: u32) -> PathBuf {
        self.root.join(format!("lemmas_{num}.txt"))
    }

    pub fn load(&self, num: u32) -> Result<DocTerms, StoreError> {
        let tokens_path = self.tokens_path(num);
        let raw = fs::read_to_string(&tokens_path).map_err(|source| StoreError::MissingDocFile {
            path: tokens_path,
            source,
        })?;
        let tokens = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let lemmas_path = self.lemmas_path(num);
        let raw = fs::read_to_string(&lemmas_path).map_err(|source| StoreError::MissingDocFile {
            path: lemmas_path,
            source,
        })?;
        let mut lemmas = BTreeMap::new();
        for line in raw.lines() {
            let mut parts = line.split_whitespace();
            let Some(lemma) = parts.next() else { continue };
            let forms: BTreeSet<String> = parts.map(str::to_string).collect();
            lemmas.insert(lemma.to_lowercase(), forms);
        }

        Ok(DocTerms {
            doc_id: Self::doc_id(num),
            tokens,
            lemmas,
        })
    }

    /// Scan every document once, in page order.
    pub fn iter(&self) -> impl Iterator<Item = Result<DocTerms, StoreError>> + '_ {
        self.nums.iter().map(move |&n| self.load(n))
    }
}
