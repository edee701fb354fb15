use crate::index::InvertedIndex;
use crate::stats::WeightLine;
use crate::store::Store;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

/// On-disk layout of the built artifacts.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn inverted_index(&self) -> PathBuf {
        self.root.join("inverted_index.txt")
    }

    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    pub fn token_weights_dir(&self) -> PathBuf {
        self.root.join("tfidf_tokens")
    }

    pub fn lemma_weights_dir(&self) -> PathBuf {
        self.root.join("tfidf_lemmas")
    }

    pub fn token_weights(&self, num: u32) -> PathBuf {
        self.token_weights_dir().join(format!("tfidf_tokens_{num}.txt"))
    }

    pub fn lemma_weights(&self, num: u32) -> PathBuf {
        self.lemma_weights_dir().join(format!("tfidf_lemmas_{num}.txt"))
    }
}

pub fn save_index_listing(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.inverted_index())?);
    index.write_listing(&mut f)?;
    f.flush()?;
    Ok(())
}

/// Load the inverted index listing; the universe comes from the store's
/// declared document set.
pub fn load_index_listing(paths: &IndexPaths, store: &Store) -> Result<InvertedIndex> {
    let path = paths.inverted_index();
    let f = BufReader::new(
        File::open(&path).with_context(|| format!("open index listing {}", path.display()))?,
    );
    let index = InvertedIndex::read_listing(f, store.doc_ids())?;
    Ok(index)
}

/// Write one weight file: `term idf tfidf` per line, decimal floats.
pub fn save_weights(path: &Path, lines: &[WeightLine]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut f = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(f, "{} {} {}", line.term, line.idf, line.tfidf)?;
    }
    f.flush()?;
    Ok(())
}

pub fn load_weights(path: &Path) -> Result<Vec<WeightLine>> {
    let f = BufReader::new(
        File::open(path).with_context(|| format!("open weight file {}", path.display()))?,
    );
    let mut out = Vec::new();
    for line in f.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(term), Some(idf), Some(tfidf), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            bail!("malformed weight line {:?} in {}", line, path.display());
        };
        out.push(WeightLine {
            term: term.to_string(),
            idf: idf.parse().with_context(|| format!("bad idf in {}", path.display()))?,
            tfidf: tfidf
                .parse()
                .with_context(|| format!("bad tfidf in {}", path.display()))?,
        });
    }
    Ok(out)
}

/// Numeric page indices of the weight files present in a directory,
/// ascending.
pub fn weight_file_nums(dir: &Path, prefix: &str) -> Result<Vec<u32>> {
    let mut nums = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("scan weight dir {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(rest) = name
            .strip_prefix(prefix)
            .and_then(|r| r.strip_suffix(".txt"))
        {
            if let Ok(n) = rest.parse::<u32>() {
                nums.push(n);
            }
        }
    }
    nums.sort_unstable();
    Ok(nums)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let buf = fs::read_to_string(&path)
        .with_context(|| format!("open index meta {}", path.display()))?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
