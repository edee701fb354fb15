use crate::store::{Store, StoreError};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Word pattern shared by every query path: corpus alphabet plus
    // Latin letters, digits and underscore.
    static ref WORD: Regex = Regex::new(r"\w+").expect("valid regex");
}

/// Normalization service injected into both the index-build and the
/// query paths. Query terms must land on exactly the keys the posting
/// lists and weight files were built under, so the lemma table is
/// derived from the store's own lemma files rather than recomputed by
/// a second analyzer.
pub struct Lemmatizer {
    forms: HashMap<String, String>,
}

impl Lemmatizer {
    pub fn new(forms: HashMap<String, String>) -> Self {
        Self { forms }
    }

    /// Build the surface-form table from every lemma group in the store.
    pub fn from_store(store: &Store) -> Result<Self, StoreError> {
        let mut forms: HashMap<String, String> = HashMap::new();
        for doc in store.iter() {
            let doc = doc?;
            for (lemma, tokens) in &doc.lemmas {
                for token in tokens {
                    forms
                        .entry(token.to_lowercase())
                        .or_insert_with(|| lemma.clone());
                }
                // A lemma is its own canonical form.
                forms
                    .entry(lemma.clone())
                    .or_insert_with(|| lemma.clone());
            }
        }
        tracing::debug!(num_forms = forms.len(), "built lemma table");
        Ok(Self { forms })
    }

    /// Canonical form of a single token. Tokens the store has never
    /// seen fall back to their lowercased form.
    pub fn lemmatize(&self, token: &str) -> String {
        let token = token.nfkc().collect::<String>().to_lowercase();
        match self.forms.get(&token) {
            Some(lemma) => lemma.clone(),
            None => token,
        }
    }

    /// Split free text into a lemmatized token sequence using NFKC
    /// normalization and lowercasing, same as at index-build time.
    pub fn lemmatize_text(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        WORD.find_iter(&normalized)
            .map(|m| match self.forms.get(m.as_str()) {
                Some(lemma) => lemma.clone(),
                None => m.as_str().to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemmatizer() -> Lemmatizer {
        let forms = [
            ("кота", "кот"),
            ("коты", "кот"),
            ("кот", "кот"),
            ("собаки", "собака"),
            ("собака", "собака"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        Lemmatizer::new(forms)
    }

    #[test]
    fn maps_known_forms_to_lemmas() {
        let lem = lemmatizer();
        assert_eq!(lem.lemmatize("Кота"), "кот");
        assert_eq!(lem.lemmatize("собаки"), "собака");
    }

    #[test]
    fn unknown_tokens_fall_back_to_lowercase() {
        let lem = lemmatizer();
        assert_eq!(lem.lemmatize("Слон"), "слон");
    }

    #[test]
    fn splits_text_on_word_boundaries() {
        let lem = lemmatizer();
        let terms = lem.lemmatize_text("Коты и собаки, rust2024!");
        assert_eq!(terms, vec!["кот", "и", "собака", "rust2024"]);
    }
}
