use std::fs;
use std::path::Path;

/// Write one document into a store directory the way the tokenizer
/// stage does: sorted deduplicated tokens, one per line, and sorted
/// `lemma form1 form2 …` lines.
pub fn write_doc(dir: &Path, num: u32, tokens: &[&str], lemmas: &[(&str, &[&str])]) {
    let mut tokens: Vec<&str> = tokens.to_vec();
    tokens.sort_unstable();
    tokens.dedup();
    fs::write(
        dir.join(format!("tokens_{num}.txt")),
        tokens.join("\n") + "\n",
    )
    .unwrap();

    let mut lines: Vec<String> = lemmas
        .iter()
        .map(|(lemma, forms)| {
            let mut forms: Vec<&str> = forms.to_vec();
            forms.sort_unstable();
            if forms.is_empty() {
                (*lemma).to_string()
            } else {
                format!("{} {}", lemma, forms.join(" "))
            }
        })
        .collect();
    lines.sort();
    fs::write(
        dir.join(format!("lemmas_{num}.txt")),
        lines.join("\n") + "\n",
    )
    .unwrap();
}
