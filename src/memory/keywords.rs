//! Inverted keyword index: normalized token → set of memory ids.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use super::{read_guard, write_guard};

/// Tokens shorter than this are not indexed.
const MIN_TOKEN_LEN: usize = 3;

/// Split on anything that is not an ASCII letter or digit, drop short
/// tokens, and fold to lowercase.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .map(|word| word.to_ascii_lowercase())
}

#[derive(Debug, Default)]
pub struct KeywordIndex {
    index: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl KeywordIndex {
    pub fn insert(&self, id: &str, content: &str) {
        let mut index = write_guard(&self.index, "keyword index");
        for token in tokenize(content) {
            index.entry(token).or_default().insert(id.to_string());
        }
    }

    /// Remove `id` from every token it was indexed under. `content` must be
    /// the text the id was inserted with.
    pub fn remove(&self, id: &str, content: &str) {
        let mut index = write_guard(&self.index, "keyword index");
        for token in tokenize(content) {
            if let Some(ids) = index.get_mut(&token) {
                ids.remove(id);
                if ids.is_empty() {
                    index.remove(&token);
                }
            }
        }
    }

    /// Union of the ids indexed under any of `keywords` (OR semantics).
    pub fn lookup<S: AsRef<str>>(&self, keywords: &[S]) -> BTreeSet<String> {
        let index = read_guard(&self.index, "keyword index");
        let mut found = BTreeSet::new();
        for keyword in keywords {
            for token in tokenize(keyword.as_ref()) {
                if let Some(ids) = index.get(&token) {
                    found.extend(ids.iter().cloned());
                }
            }
        }
        found
    }

    /// Number of distinct tokens currently indexed.
    pub fn token_count(&self) -> usize {
        read_guard(&self.index, "keyword index").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_non_alphanumerics() {
        let tokens: Vec<String> = tokenize("Hello, world! it's rust-lang v2").collect();
        assert_eq!(tokens, vec!["hello", "world", "rust", "lang"]);
    }

    #[test]
    fn tokenize_keeps_digits_and_ignores_non_ascii_letters() {
        let tokens: Vec<String> = tokenize("Elephant55 café 42x").collect();
        assert_eq!(tokens, vec!["elephant55", "caf", "42x"]);
    }

    #[test]
    fn lookup_is_whole_token_and_case_insensitive() {
        let index = KeywordIndex::default();
        index.insert("a", "Elephant55 roams");

        assert_eq!(index.lookup(&["elephant55"]).len(), 1);
        assert_eq!(index.lookup(&["ELEPHANT55"]).len(), 1);
        assert!(index.lookup(&["eleph"]).is_empty());
    }

    #[test]
    fn lookup_unions_keywords() {
        let index = KeywordIndex::default();
        index.insert("a", "apples and pears");
        index.insert("b", "pears only");
        index.insert("c", "plums");

        let ids = index.lookup(&["apples", "pears", "missing"]);
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn remove_drops_empty_tokens() {
        let index = KeywordIndex::default();
        index.insert("a", "shared unique");
        index.insert("b", "shared");
        assert_eq!(index.token_count(), 2);

        index.remove("a", "shared unique");
        assert_eq!(index.token_count(), 1);
        assert_eq!(index.lookup(&["shared"]).len(), 1);
        assert!(index.lookup(&["unique"]).is_empty());
    }
}
