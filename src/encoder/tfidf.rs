//! Term-frequency / inverse-document-frequency text vectorizer.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalizer::TextNormalizer;
use super::sparse::SparseVector;
use super::stop_words::is_stop_word;
use crate::error::ModelError;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Settings fixed at fit time and carried with the fitted vectorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Vocabulary cap; the most frequent terms are kept.
    pub max_features: usize,
    /// Split `lowerUpper` boundaries before tokenizing.
    pub split_camel_case: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 10_000,
            split_camel_case: false,
        }
    }
}

/// A fitted TF-IDF vectorizer.
///
/// Terms are case-folded tokens of two or more word characters with English
/// stop words removed. Columns are assigned in lexicographic term order, IDF
/// is smoothed as `ln((1 + n) / (1 + df)) + 1`, and every row is
/// L2-normalized.
///
/// # Examples
///
/// ```
/// use mangenre::encoder::{TfidfVectorizer, VectorizerConfig};
///
/// let docs = vec!["sword fight".to_string(), "school romance".to_string()];
/// let vectorizer = TfidfVectorizer::fit(&docs, VectorizerConfig::default()).unwrap();
/// assert_eq!(vectorizer.dim(), 4);
///
/// let v = vectorizer.transform("a sword in school");
/// assert_eq!(v.nnz(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and IDF weights from `documents`.
    pub fn fit(documents: &[String], config: VectorizerConfig) -> Result<Self, ModelError> {
        if documents.is_empty() {
            return Err(ModelError::EmptyCorpus);
        }

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_counts: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let tokens = tokenize(doc, config.split_camel_case);
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_counts.entry(term.clone()).or_insert(0) += 1;
            }
            for term in tokens {
                *term_counts.entry(term).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n = documents.len() as f64;
        let idf = terms
            .iter()
            .map(|term| {
                let df = doc_counts.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term, i))
            .collect();

        Ok(Self {
            config,
            vocabulary,
            idf,
        })
    }

    /// Width of every vector this vectorizer produces.
    pub fn dim(&self) -> usize {
        self.idf.len()
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Column index of `term`, if it is in the vocabulary.
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Maps text onto the fitted vocabulary. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let pairs = tokenize(text, self.config.split_camel_case)
            .into_iter()
            .filter_map(|term| self.vocabulary.get(&term).copied())
            .map(|i| (i, self.idf[i]))
            .collect();
        let mut vector = SparseVector::from_pairs(self.dim(), pairs);
        vector.normalize();
        vector
    }

    pub fn transform_many(&self, texts: &[String]) -> Vec<SparseVector> {
        texts.iter().map(|text| self.transform(text)).collect()
    }

    /// Checks that every vocabulary column has an IDF weight.
    pub(crate) fn check_consistency(&self) -> Result<(), ModelError> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(ModelError::mismatch(
                "vocabulary size",
                self.idf.len(),
                self.vocabulary.len(),
            ));
        }
        if let Some(&index) = self.vocabulary.values().find(|&&i| i >= self.idf.len()) {
            return Err(ModelError::EncoderMismatch {
                what: "vocabulary column",
                expected: format!("< {}", self.idf.len()),
                found: index.to_string(),
            });
        }
        Ok(())
    }
}

fn tokenize(text: &str, split_camel_case: bool) -> Vec<String> {
    let text = if split_camel_case {
        TextNormalizer::split_camel_case(text)
    } else {
        text.to_string()
    };
    let folded = text.to_lowercase();
    TOKEN
        .find_iter(&folded)
        .map(|m| m.as_str())
        .filter(|token| !is_stop_word(token))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn fit_on_empty_corpus_fails() {
        let err = TfidfVectorizer::fit(&[], VectorizerConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::EmptyCorpus));
    }

    #[test]
    fn stop_words_and_short_tokens_are_excluded() {
        let v = TfidfVectorizer::fit(&docs(&["The hero and a sword"]), VectorizerConfig::default())
            .unwrap();
        assert_eq!(v.dim(), 2);
        assert!(v.index_of("hero").is_some());
        assert!(v.index_of("the").is_none());
        assert!(v.index_of("a").is_none());
    }

    #[test]
    fn numerals_and_light_verbs_never_enter_the_vocabulary() {
        let v = TfidfVectorizer::fit(
            &docs(&["first two three get take find show system"]),
            VectorizerConfig::default(),
        )
        .unwrap();
        assert_eq!(v.dim(), 0);
    }

    #[test]
    fn vocabulary_is_capped_by_frequency() {
        let config = VectorizerConfig {
            max_features: 2,
            ..VectorizerConfig::default()
        };
        let v = TfidfVectorizer::fit(
            &docs(&["magic magic school", "magic school ninja", "dragon"]),
            config,
        )
        .unwrap();
        assert_eq!(v.dim(), 2);
        assert!(v.index_of("magic").is_some());
        assert!(v.index_of("school").is_some());
        assert!(v.index_of("dragon").is_none());
    }

    #[test]
    fn columns_follow_lexicographic_order() {
        let v = TfidfVectorizer::fit(&docs(&["zombie apocalypse mecha"]), VectorizerConfig::default())
            .unwrap();
        assert_eq!(v.index_of("apocalypse"), Some(0));
        assert_eq!(v.index_of("mecha"), Some(1));
        assert_eq!(v.index_of("zombie"), Some(2));
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let v = TfidfVectorizer::fit(
            &docs(&["school romance", "school comedy", "school horror"]),
            VectorizerConfig::default(),
        )
        .unwrap();
        let row = v.transform("school horror");
        let school = row.get(v.index_of("school").unwrap());
        let horror = row.get(v.index_of("horror").unwrap());
        assert!(horror > school);
        assert!((row.l2_norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn transform_is_deterministic() {
        let v = TfidfVectorizer::fit(&docs(&["space opera", "space pirates"]), VectorizerConfig::default())
            .unwrap();
        assert_eq!(v.transform("space pirates!"), v.transform("space pirates!"));
    }

    #[test]
    fn unknown_text_maps_to_zero_vector() {
        let v = TfidfVectorizer::fit(&docs(&["space opera"]), VectorizerConfig::default()).unwrap();
        let row = v.transform("completely different words");
        assert_eq!(row.nnz(), 0);
        assert_eq!(row.dim(), v.dim());
    }

    #[test]
    fn camel_case_split_is_applied_at_fit_and_transform() {
        let config = VectorizerConfig {
            split_camel_case: true,
            ..VectorizerConfig::default()
        };
        let v = TfidfVectorizer::fit(&docs(&["SwordArtOnline"]), config).unwrap();
        assert!(v.index_of("sword").is_some());
        assert!(v.index_of("swordartonline").is_none());
        assert_eq!(v.transform("SwordArt").nnz(), 2);
    }
}
