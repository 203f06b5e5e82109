//! Profile answers used to fill application forms.
use hawk_config::HawkConfig;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Key → value lookup the form driver queries for field values.
pub trait AnswerSource: Send + Sync {
    /// Answer for a question as printed on the form.
    fn answer(&self, question: &str) -> Option<String>;

    /// File to attach to an upload field with the given label.
    fn document(&self, label: &str) -> Option<PathBuf>;
}

/// Lowercase, drop punctuation and required-field markers, collapse spaces.
pub fn normalize_question(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Answers configured by the user.
///
/// A question matches a configured key when the normalized texts are equal,
/// or else when the question contains the key; the longest contained key
/// wins.
#[derive(Debug, Clone, Default)]
pub struct ProfileAnswers {
    answers: Vec<(String, String)>,
    documents: Vec<(String, PathBuf)>,
}

impl ProfileAnswers {
    pub fn new(answers: &BTreeMap<String, String>, documents: &BTreeMap<String, PathBuf>) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(k, v)| (normalize_question(k), v.clone()))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
            documents: documents
                .iter()
                .map(|(k, v)| (normalize_question(k), v.clone()))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &HawkConfig) -> Self {
        Self::new(&config.answers, &config.uploads)
    }

    fn best_match<'a, T>(entries: &'a [(String, T)], question: &str) -> Option<&'a T> {
        let question = normalize_question(question);
        if question.is_empty() {
            return None;
        }
        if let Some((_, v)) = entries.iter().find(|(k, _)| *k == question) {
            return Some(v);
        }
        let padded = format!(" {question} ");
        entries
            .iter()
            .filter(|(k, _)| padded.contains(&format!(" {k} ")))
            .max_by_key(|(k, _)| k.len())
            .map(|(_, v)| v)
    }
}

impl AnswerSource for ProfileAnswers {
    fn answer(&self, question: &str) -> Option<String> {
        Self::best_match(&self.answers, question).cloned()
    }

    fn document(&self, label: &str) -> Option<PathBuf> {
        Self::best_match(&self.documents, label).cloned()
    }
}
