//! Keyword rule classifier.
//!
//! Each rule maps one label to a keyword list. A title is scored against
//! every rule by counting whole-word, case-insensitive keyword hits; the
//! highest score wins and ties go to the earlier rule.

use super::{CategoryClassifier, ClassifierError};
use regex::Regex;

/// Built-in rule table as `(label, keywords)`.
pub const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "work",
        &[
            "meeting", "report", "deadline", "project", "review", "client", "email",
            "presentation", "invoice", "sprint", "deploy",
        ],
    ),
    (
        "study",
        &[
            "exam", "lecture", "homework", "thesis", "assignment", "seminar", "course",
            "study", "learn", "tutorial",
        ],
    ),
    (
        "household",
        &[
            "clean", "laundry", "dishes", "groceries", "cook", "vacuum", "repair", "rent",
            "trash",
        ],
    ),
    (
        "health",
        &[
            "doctor", "dentist", "gym", "run", "workout", "medicine", "appointment", "yoga",
        ],
    ),
    (
        "leisure",
        &[
            "movie", "concert", "party", "holiday", "vacation", "game", "birthday", "trip",
        ],
    ),
];

/// Compiled rule for one label.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    label: String,
    pattern: Regex,
}

impl CategoryRule {
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Deterministic rule-based classifier.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<CategoryRule>,
}

impl KeywordClassifier {
    /// Compiles a rule table. Rules with no keywords are rejected.
    pub fn new<L, K>(rules: &[(L, &[K])]) -> Result<Self, ClassifierError>
    where
        L: AsRef<str>,
        K: AsRef<str>,
    {
        let mut compiled = Vec::with_capacity(rules.len());
        for (label, keywords) in rules {
            let label = label.as_ref().trim().to_lowercase();
            let alternatives = keywords
                .iter()
                .map(|keyword| keyword.as_ref().trim())
                .filter(|keyword| !keyword.is_empty())
                .map(regex::escape)
                .collect::<Vec<_>>();
            if label.is_empty() || alternatives.is_empty() {
                return Err(ClassifierError::InvalidRule {
                    label,
                    message: "rule needs a label and at least one keyword".to_string(),
                });
            }

            let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
                .map_err(|err| ClassifierError::InvalidRule {
                    label: label.clone(),
                    message: err.to_string(),
                })?;
            compiled.push(CategoryRule { label, pattern });
        }

        Ok(Self { rules: compiled })
    }

    /// Classifier over `DEFAULT_RULES`.
    pub fn with_default_rules() -> Self {
        Self::new(DEFAULT_RULES).expect("default classifier rules are valid")
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, title: &str) -> Result<String, ClassifierError> {
        let mut best: Option<(&CategoryRule, usize)> = None;
        for rule in &self.rules {
            let hits = rule.pattern.find_iter(title).count();
            if hits == 0 {
                continue;
            }
            if best.map_or(true, |(_, best_hits)| hits > best_hits) {
                best = Some((rule, hits));
            }
        }

        best.map(|(rule, _)| rule.label.clone())
            .ok_or(ClassifierError::NoPrediction)
    }
}
