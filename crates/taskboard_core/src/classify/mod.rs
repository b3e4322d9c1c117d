//! Category classifier capability.
//!
//! # Responsibility
//! - Define the single-operation contract `classify(title) -> label`.
//! - Normalize classifier output before the todo service uses it.
//!
//! # Invariants
//! - Classifier failures, panics included, are reported as
//!   `ClassifierError`; callers decide the fallback label.
//! - A usable label is non-empty, trimmed and lowercase.

use crate::logging::panic_message;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};

mod keyword;

pub use keyword::{CategoryRule, KeywordClassifier, DEFAULT_RULES};

/// Labels a todo by its title.
pub trait CategoryClassifier {
    fn classify(&self, title: &str) -> Result<String, ClassifierError>;
}

impl<C: CategoryClassifier + ?Sized> CategoryClassifier for &C {
    fn classify(&self, title: &str) -> Result<String, ClassifierError> {
        (**self).classify(title)
    }
}

impl<C: CategoryClassifier + ?Sized> CategoryClassifier for Box<C> {
    fn classify(&self, title: &str) -> Result<String, ClassifierError> {
        (**self).classify(title)
    }
}

/// Classifier failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// Backing model is not loaded or cannot be reached.
    Unavailable(String),
    /// No label could be predicted for the input.
    NoPrediction,
    /// Classifier produced an unusable label.
    Malformed(String),
    /// Rule table could not be compiled.
    InvalidRule { label: String, message: String },
    /// Classifier panicked while labeling.
    Panicked(String),
}

impl Display for ClassifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "classifier unavailable: {reason}"),
            Self::NoPrediction => write!(f, "classifier produced no prediction"),
            Self::Malformed(label) => write!(f, "classifier produced malformed label `{label}`"),
            Self::InvalidRule { label, message } => {
                write!(f, "invalid classifier rule for `{label}`: {message}")
            }
            Self::Panicked(message) => write!(f, "classifier panicked: {message}"),
        }
    }
}

impl Error for ClassifierError {}

/// Classifier for deployments without a model. Every call fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableClassifier {
    reason: Option<String>,
}

impl UnavailableClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl CategoryClassifier for UnavailableClassifier {
    fn classify(&self, _title: &str) -> Result<String, ClassifierError> {
        Err(ClassifierError::Unavailable(
            self.reason
                .clone()
                .unwrap_or_else(|| "no model loaded".to_string()),
        ))
    }
}

/// Calls `classifier` and normalizes its label.
pub fn predict_category<C: CategoryClassifier + ?Sized>(
    classifier: &C,
    title: &str,
) -> Result<String, ClassifierError> {
    let raw = catch_unwind(AssertUnwindSafe(|| classifier.classify(title)))
        .map_err(|payload| ClassifierError::Panicked(panic_message(payload.as_ref())))??;
    let label = raw.trim().to_lowercase();
    if label.is_empty() || label.chars().any(char::is_control) {
        return Err(ClassifierError::Malformed(raw));
    }
    Ok(label)
}
