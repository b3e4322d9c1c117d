//! Field validation errors shared by assignee and todo inputs.

use crate::model::assignee::AssigneeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum length of assignee `name` and `prename`, in characters.
pub const NAME_MAX_CHARS: usize = 40;
/// Maximum length of a todo `title`, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Rejected input. Every variant names the offending wire field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is absent, or blank after trimming.
    Blank(&'static str),
    /// Required non-text field is absent.
    Missing(&'static str),
    /// Field exceeds its character limit.
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
    /// Email is not a syntactically valid address.
    InvalidEmail(String),
    /// Email is valid but outside the organization domain.
    EmailDomain { domain: String },
    /// Some referenced assignee ids do not exist.
    UnknownAssignees(Vec<AssigneeId>),
    /// Timestamp has no calendar date representation.
    OutOfRange(&'static str),
}

impl ValidationError {
    /// Wire name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Blank(field)
            | Self::Missing(field)
            | Self::OutOfRange(field)
            | Self::TooLong { field, .. } => field,
            Self::InvalidEmail(_) | Self::EmailDomain { .. } => "email",
            Self::UnknownAssignees(_) => "assigneeIdList",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "{field} cannot be empty"),
            Self::Missing(field) => write!(f, "{field} is required"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
            Self::InvalidEmail(value) => write!(f, "email is not a valid address: `{value}`"),
            Self::EmailDomain { domain } => write!(f, "email must end with {domain}"),
            Self::UnknownAssignees(_) => write!(f, "one or more referenced ids are invalid"),
            Self::OutOfRange(field) => write!(f, "{field} is not a representable date"),
        }
    }
}

impl Error for ValidationError {}

/// Trims a required text field and enforces its length limit.
pub(crate) fn required_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::TooLong { field, max_chars });
    }
    Ok(trimmed.to_string())
}

/// Accepts epoch milliseconds that map onto a calendar date.
pub(crate) fn calendar_millis(
    field: &'static str,
    epoch_ms: i64,
) -> Result<i64, ValidationError> {
    chrono::DateTime::from_timestamp_millis(epoch_ms)
        .map(|_| epoch_ms)
        .ok_or(ValidationError::OutOfRange(field))
}
