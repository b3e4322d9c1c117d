//! Assignee domain model.
//!
//! # Responsibility
//! - Define the person record a todo can be linked to.
//! - Validate assignee input against name limits and the email policy.
//!
//! # Invariants
//! - `id` is assigned once and never changes on update.
//! - Stored `name`/`prename`/`email` are trimmed and validated.

use crate::model::validation::{required_text, ValidationError, NAME_MAX_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an assignee.
pub type AssigneeId = Uuid;

/// Organization domain accepted when none is configured.
pub const DEFAULT_EMAIL_DOMAIN: &str = "org.edu";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@([A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
        .expect("valid email regex")
});

/// Person that can be linked to todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub id: AssigneeId,
    /// Family name.
    pub name: String,
    /// Given name.
    pub prename: String,
    pub email: String,
}

impl Assignee {
    /// Creates an assignee from validated fields with a fresh id.
    pub fn new(fields: AssigneeFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            prename: fields.prename,
            email: fields.email,
        }
    }

    /// Rebuilds an assignee around an existing id, e.g. for full replacement.
    pub fn with_id(id: AssigneeId, fields: AssigneeFields) -> Self {
        Self {
            id,
            name: fields.name,
            prename: fields.prename,
            email: fields.email,
        }
    }

    /// Human-readable label, `"prename name"`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.prename, self.name)
    }
}

/// Raw assignee request body. Absent fields fail validation by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssigneeInput {
    pub name: Option<String>,
    pub prename: Option<String>,
    pub email: Option<String>,
}

impl AssigneeInput {
    pub fn new(
        name: impl Into<String>,
        prename: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            prename: Some(prename.into()),
            email: Some(email.into()),
        }
    }

    /// Checks fields in wire order and returns their normalized values.
    pub fn validate(&self, policy: &EmailPolicy) -> Result<AssigneeFields, ValidationError> {
        let name = required_text("name", self.name.as_deref(), NAME_MAX_CHARS)?;
        let prename = required_text("prename", self.prename.as_deref(), NAME_MAX_CHARS)?;
        let email = policy.check(self.email.as_deref())?;
        Ok(AssigneeFields {
            name,
            prename,
            email,
        })
    }
}

/// Validated, trimmed assignee fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeFields {
    pub name: String,
    pub prename: String,
    pub email: String,
}

/// Email acceptance rule: valid syntax and an organization domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPolicy {
    domain: String,
}

impl EmailPolicy {
    /// Builds a policy for `domain`; a leading `@` or `.` is ignored.
    pub fn new(domain: impl AsRef<str>) -> Self {
        let domain = domain
            .as_ref()
            .trim()
            .trim_start_matches(['@', '.'])
            .to_ascii_lowercase();
        Self { domain }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the trimmed address when it is acceptable.
    ///
    /// The address domain must equal the policy domain or be one of its
    /// subdomains; `x@evil-org.edu` does not match `org.edu`.
    pub fn check(&self, email: Option<&str>) -> Result<String, ValidationError> {
        let email = email.map(str::trim).unwrap_or_default();
        if email.is_empty() {
            return Err(ValidationError::Blank("email"));
        }
        if !EMAIL_RE.is_match(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }

        let host = email
            .rsplit_once('@')
            .map(|(_, host)| host.to_ascii_lowercase())
            .unwrap_or_default();
        let in_domain = host == self.domain
            || host
                .strip_suffix(self.domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'));
        if !in_domain {
            return Err(ValidationError::EmailDomain {
                domain: self.domain.clone(),
            });
        }

        Ok(email.to_string())
    }
}

impl Default for EmailPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EMAIL_DOMAIN)
    }
}
