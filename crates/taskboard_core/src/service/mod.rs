//! Core use-case services.
//!
//! # Responsibility
//! - Validate requests before any store mutation.
//! - Orchestrate repositories and the category classifier into use-cases.
//! - Map repository outcomes onto the caller-facing error taxonomy.
//!
//! # Invariants
//! - Validation always runs to completion before the first write.
//! - Classifier failures never escape a service call.

use crate::model::assignee::AssigneeId;
use crate::model::todo::TodoId;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod assignee_service;
pub mod relationship_service;
pub mod todo_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error for assignee/todo use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing field, or a dangling assignee reference.
    Validation(ValidationError),
    AssigneeNotFound(AssigneeId),
    TodoNotFound(TodoId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AssigneeNotFound(_) | Self::TodoNotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AssigneeNotFound(id) => write!(f, "assignee with id {id} not found"),
            Self::TodoNotFound(id) => write!(f, "todo with id {id} not found"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AssigneeNotFound(id) => Self::AssigneeNotFound(id),
            RepoError::TodoNotFound(id) => Self::TodoNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
