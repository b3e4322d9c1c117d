//! Core domain logic for the taskboard.
//! This crate is the single source of truth for assignee/todo invariants.

pub mod classify;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use classify::{
    predict_category, CategoryClassifier, ClassifierError, KeywordClassifier,
    UnavailableClassifier,
};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use export::{ExportError, ExportResult, TodoCsvExporter, CSV_FILE_NAME, CSV_HEADER};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::assignee::{Assignee, AssigneeId, AssigneeInput, EmailPolicy};
pub use model::todo::{CompletionState, Todo, TodoId, TodoInput, DEFAULT_CATEGORY};
pub use model::validation::ValidationError;
pub use repo::assignee_repo::{AssigneeRepository, SqliteAssigneeRepository};
pub use repo::relationship_repo::{
    CascadeOutcome, DanglingReference, RelationshipRepository, SqliteRelationshipRepository,
};
pub use repo::todo_repo::{SqliteTodoRepository, TodoRepository};
pub use repo::{RepoError, RepoResult};
pub use service::assignee_service::AssigneeService;
pub use service::relationship_service::RelationshipService;
pub use service::todo_service::{TodoDetails, TodoService};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
