//! Relationship consistency service.
//!
//! # Responsibility
//! - Delete assignees through the cascading repository path.
//! - Expose link audits used to check the no-dangling-reference rule.
//!
//! # Invariants
//! - Deleting an unknown assignee fails with `AssigneeNotFound` and writes
//!   nothing.
//! - After a successful delete no todo references the removed id.

use crate::model::assignee::{Assignee, AssigneeId};
use crate::model::todo::TodoId;
use crate::repo::relationship_repo::{DanglingReference, RelationshipRepository};
use crate::service::{ServiceError, ServiceResult};
use log::{error, info};
use std::time::Instant;

/// Relationship service facade.
pub struct RelationshipService<R: RelationshipRepository> {
    repo: R,
}

impl<R: RelationshipRepository> RelationshipService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Detaches the assignee from every todo, then deletes it.
    ///
    /// Returns the assignee as it was right before deletion.
    pub fn delete_assignee(&self, assignee_id: AssigneeId) -> ServiceResult<Assignee> {
        let started_at = Instant::now();
        match self.repo.delete_assignee_cascading(assignee_id) {
            Ok(outcome) => {
                info!(
                    "event=assignee_delete module=relationship status=ok detached_todos={} duration_ms={}",
                    outcome.detached_todos.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(outcome.assignee)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                if !err.is_not_found() {
                    error!(
                        "event=assignee_delete module=relationship status=error duration_ms={} error={}",
                        started_at.elapsed().as_millis(),
                        err
                    );
                }
                Err(err)
            }
        }
    }

    pub fn todos_referencing(&self, assignee_id: AssigneeId) -> ServiceResult<Vec<TodoId>> {
        Ok(self.repo.todos_referencing(assignee_id)?)
    }

    pub fn dangling_references(&self) -> ServiceResult<Vec<DanglingReference>> {
        Ok(self.repo.dangling_references()?)
    }

    /// Fails when any link points at a missing assignee.
    pub fn verify_integrity(&self) -> ServiceResult<()> {
        let dangling = self.repo.dangling_references()?;
        if dangling.is_empty() {
            return Ok(());
        }
        error!(
            "event=relationship_audit module=relationship status=error dangling={}",
            dangling.len()
        );
        Err(ServiceError::InconsistentState(
            "todo links reference missing assignees",
        ))
    }
}
