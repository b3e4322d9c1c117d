//! Assignee use-case service.
//!
//! # Responsibility
//! - Validate and persist assignee create/update requests.
//! - Resolve assignee id sets for todo validation.
//! - Seed the two default assignees into an empty store.
//!
//! # Invariants
//! - Validation runs before existence checks and before any write.
//! - `seed_defaults` is idempotent and only writes into an empty store.
//! - Deletion lives in `RelationshipService`, never here.

use crate::model::assignee::{Assignee, AssigneeId, AssigneeInput, EmailPolicy};
use crate::model::todo::normalize_assignee_ids;
use crate::model::validation::ValidationError;
use crate::repo::assignee_repo::AssigneeRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;
use std::collections::HashSet;

/// Default assignees as `(name, prename, mailbox)`; the mailbox is joined
/// with the configured email domain.
const DEFAULT_ASSIGNEES: &[(&str, &str, &str)] =
    &[("Octocat", "Paul", "paul"), ("Grumpy", "John", "john")];

/// Assignee service facade over repository implementations.
pub struct AssigneeService<R: AssigneeRepository> {
    repo: R,
    policy: EmailPolicy,
}

impl<R: AssigneeRepository> AssigneeService<R> {
    /// Creates a service accepting the default email domain.
    pub fn new(repo: R) -> Self {
        Self::with_policy(repo, EmailPolicy::default())
    }

    pub fn with_policy(repo: R, policy: EmailPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> &EmailPolicy {
        &self.policy
    }

    /// Inserts the default assignees when the store is empty.
    ///
    /// Returns how many records were inserted (0 when already populated).
    pub fn seed_defaults(&self) -> ServiceResult<usize> {
        if self.repo.count_assignees()? > 0 {
            return Ok(0);
        }

        for (name, prename, mailbox) in DEFAULT_ASSIGNEES {
            let input = AssigneeInput::new(
                *name,
                *prename,
                format!("{mailbox}@{}", self.policy.domain()),
            );
            let assignee = Assignee::new(input.validate(&self.policy)?);
            self.repo.create_assignee(&assignee)?;
        }

        info!(
            "event=assignee_seed module=assignee_service status=ok inserted={}",
            DEFAULT_ASSIGNEES.len()
        );
        Ok(DEFAULT_ASSIGNEES.len())
    }

    pub fn create_assignee(&self, input: &AssigneeInput) -> ServiceResult<Assignee> {
        let fields = input.validate(&self.policy)?;
        let assignee = Assignee::new(fields);
        let id = self.repo.create_assignee(&assignee)?;
        self.read_back(id, "created assignee not found in read-back")
    }

    pub fn get_assignee(&self, id: AssigneeId) -> ServiceResult<Assignee> {
        self.repo
            .get_assignee(id)?
            .ok_or(ServiceError::AssigneeNotFound(id))
    }

    /// Returns the existing subset of `ids`; missing ids are skipped.
    pub fn get_assignees(&self, ids: &[AssigneeId]) -> ServiceResult<Vec<Assignee>> {
        Ok(self.repo.get_assignees(ids)?)
    }

    pub fn list_assignees(&self) -> ServiceResult<Vec<Assignee>> {
        Ok(self.repo.list_assignees()?)
    }

    /// Replaces name, prename and email; the id is preserved.
    pub fn update_assignee(
        &self,
        id: AssigneeId,
        input: &AssigneeInput,
    ) -> ServiceResult<Assignee> {
        let fields = input.validate(&self.policy)?;
        if self.repo.get_assignee(id)?.is_none() {
            return Err(ServiceError::AssigneeNotFound(id));
        }

        let assignee = Assignee::with_id(id, fields);
        self.repo.update_assignee(&assignee)?;
        self.read_back(id, "updated assignee not found in read-back")
    }

    /// Fails with a validation error unless every id exists.
    pub fn ensure_assignees_exist(&self, ids: &[AssigneeId]) -> ServiceResult<Vec<Assignee>> {
        ensure_assignees_exist(&self.repo, ids)
    }

    fn read_back(&self, id: AssigneeId, details: &'static str) -> ServiceResult<Assignee> {
        self.repo
            .get_assignee(id)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}

/// Resolves `ids` and rejects the whole set if any id is missing.
pub(crate) fn ensure_assignees_exist<R: AssigneeRepository + ?Sized>(
    repo: &R,
    ids: &[AssigneeId],
) -> ServiceResult<Vec<Assignee>> {
    let requested = normalize_assignee_ids(ids);
    let found = repo.get_assignees(&requested)?;
    if found.len() == requested.len() {
        return Ok(found);
    }

    let known = found
        .iter()
        .map(|assignee| assignee.id)
        .collect::<HashSet<_>>();
    let missing = requested
        .into_iter()
        .filter(|id| !known.contains(id))
        .collect();
    Err(ValidationError::UnknownAssignees(missing).into())
}
