//! Todo domain model and completion lifecycle.
//!
//! # Responsibility
//! - Define the todo record and its request shape.
//! - Own the Open/Completed transition rules.
//!
//! # Invariants
//! - `created_date` is set once when the record is built and never rewritten.
//! - `finished_date` is stamped on the first Open -> Completed transition and
//!   survives later reopening.
//! - `assignee_ids` is sorted and free of duplicates.
//! - `category` is system-assigned; request bodies cannot set it.

use crate::model::assignee::AssigneeId;
use crate::model::validation::{
    calendar_millis, required_text, ValidationError, TITLE_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of a todo.
pub type TodoId = Uuid;

/// Category used when the classifier cannot label a todo.
pub const DEFAULT_CATEGORY: &str = "work";

/// Completion state derived from the `finished` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    Open,
    Completed,
}

/// Canonical todo record.
///
/// Timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub finished: bool,
    /// Referenced assignees, resolved against the assignee store on demand.
    pub assignee_ids: Vec<AssigneeId>,
    pub created_date: i64,
    pub due_date: i64,
    /// First completion time; `None` until the todo is first finished.
    pub finished_date: Option<i64>,
    pub category: String,
}

impl Todo {
    /// Builds a new todo from validated fields.
    ///
    /// `now_ms` becomes `created_date`, and also `finished_date` when the
    /// todo is created already finished.
    pub fn create(fields: TodoFields, category: impl Into<String>, now_ms: i64) -> Self {
        let mut todo = Self {
            id: Uuid::new_v4(),
            title: fields.title,
            description: fields.description,
            finished: false,
            assignee_ids: fields.assignee_ids,
            created_date: now_ms,
            due_date: fields.due_date,
            finished_date: None,
            category: category.into(),
        };
        todo.set_finished(fields.finished, now_ms);
        todo
    }

    /// Replaces every user-writable field, including the full assignee set.
    ///
    /// `id`, `created_date` and `category` are left untouched.
    pub fn apply(&mut self, fields: TodoFields, now_ms: i64) {
        self.title = fields.title;
        self.description = fields.description;
        self.due_date = fields.due_date;
        self.assignee_ids = fields.assignee_ids;
        self.set_finished(fields.finished, now_ms);
    }

    /// Sets the completion flag.
    ///
    /// Only the first transition to finished stamps `finished_date`.
    pub fn set_finished(&mut self, finished: bool, now_ms: i64) {
        self.finished = finished;
        if finished && self.finished_date.is_none() {
            self.finished_date = Some(now_ms);
        }
    }

    pub fn completion_state(&self) -> CompletionState {
        if self.finished {
            CompletionState::Completed
        } else {
            CompletionState::Open
        }
    }

    /// Whether `assignee_id` is in the reference set.
    pub fn references(&self, assignee_id: AssigneeId) -> bool {
        self.assignee_ids.binary_search(&assignee_id).is_ok()
    }

    /// Drops one assignee reference. Returns whether it was present.
    pub fn detach_assignee(&mut self, assignee_id: AssigneeId) -> bool {
        match self.assignee_ids.binary_search(&assignee_id) {
            Ok(index) => {
                self.assignee_ids.remove(index);
                true
            }
            Err(_) => false,
        }
    }
}

/// Raw todo request body.
///
/// A missing `assigneeIdList` means "no assignees"; on update it clears
/// the previous set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub finished: bool,
    pub due_date: Option<i64>,
    pub assignee_id_list: Option<Vec<AssigneeId>>,
}

impl TodoInput {
    pub fn new(title: impl Into<String>, due_date: i64) -> Self {
        Self {
            title: Some(title.into()),
            due_date: Some(due_date),
            ..Self::default()
        }
    }

    pub fn with_assignees(mut self, ids: impl IntoIterator<Item = AssigneeId>) -> Self {
        self.assignee_id_list = Some(ids.into_iter().collect());
        self
    }

    pub fn with_finished(mut self, finished: bool) -> Self {
        self.finished = finished;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the fields that need no store access.
    ///
    /// Assignee existence is checked by the todo service afterwards.
    pub fn validate(&self) -> Result<TodoFields, ValidationError> {
        let title = required_text("title", self.title.as_deref(), TITLE_MAX_CHARS)?;
        let due_date = self.due_date.ok_or(ValidationError::Missing("dueDate"))?;
        let due_date = calendar_millis("dueDate", due_date)?;
        let assignee_ids = normalize_assignee_ids(self.assignee_id_list.as_deref().unwrap_or(&[]));

        Ok(TodoFields {
            title,
            description: self.description.clone(),
            finished: self.finished,
            due_date,
            assignee_ids,
        })
    }
}

/// Validated todo fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    pub title: String,
    pub description: Option<String>,
    pub finished: bool,
    pub due_date: i64,
    pub assignee_ids: Vec<AssigneeId>,
}

/// Sorts and deduplicates assignee ids.
pub fn normalize_assignee_ids(ids: &[AssigneeId]) -> Vec<AssigneeId> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
