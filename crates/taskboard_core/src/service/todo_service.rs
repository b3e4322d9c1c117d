//! Todo use-case service.
//!
//! # Responsibility
//! - Validate todo requests, including assignee existence, before writes.
//! - Label todos through the category classifier on every create/update.
//! - Resolve stored assignee ids back to records for callers.
//!
//! # Invariants
//! - A request naming any unknown assignee is rejected as a whole.
//! - A missing assignee list on update clears the previous set.
//! - Classifier failure: create falls back to `DEFAULT_CATEGORY`, update
//!   keeps the stored label (or the default when none is stored).

use crate::classify::{predict_category, CategoryClassifier};
use crate::model::assignee::{Assignee, AssigneeId};
use crate::model::todo::{Todo, TodoId, TodoInput, DEFAULT_CATEGORY};
use crate::repo::assignee_repo::AssigneeRepository;
use crate::repo::todo_repo::TodoRepository;
use crate::service::assignee_service::ensure_assignees_exist;
use crate::service::{now_epoch_ms, ServiceError, ServiceResult};
use log::{debug, warn};

/// Todo together with its resolved assignee records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDetails {
    pub todo: Todo,
    /// Ordered by prename, name, id.
    pub assignees: Vec<Assignee>,
}

impl TodoDetails {
    /// Display names (`"prename name"`) in assignee order.
    pub fn assignee_names(&self) -> Vec<String> {
        self.assignees.iter().map(Assignee::display_name).collect()
    }
}

/// Todo service facade over repositories and a classifier.
pub struct TodoService<T, A, C>
where
    T: TodoRepository,
    A: AssigneeRepository,
    C: CategoryClassifier,
{
    todos: T,
    assignees: A,
    classifier: C,
    clock: fn() -> i64,
}

impl<T, A, C> TodoService<T, A, C>
where
    T: TodoRepository,
    A: AssigneeRepository,
    C: CategoryClassifier,
{
    pub fn new(todos: T, assignees: A, classifier: C) -> Self {
        Self {
            todos,
            assignees,
            classifier,
            clock: now_epoch_ms,
        }
    }

    /// Replaces the wall clock, e.g. with a fixed time in tests.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn create_todo(&self, input: &TodoInput) -> ServiceResult<Todo> {
        let fields = input.validate()?;
        ensure_assignees_exist(&self.assignees, &fields.assignee_ids)?;

        let category = self.classify(&fields.title, None);
        let todo = Todo::create(fields, category, (self.clock)());
        let id = self.todos.create_todo(&todo)?;
        debug!(
            "event=todo_create module=todo_service status=ok assignees={} category={}",
            todo.assignee_ids.len(),
            todo.category
        );
        self.read_back(id, "created todo not found in read-back")
    }

    /// Fully replaces a todo's writable fields and assignee set.
    pub fn update_todo(&self, id: TodoId, input: &TodoInput) -> ServiceResult<Todo> {
        let mut todo = self.get_todo(id)?;
        let fields = input.validate()?;
        ensure_assignees_exist(&self.assignees, &fields.assignee_ids)?;

        let category = self.classify(&fields.title, Some(todo.category.as_str()));
        todo.apply(fields, (self.clock)());
        todo.category = category;
        self.todos.update_todo(&todo)?;
        self.read_back(id, "updated todo not found in read-back")
    }

    pub fn get_todo(&self, id: TodoId) -> ServiceResult<Todo> {
        self.todos.get_todo(id)?.ok_or(ServiceError::TodoNotFound(id))
    }

    /// Lists all todos ordered by creation time.
    pub fn list_todos(&self) -> ServiceResult<Vec<Todo>> {
        Ok(self.todos.list_todos()?)
    }

    /// Lists todos assigned to an existing assignee.
    pub fn list_todos_by_assignee(&self, assignee_id: AssigneeId) -> ServiceResult<Vec<Todo>> {
        if self.assignees.get_assignee(assignee_id)?.is_none() {
            return Err(ServiceError::AssigneeNotFound(assignee_id));
        }
        Ok(self.todos.list_todos_by_assignee(assignee_id)?)
    }

    pub fn delete_todo(&self, id: TodoId) -> ServiceResult<()> {
        self.todos.delete_todo(id)?;
        Ok(())
    }

    /// Re-resolves the todo's assignee ids against the assignee store.
    pub fn details(&self, todo: Todo) -> ServiceResult<TodoDetails> {
        let mut assignees = self.assignees.get_assignees(&todo.assignee_ids)?;
        if assignees.len() != todo.assignee_ids.len() {
            return Err(ServiceError::InconsistentState(
                "todo references an assignee that does not exist",
            ));
        }
        assignees.sort_by(|left, right| {
            (&left.prename, &left.name, left.id).cmp(&(&right.prename, &right.name, right.id))
        });
        Ok(TodoDetails { todo, assignees })
    }

    fn classify(&self, title: &str, existing: Option<&str>) -> String {
        match predict_category(&self.classifier, title) {
            Ok(label) => label,
            Err(err) => {
                let fallback = existing
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .unwrap_or(DEFAULT_CATEGORY)
                    .to_string();
                warn!(
                    "event=todo_classify module=todo_service status=fallback category={} error={}",
                    fallback, err
                );
                fallback
            }
        }
    }

    fn read_back(&self, id: TodoId, details: &'static str) -> ServiceResult<Todo> {
        self.todos
            .get_todo(id)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}
