//! Relationship repository: the only path that removes assignees.
//!
//! # Responsibility
//! - Delete an assignee after detaching it from every referencing todo.
//! - Answer audit queries over the todo/assignee link set.
//!
//! # Invariants
//! - Lookup, detach and delete commit in one immediate transaction; any
//!   failure leaves the assignee and every link untouched.
//! - Every affected todo is persisted before the assignee row is removed.

use crate::model::assignee::{Assignee, AssigneeId};
use crate::model::todo::TodoId;
use crate::repo::assignee_repo::{AssigneeRepository, SqliteAssigneeRepository};
use crate::repo::todo_repo::{SqliteTodoRepository, TodoRepository};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Result of a cascading assignee delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    /// Assignee state right before removal.
    pub assignee: Assignee,
    /// Todos whose link set lost the assignee, in listing order.
    pub detached_todos: Vec<TodoId>,
}

/// Link row whose assignee no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReference {
    pub todo_id: TodoId,
    pub assignee_id: AssigneeId,
}

/// Repository interface for cross-table relationship maintenance.
pub trait RelationshipRepository {
    /// Detaches `assignee_id` from all todos, then deletes the assignee.
    fn delete_assignee_cascading(&self, assignee_id: AssigneeId) -> RepoResult<CascadeOutcome>;
    /// Ids of todos currently linked to `assignee_id`.
    fn todos_referencing(&self, assignee_id: AssigneeId) -> RepoResult<Vec<TodoId>>;
    /// Links pointing at missing assignees. Empty while invariants hold.
    fn dangling_references(&self) -> RepoResult<Vec<DanglingReference>>;
}

/// SQLite-backed relationship repository.
pub struct SqliteRelationshipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRelationshipRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["assignees", "todos", "todo_assignees"])?;
        Ok(Self { conn })
    }
}

impl RelationshipRepository for SqliteRelationshipRepository<'_> {
    fn delete_assignee_cascading(&self, assignee_id: AssigneeId) -> RepoResult<CascadeOutcome> {
        // Dropping `tx` on any early return rolls back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let assignees = SqliteAssigneeRepository::try_new(&tx)?;
        let todos = SqliteTodoRepository::try_new(&tx)?;

        let assignee = assignees
            .get_assignee(assignee_id)?
            .ok_or(RepoError::AssigneeNotFound(assignee_id))?;

        let affected = todos.list_todos_by_assignee(assignee_id)?;
        let mut detached_todos = Vec::with_capacity(affected.len());
        for mut todo in affected {
            todo.detach_assignee(assignee_id);
            todos.update_todo(&todo)?;
            detached_todos.push(todo.id);
        }

        let removed = tx.execute(
            "DELETE FROM assignees WHERE uuid = ?1;",
            [assignee_id.to_string()],
        )?;
        if removed != 1 {
            return Err(RepoError::AssigneeNotFound(assignee_id));
        }

        tx.commit()?;
        Ok(CascadeOutcome {
            assignee,
            detached_todos,
        })
    }

    fn todos_referencing(&self, assignee_id: AssigneeId) -> RepoResult<Vec<TodoId>> {
        let mut stmt = self.conn.prepare(
            "SELECT ta.todo_uuid
             FROM todo_assignees ta
             INNER JOIN todos t ON t.uuid = ta.todo_uuid
             WHERE ta.assignee_uuid = ?1
             ORDER BY t.created_date ASC, t.uuid ASC;",
        )?;
        let mut rows = stmt.query([assignee_id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "todo_assignees.todo_uuid")?);
        }
        Ok(ids)
    }

    fn dangling_references(&self) -> RepoResult<Vec<DanglingReference>> {
        let mut stmt = self.conn.prepare(
            "SELECT ta.todo_uuid, ta.assignee_uuid
             FROM todo_assignees ta
             LEFT JOIN assignees a ON a.uuid = ta.assignee_uuid
             WHERE a.uuid IS NULL
             ORDER BY ta.todo_uuid ASC, ta.assignee_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut dangling = Vec::new();
        while let Some(row) = rows.next()? {
            let todo_text: String = row.get(0)?;
            let assignee_text: String = row.get(1)?;
            dangling.push(DanglingReference {
                todo_id: parse_uuid(&todo_text, "todo_assignees.todo_uuid")?,
                assignee_id: parse_uuid(&assignee_text, "todo_assignees.assignee_uuid")?,
            });
        }
        Ok(dangling)
    }
}
