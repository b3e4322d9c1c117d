//! Todo repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `todos` plus the owned `todo_assignees` links.
//! - Replace a todo's link set wholesale on every write.
//!
//! # Invariants
//! - Row and link writes for one todo commit together.
//! - `created_date` is written on insert only.
//! - Listing order is `created_date ASC, uuid ASC`.
//! - Loaded `assignee_ids` are sorted and unique.

use crate::model::assignee::AssigneeId;
use crate::model::todo::{Todo, TodoId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, in_write_tx, int_to_bool, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};

const TODO_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    finished,
    created_date,
    due_date,
    finished_date,
    category
FROM todos";

/// Repository interface for todo records and their assignee links.
pub trait TodoRepository {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId>;
    /// Overwrites mutable columns and the full link set.
    fn update_todo(&self, todo: &Todo) -> RepoResult<()>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    fn list_todos(&self) -> RepoResult<Vec<Todo>>;
    /// Lists todos whose link set contains `assignee_id`.
    fn list_todos_by_assignee(&self, assignee_id: AssigneeId) -> RepoResult<Vec<Todo>>;
    fn delete_todo(&self, id: TodoId) -> RepoResult<()>;
}

impl<R: TodoRepository + ?Sized> TodoRepository for &R {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        (**self).create_todo(todo)
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<()> {
        (**self).update_todo(todo)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        (**self).get_todo(id)
    }

    fn list_todos(&self) -> RepoResult<Vec<Todo>> {
        (**self).list_todos()
    }

    fn list_todos_by_assignee(&self, assignee_id: AssigneeId) -> RepoResult<Vec<Todo>> {
        (**self).list_todos_by_assignee(assignee_id)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        (**self).delete_todo(id)
    }
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["todos", "todo_assignees"])?;
        Ok(Self { conn })
    }

    fn load_rows(&self, sql: &str, bind: Option<String>) -> RepoResult<Vec<Todo>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match bind {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };
        let mut todos = Vec::new();
        while let Some(row) = rows.next()? {
            todos.push(parse_todo_row(self.conn, row)?);
        }
        Ok(todos)
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        in_write_tx(self.conn, |conn| {
            conn.execute(
                "INSERT INTO todos (
                    uuid,
                    title,
                    description,
                    finished,
                    created_date,
                    due_date,
                    finished_date,
                    category
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    todo.id.to_string(),
                    todo.title.as_str(),
                    todo.description.as_deref(),
                    bool_to_int(todo.finished),
                    todo.created_date,
                    todo.due_date,
                    todo.finished_date,
                    todo.category.as_str(),
                ],
            )?;
            replace_links(conn, todo)
        })?;

        Ok(todo.id)
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<()> {
        in_write_tx(self.conn, |conn| {
            let changed = conn.execute(
                "UPDATE todos
                 SET
                    title = ?1,
                    description = ?2,
                    finished = ?3,
                    due_date = ?4,
                    finished_date = ?5,
                    category = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?7;",
                params![
                    todo.title.as_str(),
                    todo.description.as_deref(),
                    bool_to_int(todo.finished),
                    todo.due_date,
                    todo.finished_date,
                    todo.category.as_str(),
                    todo.id.to_string(),
                ],
            )?;

            if changed == 0 {
                return Err(RepoError::TodoNotFound(todo.id));
            }

            replace_links(conn, todo)
        })
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut todos = self.load_rows(
            &format!("{TODO_SELECT_SQL} WHERE uuid = ?1;"),
            Some(id.to_string()),
        )?;
        Ok(todos.pop())
    }

    fn list_todos(&self) -> RepoResult<Vec<Todo>> {
        self.load_rows(
            &format!("{TODO_SELECT_SQL} ORDER BY created_date ASC, uuid ASC;"),
            None,
        )
    }

    fn list_todos_by_assignee(&self, assignee_id: AssigneeId) -> RepoResult<Vec<Todo>> {
        self.load_rows(
            &format!(
                "{TODO_SELECT_SQL}
                 WHERE EXISTS (
                    SELECT 1
                    FROM todo_assignees ta
                    WHERE ta.todo_uuid = todos.uuid
                      AND ta.assignee_uuid = ?1
                 )
                 ORDER BY created_date ASC, uuid ASC;"
            ),
            Some(assignee_id.to_string()),
        )
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TodoNotFound(id));
        }
        Ok(())
    }
}

fn replace_links(conn: &Connection, todo: &Todo) -> RepoResult<()> {
    let todo_uuid = todo.id.to_string();
    conn.execute(
        "DELETE FROM todo_assignees WHERE todo_uuid = ?1;",
        [todo_uuid.as_str()],
    )?;

    let mut insert = conn.prepare(
        "INSERT OR IGNORE INTO todo_assignees (todo_uuid, assignee_uuid)
         VALUES (?1, ?2);",
    )?;
    for assignee_id in &todo.assignee_ids {
        insert.execute(params![todo_uuid.as_str(), assignee_id.to_string()])?;
    }

    Ok(())
}

pub(crate) fn load_assignee_ids(conn: &Connection, todo_uuid: &str) -> RepoResult<Vec<AssigneeId>> {
    let mut stmt = conn.prepare(
        "SELECT assignee_uuid
         FROM todo_assignees
         WHERE todo_uuid = ?1;",
    )?;
    let mut rows = stmt.query([todo_uuid])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "todo_assignees.assignee_uuid")?);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

fn parse_todo_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Todo> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "todos.uuid")?;
    let finished = int_to_bool(row.get("finished")?, "todos.finished")?;
    let assignee_ids = load_assignee_ids(conn, &uuid_text)?;

    Ok(Todo {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        finished,
        assignee_ids,
        created_date: row.get("created_date")?,
        due_date: row.get("due_date")?,
        finished_date: row.get("finished_date")?,
        category: row.get("category")?,
    })
}
