//! Assignee repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update APIs over the `assignees` table.
//! - Resolve id sets to existing records (`get_assignees`).
//!
//! # Invariants
//! - Deletion is not part of this contract; it must go through
//!   `RelationshipRepository` so todo links are detached first.
//! - Listing order is insertion order.

use crate::model::assignee::{Assignee, AssigneeId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, params_from_iter, Connection, Row};

const ASSIGNEE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    prename,
    email
FROM assignees";

/// Repository interface for assignee records.
pub trait AssigneeRepository {
    fn create_assignee(&self, assignee: &Assignee) -> RepoResult<AssigneeId>;
    /// Replaces name, prename and email of an existing assignee.
    fn update_assignee(&self, assignee: &Assignee) -> RepoResult<()>;
    fn get_assignee(&self, id: AssigneeId) -> RepoResult<Option<Assignee>>;
    /// Returns the subset of `ids` that exist, in listing order.
    fn get_assignees(&self, ids: &[AssigneeId]) -> RepoResult<Vec<Assignee>>;
    fn list_assignees(&self) -> RepoResult<Vec<Assignee>>;
    fn count_assignees(&self) -> RepoResult<u64>;
}

impl<R: AssigneeRepository + ?Sized> AssigneeRepository for &R {
    fn create_assignee(&self, assignee: &Assignee) -> RepoResult<AssigneeId> {
        (**self).create_assignee(assignee)
    }

    fn update_assignee(&self, assignee: &Assignee) -> RepoResult<()> {
        (**self).update_assignee(assignee)
    }

    fn get_assignee(&self, id: AssigneeId) -> RepoResult<Option<Assignee>> {
        (**self).get_assignee(id)
    }

    fn get_assignees(&self, ids: &[AssigneeId]) -> RepoResult<Vec<Assignee>> {
        (**self).get_assignees(ids)
    }

    fn list_assignees(&self) -> RepoResult<Vec<Assignee>> {
        (**self).list_assignees()
    }

    fn count_assignees(&self) -> RepoResult<u64> {
        (**self).count_assignees()
    }
}

/// SQLite-backed assignee repository.
pub struct SqliteAssigneeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssigneeRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["assignees"])?;
        Ok(Self { conn })
    }
}

impl AssigneeRepository for SqliteAssigneeRepository<'_> {
    fn create_assignee(&self, assignee: &Assignee) -> RepoResult<AssigneeId> {
        self.conn.execute(
            "INSERT INTO assignees (uuid, name, prename, email)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                assignee.id.to_string(),
                assignee.name.as_str(),
                assignee.prename.as_str(),
                assignee.email.as_str(),
            ],
        )?;

        Ok(assignee.id)
    }

    fn update_assignee(&self, assignee: &Assignee) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE assignees
             SET
                name = ?1,
                prename = ?2,
                email = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                assignee.name.as_str(),
                assignee.prename.as_str(),
                assignee.email.as_str(),
                assignee.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::AssigneeNotFound(assignee.id));
        }

        Ok(())
    }

    fn get_assignee(&self, id: AssigneeId) -> RepoResult<Option<Assignee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ASSIGNEE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_assignee_row(row)?));
        }

        Ok(None)
    }

    fn get_assignees(&self, ids: &[AssigneeId]) -> RepoResult<Vec<Assignee>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "{ASSIGNEE_SELECT_SQL}
             WHERE uuid IN ({placeholders})
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(ids.iter().map(ToString::to_string)))?;
        let mut assignees = Vec::new();
        while let Some(row) = rows.next()? {
            assignees.push(parse_assignee_row(row)?);
        }

        Ok(assignees)
    }

    fn list_assignees(&self) -> RepoResult<Vec<Assignee>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ASSIGNEE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut assignees = Vec::new();
        while let Some(row) = rows.next()? {
            assignees.push(parse_assignee_row(row)?);
        }

        Ok(assignees)
    }

    fn count_assignees(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM assignees;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative assignee count `{count}`")))
    }
}

pub(crate) fn parse_assignee_row(row: &Row<'_>) -> RepoResult<Assignee> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Assignee {
        id: parse_uuid(&uuid_text, "assignees.uuid")?,
        name: row.get("name")?,
        prename: row.get("prename")?,
        email: row.get("email")?,
    })
}
