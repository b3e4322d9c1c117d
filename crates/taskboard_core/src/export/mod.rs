//! Tabular export of the todo collection.
//!
//! # Responsibility
//! - Render every todo as one CSV row with a fixed column order.
//! - Resolve assignee ids to display names at export time.
//!
//! # Invariants
//! - Output is fully buffered; nothing reaches the sink if rendering fails.
//! - Row order follows todo listing order (`created_date ASC, uuid ASC`).
//! - Dates render as `yyyy-MM-dd` in the exporter's time zone.

use crate::db::DbError;
use crate::model::assignee::{Assignee, AssigneeId};
use crate::model::todo::{Todo, TodoId};
use crate::repo::assignee_repo::AssigneeRepository;
use crate::repo::todo_repo::TodoRepository;
use crate::repo::RepoError;
use chrono::{Local, TimeZone};
use log::{error, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::time::Instant;

/// Header row, in column order.
pub const CSV_HEADER: [&str; 9] = [
    "id",
    "title",
    "description",
    "finished",
    "assignees",
    "createdDate",
    "dueDate",
    "finishedDate",
    "category",
];

/// Separator between assignee display names in the `assignees` column.
pub const ASSIGNEE_SEPARATOR: &str = "+";

/// Suggested file name for downloads.
pub const CSV_FILE_NAME: &str = "todos.csv";

pub type ExportResult<T> = Result<T, ExportError>;

/// Fatal export failure. Exports are never retried.
#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
    Repo(RepoError),
    /// Timestamp cannot be represented as a calendar date.
    InvalidTimestamp { field: &'static str, value: i64 },
    /// Todo links an assignee that is not in the store.
    UnknownAssignee {
        todo_id: TodoId,
        assignee_id: AssigneeId,
    },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "failed to write csv: {err}"),
            Self::Io(err) => write!(f, "failed to write export: {err}"),
            Self::Repo(err) => write!(f, "failed to load todos for export: {err}"),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "{field} value {value} is out of range")
            }
            Self::UnknownAssignee {
                todo_id,
                assignee_id,
            } => write!(f, "todo {todo_id} references unknown assignee {assignee_id}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for ExportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ExportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

/// CSV exporter bound to one time zone.
#[derive(Debug, Clone)]
pub struct TodoCsvExporter<Tz: TimeZone = Local> {
    tz: Tz,
}

impl TodoCsvExporter<Local> {
    /// Exporter rendering dates in the system's local time zone.
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for TodoCsvExporter<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz> TodoCsvExporter<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn with_time_zone(tz: Tz) -> Self {
        Self { tz }
    }

    /// Loads every todo and renders the full document.
    pub fn export<T, A>(&self, todos: &T, assignees: &A) -> ExportResult<Vec<u8>>
    where
        T: TodoRepository + ?Sized,
        A: AssigneeRepository + ?Sized,
    {
        let started_at = Instant::now();
        let result = todos
            .list_todos()
            .map_err(ExportError::from)
            .and_then(|rows| {
                let directory = assignees
                    .list_assignees()?
                    .into_iter()
                    .map(|assignee| (assignee.id, assignee))
                    .collect::<HashMap<_, _>>();
                self.render(&rows, &directory).map(|bytes| (rows.len(), bytes))
            });

        match result {
            Ok((row_count, bytes)) => {
                info!(
                    "event=todo_export module=export status=ok rows={} bytes={} duration_ms={}",
                    row_count,
                    bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(bytes)
            }
            Err(err) => {
                error!(
                    "event=todo_export module=export status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Renders the full document and writes it to `sink` in one piece.
    pub fn export_to<W, T, A>(&self, todos: &T, assignees: &A, sink: &mut W) -> ExportResult<()>
    where
        W: Write + ?Sized,
        T: TodoRepository + ?Sized,
        A: AssigneeRepository + ?Sized,
    {
        let bytes = self.export(todos, assignees)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Renders `todos` with assignee names taken from `directory`.
    pub fn render(
        &self,
        todos: &[Todo],
        directory: &HashMap<AssigneeId, Assignee>,
    ) -> ExportResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for todo in todos {
            writer.write_record(self.row(todo, directory)?)?;
        }
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|err| ExportError::Io(err.into_error()))
    }

    fn row(
        &self,
        todo: &Todo,
        directory: &HashMap<AssigneeId, Assignee>,
    ) -> ExportResult<[String; 9]> {
        Ok([
            todo.id.to_string(),
            todo.title.clone(),
            todo.description.clone().unwrap_or_default(),
            if todo.finished { "TRUE" } else { "FALSE" }.to_string(),
            assignee_column(todo, directory)?,
            self.date_column("createdDate", Some(todo.created_date))?,
            self.date_column("dueDate", Some(todo.due_date))?,
            self.date_column("finishedDate", todo.finished_date)?,
            todo.category.clone(),
        ])
    }

    fn date_column(&self, field: &'static str, value: Option<i64>) -> ExportResult<String> {
        match value {
            Some(epoch_ms) => format_calendar_date(epoch_ms, &self.tz)
                .ok_or(ExportError::InvalidTimestamp { field, value: epoch_ms }),
            None => Ok(String::new()),
        }
    }
}

/// Formats epoch milliseconds as `yyyy-MM-dd` in `tz`.
pub fn format_calendar_date<Tz>(epoch_ms: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|moment| moment.format("%Y-%m-%d").to_string())
}

fn assignee_column(todo: &Todo, directory: &HashMap<AssigneeId, Assignee>) -> ExportResult<String> {
    let mut assignees = Vec::with_capacity(todo.assignee_ids.len());
    for assignee_id in &todo.assignee_ids {
        let assignee = directory
            .get(assignee_id)
            .ok_or(ExportError::UnknownAssignee {
                todo_id: todo.id,
                assignee_id: *assignee_id,
            })?;
        assignees.push(assignee);
    }
    assignees.sort_by(|left, right| {
        (&left.prename, &left.name, left.id).cmp(&(&right.prename, &right.name, right.id))
    });

    Ok(assignees
        .iter()
        .map(|assignee| assignee.display_name())
        .collect::<Vec<_>>()
        .join(ASSIGNEE_SEPARATOR))
}
