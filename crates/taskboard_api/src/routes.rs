//! Request path and method matching.
//!
//! # Invariants
//! - Unknown paths are `NotFound`; known paths with another method are
//!   `MethodNotAllowed`; ids are parsed only after method matching.
//! - A leading `/api/v1`, a trailing `/` and any query string are ignored.

use taskboard_core::{AssigneeId, TodoId};
use uuid::Uuid;

const API_PREFIX: &str = "/api/v1";

/// Matched request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    ListAssignees,
    CreateAssignee,
    GetAssignee(AssigneeId),
    UpdateAssignee(AssigneeId),
    DeleteAssignee(AssigneeId),
    ListTodosByAssignee(AssigneeId),
    ListTodos,
    CreateTodo,
    GetTodo(TodoId),
    UpdateTodo(TodoId),
    DeleteTodo(TodoId),
    ExportTodosCsv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RouteError {
    NotFound,
    MethodNotAllowed(&'static [&'static str]),
    MalformedId(String),
}

impl Route {
    pub(crate) fn parse(method: &str, path: &str) -> Result<Self, RouteError> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.strip_prefix(API_PREFIX).unwrap_or(path);
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        let method = method.trim().to_ascii_uppercase();

        match segments.as_slice() {
            ["assignees"] => match method.as_str() {
                "GET" => Ok(Self::ListAssignees),
                "POST" => Ok(Self::CreateAssignee),
                _ => Err(RouteError::MethodNotAllowed(&["GET", "POST"])),
            },
            ["assignees", id] => {
                let build = match method.as_str() {
                    "GET" => Self::GetAssignee,
                    "PUT" => Self::UpdateAssignee,
                    "DELETE" => Self::DeleteAssignee,
                    _ => return Err(RouteError::MethodNotAllowed(&["GET", "PUT", "DELETE"])),
                };
                parse_id(id).map(build)
            }
            ["assignees", id, "todos"] => match method.as_str() {
                "GET" => parse_id(id).map(Self::ListTodosByAssignee),
                _ => Err(RouteError::MethodNotAllowed(&["GET"])),
            },
            ["todos"] => match method.as_str() {
                "GET" => Ok(Self::ListTodos),
                "POST" => Ok(Self::CreateTodo),
                _ => Err(RouteError::MethodNotAllowed(&["GET", "POST"])),
            },
            ["todos", id] => {
                let build = match method.as_str() {
                    "GET" => Self::GetTodo,
                    "PUT" => Self::UpdateTodo,
                    "DELETE" => Self::DeleteTodo,
                    _ => return Err(RouteError::MethodNotAllowed(&["GET", "PUT", "DELETE"])),
                };
                parse_id(id).map(build)
            }
            ["csv-downloads", "todos"] => match method.as_str() {
                "GET" => Ok(Self::ExportTodosCsv),
                _ => Err(RouteError::MethodNotAllowed(&["GET"])),
            },
            _ => Err(RouteError::NotFound),
        }
    }

    /// Stable route label for log lines.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::ListAssignees => "assignee_list",
            Self::CreateAssignee => "assignee_create",
            Self::GetAssignee(_) => "assignee_get",
            Self::UpdateAssignee(_) => "assignee_update",
            Self::DeleteAssignee(_) => "assignee_delete",
            Self::ListTodosByAssignee(_) => "assignee_todos",
            Self::ListTodos => "todo_list",
            Self::CreateTodo => "todo_create",
            Self::GetTodo(_) => "todo_get",
            Self::UpdateTodo(_) => "todo_update",
            Self::DeleteTodo(_) => "todo_delete",
            Self::ExportTodosCsv => "todo_export_csv",
        }
    }
}

fn parse_id(value: &str) -> Result<Uuid, RouteError> {
    Uuid::parse_str(value).map_err(|_| RouteError::MalformedId(value.to_string()))
}
