//! Response envelope, wire bodies and error-to-status mapping.

use serde::Serialize;
use taskboard_core::{
    Assignee, ExportError, RepoError, ServiceError, TodoDetails, TodoId, CSV_FILE_NAME,
};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CSV: &str = "text/csv";

/// Transport-agnostic response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    /// Extra headers beyond `Content-Type`.
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl ApiResponse {
    pub(crate) fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, ApiFailure> {
        let body = serde_json::to_string(value)
            .map_err(|err| ApiFailure::internal(format!("response encoding failed: {err}")))?;
        Ok(Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            headers: Vec::new(),
            body,
        })
    }

    pub(crate) fn csv_attachment(body: String) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_CSV,
            headers: vec![(
                "Content-Disposition",
                format!("attachment; filename=\"{CSV_FILE_NAME}\""),
            )],
            body,
        }
    }

    pub(crate) fn error(status: u16, message: impl Into<String>) -> Self {
        let body = ErrorBody {
            error: message.into(),
        };
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            headers: Vec::new(),
            body: serde_json::to_string(&body)
                .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Todo as sent over the wire, with assignees resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TodoBody {
    id: TodoId,
    title: String,
    description: Option<String>,
    finished: bool,
    assignee_list: Vec<Assignee>,
    created_date: i64,
    due_date: i64,
    finished_date: Option<i64>,
    category: String,
}

impl From<TodoDetails> for TodoBody {
    fn from(value: TodoDetails) -> Self {
        let TodoDetails { todo, assignees } = value;
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            finished: todo.finished,
            assignee_list: assignees,
            created_date: todo.created_date,
            due_date: todo.due_date,
            finished_date: todo.finished_date,
            category: todo.category,
        }
    }
}

/// Handler failure carrying its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiFailure {
    pub status: u16,
    pub message: String,
}

impl ApiFailure {
    pub(crate) fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl From<ServiceError> for ApiFailure {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(_) => Self::bad_request(value.to_string()),
            ServiceError::AssigneeNotFound(_) | ServiceError::TodoNotFound(_) => {
                Self::new(404, value.to_string())
            }
            ServiceError::Repo(_) | ServiceError::InconsistentState(_) => {
                Self::internal(value.to_string())
            }
        }
    }
}

impl From<RepoError> for ApiFailure {
    fn from(value: RepoError) -> Self {
        ServiceError::from(value).into()
    }
}

impl From<ExportError> for ApiFailure {
    fn from(value: ExportError) -> Self {
        Self::internal(format!("export failed: {value}"))
    }
}

impl From<serde_json::Error> for ApiFailure {
    fn from(value: serde_json::Error) -> Self {
        Self::bad_request(format!("malformed JSON body: {value}"))
    }
}

impl From<ApiFailure> for ApiResponse {
    fn from(value: ApiFailure) -> Self {
        Self::error(value.status, value.message)
    }
}
