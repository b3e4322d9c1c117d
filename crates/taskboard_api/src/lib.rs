//! Request surface for the taskboard.
//!
//! # Responsibility
//! - Map `(method, path, JSON body)` requests onto core use-cases.
//! - Translate core errors into status codes and `{"error": ...}` bodies.
//!
//! # Invariants
//! - `handle` never panics and always returns a response.
//! - Requests are serialized over one SQLite connection.
//! - Default assignees are seeded once, when the surface is opened.

mod response;
mod routes;

pub use response::{ApiResponse, CONTENT_TYPE_CSV, CONTENT_TYPE_JSON};

use log::{error, info, warn};
use response::{ApiFailure, TodoBody};
use routes::{Route, RouteError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use taskboard_core::db::{open_db, open_db_in_memory};
use taskboard_core::{
    AssigneeInput, AssigneeService, CategoryClassifier, CoreConfig, DbError, EmailPolicy,
    KeywordClassifier, RelationshipService, ServiceError, SqliteAssigneeRepository,
    SqliteRelationshipRepository, SqliteTodoRepository, Todo, TodoCsvExporter, TodoInput,
    TodoService,
};

type SharedClassifier = Box<dyn CategoryClassifier + Send + Sync>;

type TodoUseCases<'a> = TodoService<
    SqliteTodoRepository<'a>,
    SqliteAssigneeRepository<'a>,
    &'a (dyn CategoryClassifier + Send + Sync),
>;

/// Startup failure of the request surface.
#[derive(Debug)]
pub enum ApiError {
    Db(DbError),
    Seed(ServiceError),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "database open failed: {err}"),
            Self::Seed(err) => write!(f, "default assignee seeding failed: {err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Seed(err) => Some(err),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self::Seed(value)
    }
}

/// Request dispatcher owning the store connection and classifier.
pub struct TaskboardApi {
    conn: Mutex<Connection>,
    classifier: SharedClassifier,
    policy: EmailPolicy,
}

impl TaskboardApi {
    /// Opens the configured database file with the keyword classifier.
    pub fn open(config: &CoreConfig) -> Result<Self, ApiError> {
        let conn = open_db(&config.db_path)?;
        Self::from_connection(
            conn,
            config.email_policy(),
            Box::new(KeywordClassifier::with_default_rules()),
        )
    }

    /// In-memory store with the default email policy.
    pub fn in_memory(classifier: SharedClassifier) -> Result<Self, ApiError> {
        Self::from_connection(open_db_in_memory()?, EmailPolicy::default(), classifier)
    }

    /// Wraps a migrated connection and seeds default assignees.
    pub fn from_connection(
        conn: Connection,
        policy: EmailPolicy,
        classifier: SharedClassifier,
    ) -> Result<Self, ApiError> {
        let repo = SqliteAssigneeRepository::try_new(&conn).map_err(ServiceError::from)?;
        AssigneeService::with_policy(repo, policy.clone()).seed_defaults()?;
        Ok(Self {
            conn: Mutex::new(conn),
            classifier,
            policy,
        })
    }

    /// Dispatches one request. An empty `body` means "no body".
    pub fn handle(&self, method: &str, path: &str, body: &str) -> ApiResponse {
        let started_at = Instant::now();
        let route = match Route::parse(method, path) {
            Ok(route) => route,
            Err(err) => {
                let response = route_error_response(err);
                info!(
                    "event=api_request module=api route=unmatched status={} duration_ms={}",
                    response.status,
                    started_at.elapsed().as_millis()
                );
                return response;
            }
        };

        let conn = self.lock();
        let response = match self.dispatch(&conn, route, body) {
            Ok(response) => response,
            Err(failure) => {
                if failure.status >= 500 {
                    error!(
                        "event=api_request module=api route={} status={} error={}",
                        route.name(),
                        failure.status,
                        failure.message
                    );
                    ApiResponse::error(failure.status, "internal server error")
                } else {
                    ApiResponse::from(failure)
                }
            }
        };
        drop(conn);

        info!(
            "event=api_request module=api route={} status={} duration_ms={}",
            route.name(),
            response.status,
            started_at.elapsed().as_millis()
        );
        response
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event=api_lock module=api status=recovered reason=poisoned");
                poisoned.into_inner()
            }
        }
    }

    fn dispatch(
        &self,
        conn: &Connection,
        route: Route,
        body: &str,
    ) -> Result<ApiResponse, ApiFailure> {
        match route {
            Route::ListAssignees => {
                ApiResponse::json(200, &self.assignees(conn)?.list_assignees()?)
            }
            Route::CreateAssignee => {
                let input = parse_body::<AssigneeInput>(body)?;
                ApiResponse::json(201, &self.assignees(conn)?.create_assignee(&input)?)
            }
            Route::GetAssignee(id) => {
                ApiResponse::json(200, &self.assignees(conn)?.get_assignee(id)?)
            }
            Route::UpdateAssignee(id) => {
                let input = parse_body::<AssigneeInput>(body)?;
                ApiResponse::json(200, &self.assignees(conn)?.update_assignee(id, &input)?)
            }
            Route::DeleteAssignee(id) => {
                let repo = SqliteRelationshipRepository::try_new(conn)?;
                ApiResponse::json(200, &RelationshipService::new(repo).delete_assignee(id)?)
            }
            Route::ListTodosByAssignee(id) => {
                let todos = self.todos(conn)?;
                let listed = todos.list_todos_by_assignee(id)?;
                ApiResponse::json(200, &to_bodies(&todos, listed)?)
            }
            Route::ListTodos => {
                let todos = self.todos(conn)?;
                let listed = todos.list_todos()?;
                ApiResponse::json(200, &to_bodies(&todos, listed)?)
            }
            Route::CreateTodo => {
                let input = parse_body::<TodoInput>(body)?;
                let todos = self.todos(conn)?;
                let created = todos.create_todo(&input)?;
                ApiResponse::json(201, &TodoBody::from(todos.details(created)?))
            }
            Route::GetTodo(id) => {
                let todos = self.todos(conn)?;
                let todo = todos.get_todo(id)?;
                ApiResponse::json(200, &TodoBody::from(todos.details(todo)?))
            }
            Route::UpdateTodo(id) => {
                let input = parse_body::<TodoInput>(body)?;
                let todos = self.todos(conn)?;
                let updated = todos.update_todo(id, &input)?;
                ApiResponse::json(200, &TodoBody::from(todos.details(updated)?))
            }
            Route::DeleteTodo(id) => {
                self.todos(conn)?.delete_todo(id)?;
                ApiResponse::json(200, &serde_json::json!({}))
            }
            Route::ExportTodosCsv => {
                let bytes = TodoCsvExporter::local().export(
                    &SqliteTodoRepository::try_new(conn)?,
                    &SqliteAssigneeRepository::try_new(conn)?,
                )?;
                let body = String::from_utf8(bytes)
                    .map_err(|err| ApiFailure::internal(format!("export is not UTF-8: {err}")))?;
                Ok(ApiResponse::csv_attachment(body))
            }
        }
    }

    fn assignees<'a>(
        &self,
        conn: &'a Connection,
    ) -> Result<AssigneeService<SqliteAssigneeRepository<'a>>, ApiFailure> {
        let repo = SqliteAssigneeRepository::try_new(conn)?;
        Ok(AssigneeService::with_policy(repo, self.policy.clone()))
    }

    fn todos<'a>(&'a self, conn: &'a Connection) -> Result<TodoUseCases<'a>, ApiFailure> {
        Ok(TodoService::new(
            SqliteTodoRepository::try_new(conn)?,
            SqliteAssigneeRepository::try_new(conn)?,
            self.classifier.as_ref(),
        ))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiFailure> {
    if body.trim().is_empty() {
        return Err(ApiFailure::bad_request("request body must be a JSON object"));
    }
    Ok(serde_json::from_str(body)?)
}

fn to_bodies(todos: &TodoUseCases<'_>, listed: Vec<Todo>) -> Result<Vec<TodoBody>, ApiFailure> {
    listed
        .into_iter()
        .map(|todo| -> Result<TodoBody, ApiFailure> {
            Ok(TodoBody::from(todos.details(todo)?))
        })
        .collect()
}

fn route_error_response(err: RouteError) -> ApiResponse {
    match err {
        RouteError::NotFound => ApiResponse::error(404, "no such route"),
        RouteError::MethodNotAllowed(allowed) => {
            let mut response = ApiResponse::error(405, "method not allowed");
            response.headers.push(("Allow", allowed.join(", ")));
            response
        }
        RouteError::MalformedId(value) => {
            ApiResponse::error(400, format!("`{value}` is not a valid id"))
        }
    }
}
