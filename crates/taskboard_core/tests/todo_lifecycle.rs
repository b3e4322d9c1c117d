use rusqlite::Connection;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    Assignee, AssigneeInput, AssigneeService, CategoryClassifier, ClassifierError,
    CompletionState, KeywordClassifier, ServiceError, SqliteAssigneeRepository,
    SqliteTodoRepository, TodoInput, TodoRepository, TodoService, UnavailableClassifier,
    ValidationError, DEFAULT_CATEGORY,
};
use uuid::Uuid;

const DUE: i64 = 1_704_153_600_000;

type Service<'conn, C> =
    TodoService<SqliteTodoRepository<'conn>, SqliteAssigneeRepository<'conn>, C>;

fn service<C: CategoryClassifier>(conn: &Connection, classifier: C) -> Service<'_, C> {
    TodoService::new(
        SqliteTodoRepository::try_new(conn).unwrap(),
        SqliteAssigneeRepository::try_new(conn).unwrap(),
        classifier,
    )
}

fn add_assignee(conn: &Connection, name: &str, prename: &str) -> Assignee {
    AssigneeService::new(SqliteAssigneeRepository::try_new(conn).unwrap())
        .create_assignee(&AssigneeInput::new(
            name,
            prename,
            format!("{}@org.edu", prename.to_lowercase()),
        ))
        .unwrap()
}

fn todo_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM todos;", [], |row| row.get(0))
        .unwrap()
}

fn at_1000() -> i64 {
    1_000
}

fn at_2000() -> i64 {
    2_000
}

fn at_3000() -> i64 {
    3_000
}

struct FixedLabel(&'static str);

impl CategoryClassifier for FixedLabel {
    fn classify(&self, _title: &str) -> Result<String, ClassifierError> {
        Ok(self.0.to_string())
    }
}

struct Crashing;

impl CategoryClassifier for Crashing {
    fn classify(&self, _title: &str) -> Result<String, ClassifierError> {
        panic!("model crashed")
    }
}

#[test]
fn create_sets_created_date_and_echoes_fields() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let service = service(&conn, UnavailableClassifier::default()).with_clock(at_1000);

    let todo = service
        .create_todo(
            &TodoInput::new("  Write report ", DUE)
                .with_description("quarterly numbers")
                .with_assignees([jane.id]),
        )
        .unwrap();

    assert_eq!(todo.title, "Write report");
    assert_eq!(todo.description.as_deref(), Some("quarterly numbers"));
    assert_eq!(todo.created_date, 1_000);
    assert_eq!(todo.due_date, DUE);
    assert_eq!(todo.finished_date, None);
    assert_eq!(todo.completion_state(), CompletionState::Open);
    assert_eq!(todo.assignee_ids, vec![jane.id]);
    assert_eq!(service.get_todo(todo.id).unwrap(), todo);
}

#[test]
fn create_without_title_or_due_date_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, UnavailableClassifier::default());

    let err = service
        .create_todo(&TodoInput {
            due_date: Some(DUE),
            ..TodoInput::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Blank("title"))
    ));

    let err = service
        .create_todo(&TodoInput {
            title: Some("Report".to_string()),
            ..TodoInput::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Missing("dueDate"))
    ));

    let err = service
        .create_todo(&TodoInput::new("Report", i64::MAX))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::OutOfRange("dueDate"))
    ));

    assert_eq!(todo_count(&conn), 0);
}

#[test]
fn unknown_assignee_rejects_whole_request() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let unknown = Uuid::new_v4();
    let service = service(&conn, UnavailableClassifier::default());

    let err = service
        .create_todo(&TodoInput::new("Report", DUE).with_assignees([jane.id, unknown]))
        .unwrap_err();
    match err {
        ServiceError::Validation(ValidationError::UnknownAssignees(missing)) => {
            assert_eq!(missing, vec![unknown]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(todo_count(&conn), 0);

    let todo = service
        .create_todo(&TodoInput::new("Report", DUE).with_assignees([jane.id]))
        .unwrap();
    let err = service
        .update_todo(
            todo.id,
            &TodoInput::new("Report v2", DUE).with_assignees([unknown]),
        )
        .unwrap_err();
    assert!(err.is_validation());

    let stored = service.get_todo(todo.id).unwrap();
    assert_eq!(stored.title, "Report");
    assert_eq!(stored.assignee_ids, vec![jane.id]);
}

#[test]
fn duplicate_assignee_ids_collapse() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let service = service(&conn, UnavailableClassifier::default());

    let todo = service
        .create_todo(&TodoInput::new("Report", DUE).with_assignees([jane.id, jane.id]))
        .unwrap();
    assert_eq!(todo.assignee_ids, vec![jane.id]);
}

#[test]
fn update_replaces_assignee_set_and_missing_list_clears_it() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let adam = add_assignee(&conn, "Smith", "Adam");
    let service = service(&conn, UnavailableClassifier::default());

    let todo = service
        .create_todo(&TodoInput::new("Report", DUE).with_assignees([jane.id]))
        .unwrap();

    let updated = service
        .update_todo(todo.id, &TodoInput::new("Report", DUE).with_assignees([adam.id]))
        .unwrap();
    assert_eq!(updated.id, todo.id);
    assert_eq!(updated.created_date, todo.created_date);
    assert_eq!(updated.assignee_ids, vec![adam.id]);

    let cleared = service
        .update_todo(todo.id, &TodoInput::new("Report", DUE))
        .unwrap();
    assert!(cleared.assignee_ids.is_empty());
}

#[test]
fn finished_date_is_stamped_on_first_completion_only() {
    let conn = open_db_in_memory().unwrap();
    let created = service(&conn, UnavailableClassifier::default())
        .with_clock(at_1000)
        .create_todo(&TodoInput::new("Report", DUE))
        .unwrap();

    let finished = service(&conn, UnavailableClassifier::default())
        .with_clock(at_2000)
        .update_todo(created.id, &TodoInput::new("Report", DUE).with_finished(true))
        .unwrap();
    assert_eq!(finished.finished_date, Some(2_000));
    assert_eq!(finished.completion_state(), CompletionState::Completed);

    let later = service(&conn, UnavailableClassifier::default()).with_clock(at_3000);
    let reopened = later
        .update_todo(created.id, &TodoInput::new("Report", DUE))
        .unwrap();
    assert!(!reopened.finished);
    assert_eq!(reopened.finished_date, Some(2_000));

    let refinished = later
        .update_todo(created.id, &TodoInput::new("Report", DUE).with_finished(true))
        .unwrap();
    assert_eq!(refinished.finished_date, Some(2_000));
    assert_eq!(refinished.created_date, 1_000);
}

#[test]
fn todo_created_finished_is_stamped_immediately() {
    let conn = open_db_in_memory().unwrap();
    let todo = service(&conn, UnavailableClassifier::default())
        .with_clock(at_1000)
        .create_todo(&TodoInput::new("Report", DUE).with_finished(true))
        .unwrap();
    assert_eq!(todo.finished_date, Some(1_000));
}

#[test]
fn classifier_label_is_normalized() {
    let conn = open_db_in_memory().unwrap();
    let todo = service(&conn, FixedLabel("  Study "))
        .create_todo(&TodoInput::new("anything", DUE))
        .unwrap();
    assert_eq!(todo.category, "study");
}

#[test]
fn classifier_failure_falls_back_to_default_on_create() {
    let conn = open_db_in_memory().unwrap();
    let unavailable = service(&conn, UnavailableClassifier::new("model missing"))
        .create_todo(&TodoInput::new("Buy groceries", DUE))
        .unwrap();
    assert_eq!(unavailable.category, DEFAULT_CATEGORY);

    let malformed = service(&conn, FixedLabel("   "))
        .create_todo(&TodoInput::new("Buy groceries", DUE))
        .unwrap();
    assert_eq!(malformed.category, "work");
}

#[test]
fn panicking_classifier_falls_back_like_a_failure() {
    let conn = open_db_in_memory().unwrap();
    let created = service(&conn, Crashing)
        .create_todo(&TodoInput::new("Report", DUE))
        .unwrap();
    assert_eq!(created.category, DEFAULT_CATEGORY);

    let household = service(&conn, KeywordClassifier::with_default_rules())
        .create_todo(&TodoInput::new("Buy groceries", DUE))
        .unwrap();
    let updated = service(&conn, Crashing)
        .update_todo(household.id, &TodoInput::new("Buy more groceries", DUE))
        .unwrap();
    assert_eq!(updated.category, "household");
    assert_eq!(todo_count(&conn), 2);
}

#[test]
fn classifier_failure_keeps_existing_label_on_update() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, KeywordClassifier::with_default_rules());

    let todo = service
        .create_todo(&TodoInput::new("Buy groceries", DUE))
        .unwrap();
    assert_eq!(todo.category, "household");

    let updated = service
        .update_todo(todo.id, &TodoInput::new("zzz", DUE))
        .unwrap();
    assert_eq!(updated.category, "household");

    let relabeled = service
        .update_todo(todo.id, &TodoInput::new("Dentist appointment", DUE))
        .unwrap();
    assert_eq!(relabeled.category, "health");
}

#[test]
fn list_todos_is_ordered_by_creation_time() {
    let conn = open_db_in_memory().unwrap();
    let second = service(&conn, UnavailableClassifier::default())
        .with_clock(at_2000)
        .create_todo(&TodoInput::new("second", DUE))
        .unwrap();
    let first = service(&conn, UnavailableClassifier::default())
        .with_clock(at_1000)
        .create_todo(&TodoInput::new("first", DUE))
        .unwrap();

    let ids = service(&conn, UnavailableClassifier::default())
        .list_todos()
        .unwrap()
        .into_iter()
        .map(|todo| todo.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn list_todos_by_assignee_filters_and_rejects_unknown_assignee() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let adam = add_assignee(&conn, "Smith", "Adam");
    let service = service(&conn, UnavailableClassifier::default());

    let shared = service
        .create_todo(&TodoInput::new("shared", DUE).with_assignees([jane.id, adam.id]))
        .unwrap();
    service
        .create_todo(&TodoInput::new("adam only", DUE).with_assignees([adam.id]))
        .unwrap();

    let for_jane = service.list_todos_by_assignee(jane.id).unwrap();
    assert_eq!(for_jane, vec![shared]);
    assert_eq!(service.list_todos_by_assignee(adam.id).unwrap().len(), 2);

    let err = service.list_todos_by_assignee(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ServiceError::AssigneeNotFound(_)));
}

#[test]
fn details_resolve_assignees_in_name_order() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let adam = add_assignee(&conn, "Smith", "Adam");
    let service = service(&conn, UnavailableClassifier::default());

    let todo = service
        .create_todo(&TodoInput::new("shared", DUE).with_assignees([jane.id, adam.id]))
        .unwrap();
    let details = service.details(todo).unwrap();
    assert_eq!(details.assignee_names(), vec!["Adam Smith", "Jane Doe"]);
}

#[test]
fn delete_removes_todo_and_links() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let service = service(&conn, UnavailableClassifier::default());

    let todo = service
        .create_todo(&TodoInput::new("Report", DUE).with_assignees([jane.id]))
        .unwrap();
    service.delete_todo(todo.id).unwrap();

    assert!(service.get_todo(todo.id).unwrap_err().is_not_found());
    assert!(service.delete_todo(todo.id).unwrap_err().is_not_found());
    assert!(service.list_todos_by_assignee(jane.id).unwrap().is_empty());

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM todo_assignees;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(links, 0);
}

#[test]
fn update_unknown_todo_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn, UnavailableClassifier::default());

    let err = service
        .update_todo(Uuid::new_v4(), &TodoInput::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::TodoNotFound(_)));

    let repo = SqliteTodoRepository::try_new(&conn).unwrap();
    assert!(repo.list_todos().unwrap().is_empty());
}
