use rusqlite::Connection;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    Assignee, AssigneeInput, AssigneeService, RelationshipRepository, RelationshipService,
    ServiceError, SqliteAssigneeRepository, SqliteRelationshipRepository, SqliteTodoRepository,
    Todo, TodoInput, TodoService, UnavailableClassifier,
};
use uuid::Uuid;

const DUE: i64 = 1_704_153_600_000;

fn add_assignee(conn: &Connection, name: &str, prename: &str) -> Assignee {
    AssigneeService::new(SqliteAssigneeRepository::try_new(conn).unwrap())
        .create_assignee(&AssigneeInput::new(
            name,
            prename,
            format!("{}@org.edu", prename.to_lowercase()),
        ))
        .unwrap()
}

fn add_todo(conn: &Connection, title: &str, assignees: &[&Assignee]) -> Todo {
    todos(conn)
        .create_todo(
            &TodoInput::new(title, DUE).with_assignees(assignees.iter().map(|a| a.id)),
        )
        .unwrap()
}

fn todos(
    conn: &Connection,
) -> TodoService<SqliteTodoRepository<'_>, SqliteAssigneeRepository<'_>, UnavailableClassifier>
{
    TodoService::new(
        SqliteTodoRepository::try_new(conn).unwrap(),
        SqliteAssigneeRepository::try_new(conn).unwrap(),
        UnavailableClassifier::default(),
    )
}

fn relationships(conn: &Connection) -> RelationshipService<SqliteRelationshipRepository<'_>> {
    RelationshipService::new(SqliteRelationshipRepository::try_new(conn).unwrap())
}

fn link_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM todo_assignees;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn delete_detaches_assignee_from_every_todo() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let adam = add_assignee(&conn, "Smith", "Adam");
    let shared = add_todo(&conn, "shared", &[&jane, &adam]);
    let jane_only = add_todo(&conn, "jane only", &[&jane]);
    let untouched = add_todo(&conn, "adam only", &[&adam]);

    let removed = relationships(&conn).delete_assignee(jane.id).unwrap();
    assert_eq!(removed, jane);

    let todos = todos(&conn);
    assert_eq!(todos.get_todo(shared.id).unwrap().assignee_ids, vec![adam.id]);
    assert!(todos.get_todo(jane_only.id).unwrap().assignee_ids.is_empty());
    assert_eq!(todos.get_todo(untouched.id).unwrap(), untouched);
    assert_eq!(todos.list_todos().unwrap().len(), 3);

    let service = relationships(&conn);
    assert!(service.todos_referencing(jane.id).unwrap().is_empty());
    assert!(service.dangling_references().unwrap().is_empty());
    service.verify_integrity().unwrap();

    let assignees = AssigneeService::new(SqliteAssigneeRepository::try_new(&conn).unwrap());
    assert!(assignees.get_assignee(jane.id).unwrap_err().is_not_found());
}

#[test]
fn cascade_outcome_lists_detached_todos() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let first = add_todo(&conn, "first", &[&jane]);
    add_todo(&conn, "unassigned", &[]);

    let repo = SqliteRelationshipRepository::try_new(&conn).unwrap();
    assert_eq!(repo.todos_referencing(jane.id).unwrap(), vec![first.id]);

    let outcome = repo.delete_assignee_cascading(jane.id).unwrap();
    assert_eq!(outcome.assignee.id, jane.id);
    assert_eq!(outcome.detached_todos, vec![first.id]);
}

#[test]
fn delete_unknown_assignee_is_not_found_and_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let todo = add_todo(&conn, "Report", &[&jane]);

    let err = relationships(&conn)
        .delete_assignee(Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, ServiceError::AssigneeNotFound(_)));

    assert_eq!(todos(&conn).get_todo(todo.id).unwrap(), todo);
    assert_eq!(link_count(&conn), 1);
}

#[test]
fn failure_mid_cascade_rolls_back_everything() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let first = add_todo(&conn, "first", &[&jane]);
    let broken = add_todo(&conn, "boom", &[&jane]);
    conn.execute_batch(
        "CREATE TRIGGER fail_boom_update
         BEFORE UPDATE ON todos
         WHEN OLD.title = 'boom'
         BEGIN
            SELECT RAISE(ABORT, 'boom');
         END;",
    )
    .unwrap();

    let err = relationships(&conn).delete_assignee(jane.id).unwrap_err();
    assert!(matches!(err, ServiceError::Repo(_)));
    assert!(conn.is_autocommit());

    let todos = todos(&conn);
    assert_eq!(todos.get_todo(first.id).unwrap().assignee_ids, vec![jane.id]);
    assert_eq!(todos.get_todo(broken.id).unwrap().assignee_ids, vec![jane.id]);
    assert_eq!(link_count(&conn), 2);

    let assignees = AssigneeService::new(SqliteAssigneeRepository::try_new(&conn).unwrap());
    assert_eq!(assignees.get_assignee(jane.id).unwrap(), jane);
}

#[test]
fn dangling_reference_audit_detects_forced_inconsistency() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    let todo = add_todo(&conn, "Report", &[&jane]);

    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         DELETE FROM assignees;
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();

    let service = relationships(&conn);
    let dangling = service.dangling_references().unwrap();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].todo_id, todo.id);
    assert_eq!(dangling[0].assignee_id, jane.id);
    assert!(matches!(
        service.verify_integrity().unwrap_err(),
        ServiceError::InconsistentState(_)
    ));
}

#[test]
fn jane_scenario_end_to_end() {
    let conn = open_db_in_memory().unwrap();
    let jane = add_assignee(&conn, "Doe", "Jane");
    assert_eq!(jane.email, "jane@org.edu");

    let todo = add_todo(&conn, "Report", &[&jane]);
    assert_eq!(todo.assignee_ids, vec![jane.id]);
    assert_eq!(todo.category, "work");

    relationships(&conn).delete_assignee(jane.id).unwrap();

    let reloaded = todos(&conn).get_todo(todo.id).unwrap();
    assert!(reloaded.assignee_ids.is_empty());
    assert_eq!(reloaded.title, "Report");
}
