use serde_json::{json, Value};
use taskboard_api::{ApiResponse, TaskboardApi};
use taskboard_core::{CategoryClassifier, ClassifierError, CoreConfig, UnavailableClassifier};

const DUE: i64 = 1_704_153_600_000;

fn api() -> TaskboardApi {
    TaskboardApi::in_memory(Box::new(UnavailableClassifier::default())).unwrap()
}

fn body(response: &ApiResponse) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

fn create_jane(api: &TaskboardApi) -> String {
    let response = api.handle(
        "POST",
        "/assignees",
        &json!({"name": "Doe", "prename": "Jane", "email": "jane@org.edu"}).to_string(),
    );
    assert_eq!(response.status, 201, "{}", response.body);
    body(&response)["id"].as_str().unwrap().to_string()
}

#[test]
fn seeded_assignees_are_listed_once() {
    let api = api();
    let listed = body(&api.handle("GET", "/assignees", ""));
    let names = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["prename"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Paul", "John"]);
}

#[test]
fn reopening_file_database_does_not_seed_twice() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("taskboard.db");
    let db_path_text = db_path.to_str().unwrap().to_string();
    let config = CoreConfig::from_lookup(|key| {
        (key == "TASKBOARD_DB_PATH").then(|| db_path_text.clone())
    })
    .unwrap();

    drop(TaskboardApi::open(&config).unwrap());
    let api = TaskboardApi::open(&config).unwrap();
    let listed = body(&api.handle("GET", "/assignees", ""));
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[test]
fn jane_scenario() {
    let api = api();
    let jane_id = create_jane(&api);

    let created = api.handle(
        "POST",
        "/todos",
        &json!({"title": "Report", "dueDate": DUE, "assigneeIdList": [jane_id]}).to_string(),
    );
    assert_eq!(created.status, 201, "{}", created.body);
    let todo = body(&created);
    assert_eq!(todo["category"], "work");
    assert_eq!(todo["dueDate"], DUE);
    assert_eq!(todo["finished"], false);
    assert!(todo["finishedDate"].is_null());
    assert_eq!(todo["assigneeList"][0]["email"], "jane@org.edu");
    let todo_id = todo["id"].as_str().unwrap().to_string();

    let deleted = api.handle("DELETE", &format!("/assignees/{jane_id}"), "");
    assert_eq!(deleted.status, 200);
    assert_eq!(body(&deleted)["prename"], "Jane");

    let reread = body(&api.handle("GET", &format!("/todos/{todo_id}"), ""));
    assert_eq!(reread["assigneeList"], json!([]));

    let again = api.handle("DELETE", &format!("/assignees/{jane_id}"), "");
    assert_eq!(again.status, 404);
}

#[test]
fn validation_failures_are_bad_requests() {
    let api = api();

    let response = api.handle(
        "POST",
        "/assignees",
        &json!({"name": "Doe", "prename": "Jane", "email": "jane@gmail.com"}).to_string(),
    );
    assert_eq!(response.status, 400);
    assert!(body(&response)["error"].as_str().unwrap().contains("org.edu"));

    let response = api.handle("POST", "/todos", &json!({"title": "Report"}).to_string());
    assert_eq!(response.status, 400);
    assert_eq!(body(&response)["error"], "dueDate is required");

    let response = api.handle(
        "POST",
        "/todos",
        &json!({
            "title": "Report",
            "dueDate": DUE,
            "assigneeIdList": ["7f1c3f52-0a61-4f7e-9d5c-5d3f7d0b8c11"]
        })
        .to_string(),
    );
    assert_eq!(response.status, 400);
    assert_eq!(body(&response)["error"], "one or more referenced ids are invalid");

    let listed = body(&api.handle("GET", "/todos", ""));
    assert_eq!(listed, json!([]));
}

#[test]
fn malformed_requests_and_unknown_routes() {
    let api = api();

    assert_eq!(api.handle("POST", "/todos", "{not json").status, 400);
    assert_eq!(api.handle("POST", "/todos", "").status, 400);
    assert_eq!(api.handle("GET", "/todos/not-a-uuid", "").status, 400);
    assert_eq!(api.handle("GET", "/projects", "").status, 404);

    let response = api.handle("PATCH", "/todos", "");
    assert_eq!(response.status, 405);
    assert_eq!(response.header("Allow"), Some("GET, POST"));

    let missing = api.handle(
        "GET",
        "/todos/00000000-0000-4000-8000-000000000000",
        "",
    );
    assert_eq!(missing.status, 404);
}

#[test]
fn update_stamps_finished_date_once_and_keeps_created_date() {
    let api = api();
    let created = body(&api.handle(
        "POST",
        "/api/v1/todos",
        &json!({"title": "Report", "dueDate": DUE}).to_string(),
    ));
    let path = format!("/todos/{}", created["id"].as_str().unwrap());

    let finished = api.handle(
        "PUT",
        &path,
        &json!({"title": "Report", "dueDate": DUE, "finished": true}).to_string(),
    );
    assert_eq!(finished.status, 200, "{}", finished.body);
    let finished = body(&finished);
    assert!(finished["finishedDate"].is_i64());
    assert_eq!(finished["createdDate"], created["createdDate"]);

    let reopened = body(&api.handle(
        "PUT",
        &path,
        &json!({"title": "Report", "dueDate": DUE, "finished": false}).to_string(),
    ));
    assert_eq!(reopened["finished"], false);
    assert_eq!(reopened["finishedDate"], finished["finishedDate"]);
}

#[test]
fn todos_by_assignee_route() {
    let api = api();
    let jane_id = create_jane(&api);
    api.handle(
        "POST",
        "/todos",
        &json!({"title": "Report", "dueDate": DUE, "assigneeIdList": [jane_id]}).to_string(),
    );
    api.handle(
        "POST",
        "/todos",
        &json!({"title": "Other", "dueDate": DUE}).to_string(),
    );

    let listed = body(&api.handle("GET", &format!("/assignees/{jane_id}/todos"), ""));
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Report");

    let unknown = api.handle(
        "GET",
        "/assignees/00000000-0000-4000-8000-000000000000/todos",
        "",
    );
    assert_eq!(unknown.status, 404);
}

#[test]
fn delete_todo_then_get_is_not_found() {
    let api = api();
    let created = body(&api.handle(
        "POST",
        "/todos",
        &json!({"title": "Report", "dueDate": DUE}).to_string(),
    ));
    let path = format!("/todos/{}", created["id"].as_str().unwrap());

    let deleted = api.handle("DELETE", &path, "");
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.content_type, "application/json");
    assert_eq!(body(&deleted), json!({}));
    assert_eq!(api.handle("GET", &path, "").status, 404);
    assert_eq!(api.handle("DELETE", &path, "").status, 404);
}

#[test]
fn csv_download_is_an_attachment() {
    let api = api();
    let jane_id = create_jane(&api);
    api.handle(
        "POST",
        "/todos",
        &json!({"title": "Report", "dueDate": DUE, "assigneeIdList": [jane_id]}).to_string(),
    );

    let response = api.handle("GET", "/csv-downloads/todos", "");
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/csv");
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=\"todos.csv\"")
    );

    let mut reader = csv::Reader::from_reader(response.body.as_bytes());
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "Report");
    assert_eq!(&rows[0][4], "Jane Doe");
    assert_eq!(&rows[0][8], "work");
}

#[test]
fn unrepresentable_due_date_is_rejected_and_export_keeps_working() {
    let api = api();
    let response = api.handle(
        "POST",
        "/todos",
        &json!({"title": "Report", "dueDate": i64::MAX}).to_string(),
    );
    assert_eq!(response.status, 400);
    assert_eq!(body(&response)["error"], "dueDate is not a representable date");

    let export = api.handle("GET", "/csv-downloads/todos", "");
    assert_eq!(export.status, 200, "{}", export.body);
    assert_eq!(export.body.lines().count(), 1);
}

struct Crashing;

impl CategoryClassifier for Crashing {
    fn classify(&self, _title: &str) -> Result<String, ClassifierError> {
        panic!("model crashed")
    }
}

#[test]
fn panicking_classifier_still_creates_todo() {
    let api = TaskboardApi::in_memory(Box::new(Crashing)).unwrap();
    let created = api.handle(
        "POST",
        "/todos",
        &json!({"title": "Report", "dueDate": DUE}).to_string(),
    );
    assert_eq!(created.status, 201, "{}", created.body);
    assert_eq!(body(&created)["category"], "work");

    let listed = body(&api.handle("GET", "/todos", ""));
    assert_eq!(listed.as_array().unwrap().len(), 1);
}
