use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use user_registry::{
    db::{self, DbPool},
    models::{NewUser, User},
    repositories::{DieselUserRepository, RepositoryError, UserRepository, UserStore},
    services::UserService,
};

/// SQLite-backed repository whose inserts fail with a storage fault after
/// the row has been written.
struct FailingInserts(DieselUserRepository);

struct FailingInsertStore<'a>(&'a mut dyn UserStore);

impl UserStore for FailingInsertStore<'_> {
    fn find(&mut self, id: i32) -> Result<Option<User>, RepositoryError> {
        self.0.find(id)
    }

    fn find_by_email(
        &mut self,
        email: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_email(email, excluding)
    }

    fn find_by_phone(
        &mut self,
        phone: &str,
        excluding: Option<i32>,
    ) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_phone(phone, excluding)
    }

    fn insert(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        self.0.insert(user)?;
        Err(RepositoryError::Query {
            message: "database disk image is malformed".to_owned(),
        })
    }

    fn update(&mut self, id: i32, user: &NewUser) -> Result<User, RepositoryError> {
        self.0.update(id, user)
    }

    fn delete(&mut self, id: i32) -> Result<(), RepositoryError> {
        self.0.delete(id)
    }
}

impl UserRepository for FailingInserts {
    fn list(&self) -> Result<Vec<User>, RepositoryError> {
        self.0.list()
    }

    fn get(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        self.0.get(id)
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UserStore) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        self.0.transaction(|store| f(&mut FailingInsertStore(store)))
    }
}

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_repository(DieselUserRepository::new)
    }

    fn with_repository<R, M>(make: M) -> Self
    where
        R: UserRepository,
        M: FnOnce(DbPool) -> R,
    {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("users.db");
        let pool = db::build_pool(database.to_str().unwrap(), 2).unwrap();
        db::run_migrations(&pool).unwrap();

        let static_dir = dir.path().join("static");
        std::fs::create_dir(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>User Management</h1>").unwrap();

        let users = Arc::new(UserService::new(make(pool)));
        Self {
            router: user_registry::app(users, &static_dir),
            _dir: dir,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|err| panic!("response is not JSON: {err}"));
        (status, value)
    }

    async fn create(&self, body: Value) -> Value {
        let (status, user) = self.json(Method::POST, "/api/users", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {user}");
        user
    }
}

fn john() -> Value {
    json!({
        "first_name": "John",
        "last_name": "Doe",
        "email": "john@example.com",
        "phone": "1234567890"
    })
}

#[tokio::test]
async fn list_is_empty_initially() {
    let app = TestApp::new();

    let (status, body) = app.json(Method::GET, "/api/users", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_returns_the_new_user() {
    let app = TestApp::new();

    let user = app.create(john()).await;

    assert!(user["id"].is_i64());
    assert_eq!(user["first_name"], "John");
    assert_eq!(user["last_name"], "Doe");
    assert_eq!(user["email"], "john@example.com");
    assert_eq!(user["phone"], "1234567890");
    assert_eq!(user.as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn created_user_can_be_fetched_and_listed() {
    let app = TestApp::new();
    let created = app
        .create(json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "email": "jane@example.com",
            "phone": "0987654321"
        }))
        .await;

    let (status, fetched) = app
        .json(Method::GET, &format!("/api/users/{}", created["id"]), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, list) = app.json(Method::GET, "/api/users", None).await;
    assert_eq!(list, json!([created]));
}

#[tokio::test]
async fn invalid_fields_are_reported_per_field() {
    let app = TestApp::new();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/users",
            Some(json!({ "last_name": "Doe", "email": "nope", "phone": "123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "errors": {
                "first_name": "First Name is required",
                "email": "Invalid email format",
                "phone": "Phone must be 10 digits"
            }
        })
    );
}

#[tokio::test]
async fn duplicate_email_and_phone_are_conflicts() {
    let app = TestApp::new();
    app.create(john()).await;

    let mut same_email = john();
    same_email["phone"] = json!("5555555555");
    let (status, body) = app.json(Method::POST, "/api/users", Some(same_email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email already exists" }));

    let mut same_phone = john();
    same_phone["email"] = json!("johnny@example.com");
    let (status, body) = app.json(Method::POST, "/api/users", Some(same_phone)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Phone number already exists" }));
}

#[tokio::test]
async fn update_changes_fields() {
    let app = TestApp::new();
    let user = app
        .create(json!({
            "first_name": "Alice",
            "last_name": "Johnson",
            "email": "alice@example.com",
            "phone": "5555555555"
        }))
        .await;

    let (status, updated) = app
        .json(
            Method::PUT,
            &format!("/api/users/{}", user["id"]),
            Some(json!({
                "first_name": "Alice",
                "last_name": "Williams",
                "email": "alice@example.com",
                "phone": "5555555555"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], user["id"]);
    assert_eq!(updated["last_name"], "Williams");
}

#[tokio::test]
async fn update_to_a_peers_email_conflicts() {
    let app = TestApp::new();
    let user = app.create(john()).await;
    app.create(json!({
        "first_name": "Bob",
        "last_name": "Brown",
        "email": "bob@example.com",
        "phone": "1112223333"
    }))
    .await;

    let mut changes = john();
    changes["email"] = json!("bob@example.com");
    let uri = format!("/api/users/{}", user["id"]);
    let (status, body) = app.json(Method::PUT, &uri, Some(changes)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email already exists" }));
    let (_, unchanged) = app.json(Method::GET, &uri, None).await;
    assert_eq!(unchanged, user);
}

#[tokio::test]
async fn update_validates_fields() {
    let app = TestApp::new();
    let user = app.create(john()).await;

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/api/users/{}", user["id"]),
            Some(json!({ "first_name": "John", "last_name": "", "email": "john@example.com", "phone": "1234567890" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": { "last_name": "Last Name is required" } }));
}

#[tokio::test]
async fn update_unknown_user_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.json(Method::PUT, "/api/users/99", Some(john())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn delete_removes_the_user() {
    let app = TestApp::new();
    let user = app.create(john()).await;
    let uri = format!("/api/users/{}", user["id"]);

    let (status, body) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = app.json(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_and_ids_are_json_404s() {
    let app = TestApp::new();

    for uri in ["/api/nothing", "/api/users/abc", "/api/users/1"] {
        let (status, body) = app.json(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "error": "Not found" }), "{uri}");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn index_page_is_served_at_root() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>User Management</h1>");
}

#[tokio::test]
async fn storage_fault_is_a_500_with_the_message() {
    let app = TestApp::with_repository(|pool| FailingInserts(DieselUserRepository::new(pool)));

    let (status, body) = app.json(Method::POST, "/api/users", Some(john())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "database disk image is malformed" }));

    let (_, list) = app.json(Method::GET, "/api/users", None).await;
    assert_eq!(list, json!([]));
}
