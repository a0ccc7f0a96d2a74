//! Integration tests for the attendance backend.

use reqwest::{Client, Response};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, LogFormat};
use crate::db::init_database;
use crate::{create_router, AppState};

const EMAIL: &str = "coordinator@school.org";
const PASSWORD: &str = "secret1";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            cors_origin: None,
        };

        let state = AppState::new(pool, config);
        state.start_session_sync();

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    /// Fixture with an account registered and its roster loaded.
    async fn logged_in() -> Self {
        let fixture = Self::new().await;
        let resp = fixture.register(EMAIL, PASSWORD).await;
        assert_eq!(resp.status(), 200);
        fixture.wait_for_roster().await;
        fixture
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn register(&self, email: &str, password: &str) -> Response {
        self.post(
            "/api/auth/register",
            json!({
                "email": email,
                "password": password,
                "confirmPassword": password
            }),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> Response {
        self.post(
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn logout(&self) -> Response {
        self.client
            .post(self.url("/api/auth/logout"))
            .send()
            .await
            .unwrap()
    }

    /// Roster loading follows login asynchronously.
    async fn wait_for_roster(&self) {
        for _ in 0..100 {
            let body: Value = self.get("/api/auth/session").await.json().await.unwrap();
            if body["data"]["rosterLoaded"] == true {
                return;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }
        panic!("roster never loaded");
    }

    async fn add_student(&self, name: &str, class: &str, year: i32) -> Value {
        let resp = self
            .post(
                "/api/students",
                json!({ "name": name, "class": class, "joinedYear": year }),
            )
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn add_hours(&self, id: &str, hours: Value) -> Response {
        self.post(&format!("/api/students/{}/hours", id), json!({ "hours": hours }))
            .await
    }

    async fn names(&self) -> Vec<String> {
        let body: Value = self.get("/api/students").await.json().await.unwrap();
        names_of(&body)
    }
}

fn names_of(body: &Value) -> Vec<String> {
    body["data"]["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture.get("/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_student_routes_require_session() {
    let fixture = TestFixture::new().await;

    for path in ["/api/students", "/api/export"] {
        let resp = fixture.get(path).await;
        assert_eq!(resp.status(), 401);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(body["error"]["message"], "Please log in to continue");
    }

    let body: Value = fixture.get("/api/auth/session").await.json().await.unwrap();
    assert_eq!(body["data"]["session"]["status"], "anonymous");
    assert_eq!(body["data"]["rosterLoaded"], false);
}

// ==================== AUTH TESTS ====================

#[tokio::test]
async fn test_register_signs_in() {
    let fixture = TestFixture::new().await;

    let resp = fixture.register(EMAIL, PASSWORD).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], EMAIL);
    assert_eq!(body["message"], "Account created successfully!");

    fixture.wait_for_roster().await;
    let body: Value = fixture.get("/api/auth/session").await.json().await.unwrap();
    assert_eq!(body["data"]["session"]["status"], "authenticated");
    assert_eq!(body["data"]["session"]["identity"]["email"], EMAIL);

    let body: Value = fixture.get("/api/notification").await.json().await.unwrap();
    assert_eq!(body["data"]["kind"], "success");
    assert_eq!(body["data"]["message"], "Account created successfully!");
}

#[tokio::test]
async fn test_register_validation() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post(
            "/api/auth/register",
            json!({ "email": EMAIL, "password": PASSWORD, "confirmPassword": "secret2" }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Passwords do not match");

    let resp = fixture.register(EMAIL, "12345").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"]["message"],
        "Password must be at least 6 characters long"
    );

    let resp = fixture.register("", PASSWORD).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Please fill in all fields");
}

#[tokio::test]
async fn test_register_provider_errors() {
    let fixture = TestFixture::new().await;
    fixture.register(EMAIL, PASSWORD).await;

    let resp = fixture.register(EMAIL, PASSWORD).await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "AUTH_FAILED");
    assert_eq!(body["error"]["message"], "This email is already registered.");

    let resp = fixture.register("not-an-email", PASSWORD).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"]["message"],
        "Please enter a valid email address."
    );
}

#[tokio::test]
async fn test_login_errors() {
    let fixture = TestFixture::new().await;
    fixture.register(EMAIL, PASSWORD).await;
    fixture.logout().await;

    let resp = fixture.login(EMAIL, "wrong-password").await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Incorrect password.");
    assert_eq!(body["error"]["details"]["authCode"], "auth/wrong-password");

    let resp = fixture.login("nobody@school.org", PASSWORD).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "No account found with this email.");

    let resp = fixture.login(EMAIL, "").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Please fill in all fields");

    // Still anonymous after all of the above
    let resp = fixture.get("/api/students").await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_logout_and_login_reload_roster() {
    let fixture = TestFixture::logged_in().await;
    fixture.add_student("Alice", "10th", 2024).await;

    let resp = fixture.logout().await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "anonymous");
    assert_eq!(body["message"], "Logged out successfully!");

    let resp = fixture.get("/api/students").await;
    assert_eq!(resp.status(), 401);

    let resp = fixture.login(EMAIL, PASSWORD).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Login successful!");

    fixture.wait_for_roster().await;
    assert_eq!(fixture.names().await, vec!["Alice"]);
}

#[tokio::test]
async fn test_accounts_do_not_share_students() {
    let fixture = TestFixture::logged_in().await;
    fixture.add_student("Alice", "10th", 2024).await;
    fixture.logout().await;

    fixture.register("other@school.org", PASSWORD).await;
    fixture.wait_for_roster().await;

    let body: Value = fixture.get("/api/students").await.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["emptyMessage"], "No students added yet");
}

// ==================== STUDENT TESTS ====================

#[tokio::test]
async fn test_add_student_and_hours() {
    let fixture = TestFixture::logged_in().await;

    let student = fixture.add_student("Alice", "10th", 2024).await;
    assert_eq!(student["totalHours"], 0.0);
    assert_eq!(student["joinedYear"], 2024);
    let id = student["id"].as_str().unwrap();

    let resp = fixture.add_hours(id, json!(10)).await;
    assert_eq!(resp.status(), 200);

    let resp = fixture.add_hours(id, json!("2.5")).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalHours"], 12.5);
    assert_eq!(body["message"], "Added 2.5 hours successfully");

    let body: Value = fixture.get("/api/students").await.json().await.unwrap();
    assert_eq!(body["data"]["students"][0]["totalHours"], 12.5);
}

#[tokio::test]
async fn test_add_student_validation() {
    let fixture = TestFixture::logged_in().await;

    let resp = fixture
        .post("/api/students", json!({ "name": "  ", "class": "10th", "joinedYear": 2024 }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Please fill in all student details");

    let resp = fixture
        .post("/api/students", json!({ "name": "Alice", "class": "10th" }))
        .await;
    assert_eq!(resp.status(), 400);

    let body: Value = fixture.get("/api/notification").await.json().await.unwrap();
    assert_eq!(body["data"]["kind"], "error");
    assert_eq!(body["data"]["message"], "Please fill in all student details");

    assert!(fixture.names().await.is_empty());
}

#[tokio::test]
async fn test_joined_year_as_text() {
    let fixture = TestFixture::logged_in().await;

    let resp = fixture
        .post(
            "/api/students",
            json!({ "name": "Alice", "class": "10th", "joinedYear": "2024" }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["joinedYear"], 2024);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let fixture = TestFixture::logged_in().await;

    let resp = fixture
        .post(
            "/api/students",
            json!({ "name": "Alice", "class": "10th", "joinedYear": [2024] }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let banner: Value = fixture.get("/api/notification").await.json().await.unwrap();
    assert_eq!(banner["data"]["kind"], "error");
    assert_eq!(banner["data"]["message"], body["error"]["message"]);

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_invalid_hours_are_rejected() {
    let fixture = TestFixture::logged_in().await;
    let student = fixture.add_student("Alice", "10th", 2024).await;
    let id = student["id"].as_str().unwrap();

    for hours in [json!(0), json!(-1), json!("abc"), json!("")] {
        let resp = fixture.add_hours(id, hours).await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["message"], "Please enter hours greater than 0");
    }

    let body: Value = fixture.get("/api/students").await.json().await.unwrap();
    assert_eq!(body["data"]["students"][0]["totalHours"], 0.0);
}

#[tokio::test]
async fn test_hours_for_unknown_student() {
    let fixture = TestFixture::logged_in().await;

    let resp = fixture.add_hours("missing", json!(1)).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ==================== VIEW TESTS ====================

#[tokio::test]
async fn test_sort_and_search() {
    let fixture = TestFixture::logged_in().await;
    fixture.add_student("Amy", "9th", 2025).await;
    let bob = fixture.add_student("Bob", "10th", 2024).await;
    fixture.add_student("Hannah", "11th", 2023).await;
    fixture
        .add_hours(bob["id"].as_str().unwrap(), json!(3))
        .await;

    // Default: total hours descending, ties in roster (newest first) order
    assert_eq!(fixture.names().await, vec!["Bob", "Hannah", "Amy"]);

    let body: Value = fixture
        .post("/api/view/sort", json!({ "key": "name" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names_of(&body), vec!["Amy", "Bob", "Hannah"]);
    assert_eq!(body["data"]["sort"]["direction"], "ascending");

    let body: Value = fixture
        .post("/api/view/sort", json!({ "key": "name" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names_of(&body), vec!["Hannah", "Bob", "Amy"]);

    let body: Value = fixture
        .client
        .put(fixture.url("/api/view/search"))
        .json(&json!({ "term": "AN" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names_of(&body), vec!["Hannah"]);
    assert_eq!(body["data"]["shown"], 1);
    assert_eq!(body["data"]["total"], 3);

    let body: Value = fixture
        .client
        .put(fixture.url("/api/view/search"))
        .json(&json!({ "term": "zed" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["data"]["emptyMessage"],
        "No students match your search for \"zed\""
    );

    let body: Value = fixture
        .client
        .delete(fixture.url("/api/view/search"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["shown"], 3);
}

// ==================== EXPORT TESTS ====================

#[tokio::test]
async fn test_empty_export() {
    let fixture = TestFixture::logged_in().await;

    let resp = fixture.get("/api/export").await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "EMPTY_EXPORT");
    assert_eq!(body["error"]["message"], "No data to download");

    let body: Value = fixture.get("/api/notification").await.json().await.unwrap();
    assert_eq!(body["data"]["message"], "No data to download");
}

#[tokio::test]
async fn test_csv_export_follows_search_in_roster_order() {
    let fixture = TestFixture::logged_in().await;
    fixture.add_student("Anna", "9th", 2025).await;
    let hannah = fixture.add_student("Hannah", "11th", 2023).await;
    fixture.add_student("Bob", "10th", 2024).await;
    fixture
        .add_hours(hannah["id"].as_str().unwrap(), json!(4.5))
        .await;

    fixture
        .client
        .put(fixture.url("/api/view/search"))
        .json(&json!({ "term": "ann" }))
        .send()
        .await
        .unwrap();
    // Sorting does not affect the export
    fixture
        .post("/api/view/sort", json!({ "key": "name" }))
        .await;

    let resp = fixture.get("/api/export?format=csv").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"student_attendance_"));
    assert!(disposition.ends_with(".csv\""));

    let text = resp.text().await.unwrap();
    assert_eq!(
        text,
        "S.No,Student Name,Class,Joined Year,Total Hours\n\
         1,Hannah,11th,2023,4.5\n\
         2,Anna,9th,2025,0\n"
    );

    let body: Value = fixture.get("/api/notification").await.json().await.unwrap();
    assert_eq!(body["data"]["message"], "CSV file downloaded successfully");
}

#[tokio::test]
async fn test_xlsx_export() {
    let fixture = TestFixture::logged_in().await;
    fixture.add_student("Alice", "10th", 2024).await;

    let resp = fixture.get("/api/export").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let bytes = resp.bytes().await.unwrap();
    assert!(bytes.starts_with(b"PK"));

    let body: Value = fixture.get("/api/notification").await.json().await.unwrap();
    assert_eq!(body["data"]["message"], "Excel file downloaded successfully");
}
