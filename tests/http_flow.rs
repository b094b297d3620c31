//! End-to-end tests for the login -> signup -> upload flow driven through the router.

use std::path::{Path, PathBuf};
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use axum_traffic_predict::{
    build_router,
    config::{AuthConfig, Config, ModelsConfig, PredictionConfig, ServerConfig, UiConfig, UploadConfig},
    inference::ModelSet,
    models::PredictionTable,
    AppState,
};

const BOUNDARY: &str = "traffic-predict-boundary";

const BUNDLE_ONE: &str = "sessions,page_views,avg_duration\n3,12,45.5\n1,2,10\n";
const BUNDLE_TWO: &str = "purchases,cart_adds,returns\n1,4,0\n0,1,1\n";
const TRAFFIC: &str = "hour,visitors\n9,200\n3,40\n";

fn manifest_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn test_config(users_file: PathBuf) -> Config {
    Config {
        server: ServerConfig { host: "127.0.0.1".into(), port: 0 },
        auth: AuthConfig { users_file, bcrypt_cost: 4 },
        models: ModelsConfig {
            bundle_one: manifest_path("models/M1_model.json"),
            bundle_two: manifest_path("models/M9_model.json"),
            traffic: manifest_path("models/TrafficPrediction.json"),
        },
        upload: UploadConfig { max_file_size: 1024 * 1024 },
        prediction: PredictionConfig { timeout_secs: 10 },
        ui: UiConfig {
            templates_dir: manifest_path("templates"),
            static_dir: manifest_path("static"),
        },
    }
}

fn setup_app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().join("Users.json"));
    let models = ModelSet::load(&config.models).expect("demo models should load");
    (dir, build_router(AppState::new(config, models)))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_files(uri: &str, files: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let mut body = String::new();
    for (name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

fn session_cookie(response: &Response<Body>) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie should be set")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_string()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Signs `user` up and logs them in, returning the session cookie.
async fn logged_in_session(app: &Router, user: &str, password: &str) -> String {
    let response = send(app, post_form("/signup/start", "", None)).await;
    let cookie = session_cookie(&response);

    let form = format!("username={user}&password={password}");
    let response = send(app, post_form("/signup", &form, Some(&cookie))).await;
    assert!(location(&response).starts_with("/?success="));

    let response = send(app, post_form("/login", &form, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?success="));
    cookie
}

#[tokio::test]
async fn fresh_session_sees_login() {
    let (_dir, app) = setup_app();
    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<h1>Login</h1>"));
    assert!(body.contains("Create New Account"));
}

#[tokio::test]
async fn signup_then_back_returns_to_login() {
    let (_dir, app) = setup_app();

    let response = send(&app, post_form("/signup/start", "", None)).await;
    assert_eq!(location(&response), "/");
    let cookie = session_cookie(&response);

    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("<h1>Create New Account</h1>"));

    send(&app, post_form("/signup/back", "", Some(&cookie))).await;
    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("<h1>Login</h1>"));
}

#[tokio::test]
async fn duplicate_signup_shows_inline_error() {
    let (_dir, app) = setup_app();
    let response = send(&app, post_form("/signup/start", "", None)).await;
    let cookie = session_cookie(&response);

    let response = send(&app, post_form("/signup", "username=alice&password=pw1", Some(&cookie))).await;
    assert_eq!(location(&response), "/?success=Account%20created%20successfully!");

    send(&app, post_form("/signup/start", "", Some(&cookie))).await;
    let response = send(&app, post_form("/signup", "username=alice&password=pw2", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/?error=Username%20already%20exists"));

    let body = body_text(send(&app, get(&target, Some(&cookie))).await).await;
    assert!(body.contains("<h1>Create New Account</h1>"));
    assert!(body.contains("Username already exists. Try another one."));
}

#[tokio::test]
async fn wrong_password_stays_on_login() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;
    send(&app, get("/logout", Some(&cookie))).await;

    let response = send(&app, post_form("/login", "username=bob&password=y", Some(&cookie))).await;
    assert_eq!(location(&response), "/?error=Incorrect%20username%20or%20password.");

    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("<h1>Login</h1>"));
}

#[tokio::test]
async fn login_opens_upload_view() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("Upload Files for Prediction"));
    assert!(body.contains("Please upload 3 files"));
}

#[tokio::test]
async fn prediction_requires_login() {
    let (_dir, app) = setup_app();
    let request = post_files("/predict", &[("b1.csv", BUNDLE_ONE), ("b2.csv", BUNDLE_TWO), ("t.csv", TRAFFIC)], None);
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn three_files_render_prediction_table() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let request = post_files(
        "/predict",
        &[("b1.csv", BUNDLE_ONE), ("b2.csv", BUNDLE_TWO), ("t.csv", TRAFFIC)],
        Some(&cookie),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Final Combined Prediction"));
    assert!(body.contains("Download Predictions as CSV"));
    assert_eq!(body.matches("<tr><td>").count(), 2);
}

#[tokio::test]
async fn wrong_file_count_renders_warning() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let request = post_files("/predict", &[("b1.csv", BUNDLE_ONE), ("b2.csv", BUNDLE_TWO)], Some(&cookie));
    let body = body_text(send(&app, request).await).await;
    assert!(body.contains("Please upload exactly 3 files"));
    assert!(!body.contains("Final Combined Prediction"));
}

#[tokio::test]
async fn bad_upload_renders_single_error() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let request = post_files(
        "/predict",
        &[("b1.csv", BUNDLE_ONE), ("b2.csv", "purchases,cart_adds\n1,2\n"), ("t.csv", TRAFFIC)],
        Some(&cookie),
    );
    let body = body_text(send(&app, request).await).await;
    assert!(body.contains("Error during prediction"));
    assert!(body.contains("returns"));
    assert!(!body.contains("Final Combined Prediction"));
}

#[tokio::test]
async fn csv_download_reparses_to_averaged_rows() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let request = post_files(
        "/predict/csv",
        &[("b1.csv", BUNDLE_ONE), ("b2.csv", BUNDLE_TWO), ("t.csv", TRAFFIC)],
        Some(&cookie),
    );
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("predictions.csv"));

    let table = PredictionTable::from_csv(body_text(response).await.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    for row in &table.rows {
        let mean = (row.bundle_one + row.bundle_two + row.traffic) / 3.0;
        assert!((row.combined - mean).abs() < 1e-9);
    }
    // Forest: hour 9 / 200 visitors -> (0.8 + 0.7) / 2, hour 3 / 40 visitors -> (0.2 + 0.25) / 2
    assert!((table.rows[0].traffic - 0.75).abs() < 1e-9);
    assert!((table.rows[1].traffic - 0.225).abs() < 1e-9);
}

#[tokio::test]
async fn csv_endpoint_rejects_wrong_count() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let request = post_files("/predict/csv", &[("b1.csv", BUNDLE_ONE)], Some(&cookie));
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn logout_closes_upload_view() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let response = send(&app, get("/logout", Some(&cookie))).await;
    assert_eq!(location(&response), "/");

    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("<h1>Login</h1>"));

    let request = post_files(
        "/predict",
        &[("b1.csv", BUNDLE_ONE), ("b2.csv", BUNDLE_TWO), ("t.csv", TRAFFIC)],
        Some(&cookie),
    );
    assert_eq!(send(&app, request).await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn health_reports_ok() {
    let (_dir, app) = setup_app();
    let body = body_text(send(&app, get("/health", None)).await).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn login_from_signup_view_does_not_claim_success() {
    let (_dir, app) = setup_app();
    let response = send(&app, post_form("/signup/start", "", None)).await;
    let cookie = session_cookie(&response);
    send(&app, post_form("/signup", "username=bob&password=x", Some(&cookie))).await;

    // Session goes back to the signup view, then a stale login form is posted
    send(&app, post_form("/signup/start", "", Some(&cookie))).await;
    let response = send(&app, post_form("/login", "username=bob&password=x", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("<h1>Create New Account</h1>"));
    assert!(!body.contains("Upload Files for Prediction"));
}

#[tokio::test]
async fn overlong_password_signup_is_refused_inline() {
    let (_dir, app) = setup_app();
    let response = send(&app, post_form("/signup/start", "", None)).await;
    let cookie = session_cookie(&response);

    let form = format!("username=alice&password={}", "a".repeat(73));
    let response = send(&app, post_form("/signup", &form, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with("/?error=Password%20must%20be%20at%20most%2072%20bytes"));

    let body = body_text(send(&app, get(&target, Some(&cookie))).await).await;
    assert!(body.contains("<h1>Create New Account</h1>"));
}

#[tokio::test]
async fn truncated_multipart_renders_in_view_error() {
    let (_dir, app) = setup_app();
    let cookie = logged_in_session(&app, "bob", "x").await;

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"b1.csv\"\r\nContent-Type: text/csv\r\n\r\n{BUNDLE_ONE}"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(header::COOKIE, &cookie)
        .body(Body::from(body))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Upload Files for Prediction"));
    assert!(body.contains("Error reading upload"));
    assert!(!body.contains("Final Combined Prediction"));
}
