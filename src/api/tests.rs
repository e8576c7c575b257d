//! Router-level tests: requests go through the full middleware stack.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{build_router, AppState};
use crate::config::Config;
use crate::db::repositories::test_support::setup_pool;

const PASSWORD: &str = "maiz-y-cacao";

async fn app() -> Router {
    let pool = setup_pool().await;
    build_router(AppState::build(pool, Config::default()))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json_post(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` of the first Set-Cookie header for `name`
fn cookie(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Register and log in; returns the session cookie.
async fn sign_up(app: &Router, username: &str) -> String {
    let body = format!(
        "username={u}&email={u}%40example.com&password1={p}&password2={p}",
        u = username,
        p = PASSWORD
    );
    let response = send(app, form("/register", None, &body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let body = format!("username={}&password={}", username, PASSWORD);
    let response = send(app, form("/login", None, &body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    cookie(&response, "session").expect("login should set the session cookie")
}

async fn create_business(app: &Router, session: &str, name: &str) -> i64 {
    let body = format!(
        "name={}&description=Comida+t%C3%ADpica&category_id=1&address=Le%C3%B3n&hours=8-17",
        name
    );
    let response = send(app, form("/businesses/new", Some(session), &body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    location(&response)
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("redirect should point at the new business")
}

#[tokio::test]
async fn test_member_pages_redirect_to_login() {
    let app = app().await;

    let response = send(&app, get("/profile", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fprofile");

    let response = send(&app, form("/stories/new", None, "title=a&content=b")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));
}

#[tokio::test]
async fn test_public_pages_see_the_session_user() {
    let app = app().await;
    let session = sign_up(&app, "ana").await;

    let response = send(&app, get("/", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["profile"]["username"], "ana");

    let response = send(&app, get("/", Some("session=caducada"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["profile"].is_null());
}

#[tokio::test]
async fn test_register_then_login_creates_profile() {
    let app = app().await;
    let session = sign_up(&app, "maria").await;

    let response = send(&app, get("/profile", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["username"], "maria");
    assert_eq!(profile["rank"], "Visitante");

    let response = send(&app, get("/users/maria", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, get("/users/nadie", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_username_is_a_field_error() {
    let app = app().await;
    sign_up(&app, "maria").await;

    let body = format!(
        "username=maria&email=otra%40example.com&password1={p}&password2={p}",
        p = PASSWORD
    );
    let response = send(&app, form("/register", None, &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert!(error["error"]["details"]["fields"]["username"].is_array());
}

#[tokio::test]
async fn test_bad_login_reports_non_field_error() {
    let app = app().await;
    sign_up(&app, "maria").await;

    let response = send(&app, form("/login", None, "username=maria&password=wrong-one")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert!(error["error"]["details"]["fields"]["__all__"].is_array());
}

#[tokio::test]
async fn test_login_follows_local_next_only() {
    let app = app().await;
    sign_up(&app, "maria").await;

    let body = format!("username=maria&password={}&next=%2Finbox", PASSWORD);
    let response = send(&app, form("/login", None, &body)).await;
    assert_eq!(location(&response), "/inbox");

    let body = format!(
        "username=maria&password={}&next=https%3A%2F%2Fevil.example",
        PASSWORD
    );
    let response = send(&app, form("/login", None, &body)).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let app = app().await;
    let session = sign_up(&app, "maria").await;

    let response = send(&app, form("/logout", Some(&session), "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(cookie(&response, "session").as_deref(), Some("session="));

    let response = send(&app, get("/profile", Some(&session))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_console_guards() {
    let app = app().await;
    let admin = sign_up(&app, "admin").await;
    let member = sign_up(&app, "pedro").await;

    let response = send(&app, get("/admin/suggestions", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/admin/suggestions", Some(&member))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, get("/admin/suggestions", Some(&admin))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/admin/articles", Some(&admin))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_flow_updates_average() {
    let app = app().await;
    let owner = sign_up(&app, "dueno").await;
    let visitor = sign_up(&app, "ana").await;
    let id = create_business(&app, &owner, "Fritanga").await;
    let detail_uri = format!("/businesses/{}", id);

    let response = send(
        &app,
        form(&format!("{}/review", detail_uri), Some(&visitor), "text=Muy+rico&score=4"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail_uri);
    assert!(cookie(&response, "flash").unwrap().starts_with("flash=success"));

    let response = send(
        &app,
        form(&format!("{}/ratings", detail_uri), Some(&owner), "score=5"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = send(&app, get(&detail_uri, Some(&visitor))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["average_rating"], 4.5);
    assert_eq!(detail["viewer_rating"], 4);
    assert_eq!(detail["can_edit"], false);
    assert_eq!(detail["comments"][0]["score"], 4);
}

#[tokio::test]
async fn test_incomplete_review_flashes_an_error() {
    let app = app().await;
    let session = sign_up(&app, "ana").await;
    let id = create_business(&app, &session, "Fritanga").await;

    let response = send(
        &app,
        form(&format!("/businesses/{}/review", id), Some(&session), "text=Solo+texto"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let flash = cookie(&response, "flash").unwrap();
    assert!(flash.starts_with("flash=error"));

    let response = send(&app, get("/messages", Some(&flash))).await;
    let body = body_json(response).await;
    assert_eq!(body["messages"][0]["level"], "error");
    assert_eq!(body["messages"][0]["message"], "Debes completar ambos campos.");
}

#[tokio::test]
async fn test_blank_comment_is_ignored() {
    let app = app().await;
    let session = sign_up(&app, "ana").await;
    let id = create_business(&app, &session, "Fritanga").await;

    let response = send(
        &app,
        form(&format!("/businesses/{}/comments", id), Some(&session), "text=+++"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(cookie(&response, "flash").is_none());

    let detail = body_json(send(&app, get(&format!("/businesses/{}", id), None)).await).await;
    assert_eq!(detail["comments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_only_owner_or_admin_can_edit() {
    let app = app().await;
    let admin = sign_up(&app, "admin").await;
    let owner = sign_up(&app, "dueno").await;
    let stranger = sign_up(&app, "pedro").await;
    let id = create_business(&app, &owner, "Fritanga").await;
    let edit = format!("/businesses/{}/edit", id);

    let response = send(&app, form(&edit, Some(&stranger), "name=Mia")).await;
    assert!(cookie(&response, "flash").unwrap().starts_with("flash=error"));

    let response = send(&app, form(&edit, Some(&admin), "hours=9-18")).await;
    assert!(cookie(&response, "flash").unwrap().starts_with("flash=success"));

    let detail = body_json(send(&app, get(&format!("/businesses/{}", id), None)).await).await;
    assert_eq!(detail["business"]["name"], "Fritanga");
    assert_eq!(detail["business"]["hours"], "9-18");
}

#[tokio::test]
async fn test_missing_business_is_404() {
    let app = app().await;
    let response = send(&app, get("/businesses/999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_story_is_hidden_until_approved() {
    let app = app().await;
    let admin = sign_up(&app, "admin").await;
    let member = sign_up(&app, "pedro").await;

    let response = send(
        &app,
        form("/stories/new", Some(&member), "title=La+Cegua&content=Una+leyenda"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let home = body_json(send(&app, get("/", None)).await).await;
    assert_eq!(home["stories"]["total"], 0);

    let pending = body_json(send(&app, get("/admin/stories?status=pending", Some(&admin))).await).await;
    assert_eq!(pending["total"], 1);
    let id = pending["items"][0]["id"].as_i64().unwrap();

    let response = send(
        &app,
        json_post("/admin/stories/approve", &admin, json!({ "ids": [id] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["affected"], 1);
    assert_eq!(report["message"], "Se aprobó 1 relato.");

    let home = body_json(send(&app, get("/", None)).await).await;
    assert_eq!(home["stories"]["total"], 1);
}

#[tokio::test]
async fn test_claim_approval_transfers_ownership() {
    let app = app().await;
    let admin = sign_up(&app, "admin").await;
    let claimant = sign_up(&app, "dueno").await;
    let id = create_business(&app, &admin, "Fritanga").await;

    let response = send(
        &app,
        form(
            &format!("/claims?business_id={}", id),
            Some(&claimant),
            "message=Es+mi+negocio",
        ),
    )
    .await;
    assert_eq!(location(&response), "/");

    let claims = body_json(send(&app, get("/admin/claims", Some(&admin))).await).await;
    let claim_id = claims["items"][0]["id"].as_i64().unwrap();
    let response = send(
        &app,
        json_post("/admin/claims/approve", &admin, json!({ "ids": [claim_id] })),
    )
    .await;
    assert_eq!(body_json(response).await["affected"], 1);

    let response = send(
        &app,
        form(&format!("/businesses/{}/edit", id), Some(&claimant), "hours=7-15"),
    )
    .await;
    assert!(cookie(&response, "flash").unwrap().starts_with("flash=success"));
}

#[tokio::test]
async fn test_message_to_unowned_business_is_refused() {
    let app = app().await;
    let admin = sign_up(&app, "admin").await;
    let member = sign_up(&app, "pedro").await;

    let body = "business_name=Fritanga&address=Le%C3%B3n&comments=Buena+comida";
    let response = send(&app, form("/directory/suggest", Some(&member), body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let suggestions = body_json(send(&app, get("/admin/suggestions", Some(&admin))).await).await;
    let suggestion_id = suggestions["items"][0]["id"].as_i64().unwrap();
    let response = send(
        &app,
        json_post(
            "/admin/suggestions/promote",
            &admin,
            json!({ "ids": [suggestion_id] }),
        ),
    )
    .await;
    let report = body_json(response).await;
    assert_eq!(report["report"]["created"], 1);

    let listing = body_json(send(&app, get("/businesses", None)).await).await;
    let id = listing["businesses"][0]["id"].as_i64().unwrap();

    let response = send(
        &app,
        form(&format!("/businesses/{}/messages", id), Some(&member), "body=Hola"),
    )
    .await;
    assert!(cookie(&response, "flash").unwrap().starts_with("flash=error"));
}

#[tokio::test]
async fn test_map_embeds_location() {
    let app = app().await;
    let body = body_json(send(&app, get("/map?location=Le%C3%B3n%20Viejo", None)).await).await;
    assert_eq!(
        body["map_url"],
        "https://maps.google.com/maps?q=Le%C3%B3n%20Viejo&output=embed"
    );
}
