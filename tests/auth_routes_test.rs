mod common;

use actix_web::{http::header, test};
use serde_json::{json, Value};
use serial_test::serial;

use common::{bearer, TestApp, PASSWORD};
use globetrotter_api::db::UserStore;

#[actix_rt::test]
#[serial]
async fn test_signup_returns_token_pair() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "name": "Ada Lovelace",
            "email": "  Ada@Example.com ",
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["accessToken"].as_str().is_some());
    assert!(body["data"]["refreshToken"].as_str().is_some());
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert_eq!(body["data"]["user"]["role"], "user");
    assert!(body["data"]["user"].get("password").is_none());
}

#[actix_rt::test]
#[serial]
async fn test_signup_duplicate_email_conflicts() {
    let test_app = TestApp::new();
    test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "name": "Someone Else",
            "email": "ADA@example.com",
            "password": PASSWORD
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "conflict");
}

#[actix_rt::test]
#[serial]
async fn test_signup_validation_lists_fields() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "name": "", "email": "not-an-email", "password": "short" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"password"));
}

#[actix_rt::test]
#[serial]
async fn test_malformed_json_is_bad_request() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "bad_request");
}

#[actix_rt::test]
#[serial]
async fn test_login_rejects_wrong_password_generically() {
    let test_app = TestApp::new();
    test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    for (email, password) in [
        ("ada@example.com", "wrong-password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid email or password");
    }
}

#[actix_rt::test]
#[serial]
async fn test_login_deactivated_account_issues_nothing() {
    let test_app = TestApp::new();
    test_app.register("Ada", "ada@example.com").await;
    let mut user = test_app
        .state
        .store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    user.is_active = false;
    test_app.state.store.save_user(&user).await.unwrap();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Account has been deactivated");
    assert!(body.get("data").is_none());
}

#[actix_rt::test]
#[serial]
async fn test_refresh_token_is_single_use() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": ada.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let rotated = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(rotated, ada.refresh_token);

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": ada.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": rotated }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
#[serial]
async fn test_access_token_is_not_a_refresh_token() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": ada.access_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_logout_revokes_refresh_token() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header(ada.bearer())
            .set_json(json!({ "refreshToken": ada.refresh_token }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": ada.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_me_returns_current_user() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(ada.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["id"], ada.id.as_str());

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_forgot_password_unknown_email_creates_nothing() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(json!({ "email": "ghost@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("If an account exists"));

    let user = test_app
        .state
        .store
        .find_user_by_email(&ada.email)
        .await
        .unwrap()
        .unwrap();
    assert!(user.password_reset_token.is_none());
}

#[actix_rt::test]
#[serial]
async fn test_reset_password_with_issued_token() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let raw = test_app
        .state
        .auth()
        .forgot_password(&ada.email, "http://localhost:5173")
        .await
        .unwrap()
        .unwrap();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(json!({ "token": "bogus", "password": "another-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(json!({ "token": raw, "password": "another-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refreshToken": ada.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": ada.email, "password": "another-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}
