mod common;

use actix_web::test;
use serde_json::Value;
use serial_test::serial;

use common::{bearer, TestApp};

const TRIP_ID: &str = "507f1f77bcf86cd799439011";

#[actix_rt::test]
#[serial]
async fn test_protected_routes_without_auth() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let gets = [
        "/api/auth/me".to_string(),
        "/api/trips".to_string(),
        format!("/api/trips/{}", TRIP_ID),
        "/api/profile".to_string(),
        "/api/profile/destinations".to_string(),
    ];
    for uri in gets {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401, "{}", uri);
    }

    let posts = [
        "/api/trips".to_string(),
        "/api/trips/save-activity".to_string(),
        format!("/api/trips/{}/cities", TRIP_ID),
        "/api/auth/logout".to_string(),
    ];
    for uri in posts {
        let req = test::TestRequest::post().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401, "{}", uri);
    }
}

#[actix_rt::test]
#[serial]
async fn test_unauthorized_body_shape() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/api/trips").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unauthorized");
    assert!(body["message"].as_str().is_some());
}

#[actix_rt::test]
#[serial]
async fn test_rejects_wrong_scheme_and_token_type() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/trips")
        .insert_header(("Authorization", format!("Token {}", ada.access_token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/trips")
        .insert_header(bearer(&ada.refresh_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}
