mod common;

use actix_web::test;
use serde_json::{json, Value};
use serial_test::serial;

use common::{eiffel, paris, trip_body, TestApp};

#[actix_rt::test]
#[serial]
async fn test_trip_city_uniqueness() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Summer in Europe"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "planning");
    assert_eq!(body["data"]["duration"], 6);

    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities", trip_id))
        .insert_header(ada.bearer())
        .set_json(paris())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["selectedCities"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities", trip_id))
        .insert_header(ada.bearer())
        .set_json(paris())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(ada.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["selectedCities"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
#[serial]
async fn test_activity_category_is_validated() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Paris"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities", trip_id))
        .insert_header(ada.bearer())
        .set_json(paris())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let activities = format!("/api/trips/{}/cities/paris-france/activities", trip_id);
    let req = test::TestRequest::post()
        .uri(&activities)
        .insert_header(ada.bearer())
        .set_json(eiffel())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let mut extreme = eiffel();
    extreme["id"] = json!("bungee");
    extreme["category"] = json!("Extreme");
    let req = test::TestRequest::post()
        .uri(&activities)
        .insert_header(ada.bearer())
        .set_json(extreme)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "category");

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(ada.bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let city = &body["data"]["selectedCities"][0];
    assert_eq!(city["activities"].as_array().unwrap().len(), 1);
    assert_eq!(city["activities"][0]["duration"], "1–3 hrs");
}

#[actix_rt::test]
#[serial]
async fn test_activity_for_unknown_city_is_not_found() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Paris"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities/rome-italy/activities", trip_id))
        .insert_header(ada.bearer())
        .set_json(eiffel())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_rt::test]
#[serial]
async fn test_removal_idempotence_differs() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Paris"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities", trip_id))
        .insert_header(ada.bearer())
        .set_json(paris())
        .to_request();
    test::call_service(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities/paris-france/activities", trip_id))
        .insert_header(ada.bearer())
        .set_json(eiffel())
        .to_request();
    test::call_service(&app, req).await;

    let activity = format!(
        "/api/trips/{}/cities/paris-france/activities/eiffel",
        trip_id
    );
    let req = test::TestRequest::delete()
        .uri(&activity)
        .insert_header(ada.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
    let req = test::TestRequest::delete()
        .uri(&activity)
        .insert_header(ada.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let city = format!("/api/trips/{}/cities/paris-france", trip_id);
    for _ in 0..2 {
        let req = test::TestRequest::delete()
            .uri(&city)
            .insert_header(ada.bearer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["data"]["selectedCities"].as_array().unwrap().is_empty());
    }
}

#[actix_rt::test]
#[serial]
async fn test_trip_dates_must_be_ordered() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let mut backwards = trip_body("Backwards");
    backwards["startDate"] = json!("2025-06-16");
    backwards["endDate"] = json!("2025-06-10");
    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(backwards)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "endDate");

    let mut same_day = trip_body("Same day");
    same_day["endDate"] = json!("2025-06-10");
    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(same_day)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Valid"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    // Only one side supplied; checked against the stored start date.
    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(ada.bearer())
        .set_json(json!({ "endDate": "2025-06-01" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(ada.bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["endDate"]
        .as_str()
        .unwrap()
        .starts_with("2025-06-16"));
}

#[actix_rt::test]
#[serial]
async fn test_negative_budget_bucket_is_zeroed() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Paris"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}/budget-summary", trip_id))
        .insert_header(ada.bearer())
        .set_json(json!({ "transport": -50, "stay": 300, "meals": "120" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let summary = &body["data"]["budgetSummary"];
    assert_eq!(summary["transport"].as_f64(), Some(0.0));
    assert_eq!(summary["stay"].as_f64(), Some(300.0));
    assert_eq!(summary["total"].as_f64(), Some(420.0));
    assert_eq!(summary["currency"], "USD");
}

#[actix_rt::test]
#[serial]
async fn test_itinerary_is_replaced_wholesale() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Paris"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}/itinerary", trip_id))
        .insert_header(ada.bearer())
        .set_json(json!({
            "itinerary": [
                { "day": 1, "date": "2025-06-10", "items": [{ "title": "Louvre", "time": "09:00" }] },
                "not a day",
                { "day": 2, "items": [] }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let days = body["data"]["itinerary"].as_array().unwrap();
    assert_eq!(days.len(), 2);

    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}/itinerary", trip_id))
        .insert_header(ada.bearer())
        .set_json(json!({ "itinerary": [] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["itinerary"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
#[serial]
async fn test_non_owner_is_forbidden() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let bob = test_app.register("Bob", "bob@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .set_json(trip_body("Private"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let trip_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(bob.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(bob.bearer())
        .set_json(json!({ "name": "Mine now" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri(&format!("/api/trips/{}/cities", trip_id))
        .insert_header(bob.bearer())
        .set_json(paris())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(bob.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // Publishing opens reads, not writes.
    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(ada.bearer())
        .set_json(json!({ "isPublic": true }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(bob.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::put()
        .uri(&format!("/api/trips/{}", trip_id))
        .insert_header(bob.bearer())
        .set_json(json!({ "name": "Mine now" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_rt::test]
#[serial]
async fn test_unknown_trip_is_not_found() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    for uri in ["/api/trips/not-an-id", "/api/trips/507f1f77bcf86cd799439011"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(ada.bearer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}

#[actix_rt::test]
#[serial]
async fn test_list_own_trips_with_filters() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let bob = test_app.register("Bob", "bob@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    for (user, name) in [(&ada, "Paris"), (&ada, "Tokyo"), (&bob, "Lima")] {
        let req = test::TestRequest::post()
            .uri("/api/trips")
            .insert_header(user.bearer())
            .set_json(trip_body(name))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    let req = test::TestRequest::get()
        .uri("/api/trips?page=1&limit=1")
        .insert_header(ada.bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/trips?search=tok")
        .insert_header(ada.bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Tokyo");

    let req = test::TestRequest::get()
        .uri("/api/trips?status=dreaming")
        .insert_header(ada.bearer())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);
}

#[actix_rt::test]
#[serial]
async fn test_public_trip_endpoints() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let mut ids = Vec::new();
    for (name, public) in [("Shared", true), ("Secret", false)] {
        let mut trip = trip_body(name);
        trip["isPublic"] = json!(public);
        let req = test::TestRequest::post()
            .uri("/api/trips")
            .insert_header(ada.bearer())
            .set_json(trip)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::get().uri("/api/trips/public").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Shared");

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/public/{}", ids[0]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/trips/public/{}", ids[1]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_rt::test]
#[serial]
async fn test_save_activity_creates_placeholder_trip() {
    let test_app = TestApp::new();
    let ada = test_app.register("Ada", "ada@example.com").await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips/save-activity")
        .insert_header(ada.bearer())
        .set_json(json!({
            "cityName": "Kyoto",
            "country": "Japan",
            "activity": {
                "id": "fushimi",
                "name": "Fushimi Inari",
                "category": "Culture",
                "cost": "Low",
                "duration": "Half-day"
            }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["name"], "My Trip");
    assert_eq!(body["data"]["selectedCities"][0]["id"], "kyoto-japan");
    assert_eq!(
        body["data"]["selectedCities"][0]["activities"][0]["id"],
        "fushimi"
    );

    let req = test::TestRequest::get()
        .uri("/api/trips")
        .insert_header(ada.bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
}
