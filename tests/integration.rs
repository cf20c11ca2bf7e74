use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking_dispatch::api::rest::router;
use booking_dispatch::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    router(Arc::new(AppState::new(1024)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_driver(app: &axum::Router, name: &str, package: &str, online: bool) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({
                "name": name,
                "phone": "555-0199",
                "vehicle": "hatchback",
                "package": package,
                "online": online
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn create_booking(app: &axum::Router, category: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({
                "customer_name": "Priya",
                "category": category,
                "pickup": "Central Station",
                "dropoff": "Tech Park",
                "scheduled_at": "2026-11-01T09:30:00Z",
                "fare_estimate": 640.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn slot_for(app: &axum::Router, driver_id: &str) -> String {
    let res = app
        .clone()
        .oneshot(get_request(&format!("/drivers/{driver_id}/offers")))
        .await
        .unwrap();
    let offers = body_json(res).await;
    offers[0]["slot"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["bookings"], 0);
    assert_eq!(body["slots"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("pending_slots"));
}

#[tokio::test]
async fn create_booking_starts_unreviewed_and_unsent() {
    let app = setup();
    let id = create_booking(&app, "local").await;

    let res = app
        .oneshot(get_request(&format!("/bookings/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["booking"]["category"], "Local");
    assert_eq!(body["booking"]["review_status"], "Unreviewed");
    assert_eq!(body["booking"]["dispatch_state"], "NotSent");
    assert!(body["booking"]["allocated_driver_id"].is_null());
    assert_eq!(body["slots"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_booking_with_unknown_category_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({
                "customer_name": "Priya",
                "category": "SPACESHIP",
                "pickup": "A",
                "dropoff": "B",
                "scheduled_at": "2026-11-01T09:30:00Z",
                "fare_estimate": 10.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid_category");
}

#[tokio::test]
async fn create_booking_with_negative_fare_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({
                "customer_name": "Priya",
                "category": "LOCAL",
                "pickup": "A",
                "dropoff": "B",
                "scheduled_at": "2026-11-01T09:30:00Z",
                "fare_estimate": -1.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_driver_empty_name_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({ "name": "  ", "phone": "555" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_booking_returns_404() {
    let app = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/bookings/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "not_found");
}

#[tokio::test]
async fn eligibility_lists_online_drivers_with_covering_package() {
    let app = setup();
    let local = create_driver(&app, "Asha", "LOCAL", true).await;
    let all = create_driver(&app, "Bala", "PREMIUM_ALL", true).await;
    create_driver(&app, "Chitra", "OUTSTATION", true).await;
    create_driver(&app, "Dev", "LOCAL", false).await;

    let res = app
        .clone()
        .oneshot(get_request("/eligibility?category=LOCAL"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ids: Vec<String> = body_json(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&local));
    assert!(ids.contains(&all));

    let res = app
        .oneshot(get_request("/eligibility?category=TRAIN"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dispatch_with_no_eligible_drivers_returns_422_and_keeps_booking_unsent() {
    let app = setup();
    create_driver(&app, "Asha", "LOCAL", true).await;
    let booking = create_booking(&app, "OUTSTATION").await;

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/dispatch"),
            json!({ "package_type": "OUTSTATION" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["code"], "no_eligible_drivers");

    let res = app
        .oneshot(get_request(&format!("/bookings/{booking}")))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["booking"]["dispatch_state"], "NotSent");
    assert_eq!(body["slots"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn dispatch_without_review_returns_409() {
    let app = setup();
    create_driver(&app, "Asha", "LOCAL", true).await;
    let booking = create_booking(&app, "LOCAL").await;

    let res = app
        .oneshot(post_empty(&format!("/bookings/{booking}/dispatch")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "not_reviewed");
}

#[tokio::test]
async fn driver_goes_offline_and_misses_the_broadcast() {
    let app = setup();
    let asha = create_driver(&app, "Asha", "LOCAL", true).await;
    let bala = create_driver(&app, "Bala", "LOCAL", true).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{bala}/availability"),
            json!({ "online": false }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["online"], false);

    let booking = create_booking(&app, "LOCAL").await;
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/dispatch"),
            json!({ "package_type": "LOCAL" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt = body_json(res).await;
    assert_eq!(receipt["drivers_notified"], 1);
    assert_eq!(receipt["recipients"][0]["id"], asha);

    let res = app
        .oneshot(get_request(&format!("/drivers/{bala}/offers")))
        .await
        .unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn full_allocation_flow() {
    let app = setup();
    let asha = create_driver(&app, "Asha", "LOCAL", true).await;
    let bala = create_driver(&app, "Bala", "LOCAL", true).await;
    let chitra = create_driver(&app, "Chitra", "PREMIUM_ALL", true).await;
    let booking = create_booking(&app, "LOCAL").await;

    let res = app
        .clone()
        .oneshot(get_request("/queues/review"))
        .await
        .unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/review"),
            json!({ "package_type": "LOCAL" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["review_status"], "Reviewed");

    let res = app
        .clone()
        .oneshot(get_request(&format!("/bookings/{booking}/eligible-drivers")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["eligible_count"], 3);

    let res = app
        .clone()
        .oneshot(post_empty(&format!("/bookings/{booking}/dispatch")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["drivers_notified"], 3);

    let res = app
        .clone()
        .oneshot(post_empty(&format!("/bookings/{booking}/dispatch")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "already_dispatched");

    let asha_slot = slot_for(&app, &asha).await;
    let bala_slot = slot_for(&app, &bala).await;
    let chitra_slot = slot_for(&app, &chitra).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/drivers/{asha}/offers/{asha_slot}"),
            json!({ "action": "Accept" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Accepted");

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/slots/{bala_slot}/response"),
            json!({ "action": "reject" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Rejected");

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/slots/{bala_slot}/response"),
            json!({ "action": "Accept" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "slot_already_resolved");

    let res = app
        .clone()
        .oneshot(get_request("/queues/allocation"))
        .await
        .unwrap();
    let queue = body_json(res).await;
    assert_eq!(queue[0]["accepted"], 1);
    assert_eq!(queue[0]["pending"], 1);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/bookings/{booking}/responses")))
        .await
        .unwrap();
    let accepted = body_json(res).await;
    assert_eq!(accepted.as_array().unwrap().len(), 1);
    assert_eq!(accepted[0]["driver"]["name"], "Asha");
    assert_eq!(accepted[0]["driver"]["vehicle"], "hatchback");

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/allocate"),
            json!({ "driver_id": bala }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["code"], "driver_not_accepted");

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/allocate"),
            json!({ "driver_id": asha }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let allocated = body_json(res).await;
    assert_eq!(allocated["dispatch_state"], "Allocated");
    assert_eq!(allocated["allocated_driver_id"], asha);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/slots/{chitra_slot}/response"),
            json!({ "action": "Accept" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "booking_already_allocated");

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/allocate"),
            json!({ "driver_id": chitra }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["code"], "already_allocated");

    let res = app
        .clone()
        .oneshot(get_request(&format!("/bookings/{booking}")))
        .await
        .unwrap();
    let detail = body_json(res).await;
    for slot in detail["slots"].as_array().unwrap() {
        let expected = if slot["respondent"]["id"] == asha.as_str() {
            "Allocated"
        } else if slot["respondent"]["id"] == bala.as_str() {
            "Rejected"
        } else {
            "Closed"
        };
        assert_eq!(slot["status"], expected);
    }

    let res = app.oneshot(get_request("/queues/pending")).await.unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn driver_cannot_answer_another_drivers_offer() {
    let app = setup();
    let asha = create_driver(&app, "Asha", "LOCAL", true).await;
    let bala = create_driver(&app, "Bala", "LOCAL", true).await;
    let booking = create_booking(&app, "LOCAL").await;

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking}/dispatch"),
            json!({ "package_type": "LOCAL" }),
        ))
        .await
        .unwrap();

    let asha_slot = slot_for(&app, &asha).await;
    let res = app
        .oneshot(json_request(
            "POST",
            &format!("/drivers/{bala}/offers/{asha_slot}"),
            json!({ "action": "Accept" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
