// tests/integration/api_tests.rs
use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use crate::common::{init_app, stranger, test_state, wave, API_KEY, TEMPLATE_LEN};

const ALICE_FREQ: f32 = 0.29;

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header(("x-api-key", API_KEY))
        .set_json(body)
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri).insert_header(("x-api-key", API_KEY))
}

#[actix_web::test]
async fn test_enroll_then_clock_in_and_out() {
    let state = test_state();
    let app = init_app!(state);

    let req = post(
        "/api/v1/identities/enroll",
        json!({ "name": "Alice", "template": wave(ALICE_FREQ, 0.0, TEMPLATE_LEN) }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let enrolled: Value = test::read_body_json(resp).await;
    assert_eq!(enrolled["name"], "Alice");

    let scan = json!({ "template": wave(ALICE_FREQ, 0.02, TEMPLATE_LEN), "sourceDevice": "front-door" });

    let resp = test::call_service(&app, post("/api/v1/attendance/check_in_out", scan.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first: Value = test::read_body_json(resp).await;
    assert_eq!(first["eventType"], "IN");
    assert_eq!(first["identityId"], enrolled["id"]);
    assert!(first["timestamp"].is_string());
    assert!(first.get("template").is_none());

    let resp = test::call_service(&app, post("/api/v1/attendance/check_in_out", scan).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let second: Value = test::read_body_json(resp).await;
    assert_eq!(second["eventType"], "OUT");

    let short = json!({ "template": wave(ALICE_FREQ, 0.0, 10) });
    let resp = test::call_service(&app, post("/api/v1/attendance/check_in_out", short).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "malformed_input");

    let unknown = json!({ "template": stranger(TEMPLATE_LEN) });
    let resp = test::call_service(&app, post("/api/v1/attendance/check_in_out", unknown).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "no_match");
    assert_eq!(body["message"], "Identity not recognized");

    let snapshot = state.metrics.snapshot();
    assert_eq!(snapshot.scans_matched, 2);
    assert_eq!(snapshot.scans_malformed, 1);
    assert_eq!(snapshot.scans_unmatched, 1);
    assert_eq!(snapshot.events_recorded, 2);
}

#[actix_web::test]
async fn test_gate_rejects_missing_and_wrong_keys() {
    let state = test_state();
    let app = init_app!(state);
    let body = json!({ "template": wave(ALICE_FREQ, 0.0, TEMPLATE_LEN) });

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance/check_in_out")
        .set_json(body.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/attendance/check_in_out")
        .insert_header(("x-api-key", "not-the-key"))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"], "unauthorized");

    let req = test::TestRequest::get().uri("/api/v1/attendance/report").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(state.metrics.snapshot().auth_rejected, 3);
    // rejected before resolution ran
    assert_eq!(state.metrics.snapshot().scans_total, 0);
}

#[actix_web::test]
async fn test_health_is_exempt_from_gate() {
    let state = test_state();
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["identityStore"], "up");
    assert_eq!(body["ledger"], "up");
    assert_eq!(body["enrolledIdentities"], 0);
}

#[actix_web::test]
async fn test_enroll_validation_and_duplicates() {
    let state = test_state();
    let app = init_app!(state);

    let missing_name = json!({ "template": wave(ALICE_FREQ, 0.0, TEMPLATE_LEN) });
    let resp = test::call_service(&app, post("/api/v1/identities/enroll", missing_name).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let empty_template = json!({ "name": "Alice", "template": [] });
    let resp = test::call_service(&app, post("/api/v1/identities/enroll", empty_template).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let alice = json!({ "name": "Alice", "template": wave(ALICE_FREQ, 0.0, TEMPLATE_LEN) });
    let resp = test::call_service(&app, post("/api/v1/identities/enroll", alice.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, post("/api/v1/identities/enroll", alice).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "duplicate_enrollment");
}

#[actix_web::test]
async fn test_report_filters_and_ordering() {
    let state = test_state();
    let app = init_app!(state);

    let mut ids = Vec::new();
    for (name, frequency) in [("Alice", 0.29f32), ("Bob", 0.83f32)] {
        let body = json!({ "name": name, "template": wave(frequency, 0.0, TEMPLATE_LEN) });
        let resp = test::call_service(&app, post("/api/v1/identities/enroll", body).to_request()).await;
        let enrolled: Value = test::read_body_json(resp).await;
        ids.push(enrolled["id"].as_str().unwrap().to_string());
    }

    for frequency in [0.29f32, 0.83, 0.29] {
        let body = json!({ "template": wave(frequency, 0.01, TEMPLATE_LEN) });
        let resp = test::call_service(&app, post("/api/v1/attendance/check_in_out", body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(&app, get("/api/v1/attendance/report").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["totalRecords"], 3);
    let records = report["records"].as_array().unwrap();
    let timestamps: Vec<&str> = records.iter().map(|r| r["timestamp"].as_str().unwrap()).collect();
    assert_eq!(records[0]["identityId"], ids[0].as_str());
    assert_eq!(records[0]["eventType"], "OUT");
    assert!(timestamps.windows(2).all(|pair| {
        let newer = chrono::DateTime::parse_from_rfc3339(pair[0]).unwrap();
        let older = chrono::DateTime::parse_from_rfc3339(pair[1]).unwrap();
        newer >= older
    }));

    let uri = format!("/api/v1/attendance/report?identityId={}", ids[1]);
    let resp = test::call_service(&app, get(&uri).to_request()).await;
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["totalRecords"], 1);
    assert_eq!(report["records"][0]["eventType"], "IN");
    assert_eq!(report["records"][0]["sourceDevice"], "unspecified");

    let uri = "/api/v1/attendance/report?identityId=3f1c2d4e-0000-4000-8000-000000000000";
    let resp = test::call_service(&app, get(uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, get("/api/v1/attendance/report?identityId=bogus").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, get("/api/v1/attendance/report?since=2999-01-01T00:00:00Z").to_request()).await;
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["totalRecords"], 0);
}
