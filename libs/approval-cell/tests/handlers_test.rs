use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{extract::State, http::StatusCode, Form};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use approval_cell::handlers::twilio_reply;
use approval_cell::models::{InboundMessage, ReplyOutcome};
use approval_cell::services::review::ReplyReviewService;
use shared_store::{AppState, PendingRecord};
use shared_utils::test_utils::TestConfig;

const APPROVER: &str = TestConfig::DOCTOR_NUMBER;

fn test_state(calendar: &MockServer, twilio: &MockServer, tmp: &TempDir) -> Arc<AppState> {
    TestConfig {
        calendar_base_url: calendar.uri(),
        twilio_base_url: twilio.uri(),
        pending_file_path: tmp.path().join("pending.json").display().to_string(),
    }
    .to_app_state()
}

async fn seed_pending(state: &AppState) {
    state
        .pending
        .insert("T-ABC123", PendingRecord::pending("evt_1", "Ana"))
        .await
        .unwrap();
}

fn reply(from: &str, body: &str) -> Form<InboundMessage> {
    Form(InboundMessage {
        from: from.to_string(),
        body: body.to_string(),
    })
}

#[tokio::test]
async fn a_confirm_reply_patches_the_event_and_clears_the_store() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("GET"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt_1",
            "summary": "(PENDIENTE-T-ABC123) Turno para Ana"
        })))
        .expect(1)
        .mount(&calendar)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt_1" })))
        .expect(1)
        .mount(&calendar)
        .await;

    // No message goes out on a successful confirmation.
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&twilio)
        .await;

    let status = twilio_reply(State(state.clone()), reply(APPROVER, "CONFIRMAR T-ABC123")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(state.pending.read().await.is_empty());

    let patch = calendar
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PATCH")
        .unwrap();
    let body: Value = serde_json::from_slice(&patch.body).unwrap();
    let summary = body["summary"].as_str().unwrap();
    assert_eq!(summary, "Turno Confirmado ✅ Turno para Ana");
    assert!(!summary.contains("(PENDIENTE-T-ABC123)"));
}

#[tokio::test]
async fn confirm_replies_are_trimmed_and_case_normalized() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("GET"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt_1",
            "summary": "(PENDIENTE-T-ABC123) Turno para Ana"
        })))
        .mount(&calendar)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt_1" })))
        .mount(&calendar)
        .await;

    let service = ReplyReviewService::new(&state.config, &state.pending);
    let outcome = service.process_reply(APPROVER, "  confirmar t-abc123  ").await;

    assert_matches!(outcome, ReplyOutcome::Confirmed);
    assert!(state.pending.read().await.is_empty());
}

#[tokio::test]
async fn a_confirm_reply_rebuilds_an_altered_title_from_the_record() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    // The calendar UI rewrote the title and dropped the marker.
    Mock::given(method("GET"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt_1",
            "summary": "Cita de Ana (editada)"
        })))
        .mount(&calendar)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "evt_1" })))
        .mount(&calendar)
        .await;

    let service = ReplyReviewService::new(&state.config, &state.pending);
    let outcome = service.process_reply(APPROVER, "CONFIRMAR T-ABC123").await;
    assert_matches!(outcome, ReplyOutcome::Confirmed);

    let patch = calendar
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PATCH")
        .unwrap();
    let body: Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(body["summary"], "Turno Confirmado ✅ Turno para Ana");
}

#[tokio::test]
async fn a_reject_reply_deletes_the_event_and_notifies_the_approver() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("DELETE"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&calendar)
        .await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM1" })))
        .expect(1)
        .mount(&twilio)
        .await;

    let status = twilio_reply(State(state.clone()), reply(APPROVER, "RECHAZAR T-ABC123")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(state.pending.read().await.is_empty());

    let message = twilio.received_requests().await.unwrap().remove(0);
    let form = String::from_utf8_lossy(&message.body).to_string();
    assert!(form.contains("T-ABC123"));
    assert!(form.contains("rechazado"));
}

#[tokio::test]
async fn replies_from_strangers_change_nothing() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&calendar)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&twilio)
        .await;

    let status = twilio_reply(
        State(state.clone()),
        reply("whatsapp:+5491199998888", "CONFIRMAR T-ABC123"),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(state.pending.read().await.len(), 1);
}

#[tokio::test]
async fn an_unknown_code_notifies_the_approver_and_keeps_the_store() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM1" })))
        .expect(1)
        .mount(&twilio)
        .await;

    let service = ReplyReviewService::new(&state.config, &state.pending);
    let outcome = service.process_reply(APPROVER, "CONFIRMAR T-NOPE00").await;

    assert_matches!(outcome, ReplyOutcome::UnknownCode);
    assert_eq!(state.pending.read().await.len(), 1);

    let message = twilio.received_requests().await.unwrap().remove(0);
    let form = String::from_utf8_lossy(&message.body).to_string();
    assert!(form.contains("T-NOPE00"));
    assert!(form.contains("pendiente"));
}

#[tokio::test]
async fn malformed_replies_are_dropped_silently() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&twilio)
        .await;

    let service = ReplyReviewService::new(&state.config, &state.pending);

    assert_matches!(
        service.process_reply(APPROVER, "CONFIRMAR").await,
        ReplyOutcome::Malformed
    );
    assert_matches!(
        service.process_reply(APPROVER, "CONFIRMAR T-ABC123 YA").await,
        ReplyOutcome::Malformed
    );
    // A keyword the interpreter does not know must not touch the store.
    assert_matches!(
        service.process_reply(APPROVER, "APROBAR T-ABC123").await,
        ReplyOutcome::Malformed
    );

    assert_eq!(state.pending.read().await.len(), 1);
}

#[tokio::test]
async fn a_failed_calendar_call_keeps_the_code_pending() {
    let calendar = MockServer::start().await;
    let twilio = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let state = test_state(&calendar, &twilio, &tmp);
    seed_pending(&state).await;

    Mock::given(method("GET"))
        .and(path("/calendars/clinic-calendar/events/evt_1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&calendar)
        .await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM1" })))
        .expect(1)
        .mount(&twilio)
        .await;

    let service = ReplyReviewService::new(&state.config, &state.pending);
    let outcome = service.process_reply(APPROVER, "CONFIRMAR T-ABC123").await;

    assert_matches!(outcome, ReplyOutcome::Failed);
    assert_eq!(state.pending.read().await.len(), 1);

    let message = twilio.received_requests().await.unwrap().remove(0);
    let form = String::from_utf8_lossy(&message.body).to_string();
    assert!(form.contains("T-ABC123"));
    assert!(form.contains("error"));
}
