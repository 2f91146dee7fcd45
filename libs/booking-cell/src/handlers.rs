// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{error, info, warn};

use shared_calendar::CLINIC_TZ;
use shared_config::APPOINTMENT_DURATION_MINUTES;
use shared_store::{AppState, PendingRecord};

use crate::models::{BookingError, TimePreference, WebhookRequest, WebhookResponse};
use crate::services::booking::{generate_confirmation_code, AppointmentService};
use crate::services::notify::ApprovalNotifier;
use crate::services::slots::SlotFinderService;

const INTENT_REQUEST_APPOINTMENT: &str = "Solicitar_Turno";
const INTENT_SELECT_DATE: &str = "Solicitar_Turno - select_date";
const INTENT_SELECT_TIME: &str = "Solicitar_Turno - select_time";

/// Entry point for the conversation platform. Every branch answers
/// synchronously with a fulfillment message; nothing here surfaces an HTTP
/// error to the platform.
#[axum::debug_handler]
pub async fn dialogflow_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookRequest>,
) -> Json<WebhookResponse> {
    let intent = payload.query_result.intent.display_name.clone();
    info!("Intent received: {}", intent);

    let response = match intent.as_str() {
        INTENT_REQUEST_APPOINTMENT => handle_request_appointment(),
        INTENT_SELECT_DATE => handle_select_date(&state, &payload).await,
        INTENT_SELECT_TIME => handle_select_time(&state, &payload).await,
        _ => WebhookResponse::text("Disculpa, no entendí qué necesitas."),
    };

    Json(response)
}

fn handle_request_appointment() -> WebhookResponse {
    WebhookResponse::with_suggestions(
        "¡Claro! Para darte el turno correcto, primero decime, \
         ¿la consulta es para Ortodoncia u Ortopedia?",
        vec![
            "Sí, para ortodoncia".to_string(),
            "No, es para otra cosa".to_string(),
        ],
    )
}

/// List the free slots for the requested date, filtered by the morning or
/// afternoon preference, as text plus one suggestion chip per time.
async fn handle_select_date(state: &AppState, payload: &WebhookRequest) -> WebhookResponse {
    let Some(date) = param(payload, "turn_date")
        .and_then(|raw| parse_turn_date(&raw))
    else {
        warn!("Slot search aborted, no usable turn_date in the request");
        return WebhookResponse::text("Faltó información para agendar. ¿Empezamos de nuevo?");
    };

    let preference = TimePreference::parse(&param(payload, "time_preference").unwrap_or_default());

    let finder = SlotFinderService::new(&state.config);
    let slots = finder
        .find_free_slots(date, APPOINTMENT_DURATION_MINUTES, preference)
        .await;

    if slots.is_empty() {
        return WebhookResponse::text(
            "No quedan horarios libres para ese día. ¿Querés probar con otra fecha?",
        );
    }

    let listing = slots.join(", ");
    WebhookResponse::with_suggestions(
        format!(
            "Tenemos estos horarios para el {}: {}. ¿Cuál te queda mejor?",
            date.format("%d/%m/%Y"),
            listing
        ),
        slots,
    )
}

async fn handle_select_time(state: &AppState, payload: &WebhookRequest) -> WebhookResponse {
    match book_selected_time(state, payload).await {
        Ok(response) => response,
        Err(BookingError::MissingContext) => {
            WebhookResponse::text("Me perdí en la conversación, ¿podríamos empezar de nuevo?")
        }
        Err(BookingError::MissingField(field)) => {
            warn!("Scheduling aborted, missing {}", field);
            WebhookResponse::text("Faltó información para agendar. ¿Empezamos de nuevo?")
        }
        Err(BookingError::Calendar(e)) => {
            error!("Could not create the calendar event: {:#}", e);
            WebhookResponse::text(
                "Hubo un problema al crear la cita en el calendario. Intenta de nuevo.",
            )
        }
        Err(e) => {
            error!("Unexpected failure while scheduling: {}", e);
            WebhookResponse::text("Ups, ocurrió un error técnico al procesar la hora.")
        }
    }
}

async fn book_selected_time(
    state: &AppState,
    payload: &WebhookRequest,
) -> Result<WebhookResponse, BookingError> {
    let context = payload
        .query_result
        .output_contexts
        .first()
        .ok_or(BookingError::MissingContext)?;

    let patient_name = person_param(&context.parameters, "patient_name")
        .ok_or(BookingError::MissingField("patient_name"))?;
    let reason = text_param(&context.parameters, "consultation_reason")
        .or_else(|| text_param(&context.parameters, "consultation_reason.original"))
        .ok_or(BookingError::MissingField("consultation_reason"))?;
    let turn_date = text_param(&context.parameters, "turn_date")
        .ok_or(BookingError::MissingField("turn_date"))?;
    let selected_time = payload
        .query_result
        .parameters
        .get("time")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(BookingError::MissingField("time"))?;

    let start = combine_date_and_time(&turn_date, selected_time)?;

    let code = generate_confirmation_code();
    let event_id = AppointmentService::new(&state.config)
        .create_pending_appointment(start, &patient_name, &reason, &code)
        .await?;

    if let Err(e) = state
        .pending
        .insert(&code, PendingRecord::pending(event_id, patient_name.clone()))
        .await
    {
        // The event already exists; losing the record only leaves the code
        // unresolvable for the approver.
        error!("Could not persist pending appointment {}: {:#}", code, e);
    }

    let notifier = ApprovalNotifier::new(&state.config);
    if let Err(e) = notifier
        .send_booking_request(
            &patient_name,
            &start.format("%d/%m/%Y").to_string(),
            &start.format("%H:%M").to_string(),
            &reason,
            &code,
        )
        .await
    {
        warn!("Approval request for {} was not delivered: {:#}", code, e);
    }

    Ok(WebhookResponse::text(
        "¡Excelente! Se envió la solicitud al doctor para su confirmación final.",
    ))
}

// ==============================================================================
// PARAMETER EXTRACTION
// ==============================================================================

/// Look a parameter up in `queryResult.parameters` first, then in the first
/// output context.
fn param(payload: &WebhookRequest, key: &str) -> Option<String> {
    text_param(&payload.query_result.parameters, key).or_else(|| {
        payload
            .query_result
            .output_contexts
            .first()
            .and_then(|context| text_param(&context.parameters, key))
    })
}

fn text_param(parameters: &Value, key: &str) -> Option<String> {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Person entities arrive either as `{ "name": "Ana" }`, as a plain string,
/// or only under the `<field>.original` key.
fn person_param(parameters: &Value, key: &str) -> Option<String> {
    parameters
        .get(key)
        .and_then(|value| match value {
            Value::Object(map) => map.get("name").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| text_param(parameters, &format!("{key}.original")))
}

// ==============================================================================
// DATE AND TIME HANDLING
// ==============================================================================

/// Merge the conversation's date with the chosen time into one clinic-local
/// timestamp: the time's hour and minute overwrite whatever time component
/// the date carried.
fn combine_date_and_time(raw_date: &str, raw_time: &str) -> Result<DateTime<Tz>, BookingError> {
    let date = parse_turn_date(raw_date)
        .ok_or_else(|| BookingError::InvalidDateTime(raw_date.to_string()))?;
    let (hour, minute) = parse_selected_time(raw_time)
        .ok_or_else(|| BookingError::InvalidDateTime(raw_time.to_string()))?;

    CLINIC_TZ
        .with_ymd_and_hms(date.year(), date.month(), date.day(), hour, minute, 0)
        .single()
        .ok_or_else(|| BookingError::InvalidDateTime(format!("{raw_date} {raw_time}")))
}

fn parse_turn_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&CLINIC_TZ).date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// The time parameter arrives as RFC 3339 with offset, as a naive datetime,
/// or as a bare clock time, depending on how the platform resolved it.
fn parse_selected_time(raw: &str) -> Option<(u32, u32)> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        let local = instant.with_timezone(&CLINIC_TZ);
        return Some((local.hour(), local.minute()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some((naive.hour(), naive.minute()));
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .map(|t| (t.hour(), t.minute()))
}
