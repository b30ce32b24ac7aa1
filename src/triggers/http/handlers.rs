//! Eventarc HTTP handler

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;

use crate::error::Result;
use crate::metrics::EventMetrics;
use crate::server::AppState;

use super::models::{EventResponse, FirestoreCloudEvent};

/// Receive one Firestore CloudEvent.
///
/// Malformed events are rejected with 400. Anything that parses is
/// acknowledged with 200, including robot failures, so Eventarc does not
/// redeliver.
#[tracing::instrument(name = "http.receive_event", skip(state, headers, body))]
pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventResponse>> {
    let event = FirestoreCloudEvent::from_request(&headers, &body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed event");
        EventMetrics::record_rejected();
    })?;

    tracing::debug!(
        event_id = %event.id,
        event_type = %event.event_type,
        source = ?event.source,
        subject = ?event.subject,
        "Event received"
    );

    if !event.is_document_created() {
        tracing::info!(event_type = %event.event_type, "Ignoring event type");
        return Ok(Json(EventResponse {
            result: state.dispatcher.ignore(event.id, "event_type"),
            timestamp: Utc::now(),
        }));
    }

    let created = event.into_document_created().inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected event without a document path");
        EventMetrics::record_rejected();
    })?;

    let result = state.dispatcher.dispatch(created).await;

    Ok(Json(EventResponse {
        result,
        timestamp: Utc::now(),
    }))
}
