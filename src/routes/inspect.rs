use axum::{body::Bytes, extract::State, Json};

use super::AppState;
use crate::inspect::{CertificatePayload, Envelope, InspectRequest, PageMetadata};

pub async fn get_certificate(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<Envelope<CertificatePayload>> {
    let request = InspectRequest::from_body(&body);
    tracing::debug!(url = %request.url, "get-certificate");

    let envelope = state.inspector.certificate(request.url).await;
    log_outcome("get-certificate", &envelope);
    Json(envelope)
}

pub async fn fetch_metadata(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<Envelope<PageMetadata>> {
    let request = InspectRequest::from_body(&body);
    tracing::debug!(url = %request.url, "fetch-metadata");

    let envelope = state.inspector.metadata(request.url).await;
    log_outcome("fetch-metadata", &envelope);
    Json(envelope)
}

fn log_outcome<T>(operation: &str, envelope: &Envelope<T>) {
    match envelope.error_message() {
        None => tracing::debug!(operation, "Request succeeded"),
        Some(message) => tracing::warn!(operation, error = message, "Request failed"),
    }
}
