use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::inspect::Envelope;
use crate::tabs::{Tab, TabError, TabId, BLANK_URL};

#[derive(Debug, Serialize)]
pub struct TabList {
    pub tabs: Vec<Tab>,
    pub active: Option<TabId>,
}

#[derive(Debug, Serialize)]
pub struct TabPayload {
    pub tab: Tab,
}

#[derive(Debug, Default, Deserialize)]
struct OpenTabRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TabUpdate {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    favicon: Option<String>,
}

fn payload(result: Result<Tab, TabError>) -> Json<Envelope<TabPayload>> {
    if let Err(ref e) = result {
        tracing::warn!(error = %e, "Tab operation failed");
    }
    Json(Envelope::from(result.map(|tab| TabPayload { tab })))
}

pub async fn list_tabs(State(state): State<AppState>) -> Json<Envelope<TabList>> {
    let tabs = state.tabs.read().await;
    Json(Envelope::Ok(TabList {
        tabs: tabs.tabs().to_vec(),
        active: tabs.active_id(),
    }))
}

pub async fn open_tab(State(state): State<AppState>, body: Bytes) -> Json<Envelope<TabPayload>> {
    let request: OpenTabRequest = serde_json::from_slice(&body).unwrap_or_default();
    let url = request
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| BLANK_URL.to_string());

    let mut tabs = state.tabs.write().await;
    let id = tabs.open(url);
    tracing::debug!(%id, "Opened tab");
    payload(tabs.get(id).cloned().ok_or(TabError::NotFound(id)))
}

pub async fn activate_tab(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Envelope<TabPayload>> {
    let mut tabs = state.tabs.write().await;
    payload(id.parse::<TabId>().and_then(|id| tabs.activate(id).cloned()))
}

pub async fn update_tab(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Json<Envelope<TabPayload>> {
    let update: TabUpdate = serde_json::from_slice(&body).unwrap_or_default();
    let mut tabs = state.tabs.write().await;

    payload(id.parse::<TabId>().and_then(|id| {
        if let Some(url) = update.url {
            tabs.navigate(id, url)?;
        }
        if let Some(title) = update.title {
            tabs.set_title(id, title)?;
        }
        if let Some(favicon) = update.favicon {
            tabs.set_favicon(id, favicon)?;
        }
        tabs.get(id).cloned().ok_or(TabError::NotFound(id))
    }))
}

pub async fn close_tab(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Envelope<TabPayload>> {
    let mut tabs = state.tabs.write().await;
    payload(id.parse::<TabId>().and_then(|id| tabs.close(id)))
}
