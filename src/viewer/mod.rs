//! Log browser over the record store.
//!
//! # Routes
//! - `GET /?page=N`: HTML page, newest first
//! - `GET /api/records?page=N`: the same page as JSON
//!
//! Pagination walks the date-sharded tree in descending key order; there is
//! no index.

mod render;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::http::response::text_response;
use crate::recorder::{RecordPage, RecordStore};

pub use render::render_page;

#[derive(Debug, Clone)]
struct ViewerState {
    store: Arc<RecordStore>,
    page_size: usize,
}

/// `?page=N`. Anything that is not a positive integer means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page_number(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse::<usize>().ok())
            .filter(|&page| page > 0)
            .unwrap_or(1)
    }
}

/// Build the viewer router.
pub fn router(store: RecordStore, page_size: usize) -> Router {
    let state = ViewerState {
        store: Arc::new(store),
        page_size,
    };
    Router::new()
        .route("/", get(index))
        .route("/api/records", get(records))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn load(state: &ViewerState, query: &PageQuery) -> Result<RecordPage, Response> {
    state.store.page(query.page_number(), state.page_size).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list records");
        text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn index(State(state): State<ViewerState>, Query(query): Query<PageQuery>) -> Response {
    match load(&state, &query).await {
        Ok(page) => Html(render_page(&page)).into_response(),
        Err(response) => response,
    }
}

async fn records(State(state): State<ViewerState>, Query(query): Query<PageQuery>) -> Response {
    match load(&state, &query).await {
        Ok(page) => Json(page).into_response(),
        Err(response) => response,
    }
}
