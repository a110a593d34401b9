//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    assays::{assays_page, assay_create, assays_delete, assay_detail},
    blast::{blast_page, blast_order, blast_job_detail, blast_job_csv},
    dashboard::{dashboard_page, dashboard_select, dashboard_submit, api_dashboard},
    health::health,
    oligos::{oligos_page, oligo_create, oligos_import, oligos_reassign, oligos_unassign, oligos_delete},
    session::{index, login_page, login_submit, logout},
    taxids::{taxids_page, taxid_create, taxids_delete},
    taxonomy::api_taxonomy_lookup,
};
use crate::sse::dashboard_events;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Session
        .route("/",        get(index))
        .route("/login",   get(login_page).post(login_submit))
        .route("/logout",  post(logout))

        // Pages
        .route("/assays",          get(assays_page).post(assay_create))
        .route("/assays/delete",   post(assays_delete))
        .route("/assays/{id}",     get(assay_detail))
        .route("/oligos",          get(oligos_page).post(oligo_create))
        .route("/oligos/import",   post(oligos_import))
        .route("/oligos/reassign", post(oligos_reassign))
        .route("/oligos/unassign", post(oligos_unassign))
        .route("/oligos/delete",   post(oligos_delete))
        .route("/taxids",          get(taxids_page).post(taxid_create))
        .route("/taxids/delete",   post(taxids_delete))
        .route("/dashboard",        get(dashboard_page))
        .route("/dashboard/select", post(dashboard_select))
        .route("/dashboard/submit", post(dashboard_submit))
        .route("/blast",               get(blast_page))
        .route("/blast/order",         post(blast_order))
        .route("/blast/jobs/{id}",     get(blast_job_detail))
        .route("/blast/jobs/{id}/csv", get(blast_job_csv))

        // SSE streaming
        .route("/api/dashboard/events", get(dashboard_events))

        // API endpoints
        .route("/api/dashboard",         get(api_dashboard))
        .route("/api/taxonomy/{taxid}",  get(api_taxonomy_lookup))
        .route("/health",                get(health))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
