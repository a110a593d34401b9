//! HTTP handlers for all web routes.

pub mod assays;
pub mod blast;
pub mod dashboard;
pub mod health;
pub mod layout;
pub mod oligos;
pub mod session;
pub mod taxids;
pub mod taxonomy;

use std::str::FromStr;

use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::warn;

use primerwatch_common::error::{ApiError, PrimerwatchError, Result};

use layout::{escape, page, Notice};

/// Checked rows of a bulk-action form (`ids=1&ids=4&...`).
#[derive(Debug, Default, Deserialize)]
pub struct IdsForm {
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// Full-page error; an expired session goes back to sign-in.
pub fn error_page(title: &str, err: PrimerwatchError) -> Response {
    if matches!(err, PrimerwatchError::NotAuthenticated) {
        return Redirect::to("/login").into_response();
    }
    let api = ApiError::from(err);
    let body = format!(r#"
<div class="page-header"><h1 class="page-title">{}</h1></div>
{}
<p><a href="javascript:history.back()" class="btn btn-outline">Back</a></p>"#,
        escape(title),
        Notice::Error(api.to_string()).render()
    );
    (api.status(), Html(page(title, &body))).into_response()
}

/// Required list read: auth failures redirect, others become an inline error.
pub fn listed<T>(result: Result<Vec<T>>, notices: &mut Vec<Notice>) -> std::result::Result<Vec<T>, Response> {
    match result {
        Ok(rows) => Ok(rows),
        Err(PrimerwatchError::NotAuthenticated) => Err(Redirect::to("/login").into_response()),
        Err(e) => {
            notices.push(Notice::Error(e.user_message()));
            Ok(Vec::new())
        }
    }
}

/// Optional read used for display only; failure leaves it empty.
pub fn optional<T>(result: Result<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(what, error = %e, "optional read failed");
        Vec::new()
    })
}

/// Empty `<select>` values arrive as "".
pub fn parse_optional_id(raw: Option<&str>) -> std::result::Result<Option<i64>, PrimerwatchError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| PrimerwatchError::validation(format!("\"{}\" is not a valid id", s))),
    }
}

/// Numeric form fields arrive as text so a blank value can be reported inline.
pub fn parse_number<T: FromStr>(label: &str, raw: &str) -> std::result::Result<T, PrimerwatchError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| PrimerwatchError::validation(format!("{} must be a number", label)))
}
