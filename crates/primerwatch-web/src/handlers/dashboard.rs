//! Surveillance dashboard: one row per assay, job submission and live status.

use std::collections::BTreeSet;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::info;

use primerwatch_client::dashboard::{refresh, submit_jobs, DashboardView, MAX_LOOKBACK_DAYS};
use primerwatch_client::DashboardSelection;
use primerwatch_common::entities::{DashboardEntry, JobKind};
use primerwatch_common::error::{ApiError, PrimerwatchError, Result};
use primerwatch_common::Session;

use crate::auth::{ApiSession, PageSession};
use crate::handlers::layout::{empty_row, escape, failures_html, notices_html, page, Notice};
use crate::handlers::{error_page, parse_number};
use crate::state::SharedState;

// ── Form input ────────────────────────────────────────────────────────────────

/// Posted by both the submit and the select-all buttons of the dashboard form.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub ids: Vec<i64>,
    /// 1 = new sequence search, 2 = divergence check
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub lookback_days: String,
}

impl SubmitForm {
    fn kind(&self) -> Result<JobKind> {
        let tag = parse_number::<i16>("Job type", &self.job_type)?;
        JobKind::from_tag(tag).ok_or_else(|| PrimerwatchError::validation(format!("Unknown job type {}", tag)))
    }

    fn lookback(&self) -> Result<i32> {
        parse_number("Lookback window", &self.lookback_days)
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn dashboard_page(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
) -> Response {
    render(&state, &session, &BTreeSet::new(), Vec::new(), String::new(), None).await
}

/// Select-all button: select every row without a queued job, or clear when all are checked.
pub async fn dashboard_select(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<SubmitForm>,
) -> Response {
    let entries = match state.backend.read_dashboard(&session).await {
        Ok(entries) => entries,
        Err(e) => return error_page("Surveillance", e),
    };
    let mut selection = DashboardSelection::from_ids(form.ids.iter().copied(), &entries);
    selection.toggle_all(&entries);
    let selected: BTreeSet<i64> = selection.ids().collect();
    render(&state, &session, &selected, Vec::new(), String::new(), Some(&form.lookback_days)).await
}

pub async fn dashboard_submit(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<SubmitForm>,
) -> Response {
    let requested: BTreeSet<i64> = form.ids.iter().copied().collect();
    let (kind, lookback_days) = match form.kind().and_then(|kind| form.lookback().map(|days| (kind, days))) {
        Ok(parsed) => parsed,
        Err(e) => {
            let notices = vec![Notice::Error(e.user_message())];
            return render(&state, &session, &requested, notices, String::new(), Some(&form.lookback_days)).await;
        }
    };

    // Rows may have gained a job since the page was rendered.
    let entries = match state.backend.read_dashboard(&session).await {
        Ok(entries) => entries,
        Err(e) => return error_page("Surveillance", e),
    };
    let selection = DashboardSelection::from_ids(requested.iter().copied(), &entries);
    let skipped = requested.len() - selection.len();

    let result = submit_jobs(
        state.backend.as_ref(),
        &session,
        &selection,
        &entries,
        kind,
        lookback_days,
        state.concurrency(),
    )
    .await;

    let mut notices = Vec::new();
    let mut extra = String::new();
    let mut keep = BTreeSet::new();
    match result {
        Ok(report) => {
            info!(kind = kind.as_str(), ok = report.success_count(), failed = report.failure_count(), "jobs submitted");
            let text = report.summary("Queued jobs for");
            notices.push(if report.is_complete_success() { Notice::Success(text) } else { Notice::Error(text) });
            extra = failures_html(&report.failures);
        }
        Err(e) => {
            notices.push(Notice::Error(e.user_message()));
            keep = requested;
        }
    }
    if skipped > 0 {
        notices.push(Notice::Error(format!(
            "{} selected row(s) are no longer selectable and were skipped.",
            skipped
        )));
    }
    render(&state, &session, &keep, notices, extra, Some(&form.lookback_days)).await
}

/// `GET /api/dashboard`: current rows as JSON.
pub async fn api_dashboard(
    State(state): State<SharedState>,
    ApiSession(session): ApiSession,
) -> std::result::Result<Json<Vec<DashboardEntry>>, ApiError> {
    Ok(Json(state.backend.read_dashboard(&session).await?))
}

// ── Rendering ─────────────────────────────────────────────────────────────────

async fn render(
    state: &SharedState,
    session: &Session,
    selected: &BTreeSet<i64>,
    mut notices: Vec<Notice>,
    extra: String,
    lookback: Option<&str>,
) -> Response {
    let view = match refresh(state.backend.as_ref(), session).await {
        Ok(view) => view,
        Err(PrimerwatchError::NotAuthenticated) => return error_page("Surveillance", PrimerwatchError::NotAuthenticated),
        Err(e) => {
            notices.push(Notice::Error(e.user_message()));
            DashboardView { sync: Default::default(), entries: Vec::new() }
        }
    };
    if view.sync.added > 0 || view.sync.removed > 0 {
        notices.push(Notice::Success(format!(
            "Tracking updated: {} added, {} removed.",
            view.sync.added, view.sync.removed
        )));
    }
    let selection = DashboardSelection::from_ids(selected.iter().copied(), &view.entries);
    let lookback = match lookback {
        Some(raw) => raw.to_string(),
        None => state.config.dashboard.default_lookback_days.to_string(),
    };
    let interval_ms = state.config.dashboard.poll_interval().as_millis();
    Html(render_page(&view.entries, &selection, &notices, &extra, &lookback, interval_ms)).into_response()
}

fn status_cell(entry: &DashboardEntry) -> String {
    match entry.queued_job_id {
        Some(job) => format!(r#"<span class="badge badge-warning">Job #{} queued</span>"#, job),
        None => r#"<span class="badge badge-outline">Idle</span>"#.to_string(),
    }
}

fn render_page(
    entries: &[DashboardEntry],
    selection: &DashboardSelection,
    notices: &[Notice],
    extra: &str,
    lookback: &str,
    interval_ms: u128,
) -> String {
    let rows = if entries.is_empty() {
        empty_row(6, "No assays tracked yet. Create an assay to start surveillance.")
    } else {
        entries
            .iter()
            .map(|e| {
                let attr = if !e.is_selectable() {
                    " disabled"
                } else if selection.contains(e.id) {
                    " checked"
                } else {
                    ""
                };
                format!(r#"
            <tr data-entry="{}">
                <td><input type="checkbox" name="ids" value="{}" class="row-select"{}></td>
                <td><a href="/assays/{}">{}</a></td>
                <td>{} d</td>
                <td class="last-checked">{}</td>
                <td class="new-sequences">{}</td>
                <td class="status">{}</td>
            </tr>"#,
                    e.id,
                    e.id,
                    attr,
                    e.assay_id,
                    escape(&e.assay_name),
                    e.lookback_days,
                    e.last_checked
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "Never".to_string()),
                    e.new_sequences,
                    status_cell(e),
                )
            })
            .collect()
    };

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">Surveillance</h1>
        <p class="text-muted">{} tracked assay(s) · status refreshes every {} s</p>
    </div>
    <a href="/dashboard" class="btn btn-outline">Sync</a>
</div>
{}{}
<div class="card">
    <form method="post" action="/dashboard/submit">
        <table class="table">
            <thead><tr>
                <th><button type="submit" formaction="/dashboard/select" formnovalidate class="btn btn-outline btn-sm" title="Select all">All</button></th>
                <th>Assay</th><th>Lookback</th><th>Last checked</th><th>New sequences</th><th>Status</th>
            </tr></thead>
            <tbody>{}</tbody>
        </table>
        <div class="d-flex gap-3">
            <select name="job_type">
                <option value="1">New sequence search</option>
                <option value="2">Divergence check</option>
            </select>
            <label>Lookback (days) <input type="number" name="lookback_days" min="1" max="{}" value="{}" required></label>
            <button type="submit" class="btn btn-primary">Submit jobs</button>
        </div>
    </form>
</div>
<script>
const events = new EventSource('/api/dashboard/events');
events.addEventListener('snapshot', (ev) => {{
    const snap = JSON.parse(ev.data);
    if (snap.error) return;
    for (const e of snap.entries) {{
        const row = document.querySelector(`tr[data-entry="${{e.id}}"]`);
        if (!row) continue;
        row.querySelector('.new-sequences').textContent = e.new_sequences;
        if (e.last_checked) row.querySelector('.last-checked').textContent = e.last_checked.slice(0, 16).replace('T', ' ');
        const box = row.querySelector('.row-select');
        box.disabled = e.queued_job_id !== null;
        if (box.disabled) box.checked = false;
        row.querySelector('.status').innerHTML = e.queued_job_id !== null
            ? `<span class="badge badge-warning">Job #${{e.queued_job_id}} queued</span>`
            : '<span class="badge badge-outline">Idle</span>';
    }}
}});
</script>"#,
        entries.len(),
        interval_ms / 1000,
        notices_html(notices),
        extra,
        rows,
        MAX_LOOKBACK_DAYS,
        escape(lookback),
    );
    page("Surveillance", &body)
}
