//! BLAST planning, ordering, job results and CSV download.

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use primerwatch_client::blast::{default_window, order_blast_jobs, BlastOrderForm};
use primerwatch_client::export::{csv_file_name, export_blast_csv};
use primerwatch_common::entities::{BlastCandidate, BlastJob, BlastJobSummary, BlastParams, JobStatus};
use primerwatch_common::error::{PrimerwatchError, Result};
use primerwatch_common::Session;

use crate::auth::PageSession;
use crate::handlers::layout::{empty_row, escape, failures_html, notices_html, page, Notice};
use crate::handlers::{error_page, listed, optional, parse_number};
use crate::state::SharedState;

// ── Form input ────────────────────────────────────────────────────────────────

/// Numeric fields stay text until `to_order_form` so a blank input is reported inline.
#[derive(Debug, Deserialize)]
pub struct BlastForm {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
    #[serde(default)]
    pub identity_pct: String,
    #[serde(default)]
    pub coverage_pct: String,
    #[serde(default)]
    pub match_score: String,
    #[serde(default)]
    pub mismatch_score: String,
    #[serde(default)]
    pub gap_open: String,
    #[serde(default)]
    pub gap_extend: String,
    #[serde(default)]
    pub min_oligo_coverage_pct: String,
}

fn parse_date(label: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PrimerwatchError::validation(format!("{} must be a date (YYYY-MM-DD)", label)))
}

impl BlastForm {
    fn to_order_form(&self) -> Result<BlastOrderForm> {
        Ok(BlastOrderForm {
            assay_ids: self.ids.clone(),
            date_from: parse_date("Start date", &self.date_from)?,
            date_to: parse_date("End date", &self.date_to)?,
            params: BlastParams {
                identity_pct: parse_number("Identity", &self.identity_pct)?,
                coverage_pct: parse_number("Coverage", &self.coverage_pct)?,
                match_score: parse_number("Match score", &self.match_score)?,
                mismatch_score: parse_number("Mismatch score", &self.mismatch_score)?,
                gap_open: parse_number("Gap open", &self.gap_open)?,
                gap_extend: parse_number("Gap extend", &self.gap_extend)?,
                min_oligo_coverage_pct: parse_number("Min oligo coverage", &self.min_oligo_coverage_pct)?,
            },
        })
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn blast_page(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
) -> Response {
    render(&state, &session, Vec::new(), String::new()).await
}

pub async fn blast_order(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<BlastForm>,
) -> Response {
    let order_form = match form.to_order_form() {
        Ok(f) => f,
        Err(e) => return render(&state, &session, vec![Notice::Error(e.user_message())], String::new()).await,
    };
    let candidates = optional(state.backend.list_blast_candidates(&session).await, "blast candidates");
    let today = Utc::now().date_naive();

    let result = order_blast_jobs(
        state.backend.as_ref(),
        &session,
        &order_form,
        &candidates,
        today,
        state.concurrency(),
    )
    .await;
    match result {
        Ok(report) => {
            let text = report.summary("Ordered BLAST jobs for");
            let notice = if report.is_complete_success() { Notice::Success(text) } else { Notice::Error(text) };
            render(&state, &session, vec![notice], failures_html(&report.failures)).await
        }
        Err(e) => render(&state, &session, vec![Notice::Error(e.user_message())], String::new()).await,
    }
}

pub async fn blast_job_detail(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Path(job_id): Path<i64>,
) -> Response {
    match state.backend.get_blast_job(&session, job_id).await {
        Ok(job) => Html(render_job(&job)).into_response(),
        Err(e) => error_page("BLAST job", e),
    }
}

pub async fn blast_job_csv(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Path(job_id): Path<i64>,
) -> Response {
    let job = match state.backend.get_blast_job(&session, job_id).await {
        Ok(job) => job,
        Err(e) => return error_page("BLAST job", e),
    };
    match export_blast_csv(&job) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", csv_file_name(&job)),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => error_page("BLAST job", e),
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

async fn render(state: &SharedState, session: &Session, mut notices: Vec<Notice>, extra: String) -> Response {
    let candidates = match listed(state.backend.list_blast_candidates(session).await, &mut notices) {
        Ok(rows) => rows,
        Err(redirect) => return redirect,
    };
    let jobs = optional(state.backend.list_blast_jobs(session).await, "blast jobs");
    let defaults = state.config.blast.params();
    let window = default_window(Utc::now().date_naive(), state.config.blast.default_window_days);
    Html(render_page(&candidates, &jobs, &notices, &extra, &defaults, window)).into_response()
}

fn status_badge(status: JobStatus) -> String {
    let class = match status {
        JobStatus::Queued => "badge-warning",
        JobStatus::Working => "badge-info",
        JobStatus::Done => "badge-success",
    };
    format!(r#"<span class="badge {}">{}</span>"#, class, status.as_str())
}

fn render_page(
    candidates: &[BlastCandidate],
    jobs: &[BlastJobSummary],
    notices: &[Notice],
    extra: &str,
    p: &BlastParams,
    (from, to): (NaiveDate, NaiveDate),
) -> String {
    let candidate_rows = if candidates.is_empty() {
        empty_row(6, "No eligible assays. An assay needs a TaxID target, a reference amplicon and at least one oligo.")
    } else {
        candidates
            .iter()
            .map(|c| format!(r#"
            <tr>
                <td><input type="checkbox" name="ids" value="{}"></td>
                <td><a href="/assays/{}">{}</a></td>
                <td><code>{}</code></td>
                <td>{}</td>
                <td>{}</td>
                <td>{} bp</td>
            </tr>"#,
                c.assay_id,
                c.assay_id,
                escape(&c.assay_name),
                c.taxid,
                escape(c.species_name.as_deref().unwrap_or("Unknown")),
                c.oligo_count,
                c.amplicon_length,
            ))
            .collect()
    };

    let job_rows = if jobs.is_empty() {
        empty_row(5, "No BLAST jobs yet.")
    } else {
        jobs.iter()
            .map(|j| format!(r#"
            <tr>
                <td><a href="/blast/jobs/{}">#{}</a></td>
                <td>{}</td>
                <td>{} → {}</td>
                <td>{}</td>
                <td class="text-muted">{}</td>
            </tr>"#,
                j.id,
                j.id,
                escape(&j.assay_name),
                j.date_from,
                j.date_to,
                status_badge(j.status),
                j.created_at.format("%Y-%m-%d %H:%M"),
            ))
            .collect()
    };

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">BLAST</h1>
        <p class="text-muted">Check oligo coverage against sequences published in a date window</p>
    </div>
</div>
{}{}
<div class="card">
    <div class="card-header">Plan jobs</div>
    <form method="post" action="/blast/order">
        <table class="table">
            <thead><tr><th></th><th>Assay</th><th>TaxID</th><th>Species</th><th>Oligos</th><th>Amplicon</th></tr></thead>
            <tbody>{}</tbody>
        </table>
        <div class="grid-4">
            <label>From <input type="date" name="date_from" value="{}" required></label>
            <label>To <input type="date" name="date_to" value="{}" required></label>
            <label>Identity (%) <input type="number" step="any" name="identity_pct" value="{}" required></label>
            <label>Coverage (%) <input type="number" step="any" name="coverage_pct" value="{}" required></label>
            <label>Match <input type="number" name="match_score" value="{}" required></label>
            <label>Mismatch <input type="number" name="mismatch_score" value="{}" required></label>
            <label>Gap open <input type="number" name="gap_open" value="{}" required></label>
            <label>Gap extend <input type="number" name="gap_extend" value="{}" required></label>
            <label>Min oligo coverage (%) <input type="number" step="any" name="min_oligo_coverage_pct" value="{}" required></label>
        </div>
        <button type="submit" class="btn btn-primary">Order jobs</button>
    </form>
</div>
<div class="card">
    <div class="card-header">Jobs</div>
    <table class="table">
        <thead><tr><th>Job</th><th>Assay</th><th>Window</th><th>Status</th><th>Created</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</div>"#,
        notices_html(notices),
        extra,
        candidate_rows,
        from,
        to,
        p.identity_pct,
        p.coverage_pct,
        p.match_score,
        p.mismatch_score,
        p.gap_open,
        p.gap_extend,
        p.min_oligo_coverage_pct,
        job_rows,
    );
    page("BLAST", &body)
}

fn render_job(job: &BlastJob) -> String {
    let results = match &job.result {
        None => r#"<div class="card"><p class="text-muted">Results are not available yet. This page shows them once the job is done.</p></div>"#.to_string(),
        Some(result) => {
            let stats = &result.stats;
            let oligo_rows: String = result
                .oligo_stats
                .iter()
                .map(|o| format!(
                    "<tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{:.2}%</td></tr>",
                    escape(&o.name), escape(&o.sequence), o.matched, o.total, o.rate_pct()
                ))
                .collect();

            let oligo_heads: String = job.oligos.iter().map(|o| format!("<th>{}</th>", escape(&o.name))).collect();
            let oligo_seqs: String = job.oligos.iter().map(|o| format!("<td><code>{}</code></td>", escape(&o.sequence))).collect();
            let pattern_rows: String = result
                .patterns
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let variants: String = p.variants.iter().map(|v| format!("<td><code>{}</code></td>", escape(v))).collect();
                    format!(
                        "<tr><td>P{}</td><td>{}</td><td>{:.2}%</td>{}<td class=\"text-muted\">{}</td></tr>",
                        i + 1, p.count, p.percentage, variants, escape(&p.example_accessions.join(", "))
                    )
                })
                .collect();

            format!(r#"
<div class="stats-grid">
    <div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">Sequences</div></div>
    <div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">With hits</div></div>
    <div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">Full matches</div></div>
    <div class="stat-card"><div class="stat-value">{:.2}%</div><div class="stat-label">Match rate</div></div>
</div>
<div class="card">
    <div class="card-header">Per-oligo match rates</div>
    <table class="table">
        <thead><tr><th>Oligo</th><th>Sequence</th><th>Matched</th><th>Total</th><th>Rate</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</div>
<div class="card">
    <div class="card-header">Binding-site patterns</div>
    <table class="table">
        <thead><tr><th>Pattern</th><th>Count</th><th>Share</th>{}<th>Example accessions</th></tr></thead>
        <tbody>
            <tr><td>Sequence</td><td></td><td></td>{}<td></td></tr>
            {}
        </tbody>
    </table>
</div>"#,
                stats.total_sequences,
                stats.sequences_with_hits,
                stats.full_matches,
                stats.match_rate_pct(),
                oligo_rows,
                oligo_heads,
                oligo_seqs,
                pattern_rows,
            )
        }
    };

    let csv_link = if job.result.is_some() {
        format!(r#"<a href="/blast/jobs/{}/csv" class="btn btn-primary">Download CSV</a>"#, job.id)
    } else {
        String::new()
    };
    let p = &job.params;

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">BLAST job #{}</h1>
        <p class="text-muted">{} · TaxID {} · {} → {} · {}</p>
    </div>
    <div class="d-flex gap-3">{}<a href="/blast" class="btn btn-outline">All jobs</a></div>
</div>
<div class="card">
    <div class="card-header">Parameters</div>
    <p>Identity {}% · coverage {}% · match {} · mismatch {} · gap open {} · gap extend {} · min oligo coverage {}%</p>
</div>
{}"#,
        job.id,
        escape(&job.assay_name),
        job.taxid,
        job.date_from,
        job.date_to,
        status_badge(job.status),
        csv_link,
        p.identity_pct,
        p.coverage_pct,
        p.match_score,
        p.mismatch_score,
        p.gap_open,
        p.gap_extend,
        p.min_oligo_coverage_pct,
        results,
    );
    page(&format!("BLAST job #{}", job.id), &body)
}
