//! Oligo list, creation, FASTA import and bulk reassign / unassign / delete.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::info;

use primerwatch_client::import::import_oligos;
use primerwatch_client::run_batch;
use primerwatch_client::validate::oligo_draft;
use primerwatch_common::entities::{Assay, AssayAssignment, Oligo};
use primerwatch_common::Session;

use crate::auth::PageSession;
use crate::handlers::layout::{empty_row, escape, failures_html, notices_html, page, Notice};
use crate::handlers::{listed, optional, parse_optional_id};
use crate::state::SharedState;

// ── Form input ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OligoForm {
    pub name: String,
    pub sequence: String,
    pub assay_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportForm {
    pub fasta: String,
    pub assay_id: Option<String>,
}

/// Checked rows plus the reassignment target chosen next to the buttons.
#[derive(Debug, Default, Deserialize)]
pub struct BulkOligoForm {
    #[serde(default)]
    pub ids: Vec<i64>,
    pub target_assay_id: Option<String>,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn oligos_page(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
) -> Response {
    render(&state, &session, Vec::new(), String::new()).await
}

pub async fn oligo_create(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<OligoForm>,
) -> Response {
    let draft = parse_optional_id(form.assay_id.as_deref())
        .and_then(|assay_id| oligo_draft(&form.name, &form.sequence, assay_id));
    let result = match draft {
        Ok(draft) => state.backend.create_oligo(&session, &draft).await,
        Err(e) => Err(e),
    };
    let notice = match result {
        Ok(oligo) => Notice::Success(format!("Oligo \"{}\" created.", oligo.name)),
        Err(e) => Notice::Error(e.user_message()),
    };
    render(&state, &session, vec![notice], String::new()).await
}

pub async fn oligos_import(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<ImportForm>,
) -> Response {
    let assay_id = match parse_optional_id(form.assay_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return render(&state, &session, vec![Notice::Error(e.user_message())], String::new()).await,
    };
    match import_oligos(state.backend.as_ref(), &session, &form.fasta, assay_id, state.concurrency()).await {
        Ok(report) => {
            let text = format!(
                "Imported {} of {} sequence(s); {} failed.",
                report.success_count(),
                report.total,
                report.failure_count()
            );
            let notice = if report.failures.is_empty() { Notice::Success(text) } else { Notice::Error(text) };
            render(&state, &session, vec![notice], failures_html(&report.failures)).await
        }
        Err(e) => render(&state, &session, vec![Notice::Error(e.user_message())], String::new()).await,
    }
}

pub async fn oligos_reassign(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<BulkOligoForm>,
) -> Response {
    match parse_optional_id(form.target_assay_id.as_deref()) {
        Ok(Some(assay_id)) => bulk_assign(&state, &session, form.ids, AssayAssignment::Assay(assay_id), "Reassigned").await,
        Ok(None) => {
            let notice = Notice::Error("Choose an assay to reassign to.".into());
            render(&state, &session, vec![notice], String::new()).await
        }
        Err(e) => render(&state, &session, vec![Notice::Error(e.user_message())], String::new()).await,
    }
}

pub async fn oligos_unassign(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<BulkOligoForm>,
) -> Response {
    bulk_assign(&state, &session, form.ids, AssayAssignment::Unassign, "Unassigned").await
}

pub async fn oligos_delete(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<BulkOligoForm>,
) -> Response {
    if form.ids.is_empty() {
        return render(&state, &session, vec![Notice::Error("Select at least one oligo.".into())], String::new()).await;
    }
    let backend = state.backend.as_ref();
    let session_ref = &session;
    let report = run_batch(form.ids, state.concurrency(), |id| format!("oligo {}", id), |id| async move {
        backend.delete_oligo(session_ref, id).await
    })
    .await;
    let notice = if report.is_complete_success() {
        Notice::Success(report.summary("Deleted"))
    } else {
        Notice::Error(report.summary("Deleted"))
    };
    render(&state, &session, vec![notice], failures_html(&report.failures)).await
}

async fn bulk_assign(
    state: &SharedState,
    session: &Session,
    ids: Vec<i64>,
    target: AssayAssignment,
    verb: &str,
) -> Response {
    if ids.is_empty() {
        return render(state, session, vec![Notice::Error("Select at least one oligo.".into())], String::new()).await;
    }
    let backend = state.backend.as_ref();
    let report = run_batch(ids, state.concurrency(), |id| format!("oligo {}", id), |id| async move {
        backend.reassign_oligo(session, id, target).await
    })
    .await;
    info!(verb, ok = report.success_count(), failed = report.failure_count(), "bulk oligo assignment");
    let notice = if report.is_complete_success() {
        Notice::Success(report.summary(verb))
    } else {
        Notice::Error(report.summary(verb))
    };
    render(state, session, vec![notice], failures_html(&report.failures)).await
}

// ── Rendering ─────────────────────────────────────────────────────────────────

async fn render(state: &SharedState, session: &Session, mut notices: Vec<Notice>, extra: String) -> Response {
    let oligos = match listed(state.backend.list_oligos(session).await, &mut notices) {
        Ok(rows) => rows,
        Err(redirect) => return redirect,
    };
    let assays = optional(state.backend.list_assays(session).await, "assays");
    Html(render_page(&oligos, &assays, &notices, &extra)).into_response()
}

fn assay_options(assays: &[Assay]) -> String {
    assays
        .iter()
        .map(|a| format!(r#"<option value="{}">{}</option>"#, a.id, escape(&a.name)))
        .collect()
}

fn render_page(oligos: &[Oligo], assays: &[Assay], notices: &[Notice], extra: &str) -> String {
    let assay_name = |id: Option<i64>| match id {
        None => r#"<span class="text-muted">Unassigned</span>"#.to_string(),
        Some(id) => assays
            .iter()
            .find(|a| a.id == id)
            .map(|a| format!(r#"<a href="/assays/{}">{}</a>"#, a.id, escape(&a.name)))
            .unwrap_or_else(|| "Unknown".to_string()),
    };

    let rows = if oligos.is_empty() {
        empty_row(5, "No oligos yet. Add one or import a FASTA file below.")
    } else {
        oligos
            .iter()
            .map(|o| {
                format!(r#"
            <tr>
                <td><input type="checkbox" name="ids" value="{}"></td>
                <td>{}</td>
                <td><code>{}</code></td>
                <td>{}</td>
                <td class="text-muted">{}</td>
            </tr>"#,
                    o.id,
                    escape(&o.name),
                    escape(&o.sequence),
                    assay_name(o.assay_id),
                    o.sequence.len(),
                )
            })
            .collect()
    };
    let options = assay_options(assays);

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">Oligos</h1>
        <p class="text-muted">{} oligo(s)</p>
    </div>
</div>
{}{}
<div class="card">
    <form method="post" action="/oligos/delete">
        <table class="table">
            <thead><tr><th></th><th>Name</th><th>Sequence</th><th>Assay</th><th>Length</th></tr></thead>
            <tbody>{}</tbody>
        </table>
        <div class="d-flex gap-3">
            <select name="target_assay_id"><option value="">Choose assay…</option>{}</select>
            <button type="submit" formaction="/oligos/reassign" class="btn btn-outline btn-sm">Reassign selected</button>
            <button type="submit" formaction="/oligos/unassign" class="btn btn-outline btn-sm">Unassign selected</button>
            <button type="submit" class="btn btn-danger btn-sm">Delete selected</button>
        </div>
    </form>
</div>
<div class="grid-2">
    <div class="card">
        <div class="card-header">New oligo</div>
        <form method="post" action="/oligos" class="form-stack">
            <label>Name <input type="text" name="name" required></label>
            <label>Sequence (IUPAC) <input type="text" name="sequence" required></label>
            <label>Assay <select name="assay_id"><option value="">Unassigned</option>{}</select></label>
            <button type="submit" class="btn btn-primary">Add oligo</button>
        </form>
    </div>
    <div class="card">
        <div class="card-header">Import FASTA</div>
        <form method="post" action="/oligos/import" class="form-stack">
            <label>FASTA text <textarea name="fasta" rows="8" required></textarea></label>
            <label>Assay <select name="assay_id"><option value="">Unassigned</option>{}</select></label>
            <button type="submit" class="btn btn-primary">Import</button>
        </form>
    </div>
</div>"#,
        oligos.len(),
        notices_html(notices),
        extra,
        rows,
        options,
        options,
        options,
    );
    page("Oligos", &body)
}
