//! Assay list, creation, detail and bulk delete.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::info;

use primerwatch_client::run_batch;
use primerwatch_client::validate::assay_draft;
use primerwatch_common::entities::{Assay, Oligo, TaxIdEntry};

use crate::auth::PageSession;
use crate::handlers::layout::{empty_row, escape, failures_html, notices_html, page, Notice};
use crate::handlers::{error_page, listed, optional, parse_optional_id, IdsForm};
use crate::state::SharedState;

// ── Form input ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AssayForm {
    pub name: String,
    pub target_taxid_id: Option<String>,
    pub target_gene: Option<String>,
    /// Single-record FASTA or a bare sequence.
    pub amplicon: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn assays_page(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
) -> Response {
    render(&state, &session, Vec::new(), String::new(), None).await
}

pub async fn assay_create(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<AssayForm>,
) -> Response {
    let draft = parse_optional_id(form.target_taxid_id.as_deref()).and_then(|taxid| {
        assay_draft(&form.name, taxid, form.target_gene.as_deref(), &form.amplicon)
    });
    let result = match draft {
        Ok(draft) => state.backend.create_assay(&session, &draft).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(assay) => {
            info!(assay_id = assay.id, "assay created");
            let notice = Notice::Success(format!("Assay \"{}\" created.", assay.name));
            render(&state, &session, vec![notice], String::new(), None).await
        }
        Err(e) => render(&state, &session, vec![Notice::Error(e.user_message())], String::new(), Some(&form)).await,
    }
}

pub async fn assays_delete(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<IdsForm>,
) -> Response {
    if form.ids.is_empty() {
        let notice = Notice::Error("Select at least one assay to delete.".into());
        return render(&state, &session, vec![notice], String::new(), None).await;
    }
    let backend = state.backend.as_ref();
    let session_ref = &session;
    let report = run_batch(form.ids, state.concurrency(), |id| format!("assay {}", id), |id| async move {
        backend.delete_assay(session_ref, id).await
    })
    .await;

    let notice = if report.is_complete_success() {
        Notice::Success(report.summary("Deleted"))
    } else {
        Notice::Error(report.summary("Deleted"))
    };
    render(&state, &session, vec![notice], failures_html(&report.failures), None).await
}

pub async fn assay_detail(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Path(assay_id): Path<i64>,
) -> Response {
    let detail = match state.backend.get_assay(&session, assay_id).await {
        Ok(d) => d,
        Err(e) => return error_page("Assay", e),
    };
    let oligos: Vec<Oligo> = optional(state.backend.list_oligos(&session).await, "oligos")
        .into_iter()
        .filter(|o| o.assay_id == Some(assay_id))
        .collect();

    let assay = &detail.assay;
    let target = detail
        .taxid
        .as_ref()
        .map(|t| escape(&t.label()))
        .unwrap_or_else(|| "—".to_string());
    let (amp_name, amp_seq) = detail
        .ref_amplicon
        .as_ref()
        .map(|a| (a.name.clone().unwrap_or_default(), a.sequence.clone()))
        .unwrap_or_default();

    let oligo_rows = if oligos.is_empty() {
        empty_row(2, "No oligos assigned to this assay.")
    } else {
        oligos
            .iter()
            .map(|o| format!("<tr><td>{}</td><td><code>{}</code></td></tr>", escape(&o.name), escape(&o.sequence)))
            .collect()
    };

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">{}</h1>
        <p class="text-muted">Target: {} · Gene: {} · {} oligo(s)</p>
    </div>
    <a href="/assays" class="btn btn-outline">All assays</a>
</div>
<div class="card">
    <div class="card-header">Reference amplicon {}</div>
    <pre class="sequence">{}</pre>
    <p class="text-muted">{} bp</p>
</div>
<div class="card">
    <div class="card-header">Oligos</div>
    <table class="table">
        <thead><tr><th>Name</th><th>Sequence</th></tr></thead>
        <tbody>{}</tbody>
    </table>
</div>"#,
        escape(&assay.name),
        target,
        escape(assay.target_gene.as_deref().unwrap_or("—")),
        detail.oligo_count,
        escape(&amp_name),
        escape(&amp_seq),
        amp_seq.len(),
        oligo_rows,
    );
    Html(page(&assay.name, &body)).into_response()
}

// ── Rendering ─────────────────────────────────────────────────────────────────

async fn render(
    state: &SharedState,
    session: &primerwatch_common::Session,
    mut notices: Vec<Notice>,
    extra: String,
    form: Option<&AssayForm>,
) -> Response {
    let assays = match listed(state.backend.list_assays(session).await, &mut notices) {
        Ok(rows) => rows,
        Err(redirect) => return redirect,
    };
    let taxids = optional(state.backend.list_taxids(session).await, "taxids");
    Html(render_page(&assays, &taxids, &notices, &extra, form)).into_response()
}

fn render_page(
    assays: &[Assay],
    taxids: &[TaxIdEntry],
    notices: &[Notice],
    extra: &str,
    form: Option<&AssayForm>,
) -> String {
    let empty = AssayForm::default();
    let form = form.unwrap_or(&empty);
    let selected_taxid = form.target_taxid_id.as_deref().unwrap_or("");

    let taxid_label = |id: Option<i64>| {
        id.and_then(|id| taxids.iter().find(|t| t.id == id))
            .map(|t| escape(&t.label()))
            .unwrap_or_else(|| "—".to_string())
    };

    let rows = if assays.is_empty() {
        empty_row(5, "No assays yet. Create one below.")
    } else {
        assays
            .iter()
            .map(|a| {
                format!(r#"
            <tr>
                <td><input type="checkbox" name="ids" value="{}"></td>
                <td><a href="/assays/{}">{}</a></td>
                <td>{}</td>
                <td>{}</td>
                <td class="text-muted">{}</td>
            </tr>"#,
                    a.id,
                    a.id,
                    escape(&a.name),
                    taxid_label(a.target_taxid_id),
                    escape(a.target_gene.as_deref().unwrap_or("—")),
                    a.created_at.format("%Y-%m-%d"),
                )
            })
            .collect()
    };

    let options: String = taxids
        .iter()
        .map(|t| {
            let selected = if t.id.to_string() == selected_taxid { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, t.id, selected, escape(&t.label()))
        })
        .collect();

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">Assays</h1>
        <p class="text-muted">{} assay(s)</p>
    </div>
</div>
{}{}
<div class="card">
    <form method="post" action="/assays/delete">
        <table class="table">
            <thead><tr><th></th><th>Name</th><th>Target</th><th>Gene</th><th>Created</th></tr></thead>
            <tbody>{}</tbody>
        </table>
        <button type="submit" class="btn btn-danger btn-sm">Delete selected</button>
    </form>
</div>
<div class="card">
    <div class="card-header">New assay</div>
    <form method="post" action="/assays" class="form-stack">
        <label>Name <input type="text" name="name" value="{}" required></label>
        <label>Target TaxID
            <select name="target_taxid_id"><option value="">None</option>{}</select>
        </label>
        <label>Target gene <input type="text" name="target_gene" value="{}"></label>
        <label>Reference amplicon (FASTA with one record, or a bare sequence)
            <textarea name="amplicon" rows="6" required>{}</textarea>
        </label>
        <button type="submit" class="btn btn-primary">Create assay</button>
    </form>
</div>"#,
        assays.len(),
        notices_html(notices),
        extra,
        rows,
        escape(&form.name),
        options,
        escape(form.target_gene.as_deref().unwrap_or("")),
        escape(&form.amplicon),
    );
    page("Assays", &body)
}
