//! TaxID entries: list, create (species name looked up when left blank) and bulk delete.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::{debug, info};

use primerwatch_client::run_batch;
use primerwatch_client::taxonomy::parse_taxid;
use primerwatch_client::validate::taxid_draft;
use primerwatch_common::entities::TaxIdEntry;
use primerwatch_common::Session;

use crate::auth::PageSession;
use crate::handlers::layout::{empty_row, escape, failures_html, notices_html, page, Notice};
use crate::handlers::{listed, IdsForm};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct TaxIdForm {
    pub taxid: String,
    pub species_name: Option<String>,
}

pub async fn taxids_page(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
) -> Response {
    render(&state, &session, Vec::new(), String::new()).await
}

pub async fn taxid_create(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<TaxIdForm>,
) -> Response {
    let taxid = match parse_taxid(&form.taxid) {
        Ok(id) => id,
        Err(e) => return render(&state, &session, vec![Notice::Error(e.to_string())], String::new()).await,
    };

    let mut species = form.species_name.clone().filter(|s| !s.trim().is_empty());
    if species.is_none() {
        match state.taxonomy.lookup(taxid).await {
            Ok(record) => species = Some(record.species_name),
            Err(e) => debug!(taxid, error = %e, "species lookup skipped"),
        }
    }

    let result = match taxid_draft(taxid, species.as_deref()) {
        Ok(draft) => state.backend.create_taxid(&session, &draft).await,
        Err(e) => Err(e),
    };
    let notice = match result {
        Ok(entry) => {
            info!(taxid = entry.taxid, "taxid added");
            Notice::Success(format!("Added {}.", entry.label()))
        }
        Err(e) => Notice::Error(e.user_message()),
    };
    render(&state, &session, vec![notice], String::new()).await
}

pub async fn taxids_delete(
    State(state): State<SharedState>,
    PageSession(session): PageSession,
    Form(form): Form<IdsForm>,
) -> Response {
    if form.ids.is_empty() {
        return render(&state, &session, vec![Notice::Error("Select at least one TaxID.".into())], String::new()).await;
    }
    let backend = state.backend.as_ref();
    let session_ref = &session;
    let report = run_batch(form.ids, state.concurrency(), |id| format!("taxid entry {}", id), |id| async move {
        backend.delete_taxid(session_ref, id).await
    })
    .await;
    let notice = if report.is_complete_success() {
        Notice::Success(report.summary("Deleted"))
    } else {
        Notice::Error(report.summary("Deleted"))
    };
    render(&state, &session, vec![notice], failures_html(&report.failures)).await
}

async fn render(state: &SharedState, session: &Session, mut notices: Vec<Notice>, extra: String) -> Response {
    match listed(state.backend.list_taxids(session).await, &mut notices) {
        Ok(taxids) => Html(render_page(&taxids, &notices, &extra)).into_response(),
        Err(redirect) => redirect,
    }
}

fn render_page(taxids: &[TaxIdEntry], notices: &[Notice], extra: &str) -> String {
    let rows = if taxids.is_empty() {
        empty_row(4, "No TaxIDs registered yet.")
    } else {
        taxids
            .iter()
            .map(|t| format!(r#"
            <tr>
                <td><input type="checkbox" name="ids" value="{}"></td>
                <td><code>{}</code></td>
                <td>{}</td>
                <td class="text-muted">{}</td>
            </tr>"#,
                t.id,
                t.taxid,
                escape(t.species_name.as_deref().unwrap_or("Unknown")),
                t.created_at.format("%Y-%m-%d"),
            ))
            .collect()
    };

    let body = format!(r#"
<div class="page-header">
    <div>
        <h1 class="page-title">TaxIDs</h1>
        <p class="text-muted">NCBI taxonomy targets available to assays</p>
    </div>
</div>
{}{}
<div class="card">
    <form method="post" action="/taxids/delete">
        <table class="table">
            <thead><tr><th></th><th>TaxID</th><th>Species</th><th>Added</th></tr></thead>
            <tbody>{}</tbody>
        </table>
        <button type="submit" class="btn btn-danger btn-sm">Delete selected</button>
    </form>
</div>
<div class="card">
    <div class="card-header">Add TaxID</div>
    <form method="post" action="/taxids" class="form-stack">
        <label>TaxID <input type="text" name="taxid" inputmode="numeric" required></label>
        <label>Species name <input type="text" name="species_name" placeholder="Looked up from NCBI when left blank"></label>
        <button type="button" class="btn btn-outline btn-sm" id="lookup">Look up</button>
        <button type="submit" class="btn btn-primary">Add</button>
    </form>
</div>
<script>
document.getElementById('lookup').addEventListener('click', async () => {{
    const taxid = document.querySelector('input[name=taxid]').value.trim();
    const species = document.querySelector('input[name=species_name]');
    const res = await fetch('/api/taxonomy/' + encodeURIComponent(taxid));
    const body = await res.json();
    if (res.ok) {{ species.value = body.species_name; }} else {{ species.placeholder = body.error; }}
}});
</script>"#,
        notices_html(notices),
        extra,
        rows,
    );
    page("TaxIDs", &body)
}
