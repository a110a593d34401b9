//! Router-level tests: real handlers over the in-memory backend.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::Path;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use primerwatch_client::TaxonomyClient;
use primerwatch_common::backend::{BlastOrder, Session, SurveillanceBackend};
use primerwatch_common::entities::{BlastResult, MatchPattern, MatchStatistics, OligoMatchRate};
use primerwatch_config::Config;
use primerwatch_test_utils::InMemoryBackend;
use primerwatch_web::router::build_router;
use primerwatch_web::state::AppState;

const FORM: &str = "application/x-www-form-urlencoded";

fn config(taxonomy_url: &str) -> Config {
    Config::from_toml_str(&format!(
        "[backend]\nurl = \"http://127.0.0.1:9\"\n\n[taxonomy]\nbase_url = \"{}\"\ntimeout_secs = 2\n",
        taxonomy_url
    ))
    .unwrap()
}

fn app_with_taxonomy(backend: &Arc<InMemoryBackend>, taxonomy_url: &str) -> Router {
    let config = config(taxonomy_url);
    let taxonomy = Arc::new(TaxonomyClient::new(&config.taxonomy).unwrap());
    build_router(AppState::new(config, backend.clone(), backend.clone(), taxonomy))
}

fn app(backend: &Arc<InMemoryBackend>) -> Router {
    app_with_taxonomy(backend, "http://127.0.0.1:9")
}

fn cookie(session: &Session) -> String {
    format!("pw_access_token={}", session.token().unwrap())
}

async fn get_page(app: Router, uri: &str, session: Option<&Session>) -> Response {
    let mut req = Request::get(uri);
    if let Some(s) = session {
        req = req.header(header::COOKIE, cookie(s));
    }
    app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
}

async fn post_form(app: Router, uri: &str, session: Option<&Session>, body: &str) -> Response {
    let mut req = Request::post(uri).header(header::CONTENT_TYPE, FORM);
    if let Some(s) = session {
        req = req.header(header::COOKIE, cookie(s));
    }
    app.oneshot(req.body(Body::from(body.to_string())).unwrap()).await.unwrap()
}

async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(res: &Response) -> &str {
    res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

// ── Session ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_sets_cookie_and_redirects() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.sign_up("lab");

    let res = post_form(app(&backend), "/login", None, "email=lab%40example.org&password=password").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/dashboard");
    let set_cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("pw_access_token=token-"));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_bad_login_rerenders_form_with_error() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.sign_up("lab");

    let res = post_form(app(&backend), "/login", None, "email=lab%40example.org&password=wrong").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(res).await;
    assert!(html.contains("Invalid login credentials"));
    assert!(html.contains("lab@example.org"));
}

#[tokio::test]
async fn test_anonymous_page_redirects_and_api_is_unauthorized() {
    let backend = Arc::new(InMemoryBackend::new());

    let res = get_page(app(&backend), "/dashboard", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");

    let res = get_page(app(&backend), "/api/dashboard", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(backend.call_count("get_dashboard"), 0);
}

#[tokio::test]
async fn test_unknown_token_cookie_redirects_to_login() {
    let backend = Arc::new(InMemoryBackend::new());
    let stale = Session::bearer("token-expired");

    let res = get_page(app(&backend), "/assays", Some(&stale)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");

    let res = post_form(app(&backend), "/logout", Some(&session), "").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    let set_cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
}

// ── Assays and oligos ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_assay_from_fasta_amplicon() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");

    let body = "name=16S&target_taxid_id=&target_gene=rrs&amplicon=%3Eamp1%0AACGTACGT%0A";
    let html = body_text(post_form(app(&backend), "/assays", Some(&session), body).await).await;
    assert!(html.contains("Assay &quot;16S&quot; created."));

    let assays = backend.list_assays(&session).await.unwrap();
    assert_eq!(assays.len(), 1);
    let detail = backend.get_assay(&session, assays[0].id).await.unwrap();
    let amplicon = detail.ref_amplicon.unwrap();
    assert_eq!(amplicon.name.as_deref(), Some("amp1"));
    assert_eq!(amplicon.sequence, "ACGTACGT");
}

#[tokio::test]
async fn test_invalid_assay_keeps_form_values() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");

    let body = "name=16S&target_taxid_id=&target_gene=&amplicon=ACGTXQ";
    let html = body_text(post_form(app(&backend), "/assays", Some(&session), body).await).await;
    assert!(html.contains("alert-error"));
    assert!(html.contains("ACGTXQ"));
    assert_eq!(backend.call_count("create_assay"), 0);
}

#[tokio::test]
async fn test_bulk_assay_delete_reports_partial_failure() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let a = backend.seed_assay(&session, "16S", "ACGT").await;
    let b = backend.seed_assay(&session, "rpoB", "GGCC").await;
    backend.inject_failure("delete_assay", &b.id.to_string(), "assay is locked");

    let body = format!("ids={}&ids={}", a.id, b.id);
    let html = body_text(post_form(app(&backend), "/assays/delete", Some(&session), &body).await).await;
    assert!(html.contains("Deleted 1 of 2 item(s); 1 failed."));
    assert!(html.contains("assay is locked"));

    let left: Vec<i64> = backend.list_assays(&session).await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(left, vec![b.id]);
}

#[tokio::test]
async fn test_assay_detail_of_other_user_is_an_error_page() {
    let backend = Arc::new(InMemoryBackend::new());
    let owner = backend.sign_up("owner");
    let other = backend.sign_up("other");
    let assay = backend.seed_assay(&owner, "16S", "ACGT").await;

    let res = get_page(app(&backend), &format!("/assays/{}", assay.id), Some(&other)).await;
    assert!(res.status().is_client_error());
    assert!(body_text(res).await.contains("alert-error"));
}

#[tokio::test]
async fn test_fasta_import_creates_every_record() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let assay = backend.seed_assay(&session, "16S", "ACGT").await;

    let body = format!("fasta=%3Efwd%0AACGTN%0A%3Erev%0AGGCCRY%0A&assay_id={}", assay.id);
    let html = body_text(post_form(app(&backend), "/oligos/import", Some(&session), &body).await).await;
    assert!(html.contains("Imported 2 of 2 sequence(s); 0 failed."));

    let oligos = backend.list_oligos(&session).await.unwrap();
    assert_eq!(oligos.len(), 2);
    assert!(oligos.iter().all(|o| o.assay_id == Some(assay.id)));
}

#[tokio::test]
async fn test_unassign_moves_oligos_out_of_assay() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let assay = backend.seed_blast_ready_assay(&session, "16S", 562, &[("fwd", "ACGT"), ("rev", "TTGA")]).await;
    let ids: Vec<String> = backend
        .list_oligos(&session)
        .await
        .unwrap()
        .iter()
        .map(|o| format!("ids={}", o.id))
        .collect();

    let body = format!("{}&target_assay_id=", ids.join("&"));
    let html = body_text(post_form(app(&backend), "/oligos/unassign", Some(&session), &body).await).await;
    assert!(html.contains("Unassigned 2 item(s)."));
    assert!(backend
        .list_oligos(&session)
        .await
        .unwrap()
        .iter()
        .all(|o| o.assay_id.is_none()));
    assert_eq!(backend.get_assay(&session, assay.id).await.unwrap().oligo_count, 0);
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_dashboard_page_syncs_and_submit_queues_jobs() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.seed_assay(&session, "rpoB", "GGCC").await;

    let html = body_text(get_page(app(&backend), "/dashboard", Some(&session)).await).await;
    assert!(html.contains("Tracking updated: 2 added, 0 removed."));
    assert_eq!(backend.call_count("sync_dashboard"), 1);

    let entries = backend.read_dashboard(&session).await.unwrap();
    let body = format!("ids={}&ids={}&job_type=2&lookback_days=60", entries[0].id, entries[1].id);
    let html = body_text(post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await).await;
    assert!(html.contains("Queued jobs for 2 item(s)."));
    assert_eq!(backend.call_count("order_job"), 2);

    // Resubmitting the same rows: they now carry a job and are skipped.
    let html = body_text(post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await).await;
    assert!(html.contains("2 selected row(s) are no longer selectable and were skipped."));
    assert_eq!(backend.call_count("order_job"), 2);
}

#[tokio::test]
async fn test_dashboard_submit_rejects_out_of_range_lookback() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.sync_dashboard(&session).await.unwrap();
    let entries = backend.read_dashboard(&session).await.unwrap();

    let body = format!("ids={}&job_type=1&lookback_days=0", entries[0].id);
    let html = body_text(post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await).await;
    assert!(html.contains("alert-error"));
    assert_eq!(backend.call_count("order_job"), 0);
}

#[tokio::test]
async fn test_dashboard_submit_counts_duplicate_ids_once() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.sync_dashboard(&session).await.unwrap();
    let id = backend.read_dashboard(&session).await.unwrap()[0].id;

    let body = format!("ids={id}&ids={id}&job_type=1&lookback_days=30");
    let html = body_text(post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await).await;
    assert!(html.contains("Queued jobs for 1 item(s)."));
    assert!(!html.contains("were skipped"));
    assert_eq!(backend.call_count("order_job"), 1);
}

#[tokio::test]
async fn test_dashboard_submit_reports_blank_lookback_inline() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.sync_dashboard(&session).await.unwrap();
    let id = backend.read_dashboard(&session).await.unwrap()[0].id;

    let body = format!("ids={}&job_type=1&lookback_days=", id);
    let res = post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("alert-error"));
    assert!(html.contains("Lookback window must be a number"));
    // The row stays checked so the user only has to fix the number.
    assert!(html.contains(&format!(r#"value="{}" class="row-select" checked>"#, id)));
    assert_eq!(backend.call_count("order_job"), 0);

    let body = format!("ids={}&job_type=x&lookback_days=30", id);
    let html = body_text(post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await).await;
    assert!(html.contains("Job type must be a number"));
    assert_eq!(backend.call_count("order_job"), 0);
}

#[tokio::test]
async fn test_dashboard_select_all_skips_rows_with_jobs_and_toggles_off() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.seed_assay(&session, "rpoB", "GGCC").await;
    backend.sync_dashboard(&session).await.unwrap();
    let entries = backend.read_dashboard(&session).await.unwrap();
    let (busy, idle) = (entries[0].id, entries[1].id);

    let body = format!("ids={}&job_type=1&lookback_days=30", busy);
    post_form(app(&backend), "/dashboard/submit", Some(&session), &body).await;

    let html = body_text(post_form(app(&backend), "/dashboard/select", Some(&session), "lookback_days=45").await).await;
    assert!(html.contains(&format!(r#"value="{}" class="row-select" disabled>"#, busy)));
    assert!(html.contains(&format!(r#"value="{}" class="row-select" checked>"#, idle)));
    assert!(html.contains(r#"name="lookback_days" min="1" max="3650" value="45""#));

    let body = format!("ids={}&lookback_days=45", idle);
    let html = body_text(post_form(app(&backend), "/dashboard/select", Some(&session), &body).await).await;
    assert!(!html.contains(r#"class="row-select" checked>"#));
    assert_eq!(backend.call_count("order_job"), 1);
}

#[tokio::test]
async fn test_api_dashboard_accepts_bearer_header() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.sync_dashboard(&session).await.unwrap();

    let req = Request::get("/api/dashboard")
        .header(header::AUTHORIZATION, format!("Bearer {}", session.token().unwrap()))
        .body(Body::empty())
        .unwrap();
    let res = app(&backend).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["assay_name"], "16S");
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_events_stream_snapshots_until_disconnect() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.sync_dashboard(&session).await.unwrap();

    let req = Request::get("/api/dashboard/events")
        .header(header::AUTHORIZATION, format!("Bearer {}", session.token().unwrap()))
        .body(Body::empty())
        .unwrap();
    let res = app(&backend).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/event-stream"));

    let mut body = res.into_body().into_data_stream();
    let frame = body.next().await.unwrap().unwrap();
    let frame = String::from_utf8(frame.to_vec()).unwrap();
    assert!(frame.contains("event: snapshot"));
    assert!(frame.contains(r#""generation":1"#));
    assert!(frame.contains(r#""assay_name":"16S""#));

    // Default interval is 10 s.
    tokio::time::sleep(std::time::Duration::from_secs(25)).await;
    assert!(backend.call_count("get_dashboard") >= 3);

    drop(body);
    tokio::task::yield_now().await;
    let reads = backend.call_count("get_dashboard");
    tokio::time::sleep(std::time::Duration::from_secs(120)).await;
    assert_eq!(backend.call_count("get_dashboard"), reads);
}

// ── BLAST ─────────────────────────────────────────────────────────────────────

fn finished_result() -> BlastResult {
    BlastResult {
        stats: MatchStatistics { total_sequences: 10, sequences_with_hits: 9, full_matches: 8 },
        oligo_stats: vec![
            OligoMatchRate { name: "fwd".into(), sequence: "ACGT".into(), matched: 9, total: 9 },
            OligoMatchRate { name: "rev".into(), sequence: "TTGA".into(), matched: 8, total: 9 },
        ],
        patterns: vec![MatchPattern {
            count: 8,
            percentage: 80.0,
            variants: vec!["....".into(), "....".into()],
            example_accessions: vec!["NZ_CP000001".into()],
        }],
    }
}

async fn order_blast(backend: &InMemoryBackend, session: &Session) -> i64 {
    let assay = backend.seed_blast_ready_assay(session, "16S", 562, &[("fwd", "ACGT"), ("rev", "TTGA")]).await;
    let today = Utc::now().date_naive();
    let order = BlastOrder {
        assay_id: assay.id,
        date_from: today - Duration::days(30),
        date_to: today,
        params: config("http://127.0.0.1:9").blast.params(),
    };
    backend.order_blast_job(session, &order).await.unwrap()
}

#[tokio::test]
async fn test_blast_order_form_creates_one_job_per_assay() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let assay = backend.seed_blast_ready_assay(&session, "16S", 562, &[("fwd", "ACGT")]).await;

    let html = body_text(get_page(app(&backend), "/blast", Some(&session)).await).await;
    assert!(html.contains(&format!(r#"name="ids" value="{}""#, assay.id)));

    let today = Utc::now().date_naive();
    let body = format!(
        "ids={}&date_from={}&date_to={}&identity_pct=90&coverage_pct=80&match_score=1&mismatch_score=-2\
         &gap_open=-5&gap_extend=-2&min_oligo_coverage_pct=90",
        assay.id,
        today - Duration::days(7),
        today,
    );
    let html = body_text(post_form(app(&backend), "/blast/order", Some(&session), &body).await).await;
    assert!(html.contains("Ordered BLAST jobs for 1 item(s)."));
    assert_eq!(backend.list_blast_jobs(&session).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_blast_order_rejects_future_end_date() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let assay = backend.seed_blast_ready_assay(&session, "16S", 562, &[("fwd", "ACGT")]).await;

    let today = Utc::now().date_naive();
    let body = format!(
        "ids={}&date_from={}&date_to={}&identity_pct=90&coverage_pct=80&match_score=1&mismatch_score=-2\
         &gap_open=-5&gap_extend=-2&min_oligo_coverage_pct=90",
        assay.id,
        today,
        today + Duration::days(3),
    );
    let html = body_text(post_form(app(&backend), "/blast/order", Some(&session), &body).await).await;
    assert!(html.contains("End date must not be in the future"));
    assert_eq!(backend.call_count("order_blast_job"), 0);
}

#[tokio::test]
async fn test_blast_order_reports_blank_number_inline() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let assay = backend.seed_blast_ready_assay(&session, "16S", 562, &[("fwd", "ACGT")]).await;

    let today = Utc::now().date_naive();
    let body = format!(
        "ids={}&date_from={}&date_to={}&identity_pct=&coverage_pct=80&match_score=1&mismatch_score=-2\
         &gap_open=-5&gap_extend=-2&min_oligo_coverage_pct=90",
        assay.id,
        today - Duration::days(7),
        today,
    );
    let res = post_form(app(&backend), "/blast/order", Some(&session), &body).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("alert-error"));
    assert!(html.contains("Identity must be a number"));
    assert_eq!(backend.call_count("order_blast_job"), 0);
}

#[tokio::test]
async fn test_blast_csv_download_of_finished_job() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let job_id = order_blast(&backend, &session).await;
    backend.finish_blast_job(job_id, finished_result());

    let res = get_page(app(&backend), &format!("/blast/jobs/{}/csv", job_id), Some(&session)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert_eq!(disposition, format!("attachment; filename=\"blast_job_{}.csv\"", job_id));

    let csv = body_text(res).await;
    assert!(csv.starts_with("Metadata"));
    assert!(csv.contains("P1,8,80.00,....,....,NZ_CP000001"));
}

#[tokio::test]
async fn test_blast_csv_of_unfinished_job_is_rejected() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let job_id = order_blast(&backend, &session).await;

    let res = get_page(app(&backend), &format!("/blast/jobs/{}/csv", job_id), Some(&session)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let html = body_text(get_page(app(&backend), &format!("/blast/jobs/{}", job_id), Some(&session)).await).await;
    assert!(html.contains("Results are not available yet"));
    assert!(!html.contains("Download CSV"));
}

// ── Taxonomy proxy and health ─────────────────────────────────────────────────

async fn taxon(Path(id): Path<i64>) -> Response {
    match id {
        562 => Json(json!({
            "taxonomy_nodes": [{
                "taxonomy": { "tax_id": 562, "organism_name": "Escherichia coli", "rank": "SPECIES" }
            }]
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_taxonomy() -> String {
    let fake = Router::new().route("/taxonomy/taxon/{id}", get(taxon));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, fake).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_taxonomy_proxy_maps_found_and_missing() {
    let backend = Arc::new(InMemoryBackend::new());
    let url = spawn_taxonomy().await;

    let res = get_page(app_with_taxonomy(&backend, &url), "/api/taxonomy/562", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let record: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(record["species_name"], "Escherichia coli");
    assert_eq!(record["rank"], "species");

    let res = get_page(app_with_taxonomy(&backend, &url), "/api/taxonomy/4242", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = get_page(app_with_taxonomy(&backend, &url), "/api/taxonomy/e.coli", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_taxid_create_fills_species_from_lookup() {
    let backend = Arc::new(InMemoryBackend::new());
    let session = backend.sign_up("lab");
    let url = spawn_taxonomy().await;

    let html = body_text(post_form(app_with_taxonomy(&backend, &url), "/taxids", Some(&session), "taxid=562&species_name=").await).await;
    assert!(html.contains("alert-success"));
    let taxids = backend.list_taxids(&session).await.unwrap();
    assert_eq!(taxids[0].species_name.as_deref(), Some("Escherichia coli"));
}

#[tokio::test]
async fn test_health() {
    let backend = Arc::new(InMemoryBackend::new());
    let res = get_page(app(&backend), "/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["status"], "ok");
}
