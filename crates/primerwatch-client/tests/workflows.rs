//! Multi-select workflows against the in-memory backend.

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use primerwatch_client::blast::{order_blast_jobs, BlastOrderForm};
use primerwatch_client::dashboard::{refresh, submit_jobs};
use primerwatch_client::{run_batch, DashboardSelection};
use primerwatch_common::backend::SurveillanceBackend;
use primerwatch_common::entities::{AssayAssignment, BlastParams, JobKind};
use primerwatch_common::PrimerwatchError;
use primerwatch_test_utils::InMemoryBackend;

#[tokio::test]
async fn test_refresh_then_submit_skips_nothing_and_blocks_resubmit() {
    let backend = InMemoryBackend::new();
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    backend.seed_assay(&session, "rpoB", "GGCC").await;

    let view = refresh(&backend, &session).await.unwrap();
    assert_eq!(view.sync.added, 2);
    assert_eq!(view.entries.len(), 2);

    let mut selection = DashboardSelection::default();
    selection.toggle_all(&view.entries);
    let report = submit_jobs(&backend, &session, &selection, &view.entries, JobKind::DivergenceCheck, 90, 4)
        .await
        .unwrap();
    assert_eq!(report.success_count(), 2);
    assert_eq!(backend.job_kind(report.succeeded[0]), Some(JobKind::DivergenceCheck));

    // Rows now carry a job pointer and drop out of the selection.
    let view = refresh(&backend, &session).await.unwrap();
    assert_eq!(view.sync.added, 0);
    selection.reconcile(&view.entries);
    assert!(selection.is_empty());
    selection.toggle_all(&view.entries);
    assert!(selection.is_empty());

    // A stale selection submitted anyway is rejected per entry by the backend.
    let stale = DashboardSelection::from_ids(
        view.entries.iter().map(|e| e.id),
        &view.entries.iter().cloned().map(|mut e| { e.queued_job_id = None; e }).collect::<Vec<_>>(),
    );
    let report = submit_jobs(&backend, &session, &stale, &view.entries, JobKind::NewSequenceSearch, 30, 2)
        .await
        .unwrap();
    assert_eq!(report.failure_count(), 2);
    assert!(report.failures[0].message.contains("already has a queued job"));
}

#[tokio::test]
async fn test_submit_validates_lookback_before_calling() {
    let backend = InMemoryBackend::new();
    let session = backend.sign_up("lab");
    backend.seed_assay(&session, "16S", "ACGT").await;
    let view = refresh(&backend, &session).await.unwrap();
    let selection = DashboardSelection::from_ids([view.entries[0].id], &view.entries);

    let err = submit_jobs(&backend, &session, &selection, &view.entries, JobKind::NewSequenceSearch, 0, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, PrimerwatchError::Validation(_)));
    assert_eq!(backend.call_count("order_job"), 0);
}

#[tokio::test]
async fn test_bulk_unassign_partial_failure() {
    let backend = InMemoryBackend::new();
    let alice = backend.sign_up("alice");
    let bob = backend.sign_up("bob");
    let assay = backend.seed_assay(&alice, "16S", "ACGT").await;

    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let oligo = backend
            .create_oligo(&alice, &primerwatch_common::backend::NewOligo {
                name: name.into(),
                sequence: "ACGT".into(),
                assay_id: Some(assay.id),
            })
            .await
            .unwrap();
        ids.push(oligo.id);
    }
    let foreign = backend
        .create_oligo(&bob, &primerwatch_common::backend::NewOligo {
            name: "x".into(),
            sequence: "ACGT".into(),
            assay_id: None,
        })
        .await
        .unwrap();
    ids.insert(1, foreign.id);

    let report = run_batch(ids, 2, |id| id.to_string(), |id| {
        let backend = &backend;
        let alice = &alice;
        async move { backend.reassign_oligo(alice, id, AssayAssignment::Unassign).await }
    })
    .await;

    assert_eq!(report.success_count(), 3);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert!(report.succeeded.iter().all(|o| o.assay_id.is_none()));
}

#[tokio::test]
async fn test_order_blast_jobs_for_candidates() {
    let backend = InMemoryBackend::new();
    let session = backend.sign_up("lab");
    let a = backend.seed_blast_ready_assay(&session, "A", 562, &[("fwd", "ACGT"), ("rev", "TTGG")]).await;
    let b = backend.seed_blast_ready_assay(&session, "B", 1280, &[("probe", "CCAA")]).await;

    let candidates = backend.list_blast_candidates(&session).await.unwrap();
    assert_eq!(candidates.len(), 2);

    let today = Utc::now().date_naive();
    let form = BlastOrderForm {
        assay_ids: vec![a.id, b.id],
        date_from: today - Duration::days(30),
        date_to: today,
        params: BlastParams::default(),
    };
    let report = order_blast_jobs(&backend, &session, &form, &candidates, today, 4).await.unwrap();
    assert_eq!(report.success_count(), 2);

    // Both assays now have an active job and are no longer candidates.
    assert!(backend.list_blast_candidates(&session).await.unwrap().is_empty());
    let report = order_blast_jobs(&backend, &session, &form, &candidates, today, 4).await.unwrap();
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.failures[0].label, "A");

    let jobs = backend.list_blast_jobs(&session).await.unwrap();
    assert_eq!(jobs.len(), 2);
}
