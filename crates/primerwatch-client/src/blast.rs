//! BLAST planning: turn the order form into one validated order per assay.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use primerwatch_common::backend::{BlastOrder, Session, SurveillanceBackend};
use primerwatch_common::entities::{BlastCandidate, BlastParams};
use primerwatch_common::error::{PrimerwatchError, Result};

use crate::batch::{run_batch, BatchReport};

/// Submitted planning form. `assay_ids` are the checked candidate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastOrderForm {
    pub assay_ids: Vec<i64>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub params: BlastParams,
}

/// Default search window ending today.
pub fn default_window(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(days.max(0)), today)
}

pub fn build_orders(form: &BlastOrderForm, today: NaiveDate) -> Result<Vec<BlastOrder>> {
    if form.assay_ids.is_empty() {
        return Err(PrimerwatchError::validation("Select at least one assay"));
    }
    if form.date_from > form.date_to {
        return Err(PrimerwatchError::validation("Start date must not be after end date"));
    }
    if form.date_to > today {
        return Err(PrimerwatchError::validation("End date must not be in the future"));
    }
    form.params.validate()?;

    let mut ids = form.assay_ids.clone();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids
        .into_iter()
        .map(|assay_id| BlastOrder {
            assay_id,
            date_from: form.date_from,
            date_to: form.date_to,
            params: form.params.clone(),
        })
        .collect())
}

/// Validate the form and order one job per assay. Returns the new job ids.
pub async fn order_blast_jobs(
    backend: &dyn SurveillanceBackend,
    session: &Session,
    form: &BlastOrderForm,
    candidates: &[BlastCandidate],
    today: NaiveDate,
    concurrency: usize,
) -> Result<BatchReport<i64>> {
    let orders = build_orders(form, today)?;
    let label = |order: &BlastOrder| {
        candidates
            .iter()
            .find(|c| c.assay_id == order.assay_id)
            .map(|c| c.assay_name.clone())
            .unwrap_or_else(|| format!("assay {}", order.assay_id))
    };

    let report = run_batch(orders, concurrency, label, |order| async move {
        backend.order_blast_job(session, &order).await
    })
    .await;
    info!(ordered = report.success_count(), failed = report.failure_count(), "BLAST jobs ordered");
    Ok(report)
}
