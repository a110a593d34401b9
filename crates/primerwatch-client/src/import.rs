//! Bulk oligo import from multi-record FASTA text.
//!
//! Each record is validated locally and, if valid, submitted on its own to
//! `create_oligo`. Failures are collected per record without stopping the rest.

use serde::Serialize;
use tracing::info;

use primerwatch_common::backend::{NewOligo, Session, SurveillanceBackend};
use primerwatch_common::entities::Oligo;
use primerwatch_common::error::{PrimerwatchError, Result};
use primerwatch_common::fasta::{parse_fasta, FastaError};
use primerwatch_common::sequence::require_sequence;

use crate::batch::{run_batch, BatchFailure};

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub created: Vec<Oligo>,
    /// One entry per failing record, in file order. `index` is the record position.
    pub failures: Vec<BatchFailure>,
}

impl ImportReport {
    pub fn success_count(&self) -> usize {
        self.created.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

pub async fn import_oligos(
    backend: &dyn SurveillanceBackend,
    session: &Session,
    text: &str,
    assay_id: Option<i64>,
    concurrency: usize,
) -> Result<ImportReport> {
    let records = parse_fasta(text);
    if records.is_empty() {
        return Err(PrimerwatchError::validation(FastaError::Empty.to_string()));
    }
    let total = records.len();

    let mut failures = Vec::new();
    let mut pending: Vec<(usize, NewOligo)> = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match require_sequence(&record.sequence) {
            Ok(sequence) => pending.push((index, NewOligo { name: record.name, sequence, assay_id })),
            Err(e) => failures.push(BatchFailure { index, label: record.name, message: e.to_string() }),
        }
    }

    let positions: Vec<usize> = pending.iter().map(|(i, _)| *i).collect();
    let oligos: Vec<NewOligo> = pending.into_iter().map(|(_, o)| o).collect();
    let report = run_batch(oligos, concurrency, |o| o.name.clone(), |oligo| async move {
        backend.create_oligo(session, &oligo).await
    })
    .await;

    failures.extend(report.failures.into_iter().map(|f| BatchFailure { index: positions[f.index], ..f }));
    failures.sort_by_key(|f| f.index);

    info!(total, created = report.succeeded.len(), failed = failures.len(), "oligo import finished");
    Ok(ImportReport { total, created: report.succeeded, failures })
}
