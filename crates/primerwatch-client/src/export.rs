//! CSV export of a finished BLAST job.

use primerwatch_common::entities::BlastJob;
use primerwatch_common::error::{PrimerwatchError, Result};

fn csv_error(e: impl std::fmt::Display) -> PrimerwatchError {
    PrimerwatchError::Other(anyhow::anyhow!("CSV export failed: {}", e))
}

pub fn csv_file_name(job: &BlastJob) -> String {
    format!("blast_job_{}.csv", job.id)
}

/// Render metadata, statistics, per-oligo rates, parameters and match
/// patterns. Each block starts with a one-cell title row.
pub fn export_blast_csv(job: &BlastJob) -> Result<String> {
    let result = job.result.as_ref().ok_or_else(|| {
        PrimerwatchError::validation(format!("BLAST job {} has no result to export", job.id))
    })?;

    let mut w = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    let mut row = |fields: Vec<String>| w.write_record(&fields).map_err(csv_error);

    row(vec!["Metadata".into()])?;
    row(vec!["Job ID".into(), job.id.to_string()])?;
    row(vec!["Assay".into(), job.assay_name.clone()])?;
    row(vec!["TaxID".into(), job.taxid.to_string()])?;
    row(vec!["Date from".into(), job.date_from.to_string()])?;
    row(vec!["Date to".into(), job.date_to.to_string()])?;
    row(vec!["Status".into(), job.status.as_str().into()])?;
    row(vec!["Created".into(), job.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()])?;

    let stats = &result.stats;
    row(vec!["Statistics".into()])?;
    row(vec!["Total sequences".into(), stats.total_sequences.to_string()])?;
    row(vec!["Sequences with hits".into(), stats.sequences_with_hits.to_string()])?;
    row(vec!["Full matches".into(), stats.full_matches.to_string()])?;
    row(vec!["Overall match rate (%)".into(), format!("{:.2}", stats.match_rate_pct())])?;

    row(vec!["Oligo statistics".into()])?;
    row(["Oligo", "Sequence", "Matched", "Total", "Match rate (%)"].map(String::from).to_vec())?;
    for oligo in &result.oligo_stats {
        row(vec![
            oligo.name.clone(),
            oligo.sequence.clone(),
            oligo.matched.to_string(),
            oligo.total.to_string(),
            format!("{:.2}", oligo.rate_pct()),
        ])?;
    }

    let p = &job.params;
    row(vec!["Parameters".into()])?;
    row(vec!["Identity threshold (%)".into(), p.identity_pct.to_string()])?;
    row(vec!["Coverage threshold (%)".into(), p.coverage_pct.to_string()])?;
    row(vec!["Match score".into(), p.match_score.to_string()])?;
    row(vec!["Mismatch score".into(), p.mismatch_score.to_string()])?;
    row(vec!["Gap open".into(), p.gap_open.to_string()])?;
    row(vec!["Gap extend".into(), p.gap_extend.to_string()])?;
    row(vec!["Min oligo coverage (%)".into(), p.min_oligo_coverage_pct.to_string()])?;

    row(vec!["Patterns".into()])?;
    let mut header = vec!["Pattern".to_string(), "Count".into(), "Percentage".into()];
    header.extend(job.oligos.iter().map(|o| o.name.clone()));
    header.push("Example accessions".into());
    row(header)?;

    let mut sequences = vec!["Sequence".to_string(), String::new(), String::new()];
    sequences.extend(job.oligos.iter().map(|o| o.sequence.clone()));
    sequences.push(String::new());
    row(sequences)?;

    for (i, pattern) in result.patterns.iter().enumerate() {
        let mut fields = vec![
            format!("P{}", i + 1),
            pattern.count.to_string(),
            format!("{:.2}", pattern.percentage),
        ];
        fields.extend(pattern.variants.iter().cloned());
        fields.push(pattern.example_accessions.join("; "));
        row(fields)?;
    }

    let bytes = w.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}
