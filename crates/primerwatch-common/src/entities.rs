//! Rows owned by the backend datastore.
//! primerwatch only holds short-lived copies of these for rendering.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PrimerwatchError, Result};

// ---------------------------------------------------------------------------
// Assay / reference amplicon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assay {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub target_taxid_id: Option<i64>,
    pub target_gene: Option<String>,
    pub ref_amplicon_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefAmplicon {
    pub id: i64,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub sequence: String,
    pub created_at: DateTime<Utc>,
}

/// `get_assay` joins the amplicon and taxonomy target onto the assay row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssayDetail {
    pub assay: Assay,
    pub ref_amplicon: Option<RefAmplicon>,
    pub taxid: Option<TaxIdEntry>,
    #[serde(default)]
    pub oligo_count: i64,
}

// ---------------------------------------------------------------------------
// Oligo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oligo {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub sequence: String,
    pub assay_id: Option<i64>,   // None = unassigned
    pub panel_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Where a reassignment call should move an oligo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssayAssignment {
    Assay(i64),
    Unassign,
}

impl AssayAssignment {
    /// Value sent as `p_assay_id`; `Unassign` is an explicit null.
    pub fn as_param(&self) -> Option<i64> {
        match self {
            AssayAssignment::Assay(id) => Some(*id),
            AssayAssignment::Unassign => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TaxID
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxIdEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub taxid: i64,
    pub species_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TaxIdEntry {
    pub fn label(&self) -> String {
        match &self.species_name {
            Some(name) if !name.is_empty() => format!("{} ({})", name, self.taxid),
            _ => self.taxid.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Surveillance dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub id: i64,
    pub assay_id: i64,
    #[serde(default)]
    pub assay_name: String,
    pub lookback_days: i32,
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub new_sequences: i64,
    pub queued_job_id: Option<i64>,
}

impl DashboardEntry {
    /// Entries with a queued job cannot be selected until the job completes.
    pub fn is_selectable(&self) -> bool {
        self.queued_job_id.is_none()
    }
}

/// Result of `sync_dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub added: i64,
    pub removed: i64,
}

/// Numeric job-type tag understood by `order_job`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    NewSequenceSearch,
    DivergenceCheck,
}

impl JobKind {
    pub fn tag(&self) -> i16 {
        match self {
            JobKind::NewSequenceSearch => 1,
            JobKind::DivergenceCheck   => 2,
        }
    }

    pub fn from_tag(tag: i16) -> Option<Self> {
        match tag {
            1 => Some(JobKind::NewSequenceSearch),
            2 => Some(JobKind::DivergenceCheck),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::NewSequenceSearch => "New sequence search",
            JobKind::DivergenceCheck   => "Divergence check",
        }
    }
}

// ---------------------------------------------------------------------------
// BLAST aligner jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Working,
    Done,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued  => "queued",
            JobStatus::Working => "working",
            JobStatus::Done    => "done",
        }
    }
}

/// Alignment thresholds and pairwise-aligner scores sent with a BLAST order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastParams {
    pub identity_pct: f64,
    pub coverage_pct: f64,
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub min_oligo_coverage_pct: f64,
}

impl Default for BlastParams {
    fn default() -> Self {
        Self {
            identity_pct: 90.0,
            coverage_pct: 90.0,
            match_score: 2,
            mismatch_score: -3,
            gap_open: -5,
            gap_extend: -2,
            min_oligo_coverage_pct: 80.0,
        }
    }
}

impl BlastParams {
    pub fn validate(&self) -> Result<()> {
        fn pct(label: &str, v: f64) -> Result<()> {
            if !(v > 0.0 && v <= 100.0) {
                return Err(PrimerwatchError::validation(format!(
                    "{} must be greater than 0 and at most 100", label
                )));
            }
            Ok(())
        }
        pct("Identity threshold", self.identity_pct)?;
        pct("Coverage threshold", self.coverage_pct)?;
        pct("Minimum oligo coverage", self.min_oligo_coverage_pct)?;

        if self.match_score <= 0 {
            return Err(PrimerwatchError::validation("Match score must be positive"));
        }
        if self.mismatch_score > 0 {
            return Err(PrimerwatchError::validation("Mismatch score must be zero or negative"));
        }
        if self.gap_open > 0 || self.gap_extend > 0 {
            return Err(PrimerwatchError::validation("Gap penalties must be zero or negative"));
        }
        Ok(())
    }
}

/// Oligo as captured when the job was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OligoSnapshot {
    pub name: String,
    pub sequence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub total_sequences: u64,
    pub sequences_with_hits: u64,
    pub full_matches: u64,
}

impl MatchStatistics {
    pub fn match_rate_pct(&self) -> f64 {
        if self.total_sequences == 0 {
            0.0
        } else {
            self.full_matches as f64 * 100.0 / self.total_sequences as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OligoMatchRate {
    pub name: String,
    pub sequence: String,
    pub matched: u64,
    pub total: u64,
}

impl OligoMatchRate {
    pub fn rate_pct(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.matched as f64 * 100.0 / self.total as f64 }
    }
}

/// One cluster of identical oligo-binding-site variants.
/// `variants` is ordered like `BlastJob::oligos`; `.` marks a matching base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPattern {
    pub count: u64,
    pub percentage: f64,
    pub variants: Vec<String>,
    #[serde(default)]
    pub example_accessions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastResult {
    pub stats: MatchStatistics,
    pub oligo_stats: Vec<OligoMatchRate>,
    pub patterns: Vec<MatchPattern>,
}

/// Row of `get_blast_jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastJobSummary {
    pub id: i64,
    pub status: JobStatus,
    pub assay_id: i64,
    #[serde(default)]
    pub assay_name: String,
    pub taxid: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastJob {
    pub id: i64,
    pub user_id: Uuid,
    pub status: JobStatus,
    pub assay_id: i64,
    #[serde(default)]
    pub assay_name: String,
    pub taxid: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub oligos: Vec<OligoSnapshot>,
    pub reference_sequence: String,
    pub params: BlastParams,
    pub result: Option<BlastResult>,
    pub created_at: DateTime<Utc>,
}

/// Assay eligible for BLAST planning: taxonomy target, amplicon, at least
/// one oligo and no job already attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastCandidate {
    pub assay_id: i64,
    pub assay_name: String,
    pub taxid: i64,
    pub species_name: Option<String>,
    pub oligo_count: i64,
    pub amplicon_length: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_tags_roundtrip() {
        for kind in [JobKind::NewSequenceSearch, JobKind::DivergenceCheck] {
            assert_eq!(JobKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(JobKind::from_tag(9), None);
    }

    #[test]
    fn test_default_blast_params_are_valid() {
        assert!(BlastParams::default().validate().is_ok());
    }

    #[test]
    fn test_blast_params_reject_positive_mismatch() {
        let params = BlastParams { mismatch_score: 1, ..BlastParams::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_blast_params_reject_out_of_range_identity() {
        let params = BlastParams { identity_pct: 120.0, ..BlastParams::default() };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("Identity threshold"));
    }

    #[test]
    fn test_job_status_wire_format() {
        let s: JobStatus = serde_json::from_str("\"working\"").unwrap();
        assert_eq!(s, JobStatus::Working);
        assert_eq!(serde_json::to_string(&JobStatus::Done).unwrap(), "\"done\"");
    }

    #[test]
    fn test_unassign_is_explicit_null() {
        assert_eq!(AssayAssignment::Unassign.as_param(), None);
        assert_eq!(AssayAssignment::Assay(3).as_param(), Some(3));
    }
}
