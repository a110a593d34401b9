//! Contract of the external backend: authentication plus the remote
//! procedures that own every assay, oligo, TaxID, dashboard and BLAST row.
//!
//! Implementations:
//!   `primerwatch_client::RpcClient`             PostgREST/GoTrue over HTTP
//!   `primerwatch_test_utils::InMemoryBackend`   rule-enforcing fake for tests

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::*;
use crate::error::{PrimerwatchError, Result};

// ── Session ───────────────────────────────────────────────────────────────────

/// Caller identity passed explicitly to every backend call.
#[derive(Debug, Default)]
pub struct Session {
    access_token: Option<SecretString>,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(SecretString::from(token.into())),
            user_id: None,
            email: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Access token, or `NotAuthenticated` before any call is issued.
    pub fn token(&self) -> Result<&str> {
        self.access_token
            .as_ref()
            .map(|t| t.expose_secret())
            .ok_or(PrimerwatchError::NotAuthenticated)
    }

    /// Copy for handing to a background task.
    pub fn duplicate(&self) -> Self {
        Self {
            access_token: self
                .access_token
                .as_ref()
                .map(|t| SecretString::from(t.expose_secret().to_string())),
            user_id: self.user_id,
            email: self.email.clone(),
        }
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssay {
    pub name: String,
    pub target_taxid_id: Option<i64>,
    pub target_gene: Option<String>,
    pub ref_name: Option<String>,
    pub ref_sequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOligo {
    pub name: String,
    pub sequence: String,
    pub assay_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTaxId {
    pub taxid: i64,
    pub species_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOrder {
    pub entry_id: i64,
    pub kind: JobKind,
    pub lookback_days: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastOrder {
    pub assay_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub params: BlastParams,
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// Authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    async fn sign_out(&self, session: &Session) -> Result<()>;
}

/// Remote procedures. Every business rule (ownership, uniqueness, cascades,
/// alphabet) is enforced behind this trait.
#[async_trait]
pub trait SurveillanceBackend: Send + Sync {
    // assays
    async fn create_assay(&self, session: &Session, assay: &NewAssay) -> Result<Assay>;
    async fn list_assays(&self, session: &Session) -> Result<Vec<Assay>>;
    async fn get_assay(&self, session: &Session, assay_id: i64) -> Result<AssayDetail>;
    async fn delete_assay(&self, session: &Session, assay_id: i64) -> Result<()>;

    // oligos
    async fn create_oligo(&self, session: &Session, oligo: &NewOligo) -> Result<Oligo>;
    async fn list_oligos(&self, session: &Session) -> Result<Vec<Oligo>>;
    async fn delete_oligo(&self, session: &Session, oligo_id: i64) -> Result<()>;
    async fn reassign_oligo(
        &self,
        session: &Session,
        oligo_id: i64,
        target: AssayAssignment,
    ) -> Result<Oligo>;

    // taxids
    async fn create_taxid(&self, session: &Session, entry: &NewTaxId) -> Result<TaxIdEntry>;
    async fn list_taxids(&self, session: &Session) -> Result<Vec<TaxIdEntry>>;
    async fn delete_taxid(&self, session: &Session, taxid_id: i64) -> Result<()>;

    // dashboard
    async fn sync_dashboard(&self, session: &Session) -> Result<SyncSummary>;
    async fn read_dashboard(&self, session: &Session) -> Result<Vec<DashboardEntry>>;
    async fn order_job(&self, session: &Session, order: &JobOrder) -> Result<i64>;

    // BLAST
    async fn list_blast_candidates(&self, session: &Session) -> Result<Vec<BlastCandidate>>;
    async fn order_blast_job(&self, session: &Session, order: &BlastOrder) -> Result<i64>;
    async fn list_blast_jobs(&self, session: &Session) -> Result<Vec<BlastJobSummary>>;
    async fn get_blast_job(&self, session: &Session, job_id: i64) -> Result<BlastJob>;
}
