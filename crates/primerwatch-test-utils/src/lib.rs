//! primerwatch-test-utils: an in-memory stand-in for the managed backend.
//!
//! `InMemoryBackend` implements `AuthProvider` and `SurveillanceBackend`
//! with the same ownership, uniqueness and cascade rules the stored
//! procedures apply, and produces errors through `classify_backend_message`
//! so callers see exactly what the HTTP client would hand them.
//!
//! Test hooks: failure injection, per-function call counts, artificial
//! dashboard latency with in-flight tracking, and helpers that move jobs
//! along the way the external workers would.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use primerwatch_common::backend::*;
use primerwatch_common::entities::*;
use primerwatch_common::error::{classify_backend_message, PrimerwatchError, Result};
use primerwatch_common::sequence::require_sequence;

pub const DEFAULT_PASSWORD: &str = "password";
pub const DEFAULT_LOOKBACK_DAYS: i32 = 30;

#[derive(Debug, Clone)]
struct User {
    id: Uuid,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct EntryRow {
    user_id: Uuid,
    entry: DashboardEntry,
}

#[derive(Debug, Clone)]
struct JobRow {
    entry_id: i64,
    kind: JobKind,
    status: JobStatus,
}

#[derive(Default)]
struct State {
    next_id: i64,
    users: HashMap<String, User>,
    assays: BTreeMap<i64, Assay>,
    amplicons: BTreeMap<i64, RefAmplicon>,
    oligos: BTreeMap<i64, Oligo>,
    taxids: BTreeMap<i64, TaxIdEntry>,
    entries: BTreeMap<i64, EntryRow>,
    jobs: BTreeMap<i64, JobRow>,
    blast_jobs: BTreeMap<i64, BlastJob>,
    failures: HashMap<(String, String), String>,
    calls: HashMap<String, usize>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, function: &str) {
        *self.calls.entry(function.to_string()).or_default() += 1;
    }

    fn user(&self, session: &Session) -> Result<Uuid> {
        let token = session.token()?;
        self.users.get(token).map(|u| u.id).ok_or(PrimerwatchError::NotAuthenticated)
    }

    /// Injected failure for `key`, or for the wildcard `*`.
    fn injected(&self, function: &str, key: &str) -> Result<()> {
        let hit = self
            .failures
            .get(&(function.to_string(), key.to_string()))
            .or_else(|| self.failures.get(&(function.to_string(), "*".to_string())));
        match hit {
            Some(message) => Err(reject(message)),
            None => Ok(()),
        }
    }

    fn owned_assay(&self, user: Uuid, assay_id: i64) -> Result<&Assay> {
        let assay = self
            .assays
            .get(&assay_id)
            .ok_or_else(|| reject(&format!("assay_id {} does not exist", assay_id)))?;
        if assay.user_id != user {
            return Err(reject(&format!("assay_id {} does not belong to you", assay_id)));
        }
        Ok(assay)
    }

    fn owned_oligo(&self, user: Uuid, oligo_id: i64) -> Result<&Oligo> {
        let oligo = self
            .oligos
            .get(&oligo_id)
            .ok_or_else(|| reject(&format!("oligo_id {} does not exist", oligo_id)))?;
        if oligo.user_id != user {
            return Err(reject(&format!("oligo_id {} does not belong to you", oligo_id)));
        }
        Ok(oligo)
    }

    fn owned_taxid(&self, user: Uuid, taxid_id: i64) -> Result<&TaxIdEntry> {
        let entry = self
            .taxids
            .get(&taxid_id)
            .ok_or_else(|| reject(&format!("taxid_id {} does not exist", taxid_id)))?;
        if entry.user_id != user {
            return Err(reject(&format!("taxid_id {} does not belong to you", taxid_id)));
        }
        Ok(entry)
    }

    fn oligos_of(&self, assay_id: i64) -> impl Iterator<Item = &Oligo> {
        self.oligos.values().filter(move |o| o.assay_id == Some(assay_id))
    }

    fn has_active_blast_job(&self, assay_id: i64) -> bool {
        self.blast_jobs
            .values()
            .any(|j| j.assay_id == assay_id && j.status != JobStatus::Done)
    }

    fn candidate(&self, assay: &Assay) -> Option<BlastCandidate> {
        let taxid = self.taxids.get(&assay.target_taxid_id?)?;
        let amplicon = self.amplicons.get(&assay.ref_amplicon_id?)?;
        let oligo_count = self.oligos_of(assay.id).count() as i64;
        if oligo_count == 0 || self.has_active_blast_job(assay.id) {
            return None;
        }
        Some(BlastCandidate {
            assay_id: assay.id,
            assay_name: assay.name.clone(),
            taxid: taxid.taxid,
            species_name: taxid.species_name.clone(),
            oligo_count,
            amplicon_length: amplicon.sequence.len() as i64,
        })
    }

    fn entry_view(&self, row: &EntryRow) -> DashboardEntry {
        let mut entry = row.entry.clone();
        entry.assay_name = self
            .assays
            .get(&entry.assay_id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        entry
    }
}

/// Errors take the same path as messages raised by the stored procedures.
fn reject(message: &str) -> PrimerwatchError {
    classify_backend_message(400, message)
}

fn normalized(sequence: &str) -> Result<String> {
    require_sequence(sequence).map_err(|e| reject(&e.to_string()))
}

fn required(label: &str, value: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(reject(&format!("{} is required", label)));
    }
    Ok(v.to_string())
}

pub struct InMemoryBackend {
    state: Mutex<State>,
    read_latency: Mutex<Duration>,
    reads_in_flight: AtomicUsize,
    peak_reads_in_flight: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            read_latency: Mutex::new(Duration::ZERO),
            reads_in_flight: AtomicUsize::new(0),
            peak_reads_in_flight: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Fixtures ─────────────────────────────────────────────────────────────

    /// Register `<name>@example.org` with `DEFAULT_PASSWORD` and return a live session.
    pub fn sign_up(&self, name: &str) -> Session {
        let email = format!("{}@example.org", name);
        self.register(&email, DEFAULT_PASSWORD)
    }

    pub fn register(&self, email: &str, password: &str) -> Session {
        let user = User { id: Uuid::new_v4(), email: email.to_string(), password: password.to_string() };
        let token = format!("token-{}", user.id);
        let mut session = Session::bearer(token.clone());
        session.user_id = Some(user.id);
        session.email = Some(user.email.clone());
        self.state().users.insert(token, user);
        session
    }

    pub async fn seed_assay(&self, session: &Session, name: &str, amplicon: &str) -> Assay {
        let draft = NewAssay {
            name: name.to_string(),
            target_taxid_id: None,
            target_gene: None,
            ref_name: Some(format!("{}_ref", name)),
            ref_sequence: amplicon.to_string(),
        };
        match self.create_assay(session, &draft).await {
            Ok(assay) => assay,
            Err(e) => panic!("seed_assay({}) failed: {}", name, e),
        }
    }

    /// Assay with a TaxID target and `oligos` attached, i.e. a BLAST candidate.
    pub async fn seed_blast_ready_assay(
        &self,
        session: &Session,
        name: &str,
        taxid: i64,
        oligos: &[(&str, &str)],
    ) -> Assay {
        let result = async {
            let entry = self
                .create_taxid(session, &NewTaxId { taxid, species_name: Some(format!("Species {}", taxid)) })
                .await?;
            let assay = self
                .create_assay(session, &NewAssay {
                    name: name.to_string(),
                    target_taxid_id: Some(entry.id),
                    target_gene: Some("16S".to_string()),
                    ref_name: Some(format!("{}_ref", name)),
                    ref_sequence: "ACGTACGTACGTACGT".to_string(),
                })
                .await?;
            for (oligo_name, sequence) in oligos {
                self.create_oligo(session, &NewOligo {
                    name: oligo_name.to_string(),
                    sequence: sequence.to_string(),
                    assay_id: Some(assay.id),
                })
                .await?;
            }
            Ok::<_, PrimerwatchError>(assay)
        }
        .await;
        match result {
            Ok(assay) => assay,
            Err(e) => panic!("seed_blast_ready_assay({}) failed: {}", name, e),
        }
    }

    /// Make `function` fail for the item keyed `key` (a name or an id; `*` for all).
    pub fn inject_failure(&self, function: &str, key: &str, message: &str) {
        self.state()
            .failures
            .insert((function.to_string(), key.to_string()), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Number of times the named remote procedure was invoked.
    pub fn call_count(&self, function: &str) -> usize {
        self.state().calls.get(function).copied().unwrap_or(0)
    }

    pub fn set_read_latency(&self, latency: Duration) {
        *self.read_latency.lock().unwrap_or_else(|p| p.into_inner()) = latency;
    }

    /// Highest number of concurrent `get_dashboard` calls seen so far.
    pub fn peak_reads_in_flight(&self) -> usize {
        self.peak_reads_in_flight.load(Ordering::SeqCst)
    }

    /// Finish a surveillance job as the external worker would.
    pub fn complete_job(&self, job_id: i64, new_sequences: i64) {
        let mut state = self.state();
        let Some(job) = state.jobs.get_mut(&job_id) else { return };
        job.status = JobStatus::Done;
        let entry_id = job.entry_id;
        if let Some(row) = state.entries.get_mut(&entry_id) {
            row.entry.queued_job_id = None;
            row.entry.last_checked = Some(Utc::now());
            row.entry.new_sequences = new_sequences;
        }
    }

    pub fn job_kind(&self, job_id: i64) -> Option<JobKind> {
        self.state().jobs.get(&job_id).map(|j| j.kind)
    }

    pub fn finish_blast_job(&self, job_id: i64, result: BlastResult) {
        if let Some(job) = self.state().blast_jobs.get_mut(&job_id) {
            job.status = JobStatus::Done;
            job.result = Some(result);
        }
    }
}

#[async_trait]
impl AuthProvider for InMemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let state = self.state();
        let found = state
            .users
            .iter()
            .find(|(_, u)| u.email.eq_ignore_ascii_case(email.trim()) && u.password == password);
        match found {
            Some((token, user)) => {
                let mut session = Session::bearer(token.clone());
                session.user_id = Some(user.id);
                session.email = Some(user.email.clone());
                Ok(session)
            }
            None => Err(PrimerwatchError::validation("Invalid login credentials")),
        }
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        let state = self.state();
        state.user(session)?;
        Ok(())
    }
}

#[async_trait]
impl SurveillanceBackend for InMemoryBackend {
    async fn create_assay(&self, session: &Session, assay: &NewAssay) -> Result<Assay> {
        let mut state = self.state();
        state.record("create_assay");
        let user = state.user(session)?;
        let name = required("Assay name", &assay.name)?;
        state.injected("create_assay", &name)?;
        if state.assays.values().any(|a| a.user_id == user && a.name == name) {
            return Err(reject(&format!("Assay name \"{}\" already exists", name)));
        }
        if let Some(taxid_id) = assay.target_taxid_id {
            state.owned_taxid(user, taxid_id)?;
        }
        let sequence = normalized(&assay.ref_sequence)?;

        let now = Utc::now();
        let amplicon_id = state.next_id();
        state.amplicons.insert(amplicon_id, RefAmplicon {
            id: amplicon_id,
            user_id: user,
            name: assay.ref_name.clone(),
            sequence,
            created_at: now,
        });
        let id = state.next_id();
        let row = Assay {
            id,
            user_id: user,
            name,
            target_taxid_id: assay.target_taxid_id,
            target_gene: assay.target_gene.clone(),
            ref_amplicon_id: Some(amplicon_id),
            created_at: now,
        };
        state.assays.insert(id, row.clone());
        debug!(assay_id = id, "in-memory assay created");
        Ok(row)
    }

    async fn list_assays(&self, session: &Session) -> Result<Vec<Assay>> {
        let mut state = self.state();
        state.record("get_assays");
        let user = state.user(session)?;
        Ok(state.assays.values().filter(|a| a.user_id == user).cloned().collect())
    }

    async fn get_assay(&self, session: &Session, assay_id: i64) -> Result<AssayDetail> {
        let mut state = self.state();
        state.record("get_assay");
        let user = state.user(session)?;
        let assay = state.owned_assay(user, assay_id)?.clone();
        let ref_amplicon = assay.ref_amplicon_id.and_then(|id| state.amplicons.get(&id).cloned());
        let taxid = assay.target_taxid_id.and_then(|id| state.taxids.get(&id).cloned());
        let oligo_count = state.oligos_of(assay_id).count() as i64;
        Ok(AssayDetail { assay, ref_amplicon, taxid, oligo_count })
    }

    async fn delete_assay(&self, session: &Session, assay_id: i64) -> Result<()> {
        let mut state = self.state();
        state.record("delete_assay");
        let user = state.user(session)?;
        state.injected("delete_assay", &assay_id.to_string())?;
        let assay = state.owned_assay(user, assay_id)?.clone();

        state.assays.remove(&assay_id);
        if let Some(amplicon_id) = assay.ref_amplicon_id {
            state.amplicons.remove(&amplicon_id);
        }
        state.oligos.retain(|_, o| o.assay_id != Some(assay_id));
        Ok(())
    }

    async fn create_oligo(&self, session: &Session, oligo: &NewOligo) -> Result<Oligo> {
        let mut state = self.state();
        state.record("create_oligo");
        let user = state.user(session)?;
        let name = required("Sequence name", &oligo.name)?;
        state.injected("create_oligo", &name)?;
        if let Some(assay_id) = oligo.assay_id {
            state.owned_assay(user, assay_id)?;
        }
        let sequence = normalized(&oligo.sequence)?;

        let id = state.next_id();
        let row = Oligo {
            id,
            user_id: user,
            name,
            sequence,
            assay_id: oligo.assay_id,
            panel_id: None,
            created_at: Utc::now(),
        };
        state.oligos.insert(id, row.clone());
        Ok(row)
    }

    async fn list_oligos(&self, session: &Session) -> Result<Vec<Oligo>> {
        let mut state = self.state();
        state.record("get_oligos");
        let user = state.user(session)?;
        Ok(state.oligos.values().filter(|o| o.user_id == user).cloned().collect())
    }

    async fn delete_oligo(&self, session: &Session, oligo_id: i64) -> Result<()> {
        let mut state = self.state();
        state.record("delete_oligo");
        let user = state.user(session)?;
        state.injected("delete_oligo", &oligo_id.to_string())?;
        state.owned_oligo(user, oligo_id)?;
        state.oligos.remove(&oligo_id);
        Ok(())
    }

    async fn reassign_oligo(
        &self,
        session: &Session,
        oligo_id: i64,
        target: AssayAssignment,
    ) -> Result<Oligo> {
        let mut state = self.state();
        state.record("reassign_oligo");
        let user = state.user(session)?;
        state.injected("reassign_oligo", &oligo_id.to_string())?;
        state.owned_oligo(user, oligo_id)?;
        if let AssayAssignment::Assay(assay_id) = target {
            state.owned_assay(user, assay_id)?;
        }
        let oligo = state
            .oligos
            .get_mut(&oligo_id)
            .ok_or_else(|| reject(&format!("oligo_id {} does not exist", oligo_id)))?;
        oligo.assay_id = target.as_param();
        Ok(oligo.clone())
    }

    async fn create_taxid(&self, session: &Session, entry: &NewTaxId) -> Result<TaxIdEntry> {
        let mut state = self.state();
        state.record("create_taxid");
        let user = state.user(session)?;
        state.injected("create_taxid", &entry.taxid.to_string())?;
        if entry.taxid <= 0 {
            return Err(reject("taxid must be a positive integer"));
        }
        if state.taxids.values().any(|t| t.user_id == user && t.taxid == entry.taxid) {
            return Err(reject(&format!("TaxID {} already exists", entry.taxid)));
        }
        let id = state.next_id();
        let row = TaxIdEntry {
            id,
            user_id: user,
            taxid: entry.taxid,
            species_name: entry.species_name.clone(),
            created_at: Utc::now(),
        };
        state.taxids.insert(id, row.clone());
        Ok(row)
    }

    async fn list_taxids(&self, session: &Session) -> Result<Vec<TaxIdEntry>> {
        let mut state = self.state();
        state.record("get_taxids");
        let user = state.user(session)?;
        Ok(state.taxids.values().filter(|t| t.user_id == user).cloned().collect())
    }

    async fn delete_taxid(&self, session: &Session, taxid_id: i64) -> Result<()> {
        let mut state = self.state();
        state.record("delete_taxid");
        let user = state.user(session)?;
        state.injected("delete_taxid", &taxid_id.to_string())?;
        state.owned_taxid(user, taxid_id)?;
        state.taxids.remove(&taxid_id);
        for assay in state.assays.values_mut() {
            if assay.target_taxid_id == Some(taxid_id) {
                assay.target_taxid_id = None;
            }
        }
        Ok(())
    }

    async fn sync_dashboard(&self, session: &Session) -> Result<SyncSummary> {
        let mut state = self.state();
        state.record("sync_dashboard");
        let user = state.user(session)?;
        state.injected("sync_dashboard", "*")?;

        let before = state.entries.len();
        let assays = state.assays.clone();
        state
            .entries
            .retain(|_, row| row.user_id != user || assays.contains_key(&row.entry.assay_id));
        let removed = (before - state.entries.len()) as i64;

        let tracked: Vec<i64> = state
            .entries
            .values()
            .filter(|row| row.user_id == user)
            .map(|row| row.entry.assay_id)
            .collect();
        let mut added = 0;
        for assay in assays.values().filter(|a| a.user_id == user && !tracked.contains(&a.id)) {
            let id = state.next_id();
            state.entries.insert(id, EntryRow {
                user_id: user,
                entry: DashboardEntry {
                    id,
                    assay_id: assay.id,
                    assay_name: assay.name.clone(),
                    lookback_days: DEFAULT_LOOKBACK_DAYS,
                    last_checked: None,
                    new_sequences: 0,
                    queued_job_id: None,
                },
            });
            added += 1;
        }
        Ok(SyncSummary { added, removed })
    }

    async fn read_dashboard(&self, session: &Session) -> Result<Vec<DashboardEntry>> {
        let user = {
            let mut state = self.state();
            state.record("get_dashboard");
            state.user(session)?
        };

        let now = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_reads_in_flight.fetch_max(now, Ordering::SeqCst);
        let latency = *self.read_latency.lock().unwrap_or_else(|p| p.into_inner());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);

        let state = self.state();
        state.injected("get_dashboard", "*")?;
        Ok(state
            .entries
            .values()
            .filter(|row| row.user_id == user)
            .map(|row| state.entry_view(row))
            .collect())
    }

    async fn order_job(&self, session: &Session, order: &JobOrder) -> Result<i64> {
        let mut state = self.state();
        state.record("order_job");
        let user = state.user(session)?;
        state.injected("order_job", &order.entry_id.to_string())?;
        if !(1..=3650).contains(&order.lookback_days) {
            return Err(reject("lookback_days must be between 1 and 3650"));
        }
        let row = state
            .entries
            .get(&order.entry_id)
            .ok_or_else(|| reject(&format!("entry_id {} does not exist", order.entry_id)))?;
        if row.user_id != user {
            return Err(reject(&format!("entry_id {} does not belong to you", order.entry_id)));
        }
        if row.entry.queued_job_id.is_some() {
            return Err(reject(&format!("Entry {} already has a queued job", order.entry_id)));
        }

        let job_id = state.next_id();
        state.jobs.insert(job_id, JobRow {
            entry_id: order.entry_id,
            kind: order.kind,
            status: JobStatus::Queued,
        });
        if let Some(row) = state.entries.get_mut(&order.entry_id) {
            row.entry.queued_job_id = Some(job_id);
            row.entry.lookback_days = order.lookback_days;
        }
        Ok(job_id)
    }

    async fn list_blast_candidates(&self, session: &Session) -> Result<Vec<BlastCandidate>> {
        let mut state = self.state();
        state.record("get_blast_candidates");
        let user = state.user(session)?;
        Ok(state
            .assays
            .values()
            .filter(|a| a.user_id == user)
            .filter_map(|a| state.candidate(a))
            .collect())
    }

    async fn order_blast_job(&self, session: &Session, order: &BlastOrder) -> Result<i64> {
        let mut state = self.state();
        state.record("order_blast_job");
        let user = state.user(session)?;
        state.injected("order_blast_job", &order.assay_id.to_string())?;
        let assay = state.owned_assay(user, order.assay_id)?.clone();
        order.params.validate()?;
        if order.date_from > order.date_to {
            return Err(reject("date_from must not be after date_to"));
        }
        let candidate = state
            .candidate(&assay)
            .ok_or_else(|| reject(&format!("Assay \"{}\" is not eligible for BLAST", assay.name)))?;

        let oligos = state
            .oligos_of(assay.id)
            .map(|o| OligoSnapshot { name: o.name.clone(), sequence: o.sequence.clone() })
            .collect();
        let reference_sequence = assay
            .ref_amplicon_id
            .and_then(|id| state.amplicons.get(&id))
            .map(|a| a.sequence.clone())
            .unwrap_or_default();

        let id = state.next_id();
        state.blast_jobs.insert(id, BlastJob {
            id,
            user_id: user,
            status: JobStatus::Queued,
            assay_id: assay.id,
            assay_name: assay.name.clone(),
            taxid: candidate.taxid,
            date_from: order.date_from,
            date_to: order.date_to,
            oligos,
            reference_sequence,
            params: order.params.clone(),
            result: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_blast_jobs(&self, session: &Session) -> Result<Vec<BlastJobSummary>> {
        let mut state = self.state();
        state.record("get_blast_jobs");
        let user = state.user(session)?;
        Ok(state
            .blast_jobs
            .values()
            .rev()
            .filter(|j| j.user_id == user)
            .map(|j| BlastJobSummary {
                id: j.id,
                status: j.status,
                assay_id: j.assay_id,
                assay_name: j.assay_name.clone(),
                taxid: j.taxid,
                date_from: j.date_from,
                date_to: j.date_to,
                created_at: j.created_at,
            })
            .collect())
    }

    async fn get_blast_job(&self, session: &Session, job_id: i64) -> Result<BlastJob> {
        let mut state = self.state();
        state.record("get_blast_job");
        let user = state.user(session)?;
        let job = state
            .blast_jobs
            .get(&job_id)
            .ok_or_else(|| reject(&format!("job_id {} does not exist", job_id)))?;
        if job.user_id != user {
            return Err(reject(&format!("job_id {} does not belong to you", job_id)));
        }
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_ownership_errors_are_classified() {
        let backend = InMemoryBackend::new();
        let alice = backend.sign_up("alice");
        let bob = backend.sign_up("bob");
        let assay = backend.seed_assay(&alice, "16S", "ACGT").await;

        let err = backend.delete_assay(&bob, assay.id).await.unwrap_err();
        assert!(matches!(err, PrimerwatchError::Forbidden(_)));
        let err = backend.delete_assay(&alice, 9999).await.unwrap_err();
        assert!(matches!(err, PrimerwatchError::NotFound(_)));
        let err = backend.list_assays(&Session::anonymous()).await.unwrap_err();
        assert!(matches!(err, PrimerwatchError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_assay_names_unique_per_user_and_delete_cascades() {
        let backend = InMemoryBackend::new();
        let alice = backend.sign_up("alice");
        let bob = backend.sign_up("bob");
        let assay = backend.seed_assay(&alice, "16S", "ACGT").await;
        backend.seed_assay(&bob, "16S", "ACGT").await;

        let dup = NewAssay {
            name: "16S".into(),
            target_taxid_id: None,
            target_gene: None,
            ref_name: None,
            ref_sequence: "ACGT".into(),
        };
        assert!(matches!(backend.create_assay(&alice, &dup).await, Err(PrimerwatchError::Validation(_))));

        backend
            .create_oligo(&alice, &NewOligo { name: "fwd".into(), sequence: "ACGT".into(), assay_id: Some(assay.id) })
            .await
            .unwrap();
        backend.delete_assay(&alice, assay.id).await.unwrap();
        assert!(backend.list_oligos(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_tracks_assays_and_jobs_block_reorder() {
        let backend = InMemoryBackend::new();
        let alice = backend.sign_up("alice");
        let a = backend.seed_assay(&alice, "A", "ACGT").await;
        backend.seed_assay(&alice, "B", "ACGT").await;

        let summary = backend.sync_dashboard(&alice).await.unwrap();
        assert_eq!(summary, SyncSummary { added: 2, removed: 0 });
        let entries = backend.read_dashboard(&alice).await.unwrap();
        let entry_id = entries[0].id;

        let order = JobOrder { entry_id, kind: JobKind::NewSequenceSearch, lookback_days: 30 };
        let job = backend.order_job(&alice, &order).await.unwrap();
        assert!(matches!(backend.order_job(&alice, &order).await, Err(PrimerwatchError::Validation(_))));

        backend.complete_job(job, 3);
        let entries = backend.read_dashboard(&alice).await.unwrap();
        assert_eq!(entries[0].queued_job_id, None);
        assert_eq!(entries[0].new_sequences, 3);

        backend.delete_assay(&alice, a.id).await.unwrap();
        assert_eq!(backend.sync_dashboard(&alice).await.unwrap(), SyncSummary { added: 0, removed: 1 });
    }

    #[tokio::test]
    async fn test_blast_candidates_require_taxid_and_oligos() {
        let backend = InMemoryBackend::new();
        let alice = backend.sign_up("alice");
        backend.seed_assay(&alice, "bare", "ACGT").await;
        let ready = backend.seed_blast_ready_assay(&alice, "ready", 562, &[("fwd", "ACGT")]).await;

        let candidates = backend.list_blast_candidates(&alice).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].assay_id, ready.id);
        assert_eq!(candidates[0].taxid, 562);

        let today = Utc::now().date_naive();
        let order = BlastOrder { assay_id: ready.id, date_from: today, date_to: today, params: BlastParams::default() };
        let job_id = backend.order_blast_job(&alice, &order).await.unwrap();
        assert!(backend.list_blast_candidates(&alice).await.unwrap().is_empty());

        let job = backend.get_blast_job(&alice, job_id).await.unwrap();
        assert_eq!(job.oligos, vec![OligoSnapshot { name: "fwd".into(), sequence: "ACGT".into() }]);
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_sign_in_with_registered_credentials() {
        let backend = InMemoryBackend::new();
        let registered = backend.register("lab@example.org", "hunter2");
        let session = backend.sign_in("LAB@example.org", "hunter2").await.unwrap();
        assert_eq!(session.user_id, registered.user_id);
        assert!(backend.sign_in("lab@example.org", "nope").await.is_err());
    }
}
