//! Surveillance dashboard: sync/read, row selection, job submission and the
//! status poller.
//!
//! Selection rule: an entry with a queued job is never selectable. The
//! poller publishes generation-stamped snapshots and stops when its handle
//! is dropped, so nothing is written after the consumer has gone away.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use primerwatch_common::backend::{JobOrder, Session, SurveillanceBackend};
use primerwatch_common::entities::{DashboardEntry, JobKind, SyncSummary};
use primerwatch_common::error::{PrimerwatchError, Result};

use crate::batch::{run_batch, BatchReport};

pub const MAX_LOOKBACK_DAYS: i32 = 3650;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub sync: SyncSummary,
    pub entries: Vec<DashboardEntry>,
}

/// Reconcile tracked entries with current assays, then read the full row set.
pub async fn refresh(backend: &dyn SurveillanceBackend, session: &Session) -> Result<DashboardView> {
    let sync = backend.sync_dashboard(session).await?;
    if sync.added > 0 || sync.removed > 0 {
        info!(added = sync.added, removed = sync.removed, "dashboard entries reconciled");
    }
    let entries = backend.read_dashboard(session).await?;
    Ok(DashboardView { sync, entries })
}

// ── Selection ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSelection {
    ids: BTreeSet<i64>,
}

impl DashboardSelection {
    /// Build from submitted ids, keeping only known selectable entries.
    pub fn from_ids(ids: impl IntoIterator<Item = i64>, entries: &[DashboardEntry]) -> Self {
        let mut selection = Self { ids: ids.into_iter().collect() };
        selection.reconcile(entries);
        selection
    }

    /// Returns whether the entry is selected afterwards.
    pub fn toggle(&mut self, entry: &DashboardEntry) -> bool {
        if !entry.is_selectable() {
            self.ids.remove(&entry.id);
            return false;
        }
        if !self.ids.remove(&entry.id) {
            self.ids.insert(entry.id);
            return true;
        }
        false
    }

    /// Select every selectable entry, or clear when they are all selected already.
    pub fn toggle_all(&mut self, entries: &[DashboardEntry]) {
        self.reconcile(entries);
        let selectable: Vec<&DashboardEntry> = entries.iter().filter(|e| e.is_selectable()).collect();
        let all_selected = !selectable.is_empty() && selectable.iter().all(|e| self.contains(e.id));
        for entry in selectable {
            if all_selected || !self.contains(entry.id) {
                self.toggle(entry);
            }
        }
    }

    /// Drop ids that vanished or picked up a queued job since the last read.
    pub fn reconcile(&mut self, entries: &[DashboardEntry]) {
        self.ids.retain(|id| entries.iter().any(|e| e.id == *id && e.is_selectable()));
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub fn validate_lookback(days: i32) -> Result<()> {
    if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(PrimerwatchError::validation(format!(
            "Lookback window must be between 1 and {} days",
            MAX_LOOKBACK_DAYS
        )));
    }
    Ok(())
}

/// Order one job per selected entry. Returns the new job ids.
pub async fn submit_jobs(
    backend: &dyn SurveillanceBackend,
    session: &Session,
    selection: &DashboardSelection,
    entries: &[DashboardEntry],
    kind: JobKind,
    lookback_days: i32,
    concurrency: usize,
) -> Result<BatchReport<i64>> {
    validate_lookback(lookback_days)?;
    if selection.is_empty() {
        return Err(PrimerwatchError::validation("Select at least one assay"));
    }

    let orders: Vec<(String, JobOrder)> = selection
        .ids()
        .map(|entry_id| {
            let label = entries
                .iter()
                .find(|e| e.id == entry_id)
                .map(|e| e.assay_name.clone())
                .unwrap_or_else(|| format!("entry {}", entry_id));
            (label, JobOrder { entry_id, kind, lookback_days })
        })
        .collect();

    Ok(run_batch(orders, concurrency, |(label, _)| label.clone(), |(_, order)| async move {
        backend.order_job(session, &order).await
    })
    .await)
}

// ── Poller ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Strictly increasing per poller.
    pub generation: u64,
    pub entries: Vec<DashboardEntry>,
    pub error: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

pub struct DashboardPoller;

impl DashboardPoller {
    /// Start polling `read_dashboard` every `interval`.
    ///
    /// Only one read is ever in flight: ticks that fall due while a read is
    /// running are skipped, and `refresh_now` calls made meanwhile collapse
    /// into a single follow-up read.
    pub fn spawn(
        backend: Arc<dyn SurveillanceBackend>,
        session: Session,
        interval: Duration,
    ) -> PollerHandle {
        let (tx, rx) = watch::channel(None);
        let trigger = Arc::new(Notify::new());
        let task_trigger = trigger.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut generation = 0u64;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = task_trigger.notified() => {}
                    _ = tx.closed() => break,
                }

                generation += 1;
                let snapshot = match backend.read_dashboard(&session).await {
                    Ok(entries) => DashboardSnapshot {
                        generation,
                        entries,
                        error: None,
                        fetched_at: Utc::now(),
                    },
                    Err(e) => {
                        warn!(generation, error = %e, "dashboard poll failed");
                        DashboardSnapshot {
                            generation,
                            entries: Vec::new(),
                            error: Some(e.user_message()),
                            fetched_at: Utc::now(),
                        }
                    }
                };
                debug!(generation, "dashboard snapshot");
                if tx.send(Some(snapshot)).is_err() {
                    break;
                }
            }
            debug!("dashboard poller stopped");
        });

        PollerHandle { rx, trigger, task }
    }
}

/// Owning handle; dropping it cancels the poll task.
pub struct PollerHandle {
    rx: watch::Receiver<Option<DashboardSnapshot>>,
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardSnapshot>> {
        self.rx.clone()
    }

    pub fn latest(&self) -> Option<DashboardSnapshot> {
        self.rx.borrow().clone()
    }

    /// Ask for a read now instead of waiting for the next tick.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
