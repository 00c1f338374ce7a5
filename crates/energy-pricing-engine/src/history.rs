//! Best-effort price history recording.
//!
//! [`HistoryRecorder`] hands entries to a background task over a bounded
//! queue. Callers never wait on the sink: a full queue drops the entry with
//! a warning, and sink failures are logged by the worker and swallowed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use energy_pricing_core::{approx_eq, EntityType, PriceHistoryEntry};
use energy_pricing_store::HistorySink;

/// Actor recorded for prices observed during calculation.
pub const ENGINE_ACTOR: &str = "pricing-engine";

/// A price observation whose previous price the worker looks up itself.
#[derive(Debug)]
pub struct Observation {
    /// Kind of entity.
    pub entity_type: EntityType,
    /// Entity identifier.
    pub entity_id: String,
    /// Observed price.
    pub price: f64,
    /// Why the price was observed.
    pub reason: String,
    /// Who observed it.
    pub actor: String,
    /// Free-form context.
    pub metadata: serde_json::Value,
}

#[derive(Debug)]
enum HistoryCommand {
    Record(PriceHistoryEntry),
    Observe(Observation),
}

/// Handle to the history worker. Cheap to clone.
#[derive(Clone, Debug)]
pub struct HistoryRecorder {
    tx: mpsc::Sender<HistoryCommand>,
}

impl HistoryRecorder {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The worker exits once every handle has been dropped and the queue is
    /// drained.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(sink: Arc<dyn HistorySink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(sink, rx));
        (Self { tx }, handle)
    }

    /// Record a price change. No-op when the price did not change.
    ///
    /// Returns whether the entry was queued.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        old_price: Option<f64>,
        new_price: f64,
        reason: impl Into<String>,
        actor: impl Into<String>,
        metadata: serde_json::Value,
    ) -> bool {
        if old_price.is_some_and(|old| approx_eq(old, new_price)) {
            return false;
        }

        let entry =
            PriceHistoryEntry::new(entity_type, entity_id, old_price, new_price, reason, actor)
                .with_metadata(metadata);
        self.enqueue(HistoryCommand::Record(entry))
    }

    /// Record a price observation. The worker compares it with the latest
    /// recorded price and only writes an entry when it differs.
    ///
    /// Returns whether the observation was queued.
    pub fn observe(&self, observation: Observation) -> bool {
        self.enqueue(HistoryCommand::Observe(observation))
    }

    fn enqueue(&self, command: HistoryCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("History queue full, dropping entry");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("History worker stopped, dropping entry");
                false
            }
        }
    }
}

async fn run_worker(sink: Arc<dyn HistorySink>, mut rx: mpsc::Receiver<HistoryCommand>) {
    while let Some(command) = rx.recv().await {
        let entry = match command {
            HistoryCommand::Record(entry) => entry,
            HistoryCommand::Observe(observation) => match resolve_observation(&*sink, observation) {
                Some(entry) => entry,
                None => continue,
            },
        };

        if let Err(e) = sink.append(&entry) {
            tracing::error!(
                error = %e,
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                "Failed to write price history"
            );
        } else {
            tracing::debug!(
                entity_type = %entry.entity_type,
                entity_id = %entry.entity_id,
                new_price = entry.new_price,
                "Price history recorded"
            );
        }
    }

    tracing::debug!("History worker stopped");
}

fn resolve_observation(sink: &dyn HistorySink, o: Observation) -> Option<PriceHistoryEntry> {
    let old_price = match sink.latest_price(o.entity_type, &o.entity_id) {
        Ok(price) => price,
        Err(e) => {
            tracing::error!(error = %e, entity_id = %o.entity_id, "Failed to read price history");
            return None;
        }
    };

    if old_price.is_some_and(|old| approx_eq(old, o.price)) {
        return None;
    }

    Some(
        PriceHistoryEntry::new(o.entity_type, o.entity_id, old_price, o.price, o.reason, o.actor)
            .with_metadata(o.metadata),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_pricing_store::{MemoryStore, StoreError};

    fn observation(price: f64) -> Observation {
        Observation {
            entity_type: EntityType::Package,
            entity_id: "pkg".into(),
            price,
            reason: "price_calculation".into(),
            actor: ENGINE_ACTOR.into(),
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn records_changes_and_suppresses_no_ops() {
        let store = Arc::new(MemoryStore::new());
        let (recorder, worker) = HistoryRecorder::spawn(store.clone(), 16);

        assert!(recorder.record(
            EntityType::Bot,
            "bot",
            Some(1.0),
            1.2,
            "update",
            "admin",
            serde_json::Value::Null
        ));
        assert!(!recorder.record(
            EntityType::Bot,
            "bot",
            Some(1.2),
            1.2,
            "update",
            "admin",
            serde_json::Value::Null
        ));

        drop(recorder);
        worker.await.unwrap();

        let entries = store.list(EntityType::Bot, "bot", 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].old_price, Some(1.0));
    }

    #[tokio::test]
    async fn observations_only_write_on_change() {
        let store = Arc::new(MemoryStore::new());
        let (recorder, worker) = HistoryRecorder::spawn(store.clone(), 16);

        recorder.observe(observation(1.5));
        recorder.observe(observation(1.5));
        recorder.observe(observation(1.7));

        drop(recorder);
        worker.await.unwrap();

        let entries = store.list(EntityType::Package, "pkg", 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].old_price, Some(1.5));
        assert_eq!(entries[0].new_price, 1.7);
        assert_eq!(entries[1].old_price, None);
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let store = Arc::new(MemoryStore::new());
        // The worker does not run until this test yields, so the queue fills.
        let (recorder, worker) = HistoryRecorder::spawn(store.clone(), 1);

        assert!(recorder.observe(observation(1.0)));
        assert!(!recorder.observe(observation(2.0)));

        drop(recorder);
        worker.await.unwrap();
        assert_eq!(store.history_len().unwrap(), 1);
    }

    struct BrokenSink;

    impl HistorySink for BrokenSink {
        fn append(&self, _entry: &PriceHistoryEntry) -> energy_pricing_store::Result<()> {
            Err(StoreError::Unavailable("disk full".into()))
        }

        fn latest_price(
            &self,
            _entity_type: EntityType,
            _entity_id: &str,
        ) -> energy_pricing_store::Result<Option<f64>> {
            Ok(None)
        }

        fn list(
            &self,
            _entity_type: EntityType,
            _entity_id: &str,
            _limit: usize,
        ) -> energy_pricing_store::Result<Vec<PriceHistoryEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn sink_failures_are_swallowed() {
        let (recorder, worker) = HistoryRecorder::spawn(Arc::new(BrokenSink), 4);

        assert!(recorder.observe(observation(1.0)));

        drop(recorder);
        worker.await.unwrap();
    }
}
