//! Reconciliation engine
//!
//! The ReconcileEngine is responsible for:
//! - Listing the provider's zones and keeping the owned ones
//! - Building a fresh snapshot of the current endpoints
//! - Translating change sets into record-set writes
//! - Applying the writes and reporting every failure
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   zones    ┌──────────────┐  snapshot  ┌──────────────────┐
//! │ ZoneProvider │──────────▶ │ ZoneResolver │──────────▶ │ ChangeTranslator │
//! │              │  records   │ + Aggregator │            └──────────────────┘
//! └──────────────┘            └──────────────┘                      │ ops
//!        ▲                                                          ▼
//!        │                  writes                          ┌───────────────┐
//!        └───────────────────────────────────────────────── │ ApplyExecutor │
//!                                                           └───────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. List zones, drop the ones outside the domain filter
//! 2. Fetch every owned zone's records (any failure aborts the pass)
//! 3. Translate the change set; unowned endpoints are set aside
//! 4. Execute writes one by one, continuing past failures
//! 5. Report failed writes and unowned endpoints together

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::aggregate::{RecordAggregator, ZoneSnapshot};
use crate::apply::{ApplyExecutor, OpOutcome};
use crate::config::SyncConfig;
use crate::error::{AggregateError, Error, Result};
use crate::model::{ChangeSet, Endpoint, RecordType};
use crate::traits::ZoneProvider;
use crate::translate::ChangeTranslator;
use crate::zone::{DomainFilter, ZoneResolver};

/// Events emitted by the ReconcileEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Snapshot of owned zones taken
    SnapshotTaken { zones: usize, endpoints: usize },

    /// Change set translated
    ChangesPlanned { ops: usize, unresolved: usize },

    /// Record-set write succeeded
    OpApplied {
        zone: String,
        name: String,
        record_type: RecordType,
    },

    /// Record-set write failed
    OpFailed {
        zone: String,
        name: String,
        record_type: RecordType,
        error: String,
    },

    /// Apply pass finished
    ApplyFinished { applied: usize, failed: usize },
}

/// Core reconciliation engine
///
/// Each call is one self-contained pass: zones and records are fetched from
/// scratch and nothing is kept between calls.
pub struct ReconcileEngine {
    /// Provider API
    provider: Box<dyn ZoneProvider>,

    /// Zones this engine may touch
    domain_filter: DomainFilter,

    /// Record grouping and expansion
    aggregator: RecordAggregator,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl ReconcileEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Box<dyn ZoneProvider>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            provider,
            domain_filter: config.domain_filter,
            aggregator: RecordAggregator::new(config.ttl),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Current endpoints of every owned zone, flattened in zone order
    pub async fn current_endpoints(&self) -> Result<Vec<Endpoint>> {
        let (_, snapshot) = self.snapshot().await?;
        Ok(snapshot.endpoints())
    }

    /// Converge the provider towards `changes`
    ///
    /// Read failures abort the pass before any write. Write failures and
    /// endpoints outside the owned zones are collected into
    /// [`Error::Apply`].
    pub async fn apply_changes(&self, changes: &ChangeSet) -> Result<()> {
        if changes.is_empty() {
            debug!("No changes to apply");
            return Ok(());
        }
        changes.validate()?;

        let (resolver, snapshot) = self.snapshot().await?;

        let translation = ChangeTranslator::new(&self.aggregator).translate(&snapshot, changes, &resolver)?;
        self.emit_event(EngineEvent::ChangesPlanned {
            ops: translation.ops.len(),
            unresolved: translation.unresolved.len(),
        });
        info!(
            "Planned {} write(s), {} endpoint(s) outside owned zones",
            translation.ops.len(),
            translation.unresolved.len()
        );

        let total = translation.ops.len();
        let result = ApplyExecutor::new(self.provider.as_ref())
            .apply_with(translation.ops, |outcome| self.emit_outcome(outcome))
            .await;

        let mut aggregate = match result {
            Ok(()) => AggregateError::default(),
            Err(aggregate) => aggregate,
        };
        self.emit_event(EngineEvent::ApplyFinished {
            applied: total - aggregate.failures.len(),
            failed: aggregate.failures.len(),
        });

        aggregate.unresolved = translation.unresolved;
        aggregate.into_result().map_err(Error::from)
    }

    /// Resolver over the owned zones plus their current endpoints
    async fn snapshot(&self) -> Result<(ZoneResolver, ZoneSnapshot)> {
        let zones = self.provider.list_zones().await?;
        let listed = zones.len();
        let resolver = ZoneResolver::owned(zones, &self.domain_filter);

        if resolver.zones().is_empty() {
            warn!("None of the {} zone(s) listed by {} are owned", listed, self.provider_name());
        }

        let snapshot = self.aggregator.observe(self.provider.as_ref(), resolver.zones()).await?;
        let endpoints = snapshot.endpoints().len();
        debug!(
            "Snapshot of {} owned zone(s) out of {}: {} endpoint(s)",
            snapshot.len(),
            listed,
            endpoints
        );
        self.emit_event(EngineEvent::SnapshotTaken {
            zones: snapshot.len(),
            endpoints,
        });

        Ok((resolver, snapshot))
    }

    fn emit_outcome(&self, outcome: OpOutcome<'_>) {
        let event = match outcome {
            OpOutcome::Applied(op) => EngineEvent::OpApplied {
                zone: op.zone().to_string(),
                name: op.name().to_string(),
                record_type: op.record_type(),
            },
            OpOutcome::Failed(failure) => EngineEvent::OpFailed {
                zone: failure.op.zone().to_string(),
                name: failure.op.name().to_string(),
                record_type: failure.op.record_type(),
                error: failure.error.to_string(),
            },
        };
        self.emit_event(event);
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Send event, logging warning if channel is full (backpressure)
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
