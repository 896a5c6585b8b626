//! Apply executor
//!
//! Executes translated writes against a [`ZoneProvider`] strictly in order,
//! one call at a time. A failed write is recorded and the executor moves on
//! to the next one; every failure is reported together at the end.

use tracing::{debug, error, info};

use crate::error::{AggregateError, OpFailure};
use crate::model::WriteOp;
use crate::traits::ZoneProvider;

/// Outcome of a single write
#[derive(Debug)]
pub enum OpOutcome<'o> {
    /// The write succeeded
    Applied(&'o WriteOp),
    /// The write failed
    Failed(&'o OpFailure),
}

/// Sequential, best-effort executor for write operations
pub struct ApplyExecutor<'p> {
    provider: &'p dyn ZoneProvider,
}

impl<'p> ApplyExecutor<'p> {
    /// Create an executor writing through `provider`
    pub fn new(provider: &'p dyn ZoneProvider) -> Self {
        Self { provider }
    }

    /// Execute `ops` in order
    ///
    /// Returns an [`AggregateError`] holding every failed write if any failed.
    pub async fn apply(&self, ops: Vec<WriteOp>) -> Result<(), AggregateError> {
        self.apply_with(ops, |_| {}).await
    }

    /// Execute `ops` in order, calling `observe` after each write
    pub async fn apply_with<F>(&self, ops: Vec<WriteOp>, mut observe: F) -> Result<(), AggregateError>
    where
        F: FnMut(OpOutcome<'_>) + Send,
    {
        let total = ops.len();
        let mut aggregate = AggregateError::default();

        for op in ops {
            debug!("Applying {}", op);
            match self.execute(&op).await {
                Ok(()) => {
                    observe(OpOutcome::Applied(&op));
                }
                Err(e) => {
                    error!("Failed to {}: {}", op, e);
                    aggregate.failures.push(OpFailure { op, error: e });
                    if let Some(failure) = aggregate.failures.last() {
                        observe(OpOutcome::Failed(failure));
                    }
                }
            }
        }

        info!(
            "Applied {}/{} change(s) via {}",
            total - aggregate.failures.len(),
            total,
            self.provider.provider_name()
        );

        aggregate.into_result()
    }

    async fn execute(&self, op: &WriteOp) -> crate::Result<()> {
        match op {
            WriteOp::ReplaceRecordSet {
                zone,
                name,
                record_type,
                records,
            } => {
                self.provider
                    .replace_record_set(zone, name, *record_type, records)
                    .await
            }
            WriteOp::DeleteRecordSet {
                zone,
                name,
                record_type,
            } => self.provider.delete_record_set(zone, name, *record_type).await,
        }
    }
}
