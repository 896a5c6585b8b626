// # zonesync-core
//
// Core library reconciling declarative DNS endpoints with zone-record
// oriented provider APIs.
//
// ## Architecture Overview
//
// - **model**: Zone records, endpoints, change sets and write operations
// - **zone**: Domain filter and longest-match zone resolution
// - **aggregate**: Folds per-value records into endpoints and back
// - **translate**: Turns a change set into ordered record-set writes
// - **apply**: Executes writes sequentially, collecting every failure
// - **ZoneProvider**: Trait for record-oriented provider APIs
// - **ReconcileEngine**: One reconciliation pass per call
// - **ProviderRegistry**: Plugin-based registry for zone providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic is separate from provider APIs
// 2. **Fresh State**: Every pass re-reads zones and records, nothing is cached
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Best Effort Writes**: One failed write never hides the others

pub mod aggregate;
pub mod apply;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod registry;
pub mod traits;
pub mod translate;
pub mod zone;

// Re-export core types for convenience
pub use aggregate::{RecordAggregator, ZoneSnapshot};
pub use apply::ApplyExecutor;
pub use config::{ProviderConfig, SyncConfig, TtlPolicy};
pub use engine::{EngineEvent, ReconcileEngine};
pub use error::{AggregateError, Error, OpFailure, Result};
pub use model::{APEX_NAME, ChangeSet, Endpoint, RecordType, WriteOp, Zone, ZoneRecord};
pub use registry::ProviderRegistry;
pub use traits::{ZoneProvider, ZoneProviderFactory};
pub use translate::{ChangeTranslator, Translation};
pub use zone::{DomainFilter, ResolvedName, ZoneResolver};
