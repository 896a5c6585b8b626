// # Zone Provider Trait
//
// Defines the record-oriented provider API the reconciliation core drives.
//
// ## Implementations
//
// - GoDaddy: `zonesync-provider-godaddy` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::ZoneProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* ZoneProvider implementation */;
//
//     for zone in provider.list_zones().await? {
//         let records = provider.list_records(&zone).await?;
//         println!("{zone}: {} record(s)", records.len());
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{RecordType, Zone, ZoneRecord};

/// Trait for zone-record DNS provider implementations
///
/// Records are addressed by zone, relative name and type only. The apex is
/// addressed with [`crate::model::APEX_NAME`].
///
/// # Trust Level: Untrusted
///
/// Providers are isolated, single-shot API clients:
///
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses into [`ZoneRecord`]s
/// - ✅ Reject record types outside [`RecordType`]
/// - ❌ Retry or back off (a failed call is reported, the next pass retries)
/// - ❌ Cache zones or records between calls
/// - ❌ Spawn tasks or threads
/// - ❌ Decide which changes are needed (owned by the translator)
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// List every zone visible to the configured credentials
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List every record of a zone, in provider order
    async fn list_records(&self, zone: &Zone) -> Result<Vec<ZoneRecord>, crate::Error>;

    /// Replace all records of `name` + `record_type` with `records`
    ///
    /// Creates the record set if it does not exist. Must be idempotent.
    async fn replace_record_set(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
        records: &[ZoneRecord],
    ) -> Result<(), crate::Error>;

    /// Delete all records of `name` + `record_type`
    async fn delete_record_set(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone providers from configuration
pub trait ZoneProviderFactory: Send + Sync {
    /// Create a ZoneProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneProvider>, crate::Error>;
}
