//! Test doubles and common utilities for reconciliation contract tests
//!
//! [`MemoryZoneProvider`] keeps zones and records in memory, logs every call
//! and can be told to fail specific calls.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use zonesync_core::error::{Error, Result};
use zonesync_core::{
    ProviderConfig, RecordType, SyncConfig, TtlPolicy, Zone, ZoneProvider, ZoneRecord,
};

#[derive(Default)]
struct State {
    zones: BTreeMap<Zone, Vec<ZoneRecord>>,
    calls: Vec<String>,
    failing: HashSet<String>,
}

/// An in-memory provider that tracks calls
///
/// Calls are logged as `list_zones`, `list_records <zone>`,
/// `replace <zone> <name> <type>` and `delete <zone> <name> <type>`; the same
/// strings select calls to fail.
#[derive(Clone, Default)]
pub struct MemoryZoneProvider {
    state: Arc<Mutex<State>>,
}

impl MemoryZoneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone holding `records`
    pub fn with_zone(self, domain: &str, records: Vec<ZoneRecord>) -> Self {
        self.state.lock().unwrap().zones.insert(Zone::new(domain), records);
        self
    }

    /// Make the call described by `call` fail
    pub fn fail_on(&self, call: &str) {
        self.state.lock().unwrap().failing.insert(call.to_string());
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Write calls received so far
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("replace") || c.starts_with("delete"))
            .collect()
    }

    /// Current records of a zone
    pub fn records(&self, domain: &str) -> Vec<ZoneRecord> {
        self.state
            .lock()
            .unwrap()
            .zones
            .get(&Zone::new(domain))
            .cloned()
            .unwrap_or_default()
    }

    fn record_call(&self, call: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        if state.failing.contains(&call) {
            return Err(Error::provider("memory", format!("injected failure: {call}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ZoneProvider for MemoryZoneProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.record_call("list_zones".to_string())?;
        Ok(self.state.lock().unwrap().zones.keys().cloned().collect())
    }

    async fn list_records(&self, zone: &Zone) -> Result<Vec<ZoneRecord>> {
        self.record_call(format!("list_records {zone}"))?;
        self.state
            .lock()
            .unwrap()
            .zones
            .get(zone)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("zone {zone}")))
    }

    async fn replace_record_set(
        &self,
        zone: &Zone,
        name: &str,
        record_type: RecordType,
        records: &[ZoneRecord],
    ) -> Result<()> {
        self.record_call(format!("replace {zone} {name} {record_type}"))?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .zones
            .get_mut(zone)
            .ok_or_else(|| Error::not_found(format!("zone {zone}")))?;

        let position = existing
            .iter()
            .position(|r| r.name == name && r.record_type == record_type)
            .unwrap_or(existing.len());
        existing.retain(|r| !(r.name == name && r.record_type == record_type));
        let position = position.min(existing.len());
        for (offset, record) in records.iter().enumerate() {
            existing.insert(position + offset, record.clone());
        }
        Ok(())
    }

    async fn delete_record_set(&self, zone: &Zone, name: &str, record_type: RecordType) -> Result<()> {
        self.record_call(format!("delete {zone} {name} {record_type}"))?;
        let mut state = self.state.lock().unwrap();
        let existing = state
            .zones
            .get_mut(zone)
            .ok_or_else(|| Error::not_found(format!("zone {zone}")))?;

        let before = existing.len();
        existing.retain(|r| !(r.name == name && r.record_type == record_type));
        if existing.len() == before {
            return Err(Error::not_found(format!("{name} ({record_type}) in {zone}")));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config() -> SyncConfig {
    SyncConfig::new(ProviderConfig::Custom {
        factory: "memory".to_string(),
        config: serde_json::json!({}),
    })
    .with_ttl(TtlPolicy::new(600, 0))
}

/// The `example.net` zone holding a single A record for `godaddy`
pub fn example_net() -> MemoryZoneProvider {
    MemoryZoneProvider::new().with_zone(
        "example.net",
        vec![ZoneRecord::new("godaddy", RecordType::A, 600, "203.0.113.43")],
    )
}
