//! Record aggregation
//!
//! Providers store one value per record; the rest of the system works with
//! endpoints holding every value of a name + type. [`RecordAggregator`]
//! converts in both directions:
//!
//! - [`RecordAggregator::group`] folds zone records into endpoints
//! - [`RecordAggregator::expand`] splits an endpoint into zone records
//!
//! `group(zone, expand(e)) == [e]` for every endpoint whose TTL already
//! satisfies the configured [`TtlPolicy`].

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::TtlPolicy;
use crate::error::Result;
use crate::model::{Endpoint, RecordType, Zone, ZoneRecord, normalize_name};
use crate::traits::ZoneProvider;
use crate::zone::{ResolvedName, record_name_to_dns_name};

/// Observed endpoints of every owned zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSnapshot {
    zones: BTreeMap<Zone, Vec<Endpoint>>,
}

impl ZoneSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoints of a zone
    pub fn insert(&mut self, zone: Zone, endpoints: Vec<Endpoint>) {
        self.zones.insert(zone, endpoints);
    }

    /// Endpoints of a zone, if it was observed
    pub fn get(&self, zone: &Zone) -> Option<&[Endpoint]> {
        self.zones.get(zone).map(Vec::as_slice)
    }

    /// Observed zones, sorted by domain
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.keys()
    }

    /// All endpoints, in zone order
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.zones.values().flatten().cloned().collect()
    }

    /// Whether the zone currently holds a record set for `name` + `record_type`
    pub fn contains(&self, zone: &Zone, dns_name: &str, record_type: RecordType) -> bool {
        let dns_name = normalize_name(dns_name);
        self.get(zone).is_some_and(|endpoints| {
            endpoints
                .iter()
                .any(|e| e.record_type == record_type && e.normalized_name() == dns_name)
        })
    }

    /// Number of observed zones
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether no zone was observed
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Folds zone records into endpoints and back
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAggregator {
    ttl: TtlPolicy,
}

impl RecordAggregator {
    /// Create an aggregator applying `ttl` on expansion
    pub fn new(ttl: TtlPolicy) -> Self {
        Self { ttl }
    }

    /// TTL policy in use
    pub fn ttl_policy(&self) -> TtlPolicy {
        self.ttl
    }

    /// Fetch the records of every zone and group them into endpoints
    ///
    /// Zones are read one after another. Any failure aborts the whole
    /// snapshot: diffing against partial state would turn missing records
    /// into deletions.
    pub async fn observe(&self, provider: &dyn ZoneProvider, zones: &[Zone]) -> Result<ZoneSnapshot> {
        let mut snapshot = ZoneSnapshot::new();

        for zone in zones {
            let records = provider.list_records(zone).await?;
            debug!("Fetched {} record(s) for zone {}", records.len(), zone);
            snapshot.insert(zone.clone(), self.group(zone, &records));
        }

        Ok(snapshot)
    }

    /// Group records sharing name + type into endpoints
    ///
    /// Endpoints appear in order of first occurrence and targets keep provider
    /// order. The TTL of the first record in a group wins.
    pub fn group(&self, zone: &Zone, records: &[ZoneRecord]) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = Vec::new();
        let mut index: HashMap<(String, RecordType), usize> = HashMap::new();

        for record in records {
            let dns_name = record_name_to_dns_name(&record.name, zone);
            let key = (dns_name.clone(), record.record_type);

            match index.get(&key).copied() {
                Some(i) => {
                    let endpoint = &mut endpoints[i];
                    if endpoint.ttl != record.ttl {
                        warn!(
                            "Records of {} ({}) disagree on TTL: keeping {}, ignoring {}",
                            dns_name, record.record_type, endpoint.ttl, record.ttl
                        );
                    }
                    endpoint.targets.push(record.data.clone());
                }
                None => {
                    index.insert(key, endpoints.len());
                    endpoints.push(Endpoint {
                        dns_name,
                        record_type: record.record_type,
                        ttl: record.ttl,
                        targets: vec![record.data.clone()],
                    });
                }
            }
        }

        endpoints
    }

    /// Split an endpoint into one zone record per target
    pub fn expand(&self, endpoint: &Endpoint, resolved: &ResolvedName) -> Vec<ZoneRecord> {
        let ttl = self.ttl.effective(endpoint.ttl);
        endpoint
            .targets
            .iter()
            .map(|target| ZoneRecord::new(resolved.record_name(), endpoint.record_type, ttl, target.clone()))
            .collect()
    }
}
