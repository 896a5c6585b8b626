//! Zone resolution
//!
//! Maps fully qualified names onto the zones this adapter owns:
//!
//! - [`DomainFilter`] decides which provider zones are owned at all
//! - [`ZoneResolver`] picks the most specific owned zone for a name and
//!   splits off the zone-relative part
//!
//! The zone apex has an empty relative name, written as [`APEX_NAME`] in
//! provider-native records.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{APEX_NAME, Zone, normalize_name};

/// Whether `name` equals `domain` or sits below it on a label boundary
fn is_within(name: &str, domain: &str) -> bool {
    if domain.is_empty() {
        return true;
    }
    name == domain
        || (name.len() > domain.len()
            && name.ends_with(domain)
            && name.as_bytes()[name.len() - domain.len() - 1] == b'.')
}

/// Predicate restricting which zones may be observed or mutated
///
/// An empty include list owns every domain. Exclusions always win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFilter {
    /// Domains (and their subdomains) that are owned
    #[serde(default)]
    pub include: Vec<String>,
    /// Domains (and their subdomains) that are never owned
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl DomainFilter {
    /// Create a filter owning the given domains
    pub fn new<I, S>(include: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            include: normalize_all(include),
            exclude: Vec::new(),
        }
    }

    /// Exclude the given domains
    pub fn with_exclusions<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = normalize_all(exclude);
        self
    }

    /// Whether any include filter is set
    pub fn is_configured(&self) -> bool {
        !self.include.is_empty()
    }

    /// Whether `domain` is owned by this filter
    pub fn owns(&self, domain: &str) -> bool {
        let domain = normalize_name(domain);
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|filter| is_within(&domain, &normalize_name(filter)));
        let excluded = self
            .exclude
            .iter()
            .any(|filter| is_within(&domain, &normalize_name(filter)));
        included && !excluded
    }
}

fn normalize_all<I, S>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    domains
        .into_iter()
        .map(|d| normalize_name(d.as_ref()))
        .filter(|d| !d.is_empty())
        .collect()
}

/// A name resolved against its owning zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Owning zone
    pub zone: Zone,
    /// Name relative to the zone, empty for the apex
    pub relative: String,
}

impl ResolvedName {
    /// Whether the name is the zone apex
    pub fn is_apex(&self) -> bool {
        self.relative.is_empty()
    }

    /// Provider-native record name
    pub fn record_name(&self) -> &str {
        if self.is_apex() { APEX_NAME } else { &self.relative }
    }

    /// Fully qualified name
    pub fn dns_name(&self) -> String {
        record_name_to_dns_name(&self.relative, &self.zone)
    }
}

/// Map a provider-native record name back to a fully qualified name
///
/// The apex sentinel and the empty name both map to the bare zone name.
pub fn record_name_to_dns_name(record_name: &str, zone: &Zone) -> String {
    let name = normalize_name(record_name);
    if name.is_empty() || name == APEX_NAME {
        zone.domain.clone()
    } else {
        format!("{}.{}", name, zone.domain)
    }
}

/// Resolves names to the most specific owned zone
#[derive(Debug, Clone, Default)]
pub struct ZoneResolver {
    zones: Vec<Zone>,
}

impl ZoneResolver {
    /// Create a resolver over the given zones
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut zones: Vec<Zone> = zones.into_iter().collect();
        zones.sort();
        zones.dedup();
        Self { zones }
    }

    /// Create a resolver over the zones owned by `filter`
    pub fn owned(zones: impl IntoIterator<Item = Zone>, filter: &DomainFilter) -> Self {
        Self::new(zones.into_iter().filter(|zone| filter.owns(&zone.domain)))
    }

    /// Zones known to the resolver, sorted by domain
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Resolve `name` to its owning zone and relative name
    ///
    /// When zones overlap the longest matching domain wins.
    pub fn resolve(&self, name: &str) -> Result<ResolvedName> {
        let normalized = normalize_name(name);
        let zone = self
            .zones
            .iter()
            .filter(|zone| !zone.domain.is_empty() && is_within(&normalized, &zone.domain))
            .max_by_key(|zone| zone.domain.len())
            .ok_or_else(|| Error::ZoneNotFound(name.to_string()))?;

        let relative = normalized[..normalized.len() - zone.domain.len()]
            .trim_end_matches('.')
            .to_string();

        Ok(ResolvedName {
            zone: zone.clone(),
            relative,
        })
    }
}
