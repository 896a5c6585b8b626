//! Change translation
//!
//! Turns a [`ChangeSet`] into the ordered provider writes that converge the
//! zones to the desired state. Providers address records by name + type only,
//! so every change becomes either a full record-set replace or a record-set
//! delete; a rename is a delete of the old key plus a replace of the new one.
//!
//! Operation order:
//!
//! 1. deletes of renamed keys
//! 2. replaces for creates, then for updates (input order)
//! 3. explicit deletes

use tracing::{debug, warn};

use crate::aggregate::{RecordAggregator, ZoneSnapshot};
use crate::error::Result;
use crate::model::{ChangeSet, Endpoint, WriteOp};
use crate::zone::ZoneResolver;

/// Result of translating a change set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// Writes to execute, in order
    pub ops: Vec<WriteOp>,
    /// Endpoints dropped because no owned zone matches them
    pub unresolved: Vec<Endpoint>,
}

impl Translation {
    /// Whether every endpoint resolved to an owned zone
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Translates change sets into provider writes
#[derive(Debug, Clone, Copy)]
pub struct ChangeTranslator<'a> {
    aggregator: &'a RecordAggregator,
}

impl<'a> ChangeTranslator<'a> {
    /// Create a translator expanding endpoints with `aggregator`
    pub fn new(aggregator: &'a RecordAggregator) -> Self {
        Self { aggregator }
    }

    /// Translate `changes` into ordered write operations
    ///
    /// Endpoints outside every owned zone are left out of the operations and
    /// reported in [`Translation::unresolved`]. `current` is only used for
    /// diagnostics.
    pub fn translate(
        &self,
        current: &ZoneSnapshot,
        changes: &ChangeSet,
        resolver: &ZoneResolver,
    ) -> Result<Translation> {
        changes.validate()?;

        let mut rename_deletes = Vec::new();
        let mut replaces = Vec::new();
        let mut deletes = Vec::new();
        let mut unresolved = Vec::new();

        for endpoint in &changes.create {
            match self.replace_op(current, endpoint, resolver) {
                Ok(op) => replaces.push(op),
                Err(_) => unresolved.push(endpoint.clone()),
            }
        }

        for (old, new) in pair_updates(&changes.update_old, &changes.update_new) {
            let replace = match self.replace_op(current, new, resolver) {
                Ok(op) => op,
                Err(_) => {
                    // The old record set stays untouched without a replacement
                    if !old.same_key(new) {
                        unresolved.push(old.clone());
                    }
                    unresolved.push(new.clone());
                    continue;
                }
            };

            if !old.same_key(new) {
                debug!(
                    "Renaming {} ({}) to {} ({})",
                    old.dns_name, old.record_type, new.dns_name, new.record_type
                );
                match delete_op(current, old, resolver) {
                    Ok(op) => rename_deletes.push(op),
                    Err(_) => unresolved.push(old.clone()),
                }
            }
            replaces.push(replace);
        }

        for endpoint in &changes.delete {
            match delete_op(current, endpoint, resolver) {
                Ok(op) => deletes.push(op),
                Err(_) => unresolved.push(endpoint.clone()),
            }
        }

        for endpoint in &unresolved {
            warn!(
                "Skipping {} ({}): not in any owned zone",
                endpoint.dns_name, endpoint.record_type
            );
        }

        let mut ops = rename_deletes;
        ops.extend(replaces);
        ops.extend(deletes);

        Ok(Translation { ops, unresolved })
    }

    fn replace_op(
        &self,
        current: &ZoneSnapshot,
        endpoint: &Endpoint,
        resolver: &ZoneResolver,
    ) -> Result<WriteOp> {
        let resolved = resolver.resolve(&endpoint.dns_name)?;

        if current.contains(&resolved.zone, &endpoint.dns_name, endpoint.record_type) {
            debug!(
                "Replacing existing record set {} ({})",
                endpoint.dns_name, endpoint.record_type
            );
        }

        Ok(WriteOp::ReplaceRecordSet {
            records: self.aggregator.expand(endpoint, &resolved),
            name: resolved.record_name().to_string(),
            zone: resolved.zone,
            record_type: endpoint.record_type,
        })
    }
}

fn delete_op(current: &ZoneSnapshot, endpoint: &Endpoint, resolver: &ZoneResolver) -> Result<WriteOp> {
    let resolved = resolver.resolve(&endpoint.dns_name)?;

    if current.get(&resolved.zone).is_some()
        && !current.contains(&resolved.zone, &endpoint.dns_name, endpoint.record_type)
    {
        warn!(
            "Deleting {} ({}) which is absent from the current snapshot",
            endpoint.dns_name, endpoint.record_type
        );
    }

    Ok(WriteOp::DeleteRecordSet {
        name: resolved.record_name().to_string(),
        zone: resolved.zone,
        record_type: endpoint.record_type,
    })
}

/// Pair old and new update entries
///
/// Entries addressing the same name + type pair up first; the rest pair
/// positionally, which is how renames arrive. Pairs keep `new` input order.
fn pair_updates<'e>(old: &'e [Endpoint], new: &'e [Endpoint]) -> Vec<(&'e Endpoint, &'e Endpoint)> {
    let mut taken = vec![false; old.len()];
    let mut matched: Vec<Option<usize>> = Vec::with_capacity(new.len());

    for n in new {
        let found = old
            .iter()
            .enumerate()
            .find(|(i, o)| !taken[*i] && o.same_key(n))
            .map(|(i, _)| i);
        if let Some(i) = found {
            taken[i] = true;
        }
        matched.push(found);
    }

    let mut leftovers = taken
        .iter()
        .enumerate()
        .filter(|(_, t)| !**t)
        .map(|(i, _)| i);

    new.iter()
        .zip(matched)
        .filter_map(|(n, m)| m.or_else(|| leftovers.next()).map(|i| (&old[i], n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TtlPolicy;
    use crate::error::Error;
    use crate::model::{APEX_NAME, RecordType, Zone, ZoneRecord};

    fn aggregator() -> RecordAggregator {
        RecordAggregator::new(TtlPolicy::new(600, 0))
    }

    fn resolver() -> ZoneResolver {
        ZoneResolver::new([Zone::new("example.net"), Zone::new("example.org")])
    }

    fn delete(zone: &str, name: &str, record_type: RecordType) -> WriteOp {
        WriteOp::DeleteRecordSet {
            zone: Zone::new(zone),
            name: name.to_string(),
            record_type,
        }
    }

    #[test]
    fn test_create_and_delete_scenario() {
        let aggregator = aggregator();
        let mut current = ZoneSnapshot::new();
        current.insert(
            Zone::new("example.net"),
            vec![Endpoint::new("godaddy.example.net", RecordType::A, 600, ["203.0.113.43"])],
        );

        let changes = ChangeSet {
            create: vec![Endpoint::new(".example.net", RecordType::A, 300, ["203.0.113.42"])],
            delete: vec![Endpoint::new("godaddy.example.net", RecordType::A, 0, ["203.0.113.43"])],
            ..Default::default()
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&current, &changes, &resolver())
            .unwrap();

        assert!(translation.is_complete());
        assert_eq!(
            translation.ops,
            vec![
                WriteOp::ReplaceRecordSet {
                    zone: Zone::new("example.net"),
                    name: APEX_NAME.to_string(),
                    record_type: RecordType::A,
                    records: vec![ZoneRecord::new(APEX_NAME, RecordType::A, 300, "203.0.113.42")],
                },
                delete("example.net", "godaddy", RecordType::A),
            ]
        );
    }

    #[test]
    fn test_update_in_place_is_single_replace() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            update_old: vec![Endpoint::new("www.example.org", RecordType::A, 600, ["10.0.0.1"])],
            update_new: vec![Endpoint::new("www.example.org", RecordType::A, 600, ["10.0.0.1", "10.0.0.2"])],
            ..Default::default()
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&ZoneSnapshot::new(), &changes, &resolver())
            .unwrap();

        assert_eq!(translation.ops.len(), 1);
        match &translation.ops[0] {
            WriteOp::ReplaceRecordSet { name, records, .. } => {
                assert_eq!(name, "www");
                assert_eq!(records.len(), 2);
            }
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn test_rename_deletes_old_key_first() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            create: vec![Endpoint::new("new.example.net", RecordType::Txt, 0, ["hello"])],
            update_old: vec![Endpoint::new("old.example.org", RecordType::Cname, 600, ["a.example.org"])],
            update_new: vec![Endpoint::new("renamed.example.org", RecordType::Cname, 600, ["a.example.org"])],
            delete: vec![Endpoint::new("gone.example.net", RecordType::A, 0, ["1.1.1.1"])],
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&ZoneSnapshot::new(), &changes, &resolver())
            .unwrap();

        let summary: Vec<String> = translation.ops.iter().map(ToString::to_string).collect();
        assert_eq!(
            summary,
            vec![
                "delete CNAME old in example.org",
                "replace TXT new in example.net",
                "replace CNAME renamed in example.org",
                "delete A gone in example.net",
            ]
        );
    }

    #[test]
    fn test_type_change_is_rename() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            update_old: vec![Endpoint::new("x.example.net", RecordType::A, 600, ["1.1.1.1"])],
            update_new: vec![Endpoint::new("x.example.net", RecordType::Cname, 600, ["y.example.net"])],
            ..Default::default()
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&ZoneSnapshot::new(), &changes, &resolver())
            .unwrap();

        assert_eq!(translation.ops[0], delete("example.net", "x", RecordType::A));
        assert_eq!(translation.ops[1].kind(), "replace");
        assert_eq!(translation.ops[1].record_type(), RecordType::Cname);
    }

    #[test]
    fn test_updates_pair_by_identity_before_position() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            update_old: vec![
                Endpoint::new("b.example.net", RecordType::A, 600, ["2.2.2.2"]),
                Endpoint::new("a.example.net", RecordType::A, 600, ["1.1.1.1"]),
            ],
            update_new: vec![
                Endpoint::new("a.example.net", RecordType::A, 600, ["1.1.1.9"]),
                Endpoint::new("b.example.net", RecordType::A, 600, ["2.2.2.9"]),
            ],
            ..Default::default()
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&ZoneSnapshot::new(), &changes, &resolver())
            .unwrap();

        // Same keys on both sides: no rename deletes
        assert_eq!(translation.ops.len(), 2);
        assert!(translation.ops.iter().all(|op| op.kind() == "replace"));
        assert_eq!(translation.ops[0].name(), "a");
        assert_eq!(translation.ops[1].name(), "b");
    }

    #[test]
    fn test_unowned_endpoints_are_reported_not_written() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            create: vec![
                Endpoint::new("www.example.com", RecordType::A, 0, ["1.1.1.1"]),
                Endpoint::new("www.example.org", RecordType::A, 0, ["1.1.1.1"]),
            ],
            delete: vec![Endpoint::new("old.example.com", RecordType::A, 0, ["1.1.1.1"])],
            ..Default::default()
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&ZoneSnapshot::new(), &changes, &resolver())
            .unwrap();

        assert!(!translation.is_complete());
        assert_eq!(translation.ops.len(), 1);
        assert_eq!(translation.ops[0].zone(), &Zone::new("example.org"));
        assert_eq!(
            translation
                .unresolved
                .iter()
                .map(|e| e.dns_name.as_str())
                .collect::<Vec<_>>(),
            vec!["www.example.com", "old.example.com"]
        );
    }

    #[test]
    fn test_rename_into_unowned_zone_keeps_old_record() {
        let aggregator = aggregator();
        let resolver = ZoneResolver::new([Zone::new("example.net")]);
        let changes = ChangeSet {
            update_old: vec![Endpoint::new("www.example.net", RecordType::A, 600, ["1.1.1.1"])],
            update_new: vec![Endpoint::new("www.example.org", RecordType::A, 600, ["1.1.1.1"])],
            ..Default::default()
        };

        let translation = ChangeTranslator::new(&aggregator)
            .translate(&ZoneSnapshot::new(), &changes, &resolver)
            .unwrap();

        assert!(translation.ops.is_empty());
        assert_eq!(
            translation
                .unresolved
                .iter()
                .map(|e| e.dns_name.as_str())
                .collect::<Vec<_>>(),
            vec!["www.example.net", "www.example.org"]
        );
    }

    #[test]
    fn test_incomplete_update_pairs_fail() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            update_old: vec![Endpoint::new("a.example.net", RecordType::A, 600, ["1.1.1.1"])],
            ..Default::default()
        };

        let result = ChangeTranslator::new(&aggregator).translate(&ZoneSnapshot::new(), &changes, &resolver());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let aggregator = aggregator();
        let changes = ChangeSet {
            create: vec![
                Endpoint::new("a.example.net", RecordType::A, 0, ["1.1.1.1", "1.1.1.2"]),
                Endpoint::new("b.example.org", RecordType::Aaaa, 0, ["::1"]),
            ],
            delete: vec![Endpoint::new("c.example.net", RecordType::Txt, 0, ["x"])],
            ..Default::default()
        };
        let translator = ChangeTranslator::new(&aggregator);

        let first = translator.translate(&ZoneSnapshot::new(), &changes, &resolver()).unwrap();
        let second = translator.translate(&ZoneSnapshot::new(), &changes, &resolver()).unwrap();
        assert_eq!(first, second);
    }
}
