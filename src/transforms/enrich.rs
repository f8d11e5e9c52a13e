//! Attach container and Kubernetes identity to records.

use crate::containers::{ContainerMetadata, MetadataReader};
use crate::event::{CommonData, Record, Value};
use crate::transforms::{util::optional::Optional, Transform};
use string_cache::DefaultAtom as Atom;

/// The enrichment stage: a common-data enricher with optional pass-through.
pub type Enricher = Optional<CommonDataEnricher>;

/// Build the enrichment stage of the pipeline.
pub fn build(enabled: bool, containers: MetadataReader) -> Enricher {
    Optional(if enabled {
        Some(CommonDataEnricher::new(containers))
    } else {
        None
    })
}

/// Looks the originating container up by mount namespace id and inserts the
/// identity blocks before the record reaches a formatter.
///
/// Enrichment never consumes a record: an unattributable event keeps flowing
/// with a zero-valued runtime block.
pub struct CommonDataEnricher {
    containers: MetadataReader,
    atom_mount_ns_id: Atom,
}

impl CommonDataEnricher {
    pub fn new(containers: MetadataReader) -> Self {
        Self {
            containers,
            atom_mount_ns_id: Atom::from("mount_ns_id"),
        }
    }

    fn lookup(&self, mount_ns_id: u64) -> Option<ContainerMetadata> {
        let read_ref = self.containers.read()?;
        read_ref
            .get(&mount_ns_id)
            .and_then(|values| values.get_one())
            .map(|boxed| (**boxed).clone())
    }
}

impl Transform for CommonDataEnricher {
    fn transform(&mut self, mut record: Record) -> Option<Record> {
        let common = match record.get_atom(&self.atom_mount_ns_id) {
            Some(Value::Unsigned(mount_ns_id)) => {
                let mount_ns_id = *mount_ns_id;
                match self.lookup(mount_ns_id) {
                    Some(meta) => meta.common_data(),
                    None => {
                        debug!(
                            message = "No container metadata for mount namespace.",
                            mount_ns_id
                        );
                        CommonData::default()
                    }
                }
            }
            _ => {
                debug!(message = "Missing field.", field = %self.atom_mount_ns_id);
                CommonData::default()
            }
        };

        common.apply_to(&mut record);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{metadata_state, PodMetadata};
    use chrono::{TimeZone, Utc};
    use string_cache::DefaultAtom as Atom;

    fn container(mount_ns_id: u64) -> ContainerMetadata {
        ContainerMetadata {
            id: "abc123".to_owned(),
            name: "test-trace-mount".to_owned(),
            image: "busybox:latest".to_owned(),
            mount_ns_id,
            started_at: Utc.timestamp_opt(100, 0).unwrap(),
            pod: Some(PodMetadata {
                namespace: "test-ns".to_owned(),
                pod_name: "test-pod".to_owned(),
                owner: "deploy/test".to_owned(),
            }),
        }
    }

    fn runtime_field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
        match record.get("runtime") {
            Some(Value::Map(map)) => map.get(&Atom::from(name)),
            _ => None,
        }
    }

    #[test]
    fn attaches_identity_for_known_namespace() {
        let (reader, mut writer) = metadata_state();
        writer.update(42, Box::new(container(42)));
        writer.refresh();

        let mut enricher = CommonDataEnricher::new(reader);
        let mut record = Record::new();
        record.insert("mount_ns_id", 42u64);

        let record = enricher.transform(record).expect("enricher keeps records");
        assert_eq!(
            runtime_field(&record, "container_name"),
            Some(&Value::from("test-trace-mount"))
        );
        assert!(record.get("k8s").is_some());
    }

    #[test]
    fn unknown_namespace_degrades_to_zero_identity() {
        let (reader, _writer) = metadata_state();
        let mut enricher = CommonDataEnricher::new(reader);

        let mut record = Record::new();
        record.insert("mount_ns_id", 42u64);

        let record = enricher.transform(record).expect("enricher keeps records");
        assert_eq!(runtime_field(&record, "container_name"), Some(&Value::from("")));
        assert!(record.get("k8s").is_none());
    }

    #[test]
    fn missing_field_degrades_to_zero_identity() {
        let (reader, _writer) = metadata_state();
        let mut enricher = CommonDataEnricher::new(reader);

        let record = enricher
            .transform(Record::new())
            .expect("enricher keeps records");
        assert!(record.get("runtime").is_some());
    }

    #[test]
    fn disabled_stage_is_a_passthrough() {
        let (reader, _writer) = metadata_state();
        let mut stage = build(false, reader);

        let record = stage.transform(Record::new()).expect("passthrough");
        assert!(record.get("runtime").is_none());
    }
}
