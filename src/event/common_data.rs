//! The identity sub-block attached to every record.

use super::{Record, Value};
use serde::{Deserialize, Serialize};

/// Container-runtime identity of the event's origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeMetadata {
    pub container_name: String,
    pub container_id: String,
    pub container_image: String,
}

/// Kubernetes identity of the event's origin, present only when the
/// container runs inside a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct K8sMetadata {
    pub namespace: String,
    pub pod_name: String,
    pub owner: String,
}

/// The identity sub-block attached to every record before formatting.
///
/// Serialized as two nested blocks under the `runtime` and `k8s` field
/// names; the `k8s` block is omitted outside Kubernetes mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommonData {
    pub runtime: RuntimeMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k8s: Option<K8sMetadata>,
}

impl RuntimeMetadata {
    /// The nested-block value form of this metadata.
    pub fn to_value(&self) -> Value {
        Value::map([
            ("container_name", self.container_name.as_str()),
            ("container_id", self.container_id.as_str()),
            ("container_image", self.container_image.as_str()),
        ])
    }
}

impl K8sMetadata {
    /// The nested-block value form of this metadata.
    pub fn to_value(&self) -> Value {
        Value::map([
            ("namespace", self.namespace.as_str()),
            ("pod_name", self.pod_name.as_str()),
            ("owner", self.owner.as_str()),
        ])
    }
}

impl CommonData {
    /// Identity for a plain (non-Kubernetes) container.
    pub fn for_container(name: &str, image: &str, id: &str) -> Self {
        Self {
            runtime: RuntimeMetadata {
                container_name: name.to_owned(),
                container_id: id.to_owned(),
                container_image: image.to_owned(),
            },
            k8s: None,
        }
    }

    /// Insert the identity blocks into a record, replacing existing ones.
    pub fn apply_to(&self, record: &mut Record) {
        record.insert("runtime", self.runtime.to_value());
        if let Some(k8s) = &self.k8s {
            record.insert("k8s", k8s.to_value());
        }
    }
}
