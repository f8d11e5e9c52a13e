//! Container metadata and the machinery keeping a local copy of it current.
//!
//! Container/runtime discovery itself lives outside this crate; it is
//! consumed here as a stream of lifecycle events through the [`Watcher`]
//! trait. The [`reflector`] maintains the shared metadata state the
//! enrichment stage reads.

pub mod fake_watcher;
pub mod reflector;
pub mod watch_state;

use crate::event::{CommonData, K8sMetadata, RuntimeMetadata};
use chrono::{DateTime, Utc};
use evmap::{ReadHandle, WriteHandle};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

/// Identity of the Kubernetes pod a container belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodMetadata {
    pub namespace: String,
    pub pod_name: String,
    pub owner: String,
}

/// Metadata describing one running container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub id: String,
    pub name: String,
    pub image: String,
    /// The mount namespace the container's processes run in; trace events
    /// are attributed to containers through this id.
    pub mount_ns_id: u64,
    /// Start timestamp as reported by the runtime; decides which of two
    /// out-of-order lifecycle events describes the live container.
    pub started_at: DateTime<Utc>,
    pub pod: Option<PodMetadata>,
}

impl ContainerMetadata {
    /// The identity sub-block to attach to this container's records.
    pub fn common_data(&self) -> CommonData {
        CommonData {
            runtime: RuntimeMetadata {
                container_name: self.name.clone(),
                container_id: self.id.clone(),
                container_image: self.image.clone(),
            },
            k8s: self.pod.as_ref().map(|pod| K8sMetadata {
                namespace: pod.namespace.clone(),
                pod_name: pod.pod_name.clone(),
                owner: pod.owner.clone(),
            }),
        }
    }
}

/// A container lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// A container started, or was discovered on initial sync.
    Added(ContainerMetadata),
    /// The container owning the mount namespace went away.
    Removed { mount_ns_id: u64 },
}

/// Produces streams of lifecycle events from a container-discovery backend.
#[allow(async_fn_in_trait)]
pub trait Watcher {
    /// The stream returned by one successful watch invocation.
    type Stream: Stream<Item = Result<LifecycleEvent, Self::StreamError>>;
    /// Error starting a watch.
    type InvocationError: std::error::Error + 'static;
    /// Error while the stream is live.
    type StreamError: std::error::Error + 'static;

    /// Start a new watch. The returned stream yields lifecycle events until
    /// the backend ends it; the caller re-invokes to resume.
    async fn watch(&mut self) -> Result<Self::Stream, Self::InvocationError>;
}

/// Read side of the shared metadata state, held by enrichers.
pub type MetadataReader = ReadHandle<u64, Box<ContainerMetadata>>;

/// Write side of the shared metadata state, owned by the reflector.
pub type MetadataWriter = WriteHandle<u64, Box<ContainerMetadata>>;

/// Create the shared container-metadata state: one writer for the reflector,
/// any number of cloned readers for enrichers.
pub fn metadata_state() -> (MetadataReader, MetadataWriter) {
    evmap::new()
}
