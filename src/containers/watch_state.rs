//! Shared state bits for watch implementations.

use super::LifecycleEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Start-timestamp freshness state in the context of a watch stream.
///
/// When a watch restarts, lifecycle events can be replayed or arrive out of
/// order; the runtime-reported start timestamp decides whether an `Added`
/// still describes the live container.
#[derive(Debug, Default)]
pub struct StartTimeState(HashMap<u64, DateTime<Utc>>);

impl StartTimeState {
    /// Create a new [`StartTimeState`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the event and report whether it is fresh enough to apply.
    ///
    /// A stale `Added` (older start timestamp than the known container in
    /// the same mount namespace) and a `Removed` for an unknown container
    /// are both reported as not applicable.
    pub fn update(&mut self, event: &LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::Added(meta) => match self.0.get(&meta.mount_ns_id) {
                Some(known) if *known > meta.started_at => false,
                _ => {
                    self.0.insert(meta.mount_ns_id, meta.started_at);
                    true
                }
            },
            LifecycleEvent::Removed { mount_ns_id } => self.0.remove(mount_ns_id).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::ContainerMetadata;
    use chrono::TimeZone;

    fn container(mount_ns_id: u64, started_secs: i64) -> ContainerMetadata {
        ContainerMetadata {
            id: "c0".to_owned(),
            name: "test".to_owned(),
            image: "busybox:latest".to_owned(),
            mount_ns_id,
            started_at: Utc.timestamp_opt(started_secs, 0).unwrap(),
            pod: None,
        }
    }

    #[test]
    fn stale_added_is_rejected() {
        let mut state = StartTimeState::new();
        assert!(state.update(&LifecycleEvent::Added(container(1, 100))));
        assert!(!state.update(&LifecycleEvent::Added(container(1, 50))));
        assert!(state.update(&LifecycleEvent::Added(container(1, 100))));
        assert!(state.update(&LifecycleEvent::Added(container(1, 200))));
    }

    #[test]
    fn removed_applies_once() {
        let mut state = StartTimeState::new();
        assert!(!state.update(&LifecycleEvent::Removed { mount_ns_id: 1 }));
        assert!(state.update(&LifecycleEvent::Added(container(1, 100))));
        assert!(state.update(&LifecycleEvent::Removed { mount_ns_id: 1 }));
        assert!(!state.update(&LifecycleEvent::Removed { mount_ns_id: 1 }));
    }
}
