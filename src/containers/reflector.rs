//! Watch and cache container metadata.

use super::{watch_state::StartTimeState, LifecycleEvent, MetadataWriter, Watcher};
use async_stream::try_stream;
use futures::{
    pin_mut,
    stream::{Stream, StreamExt},
};
use snafu::Snafu;
use std::time::Duration;
use tokio::time::sleep;

/// Watches container lifecycle events and maintains a local representation
/// of the set of running containers, keyed by mount namespace id.
///
/// Does not expose the state directly; readers hold cloned read handles.
/// The state is published after every applied event, and stale events are
/// dropped so a watch restart cannot regress it.
pub struct Reflector<W>
where
    W: Watcher,
{
    watcher: W,
    state: MetadataWriter,
    start_times: StartTimeState,
    pause_between_requests: Duration,
}

impl<W> Reflector<W>
where
    W: Watcher,
{
    /// Create a new [`Reflector`].
    pub fn new(watcher: W, state: MetadataWriter, pause_between_requests: Duration) -> Self {
        Self {
            watcher,
            state,
            start_times: StartTimeState::new(),
            pause_between_requests,
        }
    }

    /// Run the watch loop, yielding every applied lifecycle event.
    pub fn run(&mut self) -> impl Stream<Item = Result<LifecycleEvent, Error<W>>> + '_ {
        try_stream! {
            loop {
                let invocation_result = self.watcher.watch().await;
                let stream = match invocation_result {
                    Ok(val) => val,
                    Err(source) => {
                        Err(Error::Invocation { source })?;
                        return;
                    }
                };

                pin_mut!(stream);
                while let Some(item) = stream.next().await {
                    // Any error here is considered critical, do not attempt
                    // to retry and just quit.
                    let item = item.map_err(|source| Error::Streaming { source })?;

                    if !self.start_times.update(&item) {
                        debug!(message = "Dropping stale lifecycle event.", event = ?item);
                        continue;
                    }

                    self.apply(&item);

                    yield item;
                }

                // For the next pause duration we won't get any updates.
                // This is better than hammering the discovery backend.
                sleep(self.pause_between_requests).await;
            }
        }
    }

    fn apply(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Added(meta) => {
                self.state.update(meta.mount_ns_id, Box::new(meta.clone()));
            }
            LifecycleEvent::Removed { mount_ns_id } => {
                self.state.empty(*mount_ns_id);
            }
        }
        self.state.refresh();
    }
}

/// Errors that can occur while watching.
#[derive(Debug, Snafu)]
pub enum Error<W>
where
    W: Watcher,
{
    /// Starting a watch failed.
    #[snafu(display("starting the lifecycle watch failed: {source}"))]
    Invocation {
        /// The underlying invocation error.
        source: <W as Watcher>::InvocationError,
    },
    /// The live stream failed.
    #[snafu(display("the lifecycle stream failed: {source}"))]
    Streaming {
        /// The underlying stream error.
        source: <W as Watcher>::StreamError,
    },
}
