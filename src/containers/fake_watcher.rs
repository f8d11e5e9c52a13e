//! A watcher replaying a fixed sequence of lifecycle events, for tests.

use super::{LifecycleEvent, Watcher};
use futures::stream;
use std::convert::Infallible;

/// Replays the same lifecycle-event sequence on every watch invocation.
#[derive(Debug)]
pub struct FakeWatcher<I> {
    iter: I,
}

impl<I> FakeWatcher<I>
where
    I: Iterator<Item = Result<LifecycleEvent, Infallible>> + Clone,
{
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> Watcher for FakeWatcher<I>
where
    I: Iterator<Item = Result<LifecycleEvent, Infallible>> + Clone,
{
    type Stream = stream::Iter<I>;
    type InvocationError = Infallible;
    type StreamError = Infallible;

    async fn watch(&mut self) -> Result<Self::Stream, Self::InvocationError> {
        Ok(stream::iter(self.iter.clone()))
    }
}
