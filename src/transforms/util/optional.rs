//! Optional transforms.

#![deny(missing_docs)]

use crate::{event::Record, transforms::Transform};

/// Optional transform. Passes every record through unchanged when there is
/// no inner transform.
pub struct Optional<T: Transform>(pub Option<T>);

impl<T: Transform> Transform for Optional<T> {
    fn transform(&mut self, record: Record) -> Option<Record> {
        match self.0 {
            Some(ref mut inner) => inner.transform(record),
            None => Some(record),
        }
    }
}
