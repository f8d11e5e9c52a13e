//! The structured-event model: typed values, the ordered field map, and the
//! identity sub-block shared by every event type.

mod common_data;
mod value;

pub use common_data::{CommonData, K8sMetadata, RuntimeMetadata};
pub use value::Value;

use std::collections::BTreeMap;
use string_cache::DefaultAtom as Atom;

/// One structured, named-field representation of an observed event.
///
/// Field values are looked up by name; the order fields are *rendered* in is
/// dictated by the event schema and the formatter configuration, not by this
/// map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<Atom, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<Atom>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(&Atom::from(name))
    }

    /// Lookup by pre-interned name, for callers on the per-event path.
    pub fn get_atom(&self, name: &Atom) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(&Atom::from(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(&Atom::from(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&Atom::from(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Atom, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<BTreeMap<Atom, Value>> for Record {
    fn from(fields: BTreeMap<Atom, Value>) -> Self {
        Self { fields }
    }
}

impl FromIterator<(Atom, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (Atom, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
