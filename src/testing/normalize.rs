//! Placeholder rewrites for fields that vary between runs.
//!
//! Each event type gets one normalization routine, written by the test
//! author, that knows exactly which of its fields are volatile. The helpers
//! here are the vocabulary those routines are written in; all of them are
//! total and idempotent.

use crate::event::{Record, Value};
use string_cache::DefaultAtom as Atom;

/// The placeholder any integer value matches.
pub const NORMALIZED_INT: Value = Value::NormalizedInt;

/// The placeholder any string value matches.
pub const NORMALIZED_STR: Value = Value::NormalizedStr;

/// Overwrite a value with the integer placeholder.
pub fn normalize_int(value: &mut Value) {
    *value = NORMALIZED_INT;
}

/// Overwrite a value with the string placeholder.
pub fn normalize_string(value: &mut Value) {
    *value = NORMALIZED_STR;
}

/// Apply a helper to a named field, when the record carries it.
///
/// An absent field stays absent so a missing-field defect still surfaces as
/// a mismatch instead of being papered over.
pub fn normalize_field(record: &mut Record, field: &str, f: impl FnOnce(&mut Value)) {
    if let Some(value) = record.get_mut(field) {
        f(value);
    }
}

/// Rewrite the volatile attributes of the identity sub-block: generated ids
/// vary between runs, names and images do not.
pub fn normalize_common_data(record: &mut Record) {
    if let Some(Value::Map(runtime)) = record.get_mut("runtime") {
        if let Some(value) = runtime.get_mut(&Atom::from("container_id")) {
            normalize_string(value);
        }
    }
    if let Some(Value::Map(k8s)) = record.get_mut("k8s") {
        if let Some(value) = k8s.get_mut(&Atom::from("owner")) {
            normalize_string(value);
        }
    }
}
