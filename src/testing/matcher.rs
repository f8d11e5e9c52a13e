//! Placeholder-aware comparison of captured output against expected records.

use crate::event::{Record, Value};
use crate::schema::{EventSchema, FieldKind};
use snafu::Snafu;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use string_cache::DefaultAtom as Atom;

/// Verification failures.
///
/// `Unmatched` is a structural result, not a crash: its report lists every
/// unmatched expected record and every unconsumed captured entry field by
/// field, so a failure is diagnosable from CI logs alone.
#[derive(Debug, Snafu)]
pub enum MatchError {
    /// The captured output does not parse as JSON.
    #[snafu(display("captured output is not valid JSON: {source}\nraw output:\n{raw}"))]
    Parse {
        raw: String,
        source: serde_json::Error,
    },
    /// The captured output parses, but not as records of the expected type.
    #[snafu(display("captured output has an unsupported shape: {detail}\nraw output:\n{raw}"))]
    UnsupportedShape { detail: String, raw: String },
    /// The captured output does not contain the expected records.
    #[snafu(display("{report}"))]
    Unmatched { report: String },
}

/// Assert that the captured formatter output contains the expected records.
///
/// The output is parsed into records of the schema's type, the caller's
/// normalization routine is applied to each, and every expected record must
/// then consume one distinct captured entry: comparison is unordered,
/// duplicate expectations need duplicate entries, and surplus captured
/// entries are reported as context without failing the match. A field whose
/// expected value is a placeholder matches any well-typed value; every other
/// field must be exactly equal.
pub fn expect_entries_to_match<F>(
    schema: &EventSchema,
    output: &str,
    normalize: F,
    expected: &[Record],
) -> Result<(), MatchError>
where
    F: Fn(&mut Record),
{
    let mut actual = parse_records(schema, output)?;
    for record in &mut actual {
        normalize(record);
    }

    let mut consumed = vec![false; actual.len()];
    let mut unmatched = Vec::new();
    for expected_record in expected {
        let found = actual
            .iter()
            .enumerate()
            .find(|(index, candidate)| !consumed[*index] && record_matches(expected_record, candidate));
        match found {
            Some((index, _)) => consumed[index] = true,
            None => unmatched.push(expected_record),
        }
    }

    if unmatched.is_empty() {
        return Ok(());
    }

    let leftovers: Vec<&Record> = actual
        .iter()
        .zip(&consumed)
        .filter(|(_, consumed)| !**consumed)
        .map(|(record, _)| record)
        .collect();
    UnmatchedSnafu {
        report: build_report(&unmatched, &leftovers),
    }
    .fail()
}

/// Parse captured formatter output into records.
///
/// Accepts every shape the formatter produces: a single object, an array
/// envelope, and newline- or whitespace-separated objects (pretty-printed
/// included).
pub fn parse_records(schema: &EventSchema, output: &str) -> Result<Vec<Record>, MatchError> {
    let mut records = Vec::new();
    if output.trim().is_empty() {
        return Ok(records);
    }

    let stream = serde_json::Deserializer::from_str(output).into_iter::<serde_json::Value>();
    for item in stream {
        let value = item.map_err(|source| MatchError::Parse {
            raw: output.to_owned(),
            source,
        })?;
        match value {
            serde_json::Value::Array(entries) => {
                for entry in entries {
                    records.push(record_from_json(schema, entry, output)?);
                }
            }
            entry => records.push(record_from_json(schema, entry, output)?),
        }
    }
    Ok(records)
}

fn record_from_json(
    schema: &EventSchema,
    value: serde_json::Value,
    raw: &str,
) -> Result<Record, MatchError> {
    let object = match value {
        serde_json::Value::Object(object) => object,
        other => {
            return UnsupportedShapeSnafu {
                detail: format!("expected an object entry, got {}", other),
                raw,
            }
            .fail()
        }
    };

    let mut record = Record::new();
    for (name, value) in object {
        if value.is_null() {
            continue;
        }
        let field_value = match schema.field(&name).map(|field| field.kind()) {
            Some(FieldKind::Integer) => {
                value
                    .as_i64()
                    .map(Value::Integer)
                    .ok_or_else(|| shape_error(&name, "a signed integer", &value, raw))?
            }
            Some(FieldKind::Unsigned) => {
                value
                    .as_u64()
                    .map(Value::Unsigned)
                    .ok_or_else(|| shape_error(&name, "an unsigned integer", &value, raw))?
            }
            Some(FieldKind::String) => {
                match value {
                    serde_json::Value::String(string) => Value::from(string),
                    other => return Err(shape_error(&name, "a string", &other, raw)),
                }
            }
            Some(FieldKind::Nested) | None => infer_value(&name, value, raw)?,
        };
        record.insert(name, field_value);
    }
    Ok(record)
}

/// Parse a value whose kind the schema does not pin down (nested blocks and
/// fields outside the schema).
fn infer_value(name: &str, value: serde_json::Value, raw: &str) -> Result<Value, MatchError> {
    match value {
        serde_json::Value::String(string) => Ok(Value::from(string)),
        serde_json::Value::Number(number) => {
            if let Some(value) = number.as_u64() {
                Ok(Value::Unsigned(value))
            } else if let Some(value) = number.as_i64() {
                Ok(Value::Integer(value))
            } else {
                Err(shape_error(name, "an integer", &number.into(), raw))
            }
        }
        serde_json::Value::Object(object) => {
            let mut map = BTreeMap::new();
            for (key, value) in object {
                if value.is_null() {
                    continue;
                }
                let nested = infer_value(&key, value, raw)?;
                map.insert(Atom::from(key.as_str()), nested);
            }
            Ok(Value::Map(map))
        }
        other => Err(shape_error(name, "a supported value", &other, raw)),
    }
}

fn shape_error(name: &str, wanted: &str, got: &serde_json::Value, raw: &str) -> MatchError {
    MatchError::UnsupportedShape {
        detail: format!("field {:?}: expected {}, got {}", name, wanted, got),
        raw: raw.to_owned(),
    }
}

/// Placeholder-aware equality for one field.
fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::NormalizedInt, Value::Integer(_) | Value::Unsigned(_) | Value::NormalizedInt) => {
            true
        }
        (Value::NormalizedStr, Value::Bytes(_) | Value::NormalizedStr) => true,
        (Value::Map(expected), Value::Map(actual)) => expected.iter().all(|(name, want)| {
            actual
                .get(name)
                .map_or(false, |value| values_match(want, value))
        }),
        (Value::Integer(expected), Value::Unsigned(actual)) => {
            u64::try_from(*expected).map_or(false, |expected| expected == *actual)
        }
        (Value::Unsigned(expected), Value::Integer(actual)) => {
            u64::try_from(*actual).map_or(false, |actual| actual == *expected)
        }
        _ => expected == actual,
    }
}

/// Whether the captured record satisfies every field the expected record
/// carries. Extra captured fields are ignored, matching the original
/// harness's unmarshal-into-a-closed-struct semantics.
fn record_matches(expected: &Record, actual: &Record) -> bool {
    expected.iter().all(|(name, want)| {
        actual
            .get_atom(name)
            .map_or(false, |value| values_match(want, value))
    })
}

fn differing_count(expected: &Record, actual: &Record) -> usize {
    expected
        .iter()
        .filter(|(name, want)| {
            actual
                .get_atom(name)
                .map_or(true, |value| !values_match(want, value))
        })
        .count()
}

fn build_report(unmatched: &[&Record], leftovers: &[&Record]) -> String {
    let mut report = String::new();
    let _ = writeln!(
        report,
        "verification failed: {} expected record(s) unmatched, {} captured entry(ies) unconsumed",
        unmatched.len(),
        leftovers.len()
    );

    for (index, expected) in unmatched.iter().enumerate() {
        let _ = writeln!(report, "expected record #{}:", index + 1);
        write_record(&mut report, expected);

        let closest = leftovers
            .iter()
            .min_by_key(|candidate| differing_count(expected, candidate));
        if let Some(closest) = closest {
            let _ = writeln!(
                report,
                "  closest unconsumed entry ({} differing field(s)):",
                differing_count(expected, closest)
            );
            write_comparison(&mut report, expected, closest);
        }
    }

    if !leftovers.is_empty() {
        let _ = writeln!(report, "unconsumed captured entries:");
        for (index, actual) in leftovers.iter().enumerate() {
            let _ = writeln!(report, "  entry #{}:", index + 1);
            write_record(&mut report, actual);
        }
    }

    report
}

fn write_record(report: &mut String, record: &Record) {
    for (name, value) in record.iter() {
        let _ = writeln!(report, "    {}: {}", name, value);
    }
}

fn write_comparison(report: &mut String, expected: &Record, actual: &Record) {
    for (name, value) in actual.iter() {
        match expected.get_atom(name) {
            Some(want) if !values_match(want, value) => {
                let _ = writeln!(report, "    {}: {} (want {})", name, value, want);
            }
            _ => {
                let _ = writeln!(report, "    {}: {}", name, value);
            }
        }
    }
    for (name, want) in expected.iter() {
        if actual.get_atom(name).is_none() {
            let _ = writeln!(report, "    {}: <absent> (want {})", name, want);
        }
    }
}
