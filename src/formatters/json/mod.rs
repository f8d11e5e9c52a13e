//! The JSON output formatter.
//!
//! Renders records as compact or pretty-printed JSON, either one object per
//! line or wrapped in a single array. The rendered field set is resolved
//! from the formatter configuration and the event schema; configuration is
//! an ordered fold over typed option deltas, applied before the first render
//! and frozen afterwards.

use crate::event::{Record, Value};
use crate::formatters::{Formatter, FormatterConfig, FormatterDescription};
use crate::schema::EventSchema;
use serde::ser::{Serialize, SerializeMap};
use serde::Deserialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use snafu::{ensure, ResultExt, Snafu};
use string_cache::DefaultAtom as Atom;

const COMPONENT_NAME: &str = "json";

const DEFAULT_INDENT: &str = "  ";

inventory::submit! {
    FormatterDescription::new(COMPONENT_NAME)
}

/// Errors produced while rendering.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The configuration resolved to nothing to render.
    #[snafu(display("the resolved field selection is empty"))]
    EmptySelection,
    /// A selected string value cannot be encoded as JSON text.
    #[snafu(display("field {field:?} holds a non-UTF-8 string value"))]
    NonUtf8Value { field: String },
    /// The serializer itself failed.
    #[snafu(display("JSON serialization failed: {source}"))]
    Json { source: serde_json::Error },
}

/// A single configuration mutation.
///
/// Options apply in order, each mutating exactly the attributes it governs;
/// the last write to an attribute wins. `ShowAll(true)` additionally reverts
/// the selection to the schema's field set and disables the array envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonOption {
    /// Render exactly these fields, in this order.
    Fields(Vec<Atom>),
    /// Render every schema field instead of the default set.
    ShowAll(bool),
    /// Pretty-print with the given indent text per nesting level.
    Pretty { enabled: bool, indent: String },
    /// Envelope the batch as one JSON array instead of one object per line.
    Array(bool),
}

/// Render exactly these fields, in this order.
pub fn with_fields<I, S>(names: I) -> JsonOption
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    JsonOption::Fields(
        names
            .into_iter()
            .map(|name| Atom::from(name.as_ref()))
            .collect(),
    )
}

/// Render every schema field instead of the default set.
pub fn with_show_all(value: bool) -> JsonOption {
    JsonOption::ShowAll(value)
}

/// Pretty-print with the given indent text per nesting level.
pub fn with_pretty(enabled: bool, indent: impl Into<String>) -> JsonOption {
    JsonOption::Pretty {
        enabled,
        indent: indent.into(),
    }
}

/// Envelope batches as one JSON array.
pub fn with_array(value: bool) -> JsonOption {
    JsonOption::Array(value)
}

#[derive(Debug, Clone, PartialEq)]
struct RenderConfig {
    fields: Vec<Atom>,
    use_default: bool,
    show_all: bool,
    pretty: bool,
    indent: String,
    array: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            use_default: true,
            show_all: false,
            pretty: false,
            indent: DEFAULT_INDENT.to_owned(),
            array: false,
        }
    }
}

impl RenderConfig {
    fn apply(&mut self, option: JsonOption) {
        match option {
            JsonOption::Fields(names) => {
                self.fields = names;
                self.use_default = false;
            }
            JsonOption::ShowAll(value) => {
                self.show_all = value;
                if value {
                    self.use_default = true;
                    self.array = false;
                }
            }
            JsonOption::Pretty { enabled, indent } => {
                self.pretty = enabled;
                self.indent = indent;
            }
            JsonOption::Array(value) => {
                self.array = value;
            }
        }
    }
}

/// A JSON renderer bound to one event schema.
pub struct JsonFormatter {
    schema: EventSchema,
    config: RenderConfig,
}

impl JsonFormatter {
    /// Build a formatter by folding the options over the zero-value
    /// configuration, in order.
    pub fn new(schema: EventSchema, options: impl IntoIterator<Item = JsonOption>) -> Self {
        let mut config = RenderConfig::default();
        for option in options {
            config.apply(option);
        }
        Self { schema, config }
    }

    /// A formatter with the zero-value configuration: the schema's default
    /// field set, compact, one object per line.
    pub fn with_defaults(schema: EventSchema) -> Self {
        Self::new(schema, std::iter::empty())
    }

    /// Render a batch. A record whose selected values cannot be encoded is
    /// logged and skipped; the rest of the batch still renders.
    pub fn render(&self, records: &[Record]) -> Result<String, Error> {
        let fields = self.resolved_fields();
        ensure!(!fields.is_empty(), EmptySelectionSnafu);

        let mut selected = Vec::with_capacity(records.len());
        for record in records {
            match select_fields(&fields, record) {
                Ok(entry) => selected.push(entry),
                Err(error) => {
                    warn!(message = "Dropping record that failed to encode.", %error)
                }
            }
        }

        if self.config.array {
            to_json_string(&selected, self.config.pretty, &self.config.indent)
        } else {
            let mut units = Vec::with_capacity(selected.len());
            for entry in &selected {
                units.push(to_json_string(entry, self.config.pretty, &self.config.indent)?);
            }
            Ok(units.join("\n"))
        }
    }

    /// Render a single record, surfacing its encoding error to the caller.
    pub fn render_record(&self, record: &Record) -> Result<String, Error> {
        let fields = self.resolved_fields();
        ensure!(!fields.is_empty(), EmptySelectionSnafu);

        let entry = select_fields(&fields, record)?;
        to_json_string(&entry, self.config.pretty, &self.config.indent)
    }

    /// The field names to render, in render order: the explicit list when
    /// one was configured (unknown names dropped), otherwise the schema's
    /// default set, widened to every field under show-all.
    fn resolved_fields(&self) -> Vec<Atom> {
        if self.config.use_default {
            if self.config.show_all {
                self.schema
                    .fields()
                    .iter()
                    .map(|field| field.name().clone())
                    .collect()
            } else {
                self.schema
                    .default_fields()
                    .map(|field| field.name().clone())
                    .collect()
            }
        } else {
            self.config
                .fields
                .iter()
                .filter(|name| self.schema.field(name).is_some())
                .cloned()
                .collect()
        }
    }
}

impl Formatter for JsonFormatter {
    fn render(&self, records: &[Record]) -> crate::Result<String> {
        JsonFormatter::render(self, records).map_err(Into::into)
    }
}

/// Declarative configuration for the `json` formatter.
///
/// Lowered into option deltas on build; the show-all override is applied
/// last so its documented interaction always holds.
#[derive(Deserialize, serde::Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, default)]
pub struct JsonFormatterConfig {
    fields: Option<Vec<String>>,
    show_all: bool,
    pretty: bool,
    indent: Option<String>,
    array: bool,
}

#[typetag::serde(name = "json")]
impl FormatterConfig for JsonFormatterConfig {
    fn build(&self, schema: &EventSchema) -> crate::Result<Box<dyn Formatter>> {
        let mut options = Vec::new();
        if let Some(fields) = &self.fields {
            options.push(with_fields(fields));
        }
        options.push(with_array(self.array));
        options.push(with_pretty(
            self.pretty,
            self.indent.clone().unwrap_or_else(|| DEFAULT_INDENT.to_owned()),
        ));
        options.push(with_show_all(self.show_all));
        Ok(Box::new(JsonFormatter::new(schema.clone(), options)))
    }

    fn format_type(&self) -> &'static str {
        COMPONENT_NAME
    }
}

/// One record reduced to its selected fields, in render order.
struct SelectedRecord<'a> {
    entries: Vec<(Atom, &'a Value)>,
}

impl Serialize for SelectedRecord<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Pick the resolved fields out of a record; fields the record does not
/// carry are omitted.
fn select_fields<'a>(fields: &[Atom], record: &'a Record) -> Result<SelectedRecord<'a>, Error> {
    let mut entries = Vec::with_capacity(fields.len());
    for name in fields {
        if let Some(value) = record.get_atom(name) {
            ensure!(
                value.is_valid_utf8(),
                NonUtf8ValueSnafu {
                    field: name.to_string()
                }
            );
            entries.push((name.clone(), value));
        }
    }
    Ok(SelectedRecord { entries })
}

fn to_json_string<T: Serialize>(value: &T, pretty: bool, indent: &str) -> Result<String, Error> {
    let buffer = if pretty {
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = Serializer::with_formatter(Vec::new(), formatter);
        value.serialize(&mut serializer).context(JsonSnafu)?;
        serializer.into_inner()
    } else {
        let mut serializer = Serializer::new(Vec::new());
        value.serialize(&mut serializer).context(JsonSnafu)?;
        serializer.into_inner()
    };
    Ok(String::from_utf8(buffer).expect("serde_json emits valid UTF-8"))
}
