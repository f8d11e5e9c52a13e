//! Pluggable output formatters.
//!
//! A formatter renders records to text under an immutable configuration.
//! Formatter types register themselves here and are buildable from
//! declarative configuration documents tagged with `type`.

pub mod json;

use crate::event::Record;
use crate::schema::EventSchema;

/// A configured renderer. Immutable once built, shareable across producer
/// threads.
pub trait Formatter: Send + Sync {
    /// Render a batch of records to text.
    fn render(&self, records: &[Record]) -> crate::Result<String>;
}

/// Deserializable configuration for one formatter type.
#[typetag::serde(tag = "type")]
pub trait FormatterConfig: std::fmt::Debug {
    /// Build the configured formatter for an event type.
    fn build(&self, schema: &EventSchema) -> crate::Result<Box<dyn Formatter>>;

    /// The registry name of the formatter type.
    fn format_type(&self) -> &'static str;
}

/// Registry entry for a formatter type.
pub struct FormatterDescription {
    type_str: &'static str,
}

impl FormatterDescription {
    pub const fn new(type_str: &'static str) -> Self {
        Self { type_str }
    }
}

inventory::collect!(FormatterDescription);

/// The names of every registered formatter type.
pub fn formatter_types() -> Vec<&'static str> {
    inventory::iter::<FormatterDescription>
        .into_iter()
        .map(|description| description.type_str)
        .collect()
}

/// Deserialize a formatter configuration from a JSON document.
pub fn from_json_config(text: &str) -> crate::Result<Box<dyn FormatterConfig>> {
    let config: Box<dyn FormatterConfig> = serde_json::from_str(text)?;
    Ok(config)
}
