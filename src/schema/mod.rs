//! Ordered field schemas for event types.
//!
//! A schema describes, for one event type, the set of named fields, their
//! semantic kind, and whether they belong to the type's default render set.
//! Formatters resolve field selections against it; the verification parser
//! uses it to coerce JSON numbers to the right integer kind.

use string_cache::DefaultAtom as Atom;

/// The semantic kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed integer (return codes, PIDs).
    Integer,
    /// Unsigned integer (timestamps, namespace ids, bitmasks).
    Unsigned,
    /// UTF-8 string.
    String,
    /// A nested block of named fields, such as the identity sub-block.
    Nested,
}

/// One field of an event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    name: Atom,
    kind: FieldKind,
    default_visible: bool,
}

impl FieldSchema {
    pub fn name(&self) -> &Atom {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn default_visible(&self) -> bool {
        self.default_visible
    }
}

/// The ordered field schema of one event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSchema {
    event_type: String,
    fields: Vec<FieldSchema>,
}

impl EventSchema {
    pub fn builder(event_type: impl Into<String>) -> EventSchemaBuilder {
        EventSchemaBuilder {
            event_type: event_type.into(),
            fields: Vec::new(),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Every field, in schema order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// The default-visible fields, in schema order.
    pub fn default_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|field| field.default_visible)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| &*field.name == name)
    }
}

/// Builds an [`EventSchema`] field by field; declaration order is render
/// order.
pub struct EventSchemaBuilder {
    event_type: String,
    fields: Vec<FieldSchema>,
}

impl EventSchemaBuilder {
    /// Add a default-visible field.
    pub fn field(self, name: &str, kind: FieldKind) -> Self {
        self.push(name, kind, true)
    }

    /// Add a field left out of the default render set.
    pub fn hidden_field(self, name: &str, kind: FieldKind) -> Self {
        self.push(name, kind, false)
    }

    fn push(mut self, name: &str, kind: FieldKind, default_visible: bool) -> Self {
        self.fields.push(FieldSchema {
            name: Atom::from(name),
            kind,
            default_visible,
        });
        self
    }

    pub fn build(self) -> EventSchema {
        EventSchema {
            event_type: self.event_type,
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> EventSchema {
        EventSchema::builder("example")
            .field("comm", FieldKind::String)
            .field("ret", FieldKind::Integer)
            .hidden_field("flags", FieldKind::Unsigned)
            .build()
    }

    #[test]
    fn default_set_skips_hidden_fields() {
        let schema = schema();
        let default: Vec<&str> = schema.default_fields().map(|f| &**f.name()).collect();
        assert_eq!(default, vec!["comm", "ret"]);

        let all: Vec<&str> = schema.fields().iter().map(|f| &**f.name()).collect();
        assert_eq!(all, vec!["comm", "ret", "flags"]);
    }

    #[test]
    fn lookup_by_name() {
        let schema = schema();
        assert_eq!(schema.field("flags").map(|f| f.kind()), Some(FieldKind::Unsigned));
        assert!(schema.field("nope").is_none());
    }
}
