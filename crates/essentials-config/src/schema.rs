//! Declarative configuration schema.
//!
//! A [`Schema`] is an ordered tree: every entry is either a [`Field`] (a leaf
//! that reads one environment variable) or a nested [`Schema`] group.

use crate::ConfigValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a field's raw environment value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Digits only, decoded to `u64`.
    Integer,
    /// `true`/`True`/`false`/`False`.
    Boolean,
    /// Comma separated, each element trimmed. Empty string is an empty list.
    StringList,
    /// Passed through unchanged.
    String,
}

/// A leaf of the schema.
///
/// # Example
///
/// ```
/// use essentials_config::{Field, FieldKind};
///
/// let port = Field::integer().with_default(8080);
/// assert_eq!(port.kind(), FieldKind::Integer);
/// assert!(!port.is_optional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    kind: FieldKind,
    default: Option<ConfigValue>,
    optional: bool,
}

impl Field {
    /// Creates a required field of the given kind.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            optional: false,
        }
    }

    /// An integer field.
    #[must_use]
    pub const fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    /// A boolean field.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// A comma separated string list field.
    #[must_use]
    pub const fn string_list() -> Self {
        Self::new(FieldKind::StringList)
    }

    /// A string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// Value used when the variable is unset.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Omit the key from the result when the variable is unset.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Returns the field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the default value.
    #[must_use]
    pub const fn default_value(&self) -> Option<&ConfigValue> {
        self.default.as_ref()
    }

    /// Returns `true` if the field may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

/// An entry of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A leaf.
    Field(Field),
    /// A nested group.
    Group(Schema),
}

/// Ordered configuration schema.
///
/// # Example
///
/// ```
/// use essentials_config::{Field, Schema};
///
/// let schema = Schema::new()
///     .group("server", Schema::new().field("port", Field::integer()))
///     .field("features", Field::string_list().with_default(Vec::<String>::new()));
///
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    entries: IndexMap<String, Node>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, field: Field) -> Self {
        self.entries.insert(key.into(), Node::Field(field));
        self
    }

    /// Adds a nested group.
    #[must_use]
    pub fn group(mut self, key: impl Into<String>, schema: Schema) -> Self {
        self.entries.insert(key.into(), Node::Group(schema));
        self
    }

    /// Returns the entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Returns the number of direct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the schema has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
