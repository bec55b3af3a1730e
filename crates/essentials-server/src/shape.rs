//! Declarative request shapes.
//!
//! A [`Shape`] describes the expected object for one request part. Validation
//! walks the whole input and collects every [`Issue`] rather than stopping at
//! the first one; keys the shape does not declare are stripped from the
//! output.
//!
//! Query strings and route params only carry strings, so those parts are
//! validated with [`Coercion::FromStrings`]: numbers and booleans are parsed
//! from their text form before the type check, and a single value is wrapped
//! when the field is an array.
//!
//! # Example
//!
//! ```rust
//! use essentials_server::shape::{Coercion, FieldShape, Shape};
//! use serde_json::json;
//!
//! let query = Shape::new()
//!     .field("search", FieldShape::string())
//!     .field("page", FieldShape::integer().min(1.0));
//!
//! let value = query
//!     .validate(&json!({"search": "x", "page": "2", "extra": "y"}), Coercion::FromStrings)
//!     .unwrap();
//! assert_eq!(value, json!({"search": "x", "page": 2}));
//! ```

use essentials_core::{Issue, IssuePath};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// How input values are interpreted before the type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Values are taken as they are (JSON bodies).
    None,
    /// String values are parsed into the declared kind (query, params).
    FromStrings,
}

/// The type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A string.
    String,
    /// A whole number.
    Integer,
    /// Any finite number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// An array whose elements all follow the inner field.
    Array(Box<FieldShape>),
    /// A nested object.
    Object(Shape),
    /// Anything; passed through unchecked.
    Any,
}

impl ShapeKind {
    fn expected(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Any => "any",
        }
    }
}

/// Extra checks applied after the type check.
///
/// `Uuid`, `MinLength`, `MaxLength` and `OneOf` apply to strings; `Min` and
/// `Max` to numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Hyphenated UUID.
    Uuid,
    /// Inclusive lower bound.
    Min(f64),
    /// Inclusive upper bound.
    Max(f64),
    /// Minimum length in characters.
    MinLength(usize),
    /// Maximum length in characters.
    MaxLength(usize),
    /// One of a fixed set of values.
    OneOf(Vec<String>),
}

/// A field: kind, presence and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    kind: ShapeKind,
    required: bool,
    constraints: Vec<Constraint>,
}

impl FieldShape {
    fn of(kind: ShapeKind) -> Self {
        Self {
            kind,
            required: true,
            constraints: Vec::new(),
        }
    }

    /// A required string.
    #[must_use]
    pub fn string() -> Self {
        Self::of(ShapeKind::String)
    }

    /// A required whole number.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(ShapeKind::Integer)
    }

    /// A required number.
    #[must_use]
    pub fn number() -> Self {
        Self::of(ShapeKind::Number)
    }

    /// A required boolean.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(ShapeKind::Boolean)
    }

    /// A required array of `item`.
    #[must_use]
    pub fn array(item: FieldShape) -> Self {
        Self::of(ShapeKind::Array(Box::new(item)))
    }

    /// A required nested object.
    #[must_use]
    pub fn object(shape: Shape) -> Self {
        Self::of(ShapeKind::Object(shape))
    }

    /// A required value of any type.
    #[must_use]
    pub fn any() -> Self {
        Self::of(ShapeKind::Any)
    }

    /// Allows the field to be absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Requires a hyphenated UUID string.
    #[must_use]
    pub fn uuid(self) -> Self {
        self.constraint(Constraint::Uuid)
    }

    /// Inclusive numeric lower bound.
    #[must_use]
    pub fn min(self, minimum: f64) -> Self {
        self.constraint(Constraint::Min(minimum))
    }

    /// Inclusive numeric upper bound.
    #[must_use]
    pub fn max(self, maximum: f64) -> Self {
        self.constraint(Constraint::Max(maximum))
    }

    /// Minimum string length.
    #[must_use]
    pub fn min_length(self, length: usize) -> Self {
        self.constraint(Constraint::MinLength(length))
    }

    /// Maximum string length.
    #[must_use]
    pub fn max_length(self, length: usize) -> Self {
        self.constraint(Constraint::MaxLength(length))
    }

    /// Restricts a string to the given values.
    #[must_use]
    pub fn one_of<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraint(Constraint::OneOf(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The field kind.
    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Whether the field must be present.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// An object shape: named fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    fields: IndexMap<String, FieldShape>,
}

impl Shape {
    /// Creates a shape with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldShape) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldShape> {
        self.fields.get(name)
    }

    /// Whether `name` is declared as an array.
    #[must_use]
    pub fn is_array(&self, name: &str) -> bool {
        matches!(
            self.fields.get(name).map(FieldShape::kind),
            Some(ShapeKind::Array(_))
        )
    }

    /// Validates `input`, returning the cleaned object or every issue found.
    pub fn validate(&self, input: &Value, coercion: Coercion) -> Result<Value, Vec<Issue>> {
        let mut issues = Vec::new();
        let output = validate_object(self, input, &[], coercion, &mut issues);
        match output {
            Some(value) if issues.is_empty() => Ok(value),
            _ => Err(issues),
        }
    }
}

fn validate_object(
    shape: &Shape,
    input: &Value,
    path: &[IssuePath],
    coercion: Coercion,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let Value::Object(map) = input else {
        issues.push(Issue::invalid_type(path.to_vec(), "object", received(input)));
        return None;
    };

    let mut output = Map::new();
    for (name, field) in &shape.fields {
        let mut field_path = path.to_vec();
        field_path.push(IssuePath::from(name.as_str()));

        match map.get(name) {
            None => {
                if field.required {
                    issues.push(Issue::required(field_path, field.kind.expected()));
                }
            }
            Some(value) => {
                if let Some(value) = validate_field(field, value, &field_path, coercion, issues) {
                    output.insert(name.clone(), value);
                }
            }
        }
    }
    Some(Value::Object(output))
}

fn validate_field(
    field: &FieldShape,
    value: &Value,
    path: &[IssuePath],
    coercion: Coercion,
    issues: &mut Vec<Issue>,
) -> Option<Value> {
    let value = match coercion {
        Coercion::FromStrings => coerce(&field.kind, value),
        Coercion::None => value.clone(),
    };

    let mismatch = |issues: &mut Vec<Issue>, value: &Value| {
        issues.push(Issue::invalid_type(
            path.to_vec(),
            field.kind.expected(),
            received(value),
        ));
    };

    match (&field.kind, &value) {
        (ShapeKind::Any, _) => Some(value),
        (ShapeKind::String, Value::String(s)) => {
            check_string(s, &field.constraints, path, issues);
            Some(value)
        }
        (ShapeKind::Number, Value::Number(n)) => {
            check_number(n, &field.constraints, path, issues);
            Some(value)
        }
        (ShapeKind::Integer, Value::Number(n)) => match whole(n) {
            Some(int) => {
                check_number(n, &field.constraints, path, issues);
                Some(Value::from(int))
            }
            None => {
                issues.push(Issue::invalid_type(path.to_vec(), "integer", "float"));
                None
            }
        },
        (ShapeKind::Boolean, Value::Bool(_)) => Some(value),
        (ShapeKind::Array(item), Value::Array(items)) => {
            let mut output = Vec::with_capacity(items.len());
            for (index, element) in items.iter().enumerate() {
                let mut element_path = path.to_vec();
                element_path.push(IssuePath::Index(index));
                if let Some(v) = validate_field(item, element, &element_path, coercion, issues) {
                    output.push(v);
                }
            }
            Some(Value::Array(output))
        }
        (ShapeKind::Object(shape), Value::Object(_)) => {
            validate_object(shape, &value, path, coercion, issues)
        }
        _ => {
            mismatch(issues, &value);
            None
        }
    }
}

fn check_string(s: &str, constraints: &[Constraint], path: &[IssuePath], issues: &mut Vec<Issue>) {
    let length = s.chars().count();
    for constraint in constraints {
        match constraint {
            Constraint::Uuid if !is_hyphenated_uuid(s) => {
                issues.push(Issue::invalid_uuid(path.to_vec()));
            }
            Constraint::MinLength(min) if length < *min => {
                issues.push(Issue::string_too_short(path.to_vec(), *min));
            }
            Constraint::MaxLength(max) if length > *max => {
                issues.push(Issue::string_too_long(path.to_vec(), *max));
            }
            Constraint::OneOf(options) if !options.iter().any(|o| o == s) => {
                issues.push(Issue::invalid_enum_value(path.to_vec(), options, s));
            }
            _ => {}
        }
    }
}

fn check_number(n: &Number, constraints: &[Constraint], path: &[IssuePath], issues: &mut Vec<Issue>) {
    let Some(value) = n.as_f64() else { return };
    for constraint in constraints {
        match constraint {
            Constraint::Min(min) if value < *min => {
                issues.push(Issue::number_too_small(path.to_vec(), *min));
            }
            Constraint::Max(max) if value > *max => {
                issues.push(Issue::number_too_big(path.to_vec(), *max));
            }
            _ => {}
        }
    }
}

fn is_hyphenated_uuid(s: &str) -> bool {
    // `Uuid::try_parse` also accepts the simple, braced and urn forms.
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}

fn whole(n: &Number) -> Option<i64> {
    if let Some(int) = n.as_i64() {
        return Some(int);
    }
    let float = n.as_f64()?;
    if float.fract() != 0.0 || float.abs() >= 9_007_199_254_740_992.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let int = float as i64;
    Some(int)
}

/// Parses string input into the declared kind; anything unparseable is
/// returned unchanged so the type check reports it.
fn coerce(kind: &ShapeKind, value: &Value) -> Value {
    match (kind, value) {
        (ShapeKind::Integer | ShapeKind::Number, Value::String(s)) => {
            parse_number(s).unwrap_or_else(|| value.clone())
        }
        (ShapeKind::Boolean, Value::String(s)) => match s.as_str() {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            _ => value.clone(),
        },
        (ShapeKind::Array(_), Value::Array(_)) => value.clone(),
        (ShapeKind::Array(_), Value::String(_)) => Value::Array(vec![value.clone()]),
        _ => value.clone(),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }
    let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Number::from_f64(float).map(Value::Number)
}

fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
