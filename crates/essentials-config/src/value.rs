//! Resolved configuration values.

use crate::{ConfigError, EnvMapping};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use serde_path_to_error::Segment;

/// A resolved configuration tree, mirroring the schema it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A non-negative integer.
    Integer(u64),
    /// A boolean.
    Boolean(bool),
    /// A list of trimmed strings.
    StringList(Vec<String>),
    /// A string, unchanged.
    String(String),
    /// A nested group, in schema order.
    Group(IndexMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list, if this is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a direct child of a group.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Group(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Looks up a dotted path such as `server.port`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Self> {
        path.split('.').try_fold(self, |node, key| node.get(key))
    }

    /// Converts the tree to JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(n) => Value::from(*n),
            Self::Boolean(b) => Value::Bool(*b),
            Self::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            Self::String(s) => Value::String(s.clone()),
            Self::Group(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Deserializes the tree into a typed configuration struct.
    ///
    /// Variables are named as unmapped fields; see
    /// [`deserialize_with`](Self::deserialize_with).
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        self.deserialize_with(&EnvMapping::new())
    }

    /// Deserializes the tree into a typed configuration struct.
    ///
    /// A value that does not fit its target (an integer out of range for
    /// `u16`, say) fails with [`ConfigError::InvalidEnvValue`] naming the
    /// field and the variable `mapping` assigns it.
    pub fn deserialize_with<T: DeserializeOwned>(
        &self,
        mapping: &EnvMapping,
    ) -> Result<T, ConfigError> {
        serde_path_to_error::deserialize(self.to_json()).map_err(|err| {
            let keys: Vec<&str> = err
                .path()
                .iter()
                .filter_map(|segment| match segment {
                    Segment::Map { key } => Some(key.as_str()),
                    _ => None,
                })
                .collect();

            match (keys.last(), self.leaf_exists(&keys)) {
                (Some(field), true) => {
                    let var = mapping
                        .var_for(&keys)
                        .unwrap_or_else(|| field.to_uppercase());
                    ConfigError::invalid_env_value(*field, var, err.inner().to_string())
                }
                _ => ConfigError::Deserialize(err.into_inner()),
            }
        })
    }

    fn leaf_exists(&self, keys: &[&str]) -> bool {
        !keys.is_empty() && keys.iter().try_fold(self, |node, key| node.get(key)).is_some()
    }
}

impl From<u64> for ConfigValue {
    fn from(n: u64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(items: Vec<String>) -> Self {
        Self::StringList(items)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(items: Vec<&str>) -> Self {
        Self::StringList(items.into_iter().map(str::to_string).collect())
    }
}
