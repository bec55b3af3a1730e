//! Schema resolution against an environment source.

use crate::decode::{decode, REQUIRED};
use crate::mapping::MappingEntry;
use crate::schema::{Field, Node};
use crate::{ConfigError, ConfigValue, EnvMapping, EnvSource, Schema};
use indexmap::IndexMap;

/// Resolves `schema` against `source`, naming variables with `mapping`.
///
/// A field reads the variable its mapping entry names, or its own key
/// upper-cased when the mapping has no entry at that path. The walk is
/// depth-first in declaration order and stops at the first failure; no
/// partial configuration is returned.
///
/// # Example
///
/// ```
/// use essentials_config::{load_config_from_env, ConfigValue, EnvMapping, Field, Schema};
/// use std::collections::HashMap;
///
/// let schema = Schema::new().group("server", Schema::new().field("port", Field::integer()));
/// let mapping = EnvMapping::new().group("server", EnvMapping::new().var("port", "PORT"));
/// let env = HashMap::from([("PORT".to_string(), "8080".to_string())]);
///
/// let config = load_config_from_env(&schema, &mapping, &env).unwrap();
/// assert_eq!(config.get_path("server.port"), Some(&ConfigValue::Integer(8080)));
/// ```
pub fn load_config_from_env(
    schema: &Schema,
    mapping: &EnvMapping,
    source: &dyn EnvSource,
) -> Result<ConfigValue, ConfigError> {
    let mut path = Vec::new();
    resolve_group(schema, Some(mapping), source, &mut path).map(ConfigValue::Group)
}

fn resolve_group<'s>(
    schema: &'s Schema,
    mapping: Option<&EnvMapping>,
    source: &dyn EnvSource,
    path: &mut Vec<&'s str>,
) -> Result<IndexMap<String, ConfigValue>, ConfigError> {
    let mut resolved = IndexMap::new();

    for (key, node) in schema.iter() {
        path.push(key);
        let entry = mapping.and_then(|m| m.get(key));

        match node {
            Node::Group(child) => {
                let child_mapping = match entry {
                    None => None,
                    Some(MappingEntry::Group(m)) => Some(m),
                    Some(MappingEntry::Var(_)) => {
                        return Err(ConfigError::shape_mismatch(
                            path.join("."),
                            "schema group is mapped to a single variable",
                        ));
                    }
                };
                let group = resolve_group(child, child_mapping, source, path)?;
                resolved.insert(key.to_string(), ConfigValue::Group(group));
            }
            Node::Field(field) => {
                let var = match entry {
                    None => key.to_uppercase(),
                    Some(MappingEntry::Var(name)) => name.clone(),
                    Some(MappingEntry::Group(_)) => {
                        return Err(ConfigError::shape_mismatch(
                            path.join("."),
                            "schema field is mapped to a group",
                        ));
                    }
                };
                if let Some(value) = resolve_field(key, &var, field, source)? {
                    resolved.insert(key.to_string(), value);
                }
            }
        }

        path.pop();
    }

    Ok(resolved)
}

fn resolve_field(
    key: &str,
    var: &str,
    field: &Field,
    source: &dyn EnvSource,
) -> Result<Option<ConfigValue>, ConfigError> {
    match source.get(var) {
        Some(raw) => decode(field.kind(), &raw)
            .map(Some)
            .map_err(|reason| ConfigError::invalid_env_value(key, var, reason)),
        None => {
            if let Some(default) = field.default_value() {
                Ok(Some(default.clone()))
            } else if field.is_optional() {
                Ok(None)
            } else {
                Err(ConfigError::invalid_env_value(key, var, REQUIRED))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn server_schema() -> Schema {
        Schema::new().group("server", Schema::new().field("port", Field::integer()))
    }

    fn server_mapping() -> EnvMapping {
        EnvMapping::new().group("server", EnvMapping::new().var("port", "PORT"))
    }

    #[test]
    fn test_nested_integer() {
        let config =
            load_config_from_env(&server_schema(), &server_mapping(), &env(&[("PORT", "8080")]))
                .unwrap();
        assert_eq!(config.to_json(), serde_json::json!({"server": {"port": 8080}}));
    }

    #[test]
    fn test_invalid_integer_names_field_and_variable() {
        let err =
            load_config_from_env(&server_schema(), &server_mapping(), &env(&[("PORT", "abc")]))
                .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for port/PORT: Invalid number");
    }

    #[test]
    fn test_missing_required_variable() {
        let err = load_config_from_env(&server_schema(), &server_mapping(), &env(&[])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for port/PORT: Required");
    }

    #[test]
    fn test_unmapped_field_uses_uppercased_key() {
        let schema = Schema::new().field("nodeEnv", Field::string());
        let config =
            load_config_from_env(&schema, &EnvMapping::new(), &env(&[("NODEENV", "production")]))
                .unwrap();
        assert_eq!(config.get("nodeEnv").and_then(ConfigValue::as_str), Some("production"));
    }

    #[test]
    fn test_unmapped_group_falls_back_for_children() {
        let config =
            load_config_from_env(&server_schema(), &EnvMapping::new(), &env(&[("PORT", "1")]))
                .unwrap();
        assert_eq!(config.get_path("server.port"), Some(&ConfigValue::Integer(1)));
    }

    #[test]
    fn test_default_and_optional() {
        let schema = Schema::new()
            .field("host", Field::string().with_default("0.0.0.0"))
            .field("debug", Field::boolean().optional())
            .field("features", Field::string_list());
        let config =
            load_config_from_env(&schema, &EnvMapping::new(), &env(&[("FEATURES", "")])).unwrap();

        assert_eq!(
            config.to_json(),
            serde_json::json!({"host": "0.0.0.0", "features": []})
        );
    }

    #[test]
    fn test_set_variable_overrides_default() {
        let schema = Schema::new().field("port", Field::integer().with_default(50051));
        let config =
            load_config_from_env(&schema, &EnvMapping::new(), &env(&[("PORT", "9000")])).unwrap();
        assert_eq!(config.get("port"), Some(&ConfigValue::Integer(9000)));
    }

    #[test]
    fn test_invalid_boolean() {
        let schema = Schema::new().field("debug", Field::boolean());
        let err =
            load_config_from_env(&schema, &EnvMapping::new(), &env(&[("DEBUG", "yes")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for debug/DEBUG: Invalid boolean");
    }

    #[test]
    fn test_fails_on_first_field_in_declaration_order() {
        let schema = Schema::new()
            .field("b", Field::integer())
            .field("a", Field::integer());
        let err = load_config_from_env(&schema, &EnvMapping::new(), &env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { field, .. } if field == "b"));
    }

    #[test]
    fn test_shape_mismatch_group_mapped_to_var() {
        let mapping = EnvMapping::new().var("server", "SERVER");
        let err = load_config_from_env(&server_schema(), &mapping, &env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { path, .. } if path == "server"));
    }

    #[test]
    fn test_shape_mismatch_field_mapped_to_group() {
        let mapping = EnvMapping::new().group(
            "server",
            EnvMapping::new().group("port", EnvMapping::new()),
        );
        let err = load_config_from_env(&server_schema(), &mapping, &env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ShapeMismatch { path, .. } if path == "server.port"));
    }

    #[test]
    fn test_mapping_entries_without_schema_are_ignored() {
        let mapping = server_mapping().var("unused", "UNUSED");
        let config =
            load_config_from_env(&server_schema(), &mapping, &env(&[("PORT", "1")])).unwrap();
        assert!(config.get("unused").is_none());
    }
}
