//! Decoders from raw environment strings to typed values.
//!
//! Each decoder returns the failure reason used in
//! [`ConfigError::InvalidEnvValue`](crate::ConfigError::InvalidEnvValue).

use crate::{ConfigValue, FieldKind};
use regex::Regex;
use std::sync::OnceLock;

/// Reason reported for a rejected integer.
pub const INVALID_NUMBER: &str = "Invalid number";
/// Reason reported for a rejected boolean.
pub const INVALID_BOOLEAN: &str = "Invalid boolean";
/// Reason reported for a missing required variable.
pub const REQUIRED: &str = "Required";

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]+$").expect("integer pattern is valid"))
}

/// Decodes an unsigned decimal integer. Signs, fractions, whitespace and
/// blanks are rejected.
pub fn decode_integer(raw: &str) -> Result<u64, &'static str> {
    if !integer_pattern().is_match(raw) {
        return Err(INVALID_NUMBER);
    }
    raw.parse().map_err(|_| INVALID_NUMBER)
}

/// Decodes `true`/`True`/`false`/`False`.
pub fn decode_boolean(raw: &str) -> Result<bool, &'static str> {
    match raw {
        "true" | "True" => Ok(true),
        "false" | "False" => Ok(false),
        _ => Err(INVALID_BOOLEAN),
    }
}

/// Splits on `,` and trims each element. The empty string is the empty list.
pub fn decode_string_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

/// Decodes a raw value according to `kind`.
pub fn decode(kind: FieldKind, raw: &str) -> Result<ConfigValue, &'static str> {
    match kind {
        FieldKind::Integer => decode_integer(raw).map(ConfigValue::Integer),
        FieldKind::Boolean => decode_boolean(raw).map(ConfigValue::Boolean),
        FieldKind::StringList => Ok(ConfigValue::StringList(decode_string_list(raw))),
        FieldKind::String => Ok(ConfigValue::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode_integer("8080"), Ok(8080));
        assert_eq!(decode_integer("007"), Ok(7));
        assert_eq!(decode_integer("-1"), Err(INVALID_NUMBER));
        assert_eq!(decode_integer("+1"), Err(INVALID_NUMBER));
        assert_eq!(decode_integer("1.5"), Err(INVALID_NUMBER));
        assert_eq!(decode_integer(" 1"), Err(INVALID_NUMBER));
        assert_eq!(decode_integer(""), Err(INVALID_NUMBER));
        assert_eq!(decode_integer("abc"), Err(INVALID_NUMBER));
        assert_eq!(decode_integer("99999999999999999999999"), Err(INVALID_NUMBER));
    }

    #[test]
    fn test_decode_boolean() {
        assert_eq!(decode_boolean("true"), Ok(true));
        assert_eq!(decode_boolean("True"), Ok(true));
        assert_eq!(decode_boolean("false"), Ok(false));
        assert_eq!(decode_boolean("False"), Ok(false));
        assert_eq!(decode_boolean("TRUE"), Err(INVALID_BOOLEAN));
        assert_eq!(decode_boolean("yes"), Err(INVALID_BOOLEAN));
        assert_eq!(decode_boolean("1"), Err(INVALID_BOOLEAN));
        assert_eq!(decode_boolean(""), Err(INVALID_BOOLEAN));
    }

    #[test]
    fn test_decode_string_list() {
        assert_eq!(decode_string_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(decode_string_list(""), Vec::<String>::new());
        assert_eq!(decode_string_list("a,,b"), vec!["a", "", "b"]);
        assert_eq!(decode_string_list(" "), vec![""]);
    }

    #[test]
    fn test_decode_string_is_unchanged() {
        assert_eq!(
            decode(FieldKind::String, "  spaced  "),
            Ok(ConfigValue::String("  spaced  ".to_string()))
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every u64 round-trips through its decimal form.
        #[test]
        fn integer_accepts_any_decimal_u64(n: u64) {
            prop_assert_eq!(decode_integer(&n.to_string()), Ok(n));
        }

        /// Anything with a non-digit character is rejected.
        #[test]
        fn integer_rejects_non_digits(s in ".*[^0-9].*") {
            prop_assert_eq!(decode_integer(&s), Err(INVALID_NUMBER));
        }

        /// List elements never carry surrounding whitespace.
        #[test]
        fn list_elements_are_trimmed(s in "[a-z ,]{1,40}") {
            for item in decode_string_list(&s) {
                prop_assert_eq!(item.trim(), item.as_str());
            }
        }

        /// A non-empty input yields one element per comma plus one.
        #[test]
        fn list_length_follows_commas(s in "[a-z ,]{1,40}") {
            let commas = s.matches(',').count();
            prop_assert_eq!(decode_string_list(&s).len(), commas + 1);
        }

        /// Booleans round-trip through their string form.
        #[test]
        fn boolean_round_trips(b: bool) {
            prop_assert_eq!(decode_boolean(&b.to_string()), Ok(b));
        }

        /// Trimmed, comma-free elements survive joining and decoding.
        #[test]
        fn list_round_trips(
            items in prop::collection::vec("[a-z0-9]([a-z0-9 ._-]{0,6}[a-z0-9])?", 0..8)
        ) {
            prop_assert_eq!(decode_string_list(&items.join(",")), items);
        }

        /// Only the four accepted spellings decode.
        #[test]
        fn boolean_rejects_other_strings(s in "[a-zA-Z0-9]{0,8}") {
            let accepted = matches!(s.as_str(), "true" | "True" | "false" | "False");
            prop_assert_eq!(decode_boolean(&s).is_ok(), accepted);
        }
    }
}
