//! Structural contract for book payloads.
//!
//! The schema is a static table of field rules; [`validate`] walks it in
//! declaration order and collects every violation instead of stopping at the
//! first one. Values are never coerced: `"200"` is not an integer.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::Book;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+(?:[/?#]\S*)?$")
        .expect("URL pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// String matching [`URL_PATTERN`]
    Url,
    Integer,
    /// Integer >= 1
    PositiveInteger,
}

impl FieldKind {
    fn type_name(self) -> &'static str {
        match self {
            FieldKind::String | FieldKind::Url => "string",
            FieldKind::Integer | FieldKind::PositiveInteger => "integer",
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::PositiveInteger)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Every field is required.
pub const BOOK_SCHEMA: &[FieldRule] = &[
    FieldRule { name: "isbn", kind: FieldKind::String },
    FieldRule { name: "amazon_url", kind: FieldKind::Url },
    FieldRule { name: "author", kind: FieldKind::String },
    FieldRule { name: "language", kind: FieldKind::String },
    FieldRule { name: "pages", kind: FieldKind::PositiveInteger },
    FieldRule { name: "publisher", kind: FieldKind::String },
    FieldRule { name: "title", kind: FieldKind::String },
    FieldRule { name: "year", kind: FieldKind::Integer },
];

/// Non-empty, ordered list of schema violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

/// Check `payload` against [`BOOK_SCHEMA`].
pub fn validate(payload: &Value) -> Result<(), ValidationErrors> {
    let Some(object) = payload.as_object() else {
        return Err(ValidationErrors(vec![
            "instance is not of a type(s) object".to_string(),
        ]));
    };

    let errors: Vec<String> = BOOK_SCHEMA
        .iter()
        .filter_map(|rule| check_field(object, rule))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Validate, then deserialize into the typed model. Integral floats such as
/// `2017.0` are stored as integers.
pub fn parse_book(mut payload: Value) -> Result<Book, ValidationErrors> {
    validate(&payload)?;
    for rule in BOOK_SCHEMA.iter().filter(|rule| rule.kind.is_integer()) {
        if let Some(n) = payload.get(rule.name).and_then(as_integer) {
            payload[rule.name] = n.into();
        }
    }
    serde_json::from_value(payload).map_err(|err| ValidationErrors(vec![err.to_string()]))
}

fn check_field(object: &Map<String, Value>, rule: &FieldRule) -> Option<String> {
    let Some(value) = object.get(rule.name) else {
        return Some(format!("instance requires property \"{}\"", rule.name));
    };

    let type_error = || {
        format!(
            "instance.{} is not of a type(s) {}",
            rule.name,
            rule.kind.type_name()
        )
    };

    match rule.kind {
        FieldKind::String => (!value.is_string()).then(type_error),
        FieldKind::Url => match value.as_str() {
            None => Some(type_error()),
            Some(url) if !URL_PATTERN.is_match(url) => Some(format!(
                "instance.{} does not conform to the \"uri\" format",
                rule.name
            )),
            Some(_) => None,
        },
        FieldKind::Integer | FieldKind::PositiveInteger => {
            if value.is_u64() && !value.is_i64() {
                return Some(format!(
                    "instance.{} must be less than or equal to {}",
                    rule.name,
                    i64::MAX
                ));
            }
            match as_integer(value) {
                None => Some(type_error()),
                Some(n) if rule.kind == FieldKind::PositiveInteger && n < 1 => Some(format!(
                    "instance.{} must be greater than or equal to 1",
                    rule.name
                )),
                Some(_) => None,
            }
        }
    }
}

/// Integer value of `value`; a float with no fractional part counts.
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// JSON Schema rendering of [`BOOK_SCHEMA`] for the OpenAPI document.
pub fn json_schema() -> Value {
    let mut properties = Map::new();
    for rule in BOOK_SCHEMA {
        let mut property = serde_json::json!({ "type": rule.kind.type_name() });
        match rule.kind {
            FieldKind::Url => property["format"] = "uri".into(),
            FieldKind::PositiveInteger => property["minimum"] = 1.into(),
            FieldKind::String | FieldKind::Integer => {}
        }
        properties.insert(rule.name.to_string(), property);
    }

    let required: Vec<&str> = BOOK_SCHEMA.iter().map(|rule| rule.name).collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
