//! Decoding of `application/x-www-form-urlencoded` bodies into typed forms.
//!
//! Values are bound to struct fields by name through serde. The decoder keeps
//! two failure classes apart:
//!
//! - [`DecodeError::Malformed`]: the client sent something that cannot be
//!   bound (bad percent escape, `expires=abc`). Recoverable, answered with 400.
//! - [`DecodeError::InvalidTarget`]: the destination type asks for a shape a
//!   flat key/value body can never provide (sequences, maps, nested structs,
//!   bytes). This is a bug in the form definition, not in the input.
//!
//! Unknown keys are ignored, the first value of a repeated key wins, and empty
//! values are treated as absent so the field keeps its `#[serde(default)]`.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::de::value::{MapDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use thiserror::Error;

/// Form decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed form input: {0}")]
    Malformed(String),

    #[error("invalid form decode target: {0}")]
    InvalidTarget(String),
}

impl de::Error for DecodeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DecodeError::Malformed(msg.to_string())
    }
}

/// Decode a urlencoded request body into `T`.
pub fn decode_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    let body = std::str::from_utf8(body)
        .map_err(|e| DecodeError::Malformed(format!("body is not valid UTF-8: {e}")))?;

    let pairs = parse_pairs(body)?;
    T::deserialize(FormDeserializer { pairs })
}

/// Split a urlencoded body into decoded key/value pairs.
///
/// Only the first occurrence of each key is kept; pairs whose value is empty
/// are then dropped.
pub fn parse_pairs(body: &str) -> Result<Vec<(String, String)>, DecodeError> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for segment in body.split('&').filter(|s| !s.is_empty()) {
        let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
        let key = decode_component(raw_key)?;
        let value = decode_component(raw_value)?;

        if seen.insert(key.clone()) {
            pairs.push((key, value));
        }
    }

    pairs.retain(|(_, value)| !value.is_empty());
    Ok(pairs)
}

/// Percent-decode one key or value, treating `+` as a space.
fn decode_component(raw: &str) -> Result<String, DecodeError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(DecodeError::Malformed(format!(
                    "invalid percent escape in {raw:?}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| DecodeError::Malformed(format!("invalid UTF-8 in {raw:?}: {e}")))
}

fn unsupported(shape: &str) -> DecodeError {
    DecodeError::InvalidTarget(format!("form fields cannot decode into a {shape}"))
}

/// Top-level deserializer: the whole body, seen as a map of field names.
struct FormDeserializer {
    pairs: Vec<(String, String)>,
}

impl FormDeserializer {
    fn visit_pairs<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        let mut map: MapDeserializer<'de, _, DecodeError> = MapDeserializer::new(
            self.pairs
                .into_iter()
                .map(|(key, value)| (key, FieldValue(value))),
        );
        let value = visitor.visit_map(&mut map)?;
        map.end()?;
        Ok(value)
    }
}

impl<'de> de::Deserializer<'de> for FormDeserializer {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, DecodeError> {
        Err(DecodeError::InvalidTarget(
            "a form body must decode into a struct".to_string(),
        ))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.visit_pairs(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.visit_pairs(visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

/// A single submitted value, bound to one scalar field.
struct FieldValue(String);

impl<'de> IntoDeserializer<'de, DecodeError> for FieldValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                match self.0.parse() {
                    Ok(parsed) => visitor.$visit(parsed),
                    Err(e) => Err(DecodeError::Malformed(format!(
                        "{:?} is not a valid value: {e}",
                        self.0
                    ))),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldValue {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_string(self.0)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.0.as_str() {
            "true" | "on" | "1" => visitor.visit_bool(true),
            "false" | "off" | "0" => visitor.visit_bool(false),
            other => Err(DecodeError::Malformed(format!(
                "{other:?} is not a valid boolean"
            ))),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
        deserialize_char => visit_char,
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_string(self.0)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_string(self.0)
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_string(self.0)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let variant: StringDeserializer<DecodeError> = self.0.into_deserializer();
        visitor.visit_enum(variant)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, DecodeError> {
        Err(unsupported("byte array"))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        _visitor: V,
    ) -> Result<V::Value, DecodeError> {
        Err(unsupported("byte array"))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, DecodeError> {
        Err(unsupported("sequence"))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, DecodeError> {
        Err(unsupported("tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, DecodeError> {
        Err(unsupported("tuple struct"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, DecodeError> {
        Err(unsupported("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, DecodeError> {
        Err(unsupported("nested struct"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct NoteForm {
        title: String,
        body: String,
        days: i32,
        pinned: bool,
        tag: Option<String>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    #[allow(dead_code)]
    struct BrokenForm {
        title: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_decode_binds_fields_by_name() {
        let form: NoteForm =
            decode_form(b"title=Hello+there&body=a%26b&days=7&pinned=on&tag=x").unwrap();
        assert_eq!(
            form,
            NoteForm {
                title: "Hello there".to_string(),
                body: "a&b".to_string(),
                days: 7,
                pinned: true,
                tag: Some("x".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let form: NoteForm = decode_form(b"title=t&csrf=abc&extra=1").unwrap();
        assert_eq!(form.title, "t");
    }

    #[test]
    fn test_first_value_wins() {
        let form: NoteForm = decode_form(b"title=first&title=second").unwrap();
        assert_eq!(form.title, "first");
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let form: NoteForm = decode_form(b"title=&days=&tag=").unwrap();
        assert_eq!(form, NoteForm::default());
    }

    #[test]
    fn test_empty_body_decodes_to_defaults() {
        let form: NoteForm = decode_form(b"").unwrap();
        assert_eq!(form, NoteForm::default());
    }

    #[test]
    fn test_plus_encoded_as_percent_is_literal() {
        let form: NoteForm = decode_form(b"title=1%2B1").unwrap();
        assert_eq!(form.title, "1+1");
    }

    #[test]
    fn test_type_mismatch_is_malformed() {
        let err = decode_form::<NoteForm>(b"days=seven").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn test_bad_boolean_is_malformed() {
        let err = decode_form::<NoteForm>(b"pinned=maybe").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn test_invalid_percent_escape_is_malformed() {
        let err = decode_form::<NoteForm>(b"title=100%zz").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");

        let err = decode_form::<NoteForm>(b"title=trailing%2").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn test_non_utf8_is_malformed() {
        let err = decode_form::<NoteForm>(b"title=\xff\xfe").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");

        let err = decode_form::<NoteForm>(b"title=%FF").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn test_sequence_field_is_invalid_target() {
        let err = decode_form::<BrokenForm>(b"title=t&tags=a").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTarget(_)), "{err:?}");
    }

    #[test]
    fn test_non_struct_target_is_invalid_target() {
        let err = decode_form::<String>(b"title=t").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTarget(_)), "{err:?}");
    }

    #[test]
    fn test_parse_pairs_keeps_first_then_drops_empty() {
        let pairs = parse_pairs("a=&a=2&b=3&&c").unwrap();
        assert_eq!(pairs, vec![("b".to_string(), "3".to_string())]);
    }
}
