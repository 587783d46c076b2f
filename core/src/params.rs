//! Flat request payloads and their wire encodings.
//!
//! # Design
//! `Params` is an ordered map of field names to already-stringified values.
//! Scalars are coerced at insertion with the same rules a browser applies
//! when it stringifies a form field, so the encoders below only ever see
//! strings.
//!
//! Two encodings exist and they deliberately disagree about arrays:
//! - the query string repeats `name[]` once per element;
//! - the form body writes one `name` whose value is the elements joined by
//!   `,`. Callers that need real arrays in a POST must flatten them first.

use std::borrow::Cow;

use serde_json::{Number, Value};
use url::form_urlencoded;

use crate::error::TransportError;

/// Suffix appended to a field name for each element of an array in a query.
pub const ARRAY_MARKER: &str = "[]";

/// A single field value: a scalar or an ordered list of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// The value as one string, joining list elements with `,`.
    pub fn coerce(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Single(value) => Cow::Borrowed(value),
            FieldValue::Many(values) => Cow::Owned(values.join(",")),
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Single(value.to_string())
                }
            }

            impl From<Vec<$ty>> for FieldValue {
                fn from(values: Vec<$ty>) -> Self {
                    FieldValue::Many(values.into_iter().map(|v| v.to_string()).collect())
                }
            }
        )*
    };
}

field_value_from!(&str, String, bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Single(number_to_string(value))
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(values: Vec<f64>) -> Self {
        FieldValue::Many(values.into_iter().map(number_to_string).collect())
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Single(number_to_string(f64::from(value)))
    }
}

impl From<Vec<f32>> for FieldValue {
    fn from(values: Vec<f32>) -> Self {
        FieldValue::Many(
            values
                .into_iter()
                .map(|v| number_to_string(f64::from(v)))
                .collect(),
        )
    }
}

/// Stringify a float the way a browser does (ECMAScript `Number::toString`):
/// shortest round-trip digits, positional when the decimal exponent is in
/// `-7..21`, exponent form with an explicit sign otherwise.
fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", number_to_string(-value));
    }
    if value.is_infinite() {
        return "Infinity".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e-7`.
    let formatted = format!("{value:e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        let magnitude = (n - 1).abs();
        if rest.is_empty() {
            format!("{first}e{sign}{magnitude}")
        } else {
            format!("{first}.{rest}e{sign}{magnitude}")
        }
    }
}

fn json_number_to_string(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        i.to_string()
    } else if let Some(u) = number.as_u64() {
        u.to_string()
    } else {
        number.as_f64().map(number_to_string).unwrap_or_else(|| number.to_string())
    }
}

fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(json_number_to_string(n)),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Ordered flat mapping of field names to values.
///
/// Setting a name that is already present replaces its value and keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    fields: Vec<(String, FieldValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `application/x-www-form-urlencoded` body: one pair per field, lists
    /// coerced with [`FieldValue::coerce`].
    pub fn to_form_body(&self) -> String {
        let mut search = SearchParams::default();
        for (key, value) in &self.fields {
            search.set(key, &value.coerce());
        }
        search.serialize()
    }

    /// Query string without the leading `?`: scalars once, lists as one
    /// `name[]` pair per element in order.
    pub fn to_query_string(&self) -> String {
        let mut search = SearchParams::default();
        for (key, value) in &self.fields {
            match value {
                FieldValue::Single(v) => search.set(key, v),
                FieldValue::Many(values) => {
                    let name = format!("{key}{ARRAY_MARKER}");
                    for v in values {
                        search.append(&name, v);
                    }
                }
            }
        }
        search.serialize()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Build from a JSON object whose values are scalars or arrays of scalars.
impl TryFrom<Value> for Params {
    type Error = TransportError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(TransportError::UnsupportedField { key: String::new() });
        };

        // Browsers enumerate array-index keys first, ascending, then the
        // remaining keys in insertion order.
        let mut entries: Vec<(String, Value)> = map.into_iter().collect();
        entries.sort_by_key(|(key, _)| array_index(key).unwrap_or(u32::MAX));

        let mut params = Params::new();
        for (key, value) in entries {
            let field = match &value {
                Value::Array(items) => items
                    .iter()
                    .map(json_scalar_to_string)
                    .collect::<Option<Vec<_>>>()
                    .map(FieldValue::Many),
                scalar => json_scalar_to_string(scalar).map(FieldValue::Single),
            };
            match field {
                Some(field) => params.set(key, field),
                None => return Err(TransportError::UnsupportedField { key }),
            };
        }
        Ok(params)
    }
}

/// `key` as a canonical array index (`0`, `1`, ... below `2^32 - 1`).
fn array_index(key: &str) -> Option<u32> {
    let index: u32 = key.parse().ok()?;
    (index != u32::MAX && index.to_string() == key).then_some(index)
}

/// Ordered name/value pairs with URLSearchParams `set`/`append` semantics.
#[derive(Default)]
struct SearchParams(Vec<(String, String)>);

impl SearchParams {
    /// Replace the first pair named `name` and drop any later ones, or push.
    fn set(&mut self, name: &str, value: &str) {
        let Some(first) = self.0.iter().position(|(n, _)| n == name) else {
            self.0.push((name.to_string(), value.to_string()));
            return;
        };
        self.0[first].1 = value.to_string();
        let mut index = 0;
        self.0.retain(|(n, _)| {
            let keep = index <= first || n != name;
            index += 1;
            keep
        });
    }

    fn append(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }

    fn serialize(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.0)
            .finish()
    }
}
