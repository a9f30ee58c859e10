//! Nested call parameters and their flat form encoding.
//!
//! # Design
//! The remote API expects `application/x-www-form-urlencoded` bodies whose
//! keys carry bracketed nesting (`p[12]=12`, `field[%NAME%,0]=a||b`,
//! `email[0][tags]=x`). `ParamValue` is a tagged tree; `encode_form` flattens
//! at most three levels of it into `key=value` pairs. Anything deeper is
//! dropped rather than recursed into, because the server only understands
//! these shapes.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// Characters left untouched by form encoding: alphanumerics and `-_.`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Separator used to join multi-value custom field entries.
const FIELD_VALUE_SEPARATOR: &str = "||";

/// Call parameters as a tree of scalars, lists and ordered maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<ParamValue>),
    /// Ordered key/value entries; insertion order is the wire order.
    Map(Vec<(String, ParamValue)>),
}

impl ParamValue {
    /// Build a map from any iterator of key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        ParamValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ParamValue::Scalar(_))
    }

    /// Whether these parameters count as supplied. Empty maps, lists and
    /// strings are treated the same as no parameters at all.
    pub fn is_present(&self) -> bool {
        match self {
            ParamValue::Scalar(s) => !s.is_empty(),
            ParamValue::List(items) => !items.is_empty(),
            ParamValue::Map(entries) => !entries.is_empty(),
        }
    }

    /// Look up a map entry by key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        match self {
            ParamValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Key/value view of a container. Lists yield their indices as keys.
    fn entries(&self) -> Vec<(String, &ParamValue)> {
        match self {
            ParamValue::Scalar(_) => Vec::new(),
            ParamValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            ParamValue::Map(entries) => entries.iter().map(|(k, v)| (k.clone(), v)).collect(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Scalar(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Scalar(s)
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        ParamValue::Scalar(s.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Scalar(if b { "1" } else { "" }.to_string())
    }
}

macro_rules! scalar_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(n: $t) -> Self {
                ParamValue::Scalar(n.to_string())
            }
        })*
    };
}

scalar_from_number!(i32, i64, u32, u64, usize, f64);

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Scalar(String::new()),
            Value::Bool(b) => b.into(),
            Value::Number(n) => ParamValue::Scalar(n.to_string()),
            Value::String(s) => ParamValue::Scalar(s),
            Value::Array(items) => ParamValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => ParamValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Percent-encode a single key or value for a form body.
pub fn urlencode(s: &str) -> String {
    utf8_percent_encode(s, FORM).to_string().replace("%20", "+")
}

fn push_pair(pairs: &mut Vec<String>, key: &str, value: &str) {
    pairs.push(format!("{}={}", urlencode(key), urlencode(value)));
}

/// Keys shaped like `field[<anything>,0]` carry multi-value custom fields.
fn is_multi_value_field(key: &str) -> bool {
    key.strip_prefix("field[")
        .is_some_and(|rest| rest.contains(",0]"))
}

/// Flatten parameters into an `&`-joined form body.
///
/// A bare scalar is sent verbatim as `data=<value>`.
pub fn encode_form(params: &ParamValue) -> String {
    let mut pairs = Vec::new();
    match params {
        ParamValue::Scalar(raw) => push_pair(&mut pairs, "data", raw),
        ParamValue::List(items) => {
            for (index, value) in items.iter().enumerate() {
                encode_indexed(&mut pairs, index, value);
            }
        }
        ParamValue::Map(entries) => {
            for (key, value) in entries {
                encode_keyed(&mut pairs, key, value);
            }
        }
    }
    pairs.join("&").trim_end_matches(['&', ' ']).to_string()
}

/// Outer list entries: repeating groups two levels deep.
fn encode_indexed(pairs: &mut Vec<String>, index: usize, value: &ParamValue) {
    if let ParamValue::Scalar(v) = value {
        push_pair(pairs, &index.to_string(), v);
        return;
    }
    for (group_key, group_value) in value.entries() {
        match group_value {
            ParamValue::Scalar(v) => push_pair(pairs, &format!("{group_key}[{index}]"), v),
            nested => {
                for (k, v) in nested.entries() {
                    if let ParamValue::Scalar(v) = v {
                        push_pair(pairs, &format!("{group_key}[{index}][{k}]"), v);
                    }
                }
            }
        }
    }
}

fn encode_keyed(pairs: &mut Vec<String>, key: &str, value: &ParamValue) {
    if let ParamValue::Scalar(v) = value {
        push_pair(pairs, key, v);
        return;
    }
    if is_multi_value_field(key) {
        let joined = value
            .entries()
            .into_iter()
            .filter_map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(FIELD_VALUE_SEPARATOR);
        push_pair(pairs, key, &joined);
        return;
    }
    // Membership-style maps such as `p => {12: 12}`. Nested containers at
    // this level are dropped.
    for (k, v) in value.entries() {
        if let ParamValue::Scalar(v) = v {
            push_pair(pairs, &format!("{key}[{k}]"), v);
        }
    }
}

/// Append encoded parameters to a URL's query string.
pub fn append_query(url: &str, params: &ParamValue) -> String {
    let encoded = encode_form(params);
    if encoded.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{encoded}")
}
