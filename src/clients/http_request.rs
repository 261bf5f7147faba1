//! Request-side types for the Elympics API client.
//!
//! This module provides the ordered [`Parameters`] set, the request
//! [`Headers`], and the immutable [`RequestSpec`] snapshot a
//! [`Requester`](crate::clients::Requester) sends on every attempt.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use num_bigint::BigInt;

/// Verbs whose parameters travel in the query string rather than the body.
pub const METHODS_WITHOUT_BODY: [&str; 2] = ["GET", "DELETE"];

/// Default request verb.
pub const DEFAULT_METHOD: &str = "POST";

/// Default content type for body-bearing requests.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A single parameter value.
///
/// Values are stringified when the request is serialized. Collections use
/// the bracketed renderings `[a, b]` and `{k=v, k2=v2}`.
///
/// # Example
///
/// ```rust
/// use elympics_api::clients::ParamValue;
///
/// assert_eq!(ParamValue::from(42).to_string(), "42");
/// assert_eq!(ParamValue::from(vec!["a".to_string(), "b".to_string()]).to_string(), "[a, b]");
/// assert_eq!(ParamValue::variant("TOP_TEN").to_string(), "top-ten");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    /// A machine integer.
    Int(i64),
    /// An arbitrary-precision integer.
    BigInt(BigInt),
    /// A boolean flag.
    Bool(bool),
    /// A plain string.
    Str(String),
    /// A set of strings.
    StrSet(Vec<String>),
    /// A string-to-string map.
    Map(BTreeMap<String, String>),
}

impl ParamValue {
    /// Renders an enum-like value as a lowercased, hyphenated string.
    pub fn variant(value: impl fmt::Display) -> Self {
        Self::Str(value.to_string().to_lowercase().replace('_', "-"))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::StrSet(values) => write!(f, "[{}]", values.join(", ")),
            Self::Map(map) => {
                let pairs: Vec<String> = map.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<BigInt> for ParamValue {
    fn from(value: BigInt) -> Self {
        Self::BigInt(value)
    }
}

impl From<&BigInt> for ParamValue {
    fn from(value: &BigInt) -> Self {
        Self::BigInt(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::StrSet(values)
    }
}

impl From<BTreeSet<String>> for ParamValue {
    fn from(values: BTreeSet<String>) -> Self {
        Self::StrSet(values.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for ParamValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Map(map)
    }
}

/// An ordered collection of request parameters.
///
/// Insertion order is preserved and duplicate keys are allowed; only
/// [`set`](Self::set) rewrites an existing entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

impl Parameters {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Appends a parameter if a value is present; `None` is dropped.
    pub fn push_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Overrides the first entry with the given key, or appends one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serializes the entries as a query string with percent-encoded values.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.join(|value| urlencoding::encode(&value).into_owned())
    }

    /// Serializes the entries as a form body.
    ///
    /// Values are written as-is, without percent-encoding.
    #[must_use]
    pub fn form_body(&self) -> String {
        self.join(|value| value)
    }

    /// Appends the query string to `tail`, keeping any query already there.
    #[must_use]
    pub fn append_to(&self, tail: &str) -> String {
        if self.is_empty() {
            return tail.to_string();
        }
        let separator = if tail.contains('?') { '&' } else { '?' };
        format!("{tail}{separator}{}", self.query_string())
    }

    fn join(&self, render: impl Fn(String) -> String) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}={}", render(value.to_string())))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Explicit request headers.
///
/// Names keep their case; the last write for a name wins. A `None` value
/// records the header as omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Option<String>)>,
}

impl Headers {
    /// Sets a header, replacing any earlier value for the same name.
    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value recorded for `name`, if it is set and not omitted.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Iterates over the headers that carry a value.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_deref().map(|v| (n.as_str(), v)))
    }
}

/// Immutable snapshot of one logical request.
///
/// Frozen from a [`Requester`](crate::clients::Requester) before the first
/// attempt and reused for every retry and continuation page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSpec {
    /// The HTTP verb.
    pub method: String,
    /// The `Content-Type` sent with a body.
    pub content_type: String,
    /// Sends parameters in the body even for GET/DELETE.
    pub force_body: bool,
    /// The request parameters.
    pub parameters: Parameters,
    /// Explicit request headers.
    pub headers: Headers,
    /// A raw body, sent instead of the parameters.
    pub raw_body: Option<Vec<u8>>,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            force_body: false,
            parameters: Parameters::new(),
            headers: Headers::default(),
            raw_body: None,
        }
    }
}

impl RequestSpec {
    /// Returns `true` if this request carries a body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.force_body || !METHODS_WITHOUT_BODY.contains(&self.method.as_str())
    }

    /// Returns the tail to request, with parameters in the query string for
    /// body-less requests.
    #[must_use]
    pub fn target(&self, tail: &str) -> String {
        if self.has_body() {
            tail.to_string()
        } else {
            self.parameters.append_to(tail)
        }
    }

    /// Returns the bytes to send as the request body, if any.
    #[must_use]
    pub fn payload(&self) -> Option<Vec<u8>> {
        if !self.has_body() {
            return None;
        }
        Some(
            self.raw_body
                .clone()
                .unwrap_or_else(|| self.parameters.form_body().into_bytes()),
        )
    }
}
