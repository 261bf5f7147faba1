//! JSON decoding of response bodies.
//!
//! [`JsonCodec`] turns response text into typed values, either as a fresh
//! instance or by updating an existing one in place. How fields without a
//! counterpart in the target type are handled is part of the codec's
//! configuration rather than global state.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clients::errors::{DecodeError, HttpError};

/// Treatment of response fields the target type does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFields {
    /// Skip unknown fields (logged at `trace` level).
    #[default]
    Ignore,
    /// Fail decoding when an unknown field is present.
    Reject,
}

/// Decodes JSON response bodies into typed values.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use elympics_api::clients::{JsonCodec, UnknownFields};
///
/// #[derive(Deserialize)]
/// struct Entry {
///     name: String,
/// }
///
/// let lenient = JsonCodec::new(UnknownFields::Ignore);
/// let entry: Entry = lenient.decode(r#"{"name":"ann","rank":1}"#).unwrap();
/// assert_eq!(entry.name, "ann");
///
/// let strict = JsonCodec::new(UnknownFields::Reject);
/// assert!(strict.decode::<Entry>(r#"{"name":"ann","rank":1}"#).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonCodec {
    unknown_fields: UnknownFields,
}

impl JsonCodec {
    /// Creates a codec with the given unknown-field treatment.
    #[must_use]
    pub const fn new(unknown_fields: UnknownFields) -> Self {
        Self { unknown_fields }
    }

    /// Returns the unknown-field treatment.
    #[must_use]
    pub const fn unknown_fields(&self) -> UnknownFields {
        self.unknown_fields
    }

    /// Decodes `text` into a new `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Decode`] carrying the raw text if it is not valid
    /// JSON for `T`, or has unknown fields under [`UnknownFields::Reject`].
    pub fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, HttpError> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        let value = self.decode_from(&mut deserializer, text)?;
        deserializer
            .end()
            .map_err(|source| decode_error(text, source))?;
        Ok(value)
    }

    /// Updates `instance` in place from `text`.
    ///
    /// Top-level fields present in `text` replace the instance's fields;
    /// fields absent from `text` keep their current values. A non-object
    /// payload replaces the instance wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Decode`] if the merged value is not a valid `T`.
    pub fn decode_into<T>(&self, text: &str, instance: &mut T) -> Result<(), HttpError>
    where
        T: Serialize + DeserializeOwned,
    {
        let incoming: serde_json::Value =
            serde_json::from_str(text).map_err(|source| decode_error(text, source))?;
        let mut current =
            serde_json::to_value(&*instance).map_err(|source| decode_error(text, source))?;

        match (&mut current, incoming) {
            (serde_json::Value::Object(fields), serde_json::Value::Object(updates)) => {
                fields.extend(updates);
            }
            (_, other) => current = other,
        }

        *instance = self.decode_from(current, text)?;
        Ok(())
    }

    fn decode_from<'de, T, D>(&self, deserializer: D, text: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        D: serde::Deserializer<'de, Error = serde_json::Error>,
    {
        let mut unknown = Vec::new();
        let value: T = serde_ignored::deserialize(deserializer, |path| {
            unknown.push(path.to_string());
        })
        .map_err(|source| decode_error(text, source))?;

        if unknown.is_empty() {
            return Ok(value);
        }
        match self.unknown_fields {
            UnknownFields::Ignore => {
                tracing::trace!(fields = ?unknown, "Ignoring unknown fields in response");
                Ok(value)
            }
            UnknownFields::Reject => {
                let message = format!("unknown field `{}`", unknown.join("`, `"));
                Err(decode_error(
                    text,
                    <serde_json::Error as serde::de::Error>::custom(message),
                ))
            }
        }
    }
}

fn decode_error(text: &str, source: serde_json::Error) -> HttpError {
    DecodeError {
        payload: text.to_string(),
        source,
    }
    .into()
}
