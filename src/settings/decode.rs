//! Decoders turn a raw loaded value into the type a setting exposes.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a decoder.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct DecodeError(Box<dyn std::error::Error + Send + Sync>);

impl DecodeError {
    /// Wraps an arbitrary error raised while decoding.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    /// Creates an error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

/// Converts a raw configuration value into `T`.
///
/// Implemented for any `Fn(Value) -> Result<T, DecodeError>`.
pub trait Decode<T> {
    fn decode(&self, raw: Value) -> Result<T, DecodeError>;
}

impl<T, F> Decode<T> for F
where
    F: Fn(Value) -> Result<T, DecodeError>,
{
    fn decode(&self, raw: Value) -> Result<T, DecodeError> {
        self(raw)
    }
}

type ErasedDecode = dyn Fn(Value) -> Result<Box<dyn Any>, DecodeError> + Send + Sync;

/// Type-erased decoder stored on a normalized setting.
///
/// The output type is recovered on access through [`Settings::get`](crate::settings::Settings::get).
#[derive(Clone)]
pub struct Decoder {
    output: &'static str,
    inner: Arc<ErasedDecode>,
}

impl Decoder {
    /// Passes the raw value through unchanged, as a [`serde_json::Value`].
    pub fn identity() -> Self {
        Self::new(|raw: Value| Ok::<_, DecodeError>(raw))
    }

    /// Wraps a decode function producing `T`.
    pub fn new<T, D>(decode: D) -> Self
    where
        T: Any,
        D: Decode<T> + Send + Sync + 'static,
    {
        Self {
            output: std::any::type_name::<T>(),
            inner: Arc::new(move |raw| {
                decode
                    .decode(raw)
                    .map(|value| Box::new(value) as Box<dyn Any>)
            }),
        }
    }

    /// Decodes by deserializing the raw value into `T` with serde.
    ///
    /// ```
    /// use contract_settings::settings::Decoder;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Person {
    ///     first_name: String,
    /// }
    ///
    /// let decoder = Decoder::deserialize::<Person>();
    /// assert!(decoder.output_type().ends_with("Person"));
    /// ```
    pub fn deserialize<T>() -> Self
    where
        T: DeserializeOwned + Any,
    {
        Self::new(|raw: Value| serde_json::from_value::<T>(raw).map_err(DecodeError::from))
    }

    /// Name of the type this decoder produces.
    pub fn output_type(&self) -> &'static str {
        self.output
    }

    /// Runs the decoder on a raw value.
    pub fn decode(&self, raw: Value) -> Result<Box<dyn Any>, DecodeError> {
        (self.inner)(raw)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Named decoders that manifest declarations refer to by their `decode` key.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Decoder>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoder under `name`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, decoder: Decoder) -> Self {
        self.register(name, decoder);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, decoder: Decoder) {
        self.decoders.insert(name.into(), decoder);
    }

    pub fn get(&self, name: &str) -> Option<&Decoder> {
        self.decoders.get(name)
    }
}
