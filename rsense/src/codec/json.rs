//! JSON array format.
//!
//! A session writes exactly one JSON array: `[` before the first record,
//! `,` between records and `]` when the serializer closes. A serializer that
//! is closed after opening its sink but before any record writes `[]`; one
//! that never opened its sink writes nothing.
//!
//! Decoding reads the whole array on the first
//! [`deserialize`](super::Deserializer::deserialize) call and then hands out
//! the parsed records one by one. An empty source decodes as no records.
//!
//! Works for any serde type; [`AccelerometerEvent`](crate::AccelerometerEvent)
//! and [`AccurateTime`](crate::AccurateTime) use camelCase field names.
//! JSON has no NaN or infinity, so events with a non-finite axis value are
//! rejected with an `InvalidArgument` error before anything is written.

use std::collections::VecDeque;
use std::io::BufRead;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::io::{ByteSink, ByteSource, ReaderSource, WriterSink};
use super::{
    Deserializer, RecordDecoder, RecordEncoder, Serializer, StreamDeserializer, StreamSerializer,
};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};

/// Serializer type produced by [`serializer`].
pub type JsonSerializer<T, S> = StreamSerializer<T, S, JsonEncoder>;

/// Deserializer type produced by [`deserializer`].
pub type JsonDeserializer<T, S> = StreamDeserializer<T, S, JsonDecoder<T>>;

/// Creates a JSON serializer writing to `sink`.
///
/// # Errors
///
/// Fails with `InvalidArgument` if `config` is invalid.
pub fn serializer<T: Serialize, S: ByteSink>(
    sink: S,
    config: &CodecConfig,
) -> Result<JsonSerializer<T, S>> {
    StreamSerializer::new(sink, JsonEncoder::new(config.json_pretty), config)
}

/// Creates a JSON deserializer reading from `source`.
///
/// # Errors
///
/// Fails with `InvalidArgument` if `config` is invalid.
pub fn deserializer<T: DeserializeOwned, S: ByteSource>(
    source: S,
    config: &CodecConfig,
) -> Result<JsonDeserializer<T, S>> {
    StreamDeserializer::new(source, JsonDecoder::new(), config)
}

/// Encodes a non-empty slice as one compact JSON array.
///
/// # Errors
///
/// Fails with `EmptyInput` if `values` is empty.
pub fn to_string<T: Serialize>(values: &[T]) -> Result<String> {
    let mut out = Vec::new();
    {
        let serializer = serializer::<T, _>(WriterSink::new(&mut out), &CodecConfig::default())?;
        serializer.serialize_all(values)?;
        serializer.close()?;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Decodes a JSON array.
///
/// # Errors
///
/// Fails with `Malformed` if `text` is not an array of `T`.
pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let mut deserializer =
        deserializer::<T, _>(ReaderSource::new(text.as_bytes()), &CodecConfig::default())?;
    let values = deserializer.deserialize_all()?;
    deserializer.close()?;
    Ok(values)
}

/// Writes records as elements of a single JSON array.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    pretty: bool,
    started: bool,
}

impl JsonEncoder {
    /// Creates an encoder, optionally pretty-printing each element.
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            started: false,
        }
    }
}

impl<T: Serialize> RecordEncoder<T> for JsonEncoder {
    fn encode(&mut self, value: &T, out: &mut Vec<u8>) -> Result<()> {
        let body = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|source| CodecError::Encode { source })?;

        out.push(if self.started { b',' } else { b'[' });
        out.extend_from_slice(&body);
        self.started = true;
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if !self.started {
            out.push(b'[');
        }
        out.push(b']');
        if self.pretty {
            out.push(b'\n');
        }
        Ok(())
    }
}

/// Reads a JSON array up front and yields its elements.
#[derive(Debug, Clone)]
pub struct JsonDecoder<T> {
    pending: Option<VecDeque<T>>,
}

impl<T> JsonDecoder<T> {
    /// Creates a decoder that has not read anything yet.
    pub fn new() -> Self {
        Self { pending: None }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RecordDecoder<T> for JsonDecoder<T> {
    fn prepare<R: BufRead>(&mut self, input: &mut R) -> Result<()> {
        if self.pending.is_some() {
            return Ok(());
        }

        let empty = input
            .fill_buf()
            .map_err(|e| CodecError::io("reading JSON array", e))?
            .is_empty();
        let records: Vec<T> = if empty {
            Vec::new()
        } else {
            serde_json::from_reader(input).map_err(|source| CodecError::Json { source })?
        };
        tracing::debug!(records = records.len(), "loaded JSON array");
        self.pending = Some(records.into());
        Ok(())
    }

    fn decode<R: BufRead>(&mut self, _input: &mut R) -> Result<Option<T>> {
        Ok(self.pending.as_mut().and_then(VecDeque::pop_front))
    }
}
