//! Delimited-text format for [`AccelerometerEvent`]s.
//!
//! One event per line, six fields separated by the configured delimiter
//! (`,` by default):
//!
//! ```text
//! absolute_timestamp,has_relative_timestamp,relative_timestamp,x,y,z
//! ```
//!
//! When the event has no relative timestamp the flag is `false` and the
//! timestamp field is written as `0`; readers ignore it. Floats use Rust's
//! shortest round-trip representation, so every value reads back exactly.
//! Blank lines are skipped.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use super::io::{ByteSink, ByteSource, ReaderSource, WriterSink};
use super::{
    Deserializer, RecordDecoder, RecordEncoder, Serializer, StreamDeserializer, StreamSerializer,
    take_event,
};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::model::{AccelerometerEvent, AccelerometerEventBuilder};

const FIELD_COUNT: usize = 6;

/// Serializer type produced by [`serializer`].
pub type TextSerializer<S> = StreamSerializer<AccelerometerEvent, S, TextEncoder>;

/// Deserializer type produced by [`deserializer`].
pub type TextDeserializer<S> = StreamDeserializer<AccelerometerEvent, S, TextDecoder>;

/// Creates a text serializer writing to `sink`.
///
/// # Errors
///
/// Fails with `InvalidArgument` if `config` is invalid.
pub fn serializer<S: ByteSink>(sink: S, config: &CodecConfig) -> Result<TextSerializer<S>> {
    StreamSerializer::new(sink, TextEncoder::new(config.text_delimiter), config)
}

/// Creates a text deserializer reading from `source`.
///
/// # Errors
///
/// Fails with `InvalidArgument` if `config` is invalid.
pub fn deserializer<S: ByteSource>(
    source: S,
    config: &CodecConfig,
) -> Result<TextDeserializer<S>> {
    StreamDeserializer::new(source, TextDecoder::new(config.text_delimiter), config)
}

/// Encodes a non-empty slice of events with the default configuration.
///
/// # Errors
///
/// Fails with `EmptyInput` if `events` is empty.
pub fn to_string(events: &[AccelerometerEvent]) -> Result<String> {
    let mut out = Vec::new();
    {
        let serializer = serializer(WriterSink::new(&mut out), &CodecConfig::default())?;
        serializer.serialize_all(events)?;
        serializer.close()?;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Decodes every event in `text` with the default configuration.
///
/// # Errors
///
/// Fails with `Malformed` on the first line that is not a valid record.
pub fn from_str(text: &str) -> Result<Vec<AccelerometerEvent>> {
    let source = ReaderSource::new(text.as_bytes());
    let mut deserializer = deserializer(source, &CodecConfig::default())?;
    let events = deserializer.deserialize_all()?;
    deserializer.close()?;
    Ok(events)
}

/// Writes events as delimited lines.
#[derive(Debug, Clone)]
pub struct TextEncoder {
    delimiter: char,
}

impl TextEncoder {
    /// Creates an encoder using `delimiter` between fields.
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl RecordEncoder<AccelerometerEvent> for TextEncoder {
    fn encode(&mut self, event: &AccelerometerEvent, out: &mut Vec<u8>) -> Result<()> {
        let d = self.delimiter;
        writeln!(
            out,
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            event.absolute_timestamp(),
            event.has_relative_timestamp(),
            event.relative_timestamp().unwrap_or(0),
            event.x(),
            event.y(),
            event.z(),
        )
        .map_err(|e| CodecError::io("encoding text record", e))?;
        Ok(())
    }
}

/// Reads delimited lines back into events.
///
/// One builder is reused for every line and reset after each record.
#[derive(Debug, Clone)]
pub struct TextDecoder {
    delimiter: char,
    builder: AccelerometerEventBuilder,
    line: Vec<u8>,
    line_number: u64,
}

impl TextDecoder {
    /// Creates a decoder splitting fields on `delimiter`.
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            builder: AccelerometerEvent::builder(),
            line: Vec::new(),
            line_number: 0,
        }
    }
}

impl RecordDecoder<AccelerometerEvent> for TextDecoder {
    fn decode<R: BufRead>(&mut self, input: &mut R) -> Result<Option<AccelerometerEvent>> {
        loop {
            // Raw bytes: only a failed UTF-8 check is a malformed line, every
            // reader error stays an I/O failure.
            self.line.clear();
            let read = input
                .read_until(b'\n', &mut self.line)
                .map_err(|e| CodecError::io("reading text record", e))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = std::str::from_utf8(&self.line).map_err(|e| CodecError::MalformedText {
                line: self.line_number,
                reason: format!("not valid UTF-8: {e}"),
            })?;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            let event = parse_line(&mut self.builder, self.delimiter, self.line_number, line)?;
            return Ok(Some(event));
        }
    }
}

fn parse_line(
    builder: &mut AccelerometerEventBuilder,
    delimiter: char,
    line_number: u64,
    line: &str,
) -> Result<AccelerometerEvent> {
    let fields: Vec<&str> = line.split(delimiter).collect();
    let &[absolute, has_relative, relative, x, y, z] = fields.as_slice() else {
        return Err(CodecError::MalformedText {
            line: line_number,
            reason: format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        }
        .into());
    };

    let fields = [absolute, has_relative, relative, x, y, z];
    if let Err(e) = fill_builder(builder, fields, line_number) {
        builder.reset();
        return Err(e);
    }
    take_event(builder)
}

fn fill_builder(
    builder: &mut AccelerometerEventBuilder,
    [absolute, has_relative, relative, x, y, z]: [&str; FIELD_COUNT],
    line_number: u64,
) -> Result<()> {
    builder.absolute_timestamp(field(absolute, "absolute_timestamp", line_number)?);
    if field::<bool>(has_relative, "has_relative_timestamp", line_number)? {
        builder.relative_timestamp(field(relative, "relative_timestamp", line_number)?);
    }
    builder
        .x(field(x, "x", line_number)?)
        .y(field(y, "y", line_number)?)
        .z(field(z, "z", line_number)?);
    Ok(())
}

fn field<F>(value: &str, name: &str, line_number: u64) -> Result<F>
where
    F: FromStr,
    F::Err: Display,
{
    value.trim().parse().map_err(|e| {
        CodecError::MalformedText {
            line: line_number,
            reason: format!("bad {name} {value:?}: {e}"),
        }
        .into()
    })
}
