//! Length-delimited protobuf format for [`AccelerometerEvent`]s.
//!
//! Each record is a varint byte length followed by a
//! [`proto::ThreeAxisSensorEvent`] message of that many bytes. A stream ends
//! cleanly when the source is exhausted exactly at a record boundary. Running
//! out of bytes inside a record is an I/O failure; an invalid length prefix or
//! message body is a malformed record.

use std::io::{self, BufRead};

use prost::Message;

use super::io::{ByteSink, ByteSource, BytesSource, WriterSink};
use super::{
    Deserializer, RecordDecoder, RecordEncoder, Serializer, StreamDeserializer, StreamSerializer,
    take_event,
};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::model::{AccelerometerEvent, AccelerometerEventBuilder};

/// Protobuf message types of the binary format.
///
/// Hand-written prost types matching `three_axis_sensor_event.proto`.
pub mod proto {
    /// One three-axis sample.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct ThreeAxisSensorEvent {
        /// Milliseconds since the Unix epoch.
        #[prost(int64, tag = "1")]
        pub absolute_timestamp: i64,
        /// Nanoseconds on the recording device's clock.
        #[prost(int64, optional, tag = "2")]
        pub relative_timestamp: Option<i64>,
        /// X-axis value.
        #[prost(float, tag = "3")]
        pub x: f32,
        /// Y-axis value.
        #[prost(float, tag = "4")]
        pub y: f32,
        /// Z-axis value.
        #[prost(float, tag = "5")]
        pub z: f32,
    }
}

const MAX_VARINT_LEN: usize = 10;

/// Upper bound on a single record body. Real records are under 40 bytes.
const MAX_RECORD_LEN: u64 = 64 * 1024;

/// Serializer type produced by [`serializer`].
pub type BinarySerializer<S> = StreamSerializer<AccelerometerEvent, S, BinaryEncoder>;

/// Deserializer type produced by [`deserializer`].
pub type BinaryDeserializer<S> = StreamDeserializer<AccelerometerEvent, S, BinaryDecoder>;

/// Creates a binary serializer writing to `sink`.
///
/// # Errors
///
/// Fails with `InvalidArgument` if `config` is invalid.
pub fn serializer<S: ByteSink>(sink: S, config: &CodecConfig) -> Result<BinarySerializer<S>> {
    StreamSerializer::new(sink, BinaryEncoder::default(), config)
}

/// Creates a binary deserializer reading from `source`.
///
/// # Errors
///
/// Fails with `InvalidArgument` if `config` is invalid.
pub fn deserializer<S: ByteSource>(
    source: S,
    config: &CodecConfig,
) -> Result<BinaryDeserializer<S>> {
    StreamDeserializer::new(source, BinaryDecoder::default(), config)
}

/// Encodes a non-empty slice of events.
///
/// # Errors
///
/// Fails with `EmptyInput` if `events` is empty.
pub fn to_vec(events: &[AccelerometerEvent]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let serializer = serializer(WriterSink::new(&mut out), &CodecConfig::default())?;
        serializer.serialize_all(events)?;
        serializer.close()?;
    }
    Ok(out)
}

/// Decodes every event in `bytes`.
///
/// # Errors
///
/// Fails with `Malformed` on a corrupt record and with `IoFailure` if the
/// bytes end inside a record.
pub fn from_slice(bytes: &[u8]) -> Result<Vec<AccelerometerEvent>> {
    let mut deserializer = deserializer(BytesSource::new(bytes), &CodecConfig::default())?;
    let events = deserializer.deserialize_all()?;
    deserializer.close()?;
    Ok(events)
}

/// Writes events as length-delimited protobuf messages.
///
/// One message value is reused and cleared after each record.
#[derive(Debug, Clone, Default)]
pub struct BinaryEncoder {
    message: proto::ThreeAxisSensorEvent,
}

impl RecordEncoder<AccelerometerEvent> for BinaryEncoder {
    fn encode(&mut self, event: &AccelerometerEvent, out: &mut Vec<u8>) -> Result<()> {
        let message = &mut self.message;
        message.absolute_timestamp = event.absolute_timestamp();
        message.relative_timestamp = event.relative_timestamp();
        message.x = event.x();
        message.y = event.y();
        message.z = event.z();

        let encoded = message.encode_length_delimited(out);
        message.clear();
        encoded.map_err(|e| {
            CodecError::io("encoding binary record", io::Error::other(e)).into()
        })
    }
}

/// Reads length-delimited protobuf messages back into events.
///
/// One event builder is reused and reset after each record.
#[derive(Debug, Clone, Default)]
pub struct BinaryDecoder {
    builder: AccelerometerEventBuilder,
    body: Vec<u8>,
    index: u64,
}

impl RecordDecoder<AccelerometerEvent> for BinaryDecoder {
    fn decode<R: BufRead>(&mut self, input: &mut R) -> Result<Option<AccelerometerEvent>> {
        let Some(len) = read_length_prefix(input, self.index)? else {
            return Ok(None);
        };

        self.body.clear();
        self.body.resize(len, 0);
        input
            .read_exact(&mut self.body)
            .map_err(|e| CodecError::io("reading binary record", e))?;

        let message = proto::ThreeAxisSensorEvent::decode(self.body.as_slice()).map_err(|e| {
            CodecError::MalformedBinary {
                index: self.index,
                reason: e.to_string(),
            }
        })?;

        self.builder
            .absolute_timestamp(message.absolute_timestamp)
            .x(message.x)
            .y(message.y)
            .z(message.z);
        if let Some(relative) = message.relative_timestamp {
            self.builder.relative_timestamp(relative);
        }

        self.index += 1;
        take_event(&mut self.builder).map(Some)
    }
}

/// Reads a varint length prefix. Returns `None` if the input is exhausted
/// before the first byte.
fn read_length_prefix<R: BufRead>(input: &mut R, index: u64) -> Result<Option<usize>> {
    let mut value = 0u64;
    for position in 0..MAX_VARINT_LEN {
        let next = next_byte(input).map_err(|e| CodecError::io("reading length prefix", e))?;
        let byte = match next {
            Some(byte) => byte,
            None if position == 0 => return Ok(None),
            None => {
                let eof = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside a length prefix",
                );
                return Err(CodecError::io("reading length prefix", eof).into());
            }
        };

        value |= u64::from(byte & 0x7f) << (7 * position);
        if byte & 0x80 == 0 {
            if value > MAX_RECORD_LEN {
                return Err(CodecError::MalformedBinary {
                    index,
                    reason: format!("record length {value} exceeds {MAX_RECORD_LEN} bytes"),
                }
                .into());
            }
            return usize::try_from(value).map(Some).map_err(|_| {
                CodecError::MalformedBinary {
                    index,
                    reason: format!("record length {value} does not fit in memory"),
                }
                .into()
            });
        }
    }

    Err(CodecError::MalformedBinary {
        index,
        reason: format!("length prefix longer than {MAX_VARINT_LEN} bytes"),
    }
    .into())
}

fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    loop {
        match input.fill_buf() {
            Ok(buf) => {
                let byte = buf.first().copied();
                if byte.is_some() {
                    input.consume(1);
                }
                return Ok(byte);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, RsenseError};

    fn event(abs: i64, rel: Option<i64>) -> AccelerometerEvent {
        let mut builder = AccelerometerEvent::builder();
        builder.absolute_timestamp(abs).x(0.25).y(-0.5).z(9.75);
        if let Some(rel) = rel {
            builder.relative_timestamp(rel);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_round_trip_keeps_relative_presence() {
        let events = vec![event(1, Some(0)), event(2, None), event(3, Some(-7))];
        let decoded = from_slice(&to_vec(&events).unwrap()).unwrap();
        assert_eq!(decoded, events);
        assert!(decoded[0].has_relative_timestamp());
        assert!(!decoded[1].has_relative_timestamp());
    }

    #[test]
    fn test_frames_are_length_prefixed() {
        let bytes = to_vec(&[event(1, None)]).unwrap();
        let message = proto::ThreeAxisSensorEvent {
            absolute_timestamp: 1,
            relative_timestamp: None,
            x: 0.25,
            y: -0.5,
            z: 9.75,
        };
        assert_eq!(usize::from(bytes[0]), message.encoded_len());
        assert_eq!(bytes.len(), 1 + message.encoded_len());
    }

    #[test]
    fn test_empty_input_has_no_records() {
        assert!(from_slice(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_body_is_io_failure() {
        let bytes = to_vec(&[event(1, None), event(2, None)]).unwrap();
        let err = from_slice(&bytes[..bytes.len() - 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        match err {
            RsenseError::Codec(CodecError::Io { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_prefix_is_io_failure() {
        let err = from_slice(&[0x80]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_oversized_prefix_is_malformed() {
        let err = from_slice(&[0xff, 0xff, 0xff, 0x7f]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        let err = from_slice(&[0xff; 11]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_garbage_body_is_malformed() {
        let err = from_slice(&[0x02, 0xff, 0xff]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(err.to_string().contains("record 0"));
    }

    #[test]
    fn test_decoder_resets_builder_between_records() {
        let bytes = to_vec(&[event(1, Some(99)), event(2, None)]).unwrap();
        let mut decoder = BinaryDecoder::default();
        let mut input = bytes.as_slice();

        let first = decoder.decode(&mut input).unwrap().unwrap();
        let second = decoder.decode(&mut input).unwrap().unwrap();
        assert_eq!(first.relative_timestamp(), Some(99));
        assert_eq!(second.relative_timestamp(), None);
        assert!(decoder.decode(&mut input).unwrap().is_none());
    }
}
