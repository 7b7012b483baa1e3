//! Serializer and deserializer contract plus its format adapters.
//!
//! A [`Serializer`] writes values of one type to a [`ByteSink`]; a
//! [`Deserializer`] reads them back from a [`ByteSource`]. Both are sessions:
//! the sink or source is opened on first use, used exclusively by one
//! session, and released by `close()`. After close every data operation
//! fails with [`ErrorKind::ClosedResource`](crate::ErrorKind::ClosedResource),
//! while further `close()` calls succeed and do nothing.
//!
//! The three formats plug into [`StreamSerializer`] and
//! [`StreamDeserializer`] through the [`RecordEncoder`] and
//! [`RecordDecoder`] traits:
//!
//! - [`text`]: one delimited line per event
//! - [`json`]: a single JSON array per session
//! - [`binary`]: varint length-prefixed protobuf messages
//!
//! # Example
//!
//! ```rust
//! use rsense::codec::{text, BytesSource, Deserializer, Serializer, WriterSink};
//! use rsense::{AccelerometerEvent, CodecConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let event = AccelerometerEvent::builder()
//!     .absolute_timestamp(1_000)
//!     .x(0.5)
//!     .y(-0.5)
//!     .z(9.8)
//!     .build()?;
//!
//! let config = CodecConfig::default();
//! let mut bytes = Vec::new();
//! {
//!     let serializer = text::serializer(WriterSink::new(&mut bytes), &config)?;
//!     serializer.serialize(&event)?.serialize(&event)?;
//!     serializer.close()?;
//! }
//!
//! let mut deserializer = text::deserializer(BytesSource::from(bytes), &config)?;
//! let events = deserializer.deserialize_all()?;
//! deserializer.close()?;
//! assert_eq!(events, vec![event, event]);
//! # Ok(())
//! # }
//! ```

pub mod binary;
mod deserializer;
mod io;
pub mod json;
mod serializer;
mod session;
pub mod text;

pub use deserializer::{Pull, RecordStream, StreamDeserializer};
pub use io::{
    ByteSink, ByteSource, BytesSource, FileSink, FileSource, ReaderSource, WriterSink,
};
pub use serializer::StreamSerializer;

use std::io::BufRead;

use crate::error::{CodecError, Result, RsenseError};
use crate::model::{AccelerometerEvent, AccelerometerEventBuilder};

/// Writes values of type `T` to a sink.
///
/// All methods take `&self`: a serializer may be shared between threads and
/// concurrent calls are serialized internally, so records are never
/// interleaved. Data methods return `&Self` so calls can be chained.
pub trait Serializer<T> {
    /// Writes one value.
    ///
    /// # Errors
    ///
    /// Fails with `ClosedResource` after [`close`](Self::close) and with
    /// `IoFailure` when the sink fails.
    fn serialize(&self, value: &T) -> Result<&Self>;

    /// Writes every value of a non-empty sequence, in order.
    ///
    /// # Errors
    ///
    /// Fails with `EmptyInput` when the sequence is empty, even if the
    /// serializer is already closed. Otherwise fails like
    /// [`serialize`](Self::serialize).
    fn serialize_all<'v, I>(&self, values: I) -> Result<&Self>
    where
        I: IntoIterator<Item = &'v T>,
        T: 'v;

    /// Pushes buffered bytes to the sink.
    ///
    /// # Errors
    ///
    /// Fails with `ClosedResource` after close and with `IoFailure` when the
    /// sink fails.
    fn flush(&self) -> Result<&Self>;

    /// Finishes the stream and releases the sink. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails with `IoFailure` if writing the trailer or flushing fails. The
    /// sink is released either way.
    fn close(&self) -> Result<()>;
}

/// Reads values of type `T` from a source.
pub trait Deserializer<T> {
    /// Lazy single-pass sequence of decoded records.
    type Records<'a>: Iterator<Item = Result<T>>
    where
        Self: 'a;

    /// Returns a lazy sequence over the records remaining in the source.
    ///
    /// Records are decoded on demand. A decode or I/O failure is yielded as
    /// an `Err` item and ends the sequence.
    ///
    /// # Errors
    ///
    /// Fails with `ClosedResource` after [`close`](Self::close) and with
    /// `IoFailure` when the source cannot be opened.
    fn deserialize(&mut self) -> Result<Self::Records<'_>>;

    /// Releases the source. Idempotent.
    ///
    /// # Errors
    ///
    /// Never fails for the bundled formats; the signature leaves room for
    /// sources that report errors on release.
    fn close(&mut self) -> Result<()>;

    /// Reads every remaining record into a vector.
    ///
    /// # Errors
    ///
    /// Fails like [`deserialize`](Self::deserialize), or with the first
    /// error yielded by the sequence.
    fn deserialize_all(&mut self) -> Result<Vec<T>> {
        self.deserialize()?.collect()
    }
}

/// Turns one value into bytes appended to a scratch buffer.
pub trait RecordEncoder<T> {
    /// Appends the encoding of `value` to `out`.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be represented in the format.
    fn encode(&mut self, value: &T, out: &mut Vec<u8>) -> Result<()>;

    /// Appends the stream trailer, if the format has one.
    ///
    /// Called once when the session closes, and only if the sink was opened.
    ///
    /// # Errors
    ///
    /// Fails if the trailer cannot be produced.
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let _ = out;
        Ok(())
    }
}

/// Reads records from a buffered reader.
pub trait RecordDecoder<T> {
    /// Called at the start of every [`Deserializer::deserialize`] call.
    /// Formats that must read the whole stream up front do it here.
    ///
    /// # Errors
    ///
    /// Fails if the stream cannot be read or parsed.
    fn prepare<R: BufRead>(&mut self, input: &mut R) -> Result<()> {
        let _ = input;
        Ok(())
    }

    /// Decodes the next record, or returns `None` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// Fails with `IoFailure` if reading fails and with `Malformed` if the
    /// bytes do not form a record.
    fn decode<R: BufRead>(&mut self, input: &mut R) -> Result<Option<T>>;
}

/// Builds the event and resets the builder for the next record.
///
/// A builder failure here means the stream lacked a required field, so it is
/// reported as a malformed record.
pub(crate) fn take_event(builder: &mut AccelerometerEventBuilder) -> Result<AccelerometerEvent> {
    let event = builder.build().map_err(|e| match e {
        RsenseError::Build(missing) => CodecError::Incomplete(missing).into(),
        other => other,
    });
    builder.reset();
    event
}
