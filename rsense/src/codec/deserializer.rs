//! Session-backed deserializer and its lazy record stream.

use std::io::{BufRead, BufReader};
use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::io::ByteSource;
use super::session::Session;
use super::{Deserializer, RecordDecoder};
use crate::config::CodecConfig;
use crate::error::{Result, RsenseError, SessionSide};

/// Outcome of pulling one record from a [`RecordStream`].
#[derive(Debug)]
pub enum Pull<T> {
    /// A decoded record.
    Value(T),
    /// The source has no more records.
    End,
    /// Reading or decoding failed. The stream is finished afterwards.
    Failure(RsenseError),
}

/// Lazy, single-pass sequence of records decoded from a deserializer's
/// source.
///
/// Obtained from [`Deserializer::deserialize`]. Nothing is read until the
/// stream is advanced. As an [`Iterator`] it yields `Result<T>` and stops
/// after the first error.
pub struct RecordStream<'a, T, R, D> {
    reader: &'a mut R,
    decoder: &'a mut D,
    finished: bool,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T, R: BufRead, D: RecordDecoder<T>> RecordStream<'a, T, R, D> {
    fn new(reader: &'a mut R, decoder: &'a mut D) -> Self {
        Self {
            reader,
            decoder,
            finished: false,
            _record: PhantomData,
        }
    }

    /// Pulls the next record.
    pub fn pull(&mut self) -> Pull<T> {
        if self.finished {
            return Pull::End;
        }

        match self.decoder.decode(&mut *self.reader) {
            Ok(Some(value)) => Pull::Value(value),
            Ok(None) => {
                self.finished = true;
                Pull::End
            }
            Err(e) => {
                self.finished = true;
                tracing::debug!(error = %e, "record stream failed");
                Pull::Failure(e)
            }
        }
    }

    /// Collects every remaining record.
    ///
    /// # Errors
    ///
    /// Returns the first read or decode error.
    pub fn collect_all(self) -> Result<Vec<T>> {
        self.collect()
    }
}

impl<T, R: BufRead, D: RecordDecoder<T>> Iterator for RecordStream<'_, T, R, D> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pull() {
            Pull::Value(value) => Some(Ok(value)),
            Pull::End => None,
            Pull::Failure(e) => Some(Err(e)),
        }
    }
}

impl<T, R: BufRead, D: RecordDecoder<T>> FusedIterator for RecordStream<'_, T, R, D> {}

impl<T, R, D> std::fmt::Debug for RecordStream<'_, T, R, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// A [`Deserializer`] reading records with a decoder `D` from a source `S`.
///
/// The source is opened on the first [`deserialize`](Deserializer::deserialize)
/// call and wrapped in a buffered reader. Successive calls continue where
/// the previous stream stopped.
pub struct StreamDeserializer<T, S: ByteSource, D: RecordDecoder<T>> {
    session: Session<S, BufReader<S::Reader>>,
    decoder: D,
    buffer_capacity: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T, S: ByteSource, D: RecordDecoder<T>> StreamDeserializer<T, S, D> {
    /// Creates an unopened deserializer.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `config` fails
    /// [`CodecConfig::validate`].
    pub fn new(source: S, decoder: D, config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: Session::new(source, SessionSide::Deserializer),
            decoder,
            buffer_capacity: config.buffer_capacity,
            _record: PhantomData,
        })
    }

    /// Returns `true` once [`Deserializer::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

impl<T, S: ByteSource, D: RecordDecoder<T>> Deserializer<T> for StreamDeserializer<T, S, D> {
    type Records<'a>
        = RecordStream<'a, T, BufReader<S::Reader>, D>
    where
        Self: 'a;

    fn deserialize(&mut self) -> Result<Self::Records<'_>> {
        let capacity = self.buffer_capacity;
        let reader = self.session.handle_or_open(|source| {
            source
                .open()
                .map(|reader| BufReader::with_capacity(capacity, reader))
        })?;
        self.decoder.prepare(&mut *reader)?;
        Ok(RecordStream::new(reader, &mut self.decoder))
    }

    fn close(&mut self) -> Result<()> {
        self.session.close(|reader| {
            drop(reader);
            Ok(())
        })
    }
}

impl<T, S: ByteSource, D: RecordDecoder<T>> std::fmt::Debug for StreamDeserializer<T, S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDeserializer")
            .field("open", &self.session.is_open())
            .field("closed", &self.session.is_closed())
            .field("buffer_capacity", &self.buffer_capacity)
            .finish_non_exhaustive()
    }
}
