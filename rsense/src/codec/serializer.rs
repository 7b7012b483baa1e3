//! Session-backed serializer shared by every format.

use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::io::ByteSink;
use super::session::Session;
use super::{RecordEncoder, Serializer};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result, SessionSide};

/// A [`Serializer`] writing records produced by an encoder `C` to a sink `S`.
///
/// The sink is opened on the first write and wrapped in a buffered writer
/// of [`CodecConfig::buffer_capacity`] bytes. Each record is encoded into a
/// scratch buffer first and then written under the session lock, so records
/// from concurrent callers never interleave.
///
/// Dropping an unclosed serializer closes it; errors raised at that point
/// are logged and otherwise lost, so call [`Serializer::close`] to see them.
pub struct StreamSerializer<T, S: ByteSink, C: RecordEncoder<T>> {
    state: Mutex<SerializerState<S, C>>,
    buffer_capacity: usize,
    _record: PhantomData<fn(&T)>,
}

struct SerializerState<S: ByteSink, C> {
    session: Session<S, BufWriter<S::Writer>>,
    encoder: C,
    scratch: Vec<u8>,
}

impl<T, S: ByteSink, C: RecordEncoder<T>> StreamSerializer<T, S, C> {
    /// Creates an unopened serializer.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `config` fails
    /// [`CodecConfig::validate`].
    pub fn new(sink: S, encoder: C, config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(SerializerState {
                session: Session::new(sink, SessionSide::Serializer),
                encoder,
                scratch: Vec::new(),
            }),
            buffer_capacity: config.buffer_capacity,
            _record: PhantomData,
        })
    }

    /// Returns `true` once [`Serializer::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().session.is_closed()
    }

    fn lock(&self) -> MutexGuard<'_, SerializerState<S, C>> {
        // Every write clears the scratch buffer first, so a poisoned lock is
        // still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn open_writer<S: ByteSink>(
    session: &mut Session<S, BufWriter<S::Writer>>,
    capacity: usize,
) -> Result<&mut BufWriter<S::Writer>> {
    session.handle_or_open(|sink| {
        sink.open()
            .map(|writer| BufWriter::with_capacity(capacity, writer))
    })
}

impl<S: ByteSink, C> SerializerState<S, C> {
    fn write_record<T>(&mut self, value: &T, capacity: usize) -> Result<()>
    where
        C: RecordEncoder<T>,
    {
        self.session.ensure_not_closed()?;
        self.scratch.clear();
        self.encoder.encode(value, &mut self.scratch)?;

        open_writer(&mut self.session, capacity)?
            .write_all(&self.scratch)
            .map_err(|e| CodecError::io("writing record", e))?;
        Ok(())
    }

    fn close<T>(&mut self) -> Result<()>
    where
        C: RecordEncoder<T>,
    {
        let Self {
            session,
            encoder,
            scratch,
        } = self;

        session.close(|mut writer| {
            scratch.clear();
            encoder.finish(scratch)?;
            writer
                .write_all(scratch.as_slice())
                .map_err(|e| CodecError::io("writing trailer", e))?;
            writer
                .flush()
                .map_err(|e| CodecError::io("flushing sink", e))?;
            Ok(())
        })
    }
}

impl<T, S: ByteSink, C: RecordEncoder<T>> Serializer<T> for StreamSerializer<T, S, C> {
    fn serialize(&self, value: &T) -> Result<&Self> {
        self.lock().write_record(value, self.buffer_capacity)?;
        Ok(self)
    }

    fn serialize_all<'v, I>(&self, values: I) -> Result<&Self>
    where
        I: IntoIterator<Item = &'v T>,
        T: 'v,
    {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return Err(CodecError::EmptyInput.into());
        }

        let mut state = self.lock();
        let mut written = 0usize;
        for value in values {
            state.write_record(value, self.buffer_capacity)?;
            written += 1;
        }
        tracing::trace!(records = written, "serialized sequence");
        Ok(self)
    }

    fn flush(&self) -> Result<&Self> {
        let mut state = self.lock();
        state.session.ensure_not_closed()?;
        open_writer(&mut state.session, self.buffer_capacity)?
            .flush()
            .map_err(|e| CodecError::io("flushing sink", e))?;
        Ok(self)
    }

    fn close(&self) -> Result<()> {
        self.lock().close::<T>()
    }
}

impl<T, S: ByteSink, C: RecordEncoder<T>> Drop for StreamSerializer<T, S, C> {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if state.session.is_closed() {
            return;
        }
        if let Err(e) = state.close::<T>() {
            tracing::warn!(error = %e, "failed to close serializer on drop");
        }
    }
}

impl<T, S: ByteSink, C: RecordEncoder<T>> std::fmt::Debug for StreamSerializer<T, S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSerializer")
            .field("closed", &self.is_closed())
            .field("buffer_capacity", &self.buffer_capacity)
            .finish_non_exhaustive()
    }
}
