//! Session lifecycle shared by serializers and deserializers.
//!
//! A session moves `Unopened -> Open -> Closed`. The handle is opened lazily
//! on first use and at most once; closing drops it and is idempotent. Every
//! data operation on a closed session fails with [`CodecError::Closed`].

use std::io;

use crate::error::{CodecError, Result, SessionSide};

#[derive(Debug)]
enum State<H> {
    Unopened,
    Open(H),
    Closed,
}

/// A sink or source together with the handle opened from it.
#[derive(Debug)]
pub(crate) struct Session<E, H> {
    endpoint: E,
    state: State<H>,
    side: SessionSide,
}

impl<E, H> Session<E, H> {
    pub(crate) fn new(endpoint: E, side: SessionSide) -> Self {
        Self {
            endpoint,
            state: State::Unopened,
            side,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Fails if the session was closed.
    pub(crate) fn ensure_not_closed(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CodecError::Closed { side: self.side }.into());
        }
        Ok(())
    }

    /// Returns the open handle, opening it with `open` on first use.
    ///
    /// A failed open leaves the session unopened.
    pub(crate) fn handle_or_open<F>(&mut self, open: F) -> Result<&mut H>
    where
        F: FnOnce(&mut E) -> io::Result<H>,
    {
        let side = self.side;
        if matches!(self.state, State::Unopened) {
            let context = match side {
                SessionSide::Serializer => "opening sink",
                SessionSide::Deserializer => "opening source",
            };
            let handle = open(&mut self.endpoint).map_err(|e| CodecError::io(context, e))?;
            tracing::debug!(%side, "opened session handle");
            self.state = State::Open(handle);
        }

        match &mut self.state {
            State::Open(handle) => Ok(handle),
            State::Unopened | State::Closed => Err(CodecError::Closed { side }.into()),
        }
    }

    /// Marks the session closed and hands the open handle, if any, to
    /// `finish`. The handle is released even if `finish` fails. Closing a
    /// closed session does nothing.
    pub(crate) fn close<F>(&mut self, finish: F) -> Result<()>
    where
        F: FnOnce(H) -> Result<()>,
    {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(handle) => {
                tracing::debug!(side = %self.side, "closing session handle");
                finish(handle)
            }
            State::Unopened => {
                tracing::debug!(side = %self.side, "closed session that was never opened");
                Ok(())
            }
            State::Closed => Ok(()),
        }
    }
}
