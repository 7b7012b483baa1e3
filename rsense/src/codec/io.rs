//! Byte sinks and sources handed to codec sessions.
//!
//! A session never opens its handle up front. It keeps the sink or source
//! and calls [`ByteSink::open`] / [`ByteSource::open`] on first use, then
//! owns the returned writer or reader until it is closed. An open that fails
//! leaves the session unopened, so a later call can retry.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Something a serializer can open for writing.
pub trait ByteSink {
    /// The writer handed out by [`open`](Self::open).
    type Writer: Write;

    /// Opens the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while acquiring the writer.
    fn open(&mut self) -> io::Result<Self::Writer>;
}

/// Something a deserializer can open for reading.
pub trait ByteSource {
    /// The reader handed out by [`open`](Self::open).
    type Reader: Read;

    /// Opens the underlying reader.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while acquiring the reader.
    fn open(&mut self) -> io::Result<Self::Reader>;
}

/// A file sink. Truncates the file on open unless appending.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    append: bool,
}

impl FileSink {
    /// Creates a sink that truncates (or creates) `path` when opened.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: false,
        }
    }

    /// Creates a sink that appends to `path` when opened.
    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
        }
    }
}

impl ByteSink for FileSink {
    type Writer = File;

    fn open(&mut self) -> io::Result<File> {
        if self.append {
            OpenOptions::new().create(true).append(true).open(&self.path)
        } else {
            File::create(&self.path)
        }
    }
}

/// A file source.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source that opens `path` for reading.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ByteSource for FileSource {
    type Reader = File;

    fn open(&mut self) -> io::Result<File> {
        File::open(&self.path)
    }
}

/// Wraps an already open writer. It can be handed out once.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Option<W>,
}

impl<W: Write> WriterSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    type Writer = W;

    fn open(&mut self) -> io::Result<W> {
        self.writer
            .take()
            .ok_or_else(|| io::Error::other("writer was already handed out"))
    }
}

/// Wraps an already open reader. It can be handed out once.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: Option<R>,
}

impl<R: Read> ReaderSource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    type Reader = R;

    fn open(&mut self) -> io::Result<R> {
        self.reader
            .take()
            .ok_or_else(|| io::Error::other("reader was already handed out"))
    }
}

/// Shared in-memory bytes. Every open starts a new cursor at offset zero.
#[derive(Debug, Clone)]
pub struct BytesSource {
    bytes: Arc<[u8]>,
}

impl BytesSource {
    /// Wraps `bytes`.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl From<Vec<u8>> for BytesSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl ByteSource for BytesSource {
    type Reader = Cursor<Arc<[u8]>>;

    fn open(&mut self) -> io::Result<Self::Reader> {
        Ok(Cursor::new(Arc::clone(&self.bytes)))
    }
}
