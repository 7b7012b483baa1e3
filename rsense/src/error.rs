//! Error types for the rsense sensor-data library.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all rsense operations.
///
/// Each variant wraps the error enum of one concern. Use [`RsenseError::kind`]
/// to branch on the failure category without matching every variant.
#[derive(Error, Debug)]
pub enum RsenseError {
    /// Error while building or traversing a sliding window.
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// Error from a serializer or deserializer session.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A value object builder was finalized with missing fields.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Error while computing a feature.
    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),

    /// Error while loading or validating configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure category of an [`RsenseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A configuration value violates a stated precondition.
    InvalidArgument,
    /// A required value was absent.
    NullInput,
    /// A required non-empty sequence was empty.
    EmptyInput,
    /// A builder was finalized before all mandatory fields were set.
    IncompleteConfiguration,
    /// An operation was attempted on a closed codec session.
    ClosedResource,
    /// A single-pass sequence was advanced past its end.
    NoMoreElements,
    /// A mutation was attempted on a read-only value.
    UnsupportedOperation,
    /// The underlying sink or source failed.
    IoFailure,
    /// Bytes were read but do not form a valid record.
    Malformed,
}

impl ErrorKind {
    /// Returns `true` when the caller used the API incorrectly, as opposed
    /// to the transport failing or the data being corrupt.
    pub fn is_usage(self) -> bool {
        !matches!(self, Self::IoFailure | Self::Malformed)
    }
}

impl RsenseError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Window(e) => e.kind(),
            Self::Codec(e) => e.kind(),
            Self::Build(_) => ErrorKind::IncompleteConfiguration,
            Self::Feature(FeatureError::EmptyInput { .. }) => ErrorKind::EmptyInput,
            Self::Config(e) => e.kind(),
        }
    }
}

/// Errors raised by the windowing engine.
#[derive(Error, Debug)]
pub enum WindowError {
    /// The window size cannot be represented as a non-negative length.
    #[error("invalid window size {size}: size can't be negative")]
    InvalidSize {
        /// The rejected size.
        size: i64,
    },

    /// A `None` was supplied where an element was required.
    #[error("null element at position {position}")]
    NullElement {
        /// Position of the missing element within the supplied sequence.
        position: usize,
    },

    /// The window was built before size and data were both supplied.
    #[error("incomplete window configuration: missing {}", missing.join(", "))]
    Incomplete {
        /// Names of the fields that were never set.
        missing: Vec<&'static str>,
    },

    /// A window was requested after the generator was exhausted.
    #[error("no more windows")]
    Exhausted,

    /// A mutation was attempted through a read-only window generator.
    #[error("the {operation} operation is not supported by window generators")]
    Unsupported {
        /// The attempted operation.
        operation: &'static str,
    },
}

impl WindowError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSize { .. } => ErrorKind::InvalidArgument,
            Self::NullElement { .. } => ErrorKind::NullInput,
            Self::Incomplete { .. } => ErrorKind::IncompleteConfiguration,
            Self::Exhausted => ErrorKind::NoMoreElements,
            Self::Unsupported { .. } => ErrorKind::UnsupportedOperation,
        }
    }
}

/// Which side of the codec contract a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSide {
    /// A serializer writing to a sink.
    Serializer,
    /// A deserializer reading from a source.
    Deserializer,
}

impl SessionSide {
    fn activity(self) -> &'static str {
        match self {
            Self::Serializer => "serializing",
            Self::Deserializer => "deserializing",
        }
    }
}

impl std::fmt::Display for SessionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serializer => f.write_str("serializer"),
            Self::Deserializer => f.write_str("deserializer"),
        }
    }
}

/// Errors raised by serializer and deserializer sessions.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A sequence argument contained no values.
    #[error("nothing to serialize: the sequence is empty")]
    EmptyInput,

    /// The session was closed before this operation.
    #[error("the {side} is closed, no {} possible", side.activity())]
    Closed {
        /// The side of the closed session.
        side: SessionSide,
    },

    /// The sink or source failed.
    #[error("{context} failed: {source}")]
    Io {
        /// What the session was doing when the failure happened.
        context: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A delimited-text line could not be parsed.
    #[error("malformed text record on line {line}: {reason}")]
    MalformedText {
        /// 1-based line number in the source.
        line: u64,
        /// What was wrong with the line.
        reason: String,
    },

    /// A length-delimited binary record could not be decoded.
    #[error("malformed binary record {index}: {reason}")]
    MalformedBinary {
        /// 0-based index of the record in the stream.
        index: u64,
        /// What was wrong with the record.
        reason: String,
    },

    /// A value has no representation in the target format.
    #[error("cannot encode record: {source}")]
    Encode {
        /// The underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// JSON decoding failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// A decoded record was missing required fields.
    #[error("decoded record is incomplete: {0}")]
    Incomplete(#[from] BuildError),
}

impl CodecError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Closed { .. } => ErrorKind::ClosedResource,
            Self::Encode { .. } => ErrorKind::InvalidArgument,
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::Json { source } if source.is_io() => ErrorKind::IoFailure,
            Self::MalformedText { .. }
            | Self::MalformedBinary { .. }
            | Self::Json { .. }
            | Self::Incomplete(_) => ErrorKind::Malformed,
        }
    }

    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Errors raised when a value object builder is finalized too early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// One or more required fields were never set.
    #[error("{type_name} is missing required field(s): {}", missing.join(", "))]
    MissingFields {
        /// The type being built.
        type_name: &'static str,
        /// Names of the fields that were never set.
        missing: Vec<&'static str>,
    },
}

/// Errors raised by feature extractors.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// The feature was computed over zero events.
    #[error("feature {feature} needs at least one event")]
    EmptyInput {
        /// Name of the feature.
        feature: &'static str,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to load config from '{}': {source}", path.display())]
    Load {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::CodecConfig`].
    #[error("failed to parse config from '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid { .. } => ErrorKind::InvalidArgument,
            Self::Load { .. } => ErrorKind::IoFailure,
            Self::Parse { .. } => ErrorKind::Malformed,
        }
    }
}

/// Type alias for `Result<T, RsenseError>`.
pub type Result<T> = std::result::Result<T, RsenseError>;
