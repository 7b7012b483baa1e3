//! # rsense
//!
//! Sensor-data codecs and sample-based sliding windows.
//!
//! rsense handles streams of three-axis accelerometer samples: it splits
//! ordered samples into fixed-size windows and moves them through
//! serializer/deserializer sessions backed by files, in-memory buffers or any
//! reader/writer. Three wire formats are bundled: delimited text, a JSON array
//! and length-delimited protobuf.
//!
//! ## Key Properties
//!
//! - Windows are borrowed views over frozen data, or pulled lazily from an
//!   unbounded iterator
//! - Sinks and sources are opened on first use and released exactly once
//! - Serializers are shareable across threads and never interleave records
//! - Every failure carries an [`ErrorKind`] category
//!
//! ## Quick Start
//!
//! ```rust
//! use rsense::codec::{binary, BytesSource, Deserializer, Serializer, WriterSink};
//! use rsense::{AccelerometerEvent, CodecConfig, SlidingWindow};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let events = (0..10)
//!     .map(|i| {
//!         AccelerometerEvent::builder()
//!             .absolute_timestamp(1_700_000_000_000 + i)
//!             .x(0.0)
//!             .y(0.0)
//!             .z(9.8)
//!             .build()
//!     })
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! // Serialize to protobuf and read it back
//! let config = CodecConfig::default();
//! let mut bytes = Vec::new();
//! {
//!     let serializer = binary::serializer(WriterSink::new(&mut bytes), &config)?;
//!     serializer.serialize_all(&events)?;
//!     serializer.close()?;
//! }
//! let mut deserializer = binary::deserializer(BytesSource::from(bytes), &config)?;
//! let decoded = deserializer.deserialize_all()?;
//! deserializer.close()?;
//!
//! // Window the decoded samples, four at a time
//! let spec = SlidingWindow::builder().size(4)?.extend(decoded).build()?;
//! let sizes: Vec<usize> = spec.windows().map(|w| w.len()).collect();
//! assert_eq!(sizes, vec![4, 4, 2]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`window`] - Sliding window spec, generators and lazy windows
//! - [`codec`] - Serializer/deserializer contract, sinks, sources and formats
//! - [`model`] - Accelerometer event and accurate-time value objects
//! - [`feature`] - Magnitude features computed per window
//! - [`config`] - Codec configuration
//! - [`error`] - Error types

pub mod codec;
pub mod config;
pub mod error;
pub mod feature;
pub mod model;
pub mod window;

// Re-export primary API types at crate root for convenience.
pub use codec::{Deserializer, Serializer};
pub use config::CodecConfig;
pub use error::{ErrorKind, Result, RsenseError};
pub use model::{AccelerometerEvent, AccurateTime, GRAVITY_EARTH};
pub use window::{SlidingWindow, Window, WindowConfig, WindowIter};
