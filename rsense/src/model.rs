//! Immutable sensor value objects.
//!
//! [`AccelerometerEvent`] is one sample from a three-axis accelerometer and
//! [`AccurateTime`] pairs an absolute wall-clock time with a relative clock
//! reading. Both are built through builders whose `build()` reports every
//! missing required field at once.

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// Earth's gravity in SI units (m/s^2).
pub const GRAVITY_EARTH: f32 = 9.806_65;

/// A sample from a three-axis accelerometer.
///
/// The absolute timestamp is in milliseconds since the Unix epoch and is
/// meant for synchronizing with other sample streams. The optional relative
/// timestamp is in nanoseconds and compares samples from the same dataset
/// with higher precision. Axis values are in m/s^2.
///
/// # Example
///
/// ```rust
/// use rsense::AccelerometerEvent;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let event = AccelerometerEvent::builder()
///     .absolute_timestamp(1_700_000_000_000)
///     .relative_timestamp(42_000)
///     .x(0.1)
///     .y(0.2)
///     .z(9.8)
///     .build()?;
///
/// assert_eq!(event.relative_timestamp(), Some(42_000));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccelerometerEvent {
    absolute_timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relative_timestamp: Option<i64>,
    #[serde(serialize_with = "finite")]
    x: f32,
    #[serde(serialize_with = "finite")]
    y: f32,
    #[serde(serialize_with = "finite")]
    z: f32,
}

// serde_json would write NaN and infinities as `null`, which cannot be read
// back as an axis value.
fn finite<S: serde::Serializer>(
    value: &f32,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f32(*value)
    } else {
        Err(serde::ser::Error::custom(format!("axis value {value} is not finite")))
    }
}

impl AccelerometerEvent {
    /// Returns an empty builder.
    pub fn builder() -> AccelerometerEventBuilder {
        AccelerometerEventBuilder::default()
    }

    /// Absolute timestamp in milliseconds since the Unix epoch.
    pub fn absolute_timestamp(&self) -> i64 {
        self.absolute_timestamp
    }

    /// Relative timestamp in nanoseconds, if the sample carries one.
    pub fn relative_timestamp(&self) -> Option<i64> {
        self.relative_timestamp
    }

    /// Returns whether a relative timestamp is present.
    pub fn has_relative_timestamp(&self) -> bool {
        self.relative_timestamp.is_some()
    }

    /// X-axis value in m/s^2.
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Y-axis value in m/s^2.
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Z-axis value in m/s^2.
    pub fn z(&self) -> f32 {
        self.z
    }
}

/// Builder for [`AccelerometerEvent`].
///
/// The absolute timestamp and all three axes are required; the relative
/// timestamp is optional. Setters take `&mut self` so a decoder can keep one
/// builder around and [`reset`](Self::reset) it between records.
#[derive(Debug, Clone, Default)]
pub struct AccelerometerEventBuilder {
    absolute_timestamp: Option<i64>,
    relative_timestamp: Option<i64>,
    x: Option<f32>,
    y: Option<f32>,
    z: Option<f32>,
}

impl AccelerometerEventBuilder {
    /// Sets the absolute timestamp in milliseconds since the Unix epoch.
    pub fn absolute_timestamp(&mut self, millis: i64) -> &mut Self {
        self.absolute_timestamp = Some(millis);
        self
    }

    /// Sets the relative timestamp in nanoseconds.
    pub fn relative_timestamp(&mut self, nanos: i64) -> &mut Self {
        self.relative_timestamp = Some(nanos);
        self
    }

    /// Sets the x-axis value.
    pub fn x(&mut self, x: f32) -> &mut Self {
        self.x = Some(x);
        self
    }

    /// Sets the y-axis value.
    pub fn y(&mut self, y: f32) -> &mut Self {
        self.y = Some(y);
        self
    }

    /// Sets the z-axis value.
    pub fn z(&mut self, z: f32) -> &mut Self {
        self.z = Some(z);
        self
    }

    /// Clears every field, including the optional relative timestamp.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Builds the event.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingFields`] naming every required field that
    /// was never set.
    pub fn build(&self) -> Result<AccelerometerEvent> {
        let (Some(absolute_timestamp), Some(x), Some(y), Some(z)) =
            (self.absolute_timestamp, self.x, self.y, self.z)
        else {
            let missing = [
                ("absolute_timestamp", self.absolute_timestamp.is_none()),
                ("x", self.x.is_none()),
                ("y", self.y.is_none()),
                ("z", self.z.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, is_missing)| is_missing.then_some(name))
            .collect();

            return Err(BuildError::MissingFields {
                type_name: "AccelerometerEvent",
                missing,
            }
            .into());
        };

        Ok(AccelerometerEvent {
            absolute_timestamp,
            relative_timestamp: self.relative_timestamp,
            x,
            y,
            z,
        })
    }
}

/// An absolute, accurate time paired with a relative clock reading.
///
/// Typical use is anchoring a device's uptime counter to wall-clock time so
/// relative timestamps from that device can be converted later. Both values
/// are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccurateTime {
    time: i64,
    reference: i64,
}

impl AccurateTime {
    /// Returns an empty builder.
    pub fn builder() -> AccurateTimeBuilder {
        AccurateTimeBuilder::default()
    }

    /// Absolute time in milliseconds since the Unix epoch.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Relative clock reading in milliseconds taken at [`time`](Self::time).
    pub fn reference(&self) -> i64 {
        self.reference
    }
}

/// Builder for [`AccurateTime`]. Both fields are required.
#[derive(Debug, Clone, Default)]
pub struct AccurateTimeBuilder {
    time: Option<i64>,
    reference: Option<i64>,
}

impl AccurateTimeBuilder {
    /// Sets the absolute time in milliseconds since the Unix epoch.
    pub fn time(&mut self, millis: i64) -> &mut Self {
        self.time = Some(millis);
        self
    }

    /// Sets the relative clock reading in milliseconds.
    pub fn reference(&mut self, millis: i64) -> &mut Self {
        self.reference = Some(millis);
        self
    }

    /// Builds the value.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingFields`] if `time` or `reference` was
    /// never set.
    pub fn build(&self) -> Result<AccurateTime> {
        match (self.time, self.reference) {
            (Some(time), Some(reference)) => Ok(AccurateTime { time, reference }),
            (time, reference) => {
                let mut missing = Vec::with_capacity(2);
                if time.is_none() {
                    missing.push("time");
                }
                if reference.is_none() {
                    missing.push("reference");
                }
                Err(BuildError::MissingFields {
                    type_name: "AccurateTime",
                    missing,
                }
                .into())
            }
        }
    }
}
