//! Scalar features computed over groups of accelerometer events.
//!
//! Features are meant to run per window: pair them with
//! [`SlidingWindow::windows`](crate::SlidingWindow::windows) or
//! [`chunked`](crate::window::chunked) through [`compute_windowed`].
//!
//! # Example
//!
//! ```rust
//! use rsense::feature::{compute_windowed, MagnitudeMaximum};
//! use rsense::{AccelerometerEvent, SlidingWindow};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let events = (0..6)
//!     .map(|i| {
//!         AccelerometerEvent::builder()
//!             .absolute_timestamp(i)
//!             .x(0.0)
//!             .y(0.0)
//!             .z(10.0 + i as f32)
//!             .build()
//!     })
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let spec = SlidingWindow::builder().size(3)?.extend(events).build()?;
//! let maxima = compute_windowed(&MagnitudeMaximum, spec.windows())?;
//! assert_eq!(maxima.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::ops::Deref;

use crate::error::{FeatureError, Result};
use crate::model::{AccelerometerEvent, GRAVITY_EARTH};

/// A scalar computed from a non-empty group of events.
pub trait AccelerometerFeature {
    /// Stable identifier, used as a column name in reports.
    fn name(&self) -> &'static str;

    /// Computes the feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::EmptyInput`] if `events` is empty.
    fn compute(&self, events: &[AccelerometerEvent]) -> Result<f32>;
}

/// Acceleration magnitude with gravity removed.
///
/// A device at rest measures roughly zero.
pub fn magnitude(event: &AccelerometerEvent) -> f32 {
    let (x, y, z) = (event.x(), event.y(), event.z());
    (x * x + y * y + z * z).sqrt() - GRAVITY_EARTH
}

fn magnitudes<'e>(
    feature: &'static str,
    events: &'e [AccelerometerEvent],
) -> Result<impl Iterator<Item = f32> + 'e> {
    if events.is_empty() {
        return Err(FeatureError::EmptyInput { feature }.into());
    }
    Ok(events.iter().map(magnitude))
}

/// Smallest [`magnitude`] in the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeMinimum;

impl AccelerometerFeature for MagnitudeMinimum {
    fn name(&self) -> &'static str {
        "magnitude_minimum"
    }

    fn compute(&self, events: &[AccelerometerEvent]) -> Result<f32> {
        Ok(magnitudes(self.name(), events)?.fold(f32::INFINITY, f32::min))
    }
}

/// Largest [`magnitude`] in the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeMaximum;

impl AccelerometerFeature for MagnitudeMaximum {
    fn name(&self) -> &'static str {
        "magnitude_maximum"
    }

    fn compute(&self, events: &[AccelerometerEvent]) -> Result<f32> {
        Ok(magnitudes(self.name(), events)?.fold(f32::NEG_INFINITY, f32::max))
    }
}

/// Computes `feature` once per window, in window order.
///
/// Accepts both borrowed windows from [`WindowIter`](crate::window::WindowIter)
/// and owned ones from [`LazyWindows`](crate::window::LazyWindows).
///
/// # Errors
///
/// Returns the first feature error. With a window size of zero that is
/// [`FeatureError::EmptyInput`] on the first window.
pub fn compute_windowed<F, I>(feature: &F, windows: I) -> Result<Vec<f32>>
where
    F: AccelerometerFeature + ?Sized,
    I: IntoIterator,
    I::Item: Deref<Target = [AccelerometerEvent]>,
{
    windows
        .into_iter()
        .map(|window| feature.compute(&window))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::window::{SlidingWindow, chunked};

    fn event(x: f32, y: f32, z: f32) -> AccelerometerEvent {
        AccelerometerEvent::builder()
            .absolute_timestamp(0)
            .x(x)
            .y(y)
            .z(z)
            .build()
            .unwrap()
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_magnitude_removes_gravity() {
        assert!(approx(magnitude(&event(0.0, 0.0, GRAVITY_EARTH)), 0.0));
        assert!(approx(magnitude(&event(3.0, 4.0, 0.0)), 5.0 - GRAVITY_EARTH));
    }

    #[test]
    fn test_min_and_max() {
        let events = [event(0.0, 0.0, 10.0), event(0.0, 0.0, 12.0), event(0.0, 0.0, 11.0)];
        let min = MagnitudeMinimum.compute(&events).unwrap();
        let max = MagnitudeMaximum.compute(&events).unwrap();
        assert!(approx(min, 10.0 - GRAVITY_EARTH));
        assert!(approx(max, 12.0 - GRAVITY_EARTH));
    }

    #[test]
    fn test_maximum_of_negative_magnitudes() {
        let events = [event(0.0, 0.0, 0.0), event(0.0, 0.0, 1.0)];
        let max = MagnitudeMaximum.compute(&events).unwrap();
        assert!(approx(max, 1.0 - GRAVITY_EARTH));
    }

    #[test]
    fn test_empty_input() {
        let err = MagnitudeMinimum.compute(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
        assert!(err.to_string().contains("magnitude_minimum"));
    }

    #[test]
    fn test_windowed_over_borrowed_and_owned_windows() {
        let events: Vec<_> = (0..5).map(|i| event(0.0, 0.0, 10.0 + i as f32)).collect();

        let spec = SlidingWindow::builder()
            .size(2)
            .unwrap()
            .extend(events.clone())
            .build()
            .unwrap();
        let borrowed = compute_windowed(&MagnitudeMaximum, spec.windows()).unwrap();
        let owned = compute_windowed(&MagnitudeMaximum, chunked(events, 2)).unwrap();

        assert_eq!(borrowed, owned);
        assert_eq!(borrowed.len(), 3);
        assert!(approx(borrowed[2], 14.0 - GRAVITY_EARTH));
    }

    #[test]
    fn test_windowed_through_trait_object() {
        let features: Vec<Box<dyn AccelerometerFeature>> =
            vec![Box::new(MagnitudeMinimum), Box::new(MagnitudeMaximum)];
        let events = vec![event(0.0, 0.0, 10.0), event(0.0, 0.0, 11.0)];
        for feature in &features {
            let windows = chunked(events.iter().copied(), 1);
            let values = compute_windowed(feature.as_ref(), windows).unwrap();
            assert_eq!(values.len(), 2);
        }
    }
}
