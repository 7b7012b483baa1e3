//! Sample-based sliding windows.
//!
//! A sliding window partitions an ordered sequence into consecutive,
//! non-overlapping chunks of a fixed size. The last chunk may be shorter; an
//! empty trailing chunk is never produced.
//!
//! Two flavors exist:
//!
//! - [`SlidingWindow`] - a frozen, shareable spec over in-memory data. Each
//!   call to [`SlidingWindow::windows`] hands out a fresh single-traversal
//!   [`WindowIter`] that yields borrowed [`Window`] views.
//! - [`LazyWindows`] - windows pulled straight from any iterator, including
//!   infinite ones, built with [`chunked`]. Only the window being produced is
//!   ever held in memory.
//!
//! # Example
//!
//! ```rust
//! use rsense::window::SlidingWindow;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = SlidingWindow::builder()
//!     .size(2)?
//!     .extend([1, 2, 3, 4, 5, 6, 7])
//!     .build()?;
//!
//! let windows: Vec<Vec<i32>> = spec.windows().map(|w| w.to_vec()).collect();
//! assert_eq!(windows, vec![vec![1, 2], vec![3, 4], vec![5, 6], vec![7]]);
//! # Ok(())
//! # }
//! ```
//!
//! # Zero-sized windows
//!
//! A size of zero is accepted. Over non-empty data it never terminates: every
//! pull yields an empty window because the offset never advances. Callers
//! that rely on termination must reject zero themselves.

use std::iter::{Fuse, FusedIterator, Peekable};
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{Result, WindowError};

/// Plain configuration for a [`SlidingWindow`].
///
/// Both fields are required: `size` must be set and `data` must be
/// non-empty. [`SlidingWindow::from_config`] checks them and names every
/// missing field in the error.
#[derive(Debug, Clone)]
pub struct WindowConfig<E> {
    /// Number of elements per window.
    pub size: Option<usize>,
    /// The ordered source sequence.
    pub data: Vec<E>,
}

impl<E> Default for WindowConfig<E> {
    fn default() -> Self {
        Self {
            size: None,
            data: Vec::new(),
        }
    }
}

/// A frozen sliding-window spec over an in-memory sequence.
///
/// The source is an immutable shared slice: cloning the spec is cheap and
/// nothing can modify the data after [`build`](SlidingWindowBuilder::build).
#[derive(Debug, Clone)]
pub struct SlidingWindow<E> {
    size: usize,
    data: Arc<[E]>,
}

impl<E> SlidingWindow<E> {
    /// Returns a builder with no size and no data.
    pub fn builder() -> SlidingWindowBuilder<E> {
        SlidingWindowBuilder {
            config: WindowConfig::default(),
        }
    }

    /// Creates a spec from a plain configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Incomplete`] listing `size` and/or `data` when
    /// the size is unset or the data is empty.
    pub fn from_config(config: WindowConfig<E>) -> Result<Self> {
        let mut missing = Vec::new();
        if config.size.is_none() {
            missing.push("size");
        }
        if config.data.is_empty() {
            missing.push("data");
        }

        match config.size {
            Some(size) if missing.is_empty() => {
                tracing::debug!(size, elements = config.data.len(), "built sliding window");
                Ok(Self {
                    size,
                    data: config.data.into(),
                })
            }
            _ => Err(WindowError::Incomplete { missing }.into()),
        }
    }

    /// Returns the window size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the frozen source sequence.
    pub fn data(&self) -> &[E] {
        &self.data
    }

    /// Returns a new generator positioned at the start of the data.
    ///
    /// Each generator is traversed once and never resets; call this again
    /// for another traversal.
    pub fn windows(&self) -> WindowIter<'_, E> {
        WindowIter {
            data: &self.data,
            size: self.size,
            offset: 0,
        }
    }
}

impl<'a, E> IntoIterator for &'a SlidingWindow<E> {
    type Item = Window<'a, E>;
    type IntoIter = WindowIter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows()
    }
}

/// Accumulates the size and data of a [`SlidingWindow`].
///
/// Methods consume and return the builder so calls chain; the ones that can
/// reject their argument return a [`Result`] and fail immediately.
#[derive(Debug, Clone)]
pub struct SlidingWindowBuilder<E> {
    config: WindowConfig<E>,
}

impl<E> SlidingWindowBuilder<E> {
    /// Sets the window size.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidSize`] if `size` is negative.
    pub fn size(mut self, size: i64) -> Result<Self> {
        let size = usize::try_from(size).map_err(|_| WindowError::InvalidSize { size })?;
        self.config.size = Some(size);
        Ok(self)
    }

    /// Appends one element.
    #[must_use]
    pub fn add(mut self, element: E) -> Self {
        self.config.data.push(element);
        self
    }

    /// Appends a sequence of elements in order. An empty sequence is a no-op.
    #[must_use]
    pub fn extend<I: IntoIterator<Item = E>>(mut self, elements: I) -> Self {
        self.config.data.extend(elements);
        self
    }

    /// Appends one element that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NullElement`] if `element` is `None`.
    pub fn add_nullable(self, element: Option<E>) -> Result<Self> {
        match element {
            Some(element) => Ok(self.add(element)),
            None => Err(WindowError::NullElement { position: 0 }.into()),
        }
    }

    /// Appends a sequence whose slots may be absent.
    ///
    /// Nothing is appended unless every slot is present.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NullElement`] with the position of the first
    /// `None` slot.
    pub fn extend_nullable<I: IntoIterator<Item = Option<E>>>(self, elements: I) -> Result<Self> {
        let elements = elements
            .into_iter()
            .enumerate()
            .map(|(position, element)| element.ok_or(WindowError::NullElement { position }))
            .collect::<std::result::Result<Vec<E>, _>>()?;
        Ok(self.extend(elements))
    }

    /// Freezes the accumulated size and data.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Incomplete`] unless the size was set and at
    /// least one element was added.
    pub fn build(self) -> Result<SlidingWindow<E>> {
        SlidingWindow::from_config(self.config)
    }
}

/// A read-only view of one window.
///
/// Dereferences to a slice of the spec's frozen data.
#[derive(Debug, PartialEq, Eq)]
pub struct Window<'a, E> {
    elements: &'a [E],
}

impl<E> Clone for Window<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Window<'_, E> {}

impl<'a, E> Window<'a, E> {
    /// Returns the window's elements.
    pub fn as_slice(&self) -> &'a [E] {
        self.elements
    }
}

impl<E> Deref for Window<'_, E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        self.elements
    }
}

impl<'a, E> IntoIterator for Window<'a, E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Single-traversal generator over the windows of a [`SlidingWindow`].
///
/// The offset advances by the window size on every pull, so producing a
/// window costs O(size) regardless of how far the traversal has gone.
#[derive(Debug)]
pub struct WindowIter<'a, E> {
    data: &'a [E],
    size: usize,
    offset: usize,
}

impl<'a, E> WindowIter<'a, E> {
    /// Returns the next window.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Exhausted`] once no elements remain, on this
    /// and every later call.
    pub fn next_window(&mut self) -> Result<Window<'a, E>> {
        if self.offset >= self.data.len() {
            return Err(WindowError::Exhausted.into());
        }

        let end = self.offset.saturating_add(self.size).min(self.data.len());
        let window = Window {
            elements: &self.data[self.offset..end],
        };
        self.offset = self.offset.saturating_add(self.size);
        Ok(window)
    }

    /// Returns the number of elements not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Window generators are read-only; this always fails.
    ///
    /// # Errors
    ///
    /// Always returns [`WindowError::Unsupported`].
    pub fn remove(&mut self) -> Result<()> {
        Err(WindowError::Unsupported { operation: "remove" }.into())
    }
}

impl<'a, E> Iterator for WindowIter<'a, E> {
    type Item = Window<'a, E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_window().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match (self.remaining(), self.size) {
            (0, _) => (0, Some(0)),
            (_, 0) => (usize::MAX, None),
            (remaining, size) => {
                let count = remaining.div_ceil(size);
                (count, Some(count))
            }
        }
    }
}

impl<E> FusedIterator for WindowIter<'_, E> {}

/// Windows pulled lazily from an arbitrary iterator.
///
/// At most `size` elements are taken from the underlying iterator per
/// window, so infinite sources are fine. Each window is an owned `Vec`
/// detached from the source.
pub struct LazyWindows<I: Iterator> {
    inner: Peekable<Fuse<I>>,
    size: usize,
}

/// Creates lazy windows of `size` elements over `source`.
///
/// # Example
///
/// ```rust
/// use rsense::window::chunked;
///
/// let mut windows = chunked(1.., 3);
/// assert_eq!(windows.next(), Some(vec![1, 2, 3]));
/// assert_eq!(windows.next(), Some(vec![4, 5, 6]));
/// ```
pub fn chunked<I: IntoIterator>(source: I, size: usize) -> LazyWindows<I::IntoIter> {
    LazyWindows {
        inner: source.into_iter().fuse().peekable(),
        size,
    }
}

impl<I: Iterator> LazyWindows<I> {
    /// Returns the window size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the next window.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::Exhausted`] once the source is drained, on
    /// this and every later call.
    pub fn next_window(&mut self) -> Result<Vec<I::Item>> {
        if self.inner.peek().is_none() {
            return Err(WindowError::Exhausted.into());
        }

        let window: Vec<I::Item> = self.inner.by_ref().take(self.size).collect();
        tracing::trace!(len = window.len(), "pulled lazy window");
        Ok(window)
    }

    /// Window generators are read-only; this always fails.
    ///
    /// # Errors
    ///
    /// Always returns [`WindowError::Unsupported`].
    pub fn remove(&mut self) -> Result<()> {
        Err(WindowError::Unsupported { operation: "remove" }.into())
    }
}

impl<I: Iterator> Iterator for LazyWindows<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_window().ok()
    }
}

impl<I: Iterator> FusedIterator for LazyWindows<I> {}

impl<I: Iterator> std::fmt::Debug for LazyWindows<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyWindows")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
