//! Error types for stream-canvas.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`StreamCanvasError`]): Prevent a session from starting,
//!   or fail a publish operation
//! - **Recoverable errors** ([`DrawError`]): Per-source draw problems that the
//!   render loop logs and skips, surfaced via [`EventCallback`](crate::EventCallback)

/// Fatal errors returned to the caller.
///
/// These are returned from [`StreamCanvasBuilder::start()`] and
/// [`publish_capture()`]. Nothing inside the render loop, the drag controller
/// or the capture manager produces one of these at runtime.
///
/// [`StreamCanvasBuilder::start()`]: crate::StreamCanvasBuilder::start
/// [`publish_capture()`]: crate::publish_capture
#[derive(Debug, thiserror::Error)]
pub enum StreamCanvasError {
    /// The surface must have a non-zero width and height to start.
    #[error("invalid surface size: {width}x{height}")]
    InvalidSurfaceSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The draggable region must have a positive, finite size.
    #[error("invalid region size: {width}x{height}")]
    InvalidRegionSize {
        /// Requested region width.
        width: f64,
        /// Requested region height.
        height: f64,
    },

    /// `start()` was called outside a Tokio runtime.
    #[error("no Tokio runtime available to run the render loop")]
    NoRuntime,

    /// A capture rate of zero frames per second was configured.
    #[error("capture rate must be at least 1 fps")]
    InvalidCaptureRate,

    /// The publishing layer rejected one of the tracks.
    ///
    /// Tracks already published by the failed call have been unpublished
    /// before this error is returned.
    #[error("publish via '{publisher}' failed: {reason} (rolled back {rolled_back} track(s))")]
    PublishFailed {
        /// Name of the publisher that failed.
        publisher: String,
        /// Why the publish failed.
        reason: String,
        /// Number of tracks unpublished during rollback.
        rolled_back: usize,
    },

    /// The capture handed to the publisher had no live video track.
    #[error("capture {capture_id} has no live video track")]
    NoLiveVideoTrack {
        /// Identifier of the capture.
        capture_id: u64,
    },
}

/// Errors that can occur while drawing one source during a tick.
///
/// Draw errors are recoverable: the compositor emits a
/// [`CanvasEvent::DrawFailed`], skips the source for that tick and keeps going.
///
/// [`CanvasEvent::DrawFailed`]: crate::CanvasEvent::DrawFailed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// The decode sink has not received a frame yet.
    #[error("source not ready")]
    NotReady,

    /// The decode sink has no track attached.
    #[error("decode sink detached")]
    Detached,

    /// The frame's buffer does not match its declared dimensions.
    #[error("malformed frame: expected {expected} bytes for {width}x{height}, got {actual}")]
    MalformedFrame {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Byte count implied by the dimensions.
        expected: usize,
        /// Byte count actually present.
        actual: usize,
    },
}

/// Errors reported by a [`Publisher`](crate::Publisher) implementation.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The remote side refused the track.
    #[error("track rejected: {reason}")]
    Rejected {
        /// Description of the refusal.
        reason: String,
    },

    /// The transport failed while publishing.
    #[error("transport error: {0}")]
    Transport(String),

    /// Custom error for user-implemented publishers.
    #[error("{0}")]
    Custom(String),
}

impl PublishError {
    /// Creates a custom publish error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates a rejection with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
