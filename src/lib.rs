//! # stream-canvas
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Real-time video compositing with drag interaction and a republished
//! output stream.
//!
//! `stream-canvas` collects video sources (remote participants plus an
//! optional local camera), composites them onto one surface every refresh,
//! lets the user drag a single source around, and continuously captures the
//! surface as an outgoing stream for a publishing layer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), stream_canvas::StreamCanvasError> {
//! use stream_canvas::{source::MockCamera, stream_channel, LayoutMode, StreamCanvas};
//!
//! let (on_stream, mut streams) = stream_channel();
//!
//! let session = StreamCanvas::builder()
//!     .surface_size(1280, 720)
//!     .layout(LayoutMode::Grid)
//!     .on_stream_changed(on_stream)
//!     .on_event(|e| tracing::warn!(?e, "canvas event"))
//!     .start()?;
//!
//! // Feed membership snapshots as they arrive from signalling
//! let mut alice = MockCamera::qvga();
//! alice.push_solid([200, 40, 40, 255]);
//! session.reconcile(vec![alice.observe("alice")]);
//!
//! // Hand each new capture to the publishing layer
//! while streams.changed().await.is_ok() {
//!     if let Some(capture) = streams.borrow().clone() {
//!         println!("new capture {} at {} fps", capture.id(), capture.rate());
//!         break;
//!     }
//! }
//!
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Render loop**: One Tokio task ticking at the refresh interval; the only
//!   continuously running activity
//! - **Event handlers**: Reconcile, pointer input and resize run synchronously
//!   on the caller's thread and only touch shared state behind short locks
//! - **Output**: At most one live capture; replacements are announced only
//!   after the previous capture's tracks are stopped

#![warn(missing_docs)]
// Pixel and geometry code converts between integer and float coordinates on purpose
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod config;
mod error;
mod event;
mod frame;
mod geometry;
pub mod input;
pub mod output;
pub mod pipeline;
mod session;
pub mod source;

pub use builder::{StreamCanvas, StreamCanvasBuilder, MAX_SURFACE_DIMENSION};
pub use config::{CanvasConfig, LayoutMode, SegmentationThresholds};
pub use error::{DrawError, PublishError, StreamCanvasError};
pub use event::{event_callback, CanvasEvent, EventCallback, RecaptureReason};
pub use frame::VideoFrame;
pub use geometry::{Point, Rect, ScreenRect};
pub use input::{DragState, DragTransition, PointerDevice, PointerEvent, PointerPhase};
pub use output::{
    publish_capture, stream_channel, CaptureHandle, CaptureTrack, Publisher,
    StreamChangedCallback,
};
pub use session::{CanvasSession, SessionStats};
pub use source::{video_track, ObservedSource, Readiness, SourceId, SourceRegistry, TrackHandle};
