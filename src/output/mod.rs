//! Outgoing stream: captures of the composited surface.
//!
//! The render loop samples the surface into the current capture at the
//! capture rate. Consumers learn about captures through a
//! [`StreamChangedCallback`] (or [`stream_channel()`]) and hand them to a
//! [`Publisher`] with [`publish_capture()`].
//!
//! ```text
//! Surface → OutputStreamManager → CaptureHandle → Publisher
//! ```

mod capture;
mod channel;
mod manager;
mod publish;

pub use capture::{CaptureHandle, CaptureTrack};
pub use channel::stream_channel;
pub use manager::OutputStreamManager;
pub use publish::{publish_capture, Publisher};

use std::sync::Arc;

/// Callback receiving each new output capture, or `None` when no capture is
/// available.
///
/// Register one via [`StreamCanvasBuilder::on_stream_changed()`].
///
/// [`StreamCanvasBuilder::on_stream_changed()`]: crate::StreamCanvasBuilder::on_stream_changed
pub type StreamChangedCallback = Arc<dyn Fn(Option<CaptureHandle>) + Send + Sync>;
