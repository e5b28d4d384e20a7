//! Builder pattern for `StreamCanvas`.

use std::sync::Arc;

use crate::config::{CanvasConfig, LayoutMode};
use crate::input::DragController;
use crate::output::{OutputStreamManager, StreamChangedCallback};
use crate::pipeline::{spawn_compositor, SurfaceState};
use crate::session::{CanvasSession, SessionState};
use crate::source::SourceRegistry;
use crate::{event_callback, CanvasEvent, EventCallback, StreamCanvasError};

/// Largest accepted surface dimension in pixels.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// Builder for configuring and starting a canvas session.
///
/// Use [`StreamCanvas::builder()`] to create a new builder.
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> Result<(), stream_canvas::StreamCanvasError> {
/// use stream_canvas::{stream_channel, LayoutMode, StreamCanvas};
///
/// let (on_stream, mut streams) = stream_channel();
///
/// let session = StreamCanvas::builder()
///     .surface_size(800, 600)
///     .layout(LayoutMode::SingleDraggable)
///     .segmentation(true)
///     .on_stream_changed(on_stream)
///     .on_event(|e| tracing::warn!(?e, "canvas event"))
///     .start()?;
///
/// streams.changed().await.ok();
/// if let Some(capture) = streams.borrow().clone() {
///     println!("capturing {:?} at {} fps", capture.geometry(), capture.rate());
/// }
///
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
///
/// [`StreamCanvas::builder()`]: crate::StreamCanvas::builder
#[must_use]
pub struct StreamCanvasBuilder {
    width: u32,
    height: u32,
    mode: LayoutMode,
    config: CanvasConfig,
    event_callback: Option<EventCallback>,
    stream_callback: Option<StreamChangedCallback>,
}

impl Default for StreamCanvasBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCanvasBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            width: 1280,
            height: 720,
            mode: LayoutMode::default(),
            config: CanvasConfig::default(),
            event_callback: None,
            stream_callback: None,
        }
    }

    /// Set the initial surface size in pixels.
    ///
    /// Default: 1280x720
    pub fn surface_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the initial layout mode.
    ///
    /// Default: [`LayoutMode::Grid`]
    pub fn layout(mut self, mode: LayoutMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable the segmentation pass for single-source modes.
    pub fn segmentation(mut self, enabled: bool) -> Self {
        self.config.segmentation = enabled;
        self
    }

    /// Set custom canvas configuration.
    pub fn with_config(mut self, config: CanvasConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a callback to receive runtime events.
    ///
    /// Events include source attach/detach, draw failures, dropped
    /// segmentation frames and capture replacements. The callback may run
    /// while session state is locked and must not call back into the
    /// session.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(CanvasEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Set the callback receiving each new output capture.
    ///
    /// See [`stream_channel()`](crate::stream_channel) for a watch-channel
    /// adapter. The callback runs with the output manager locked; it must
    /// not call back into the session.
    pub fn on_stream_changed(mut self, callback: StreamChangedCallback) -> Self {
        self.stream_callback = Some(callback);
        self
    }

    /// Validates the builder configuration.
    fn validate(&self) -> Result<(), StreamCanvasError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_SURFACE_DIMENSION
            || self.height > MAX_SURFACE_DIMENSION
        {
            return Err(StreamCanvasError::InvalidSurfaceSize {
                width: self.width,
                height: self.height,
            });
        }

        let (rw, rh) = self.config.region_size;
        if !(rw.is_finite() && rh.is_finite() && rw > 0.0 && rh > 0.0) {
            return Err(StreamCanvasError::InvalidRegionSize {
                width: rw,
                height: rh,
            });
        }

        if self.config.capture_rate_override == Some(0) {
            return Err(StreamCanvasError::InvalidCaptureRate);
        }

        Ok(())
    }

    /// Start the render loop.
    ///
    /// Returns a [`CanvasSession`] handle to feed sources and input.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The surface size is zero or exceeds [`MAX_SURFACE_DIMENSION`]
    /// - The draggable region size is not positive and finite
    /// - The capture rate override is zero
    /// - No Tokio runtime is available
    pub fn start(self) -> Result<CanvasSession, StreamCanvasError> {
        self.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(StreamCanvasError::NoRuntime);
        }

        let mut registry = SourceRegistry::new();
        if let Some(cb) = &self.event_callback {
            registry = registry.with_event_callback(Arc::clone(cb));
        }

        let mut output = OutputStreamManager::new(
            self.config.capture_rate(self.mode),
            self.config.recapture_debounce,
        );
        if let Some(cb) = self.stream_callback {
            output = output.with_stream_callback(cb);
        }
        if let Some(cb) = &self.event_callback {
            output = output.with_event_callback(Arc::clone(cb));
        }

        let (rw, rh) = self.config.region_size;
        let drag = DragController::new(self.width, self.height, rw, rh);
        let surface = SurfaceState {
            width: self.width,
            height: self.height,
            mode: self.mode,
        };

        let state = Arc::new(SessionState::new(registry, drag, surface, output));

        tracing::info!(
            width = self.width,
            height = self.height,
            mode = ?self.mode,
            refresh = ?self.config.refresh_interval,
            segmentation = self.config.segmentation,
            "canvas session starting"
        );

        let render_handle =
            spawn_compositor(Arc::clone(&state), self.config.clone(), self.event_callback);

        Ok(CanvasSession::new(state, self.config, render_handle))
    }
}

/// Main entry point for stream-canvas.
///
/// Use [`StreamCanvas::builder()`] to start configuring a canvas session.
pub struct StreamCanvas;

impl StreamCanvas {
    /// Creates a new builder for configuring a canvas session.
    pub fn builder() -> StreamCanvasBuilder {
        StreamCanvasBuilder::new()
    }
}
