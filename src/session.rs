//! Canvas session management.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::{CanvasConfig, LayoutMode};
use crate::input::{apply_pointer, DragController, DragState, DragTransition, PointerEvent};
use crate::output::OutputStreamManager;
use crate::pipeline::SurfaceState;
use crate::source::{ObservedSource, ReconcileSummary, SourceId, SourceRegistry, TrackHandle};
use crate::{StreamCanvasError, MAX_SURFACE_DIMENSION};

/// Statistics about a canvas session.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Ticks rendered by the loop.
    pub frames_rendered: u64,
    /// Per-source draw failures.
    pub draw_failures: u64,
    /// Frames dropped because segmentation ran over budget.
    pub segmentation_skips: u64,
    /// Output captures created.
    pub captures_created: u64,
    /// Sources currently tracked.
    pub sources: usize,
}

/// Internal state shared between `CanvasSession` and the render loop.
///
/// Locks are never nested: each holder takes one, copies or mutates what it
/// needs, and releases it before taking the next.
pub(crate) struct SessionState {
    pub running: AtomicBool,
    pub frames_rendered: AtomicU64,
    pub draw_failures: AtomicU64,
    pub segmentation_skips: AtomicU64,
    pub registry: RwLock<SourceRegistry>,
    pub drag: Mutex<DragController>,
    pub surface: Mutex<SurfaceState>,
    pub output: Mutex<OutputStreamManager>,
}

impl SessionState {
    pub fn new(
        registry: SourceRegistry,
        drag: DragController,
        surface: SurfaceState,
        output: OutputStreamManager,
    ) -> Self {
        Self {
            running: AtomicBool::new(true),
            frames_rendered: AtomicU64::new(0),
            draw_failures: AtomicU64::new(0),
            segmentation_skips: AtomicU64::new(0),
            registry: RwLock::new(registry),
            drag: Mutex::new(drag),
            surface: Mutex::new(surface),
            output: Mutex::new(output),
        }
    }
}

/// Handle to a running canvas session.
///
/// The `CanvasSession` is returned by [`StreamCanvasBuilder::start()`]. The
/// render loop runs in a background task until `stop()` is called or the
/// session is dropped. Every other operation runs synchronously on the
/// caller's thread, typically from a UI or signalling event handler.
///
/// # Lifecycle
///
/// 1. Created by [`StreamCanvasBuilder::start()`]
/// 2. Feed sources with [`reconcile()`](Self::reconcile) and
///    [`set_local_source()`](Self::set_local_source)
/// 3. Forward pointer input and resizes as they happen
/// 4. Call [`stop()`](Self::stop) for graceful shutdown
///
/// # Example
///
/// ```no_run
/// # async fn demo() -> Result<(), stream_canvas::StreamCanvasError> {
/// use stream_canvas::{source::MockCamera, LayoutMode, StreamCanvas};
///
/// let session = StreamCanvas::builder()
///     .surface_size(1280, 720)
///     .layout(LayoutMode::Grid)
///     .start()?;
///
/// let mut camera = MockCamera::qvga();
/// camera.push_solid([200, 40, 40, 255]);
/// session.reconcile(vec![camera.observe("alice")]);
///
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
///
/// [`StreamCanvasBuilder::start()`]: crate::StreamCanvasBuilder::start
pub struct CanvasSession {
    state: Arc<SessionState>,
    config: CanvasConfig,
    render_handle: Option<JoinHandle<()>>,
}

impl CanvasSession {
    pub(crate) fn new(
        state: Arc<SessionState>,
        config: CanvasConfig,
        render_handle: JoinHandle<()>,
    ) -> Self {
        Self {
            state,
            config,
            render_handle: Some(render_handle),
        }
    }

    /// Applies an upstream membership snapshot to the source registry.
    pub fn reconcile(&self, observed: impl IntoIterator<Item = ObservedSource>) -> ReconcileSummary {
        self.state.registry.write().reconcile(observed)
    }

    /// Sets or clears the local source.
    pub fn set_local_source(&self, track: Option<TrackHandle>) {
        self.state.registry.write().set_local_source(track);
    }

    /// Identities of tracked sources in insertion order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.state.registry.read().ids()
    }

    /// Feeds a pointer or touch event to the drag controller.
    ///
    /// Only [`LayoutMode::SingleDraggable`] reacts to input; other modes
    /// return [`DragTransition::None`]. Gesture start and end are forwarded
    /// to the output manager so it can debounce recapture.
    pub fn handle_pointer(&self, event: &PointerEvent) -> DragTransition {
        let surface = *self.state.surface.lock();
        if surface.mode != LayoutMode::SingleDraggable {
            return DragTransition::None;
        }

        let transition = {
            let mut drag = self.state.drag.lock();
            apply_pointer(&mut drag, event, (surface.width, surface.height))
        };

        match transition {
            DragTransition::Started => {
                tracing::trace!("drag started");
                self.state.output.lock().notify_drag_started();
            }
            DragTransition::Ended => {
                tracing::trace!("drag ended");
                self.state.output.lock().notify_drag_ended(Instant::now());
            }
            DragTransition::Moved | DragTransition::None => {}
        }
        transition
    }

    /// Current drag state.
    pub fn drag_state(&self) -> DragState {
        self.state.drag.lock().state()
    }

    /// Applies a new surface size.
    ///
    /// The drag region is re-clamped immediately. The render loop picks up
    /// the new geometry on its next tick and recaptures the output. A zero
    /// dimension makes the output unavailable until a real size arrives.
    /// Sizes above [`MAX_SURFACE_DIMENSION`](crate::MAX_SURFACE_DIMENSION) are
    /// ignored and the previous geometry is kept.
    pub fn resize(&self, width: u32, height: u32) {
        if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            tracing::warn!(
                width,
                height,
                max = MAX_SURFACE_DIMENSION,
                "ignoring resize beyond maximum surface size"
            );
            return;
        }
        {
            let mut surface = self.state.surface.lock();
            if (surface.width, surface.height) == (width, height) {
                return;
            }
            surface.width = width;
            surface.height = height;
        }
        self.state.drag.lock().resize(width, height);
        tracing::debug!(width, height, "surface resized");
    }

    /// Switches layout mode and the capture rate that goes with it.
    ///
    /// Leaving the draggable mode ends any gesture in progress.
    pub fn set_layout_mode(&self, mode: LayoutMode) {
        {
            let mut surface = self.state.surface.lock();
            if surface.mode == mode {
                return;
            }
            surface.mode = mode;
        }
        if mode != LayoutMode::SingleDraggable {
            self.state.drag.lock().release();
        }
        self.state
            .output
            .lock()
            .set_rate(self.config.capture_rate(mode));
        tracing::debug!(?mode, "layout mode changed");
    }

    /// Current surface geometry and layout mode.
    pub fn surface_state(&self) -> SurfaceState {
        *self.state.surface.lock()
    }

    /// Returns `true` if the session is still running.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_rendered: self.state.frames_rendered.load(Ordering::SeqCst),
            draw_failures: self.state.draw_failures.load(Ordering::SeqCst),
            segmentation_skips: self.state.segmentation_skips.load(Ordering::SeqCst),
            captures_created: self.state.output.lock().captures_created(),
            sources: self.state.registry.read().len(),
        }
    }

    /// Gracefully stops the session.
    ///
    /// This will:
    /// 1. Clear the running flag so the render loop never re-arms
    /// 2. Wait for the render loop to finish its current tick
    /// 3. Stop the output capture and report `None` to the stream callback
    /// 4. Detach every source
    ///
    /// # Errors
    ///
    /// Currently always succeeds; the signature leaves room for publishers
    /// that need async teardown.
    pub async fn stop(mut self) -> Result<(), StreamCanvasError> {
        self.stop_internal().await;
        Ok(())
    }

    async fn stop_internal(&mut self) {
        if !self.state.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.render_handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "render loop ended abnormally");
            }
        }

        self.state.output.lock().shutdown();
        self.state.registry.write().clear();
        tracing::info!(
            frames = self.state.frames_rendered.load(Ordering::SeqCst),
            "canvas session stopped"
        );
    }
}

impl Drop for CanvasSession {
    fn drop(&mut self) {
        if self.state.running.swap(false, Ordering::SeqCst) {
            // Dropped without stop(); the loop exits on its next wake and the
            // output manager refuses new captures from here on
            self.state.output.lock().shutdown();
        }
    }
}

impl std::fmt::Debug for CanvasSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSession")
            .field("running", &self.is_running())
            .field("surface", &self.surface_state())
            .finish_non_exhaustive()
    }
}
