//! Lifecycle of the outgoing capture.

use std::time::{Duration, Instant};

use crate::event::{emit, EventCallback, RecaptureReason};
use crate::output::capture::OutputCapture;
use crate::output::{CaptureHandle, StreamChangedCallback};
use crate::pipeline::Surface;
use crate::CanvasEvent;

/// Owns the current capture of the surface and decides when to replace it.
///
/// A capture is (re)created when:
///
/// - none exists and the surface has geometry
/// - the surface geometry changed
/// - the capture rate changed
/// - a drag gesture ended and `debounce` passed without a new gesture
///
/// Replacement creates the new capture, stops every track of the previous
/// one, and only then announces the new capture. Consumers never receive a
/// capture whose tracks are already stopped, and at most one capture is live
/// at any time.
///
/// Callbacks run while the session holds this manager's lock; they must not
/// call back into the session synchronously.
pub struct OutputStreamManager {
    current: Option<OutputCapture>,
    rate: u32,
    debounce: Duration,
    drag_ended_at: Option<Instant>,
    /// Whether `None` was the last thing announced.
    announced_none: bool,
    closed: bool,
    next_id: u64,
    captures_created: u64,
    on_stream_changed: Option<StreamChangedCallback>,
    event_callback: Option<EventCallback>,
}

impl OutputStreamManager {
    /// Creates a manager with no capture.
    pub fn new(rate: u32, debounce: Duration) -> Self {
        Self {
            current: None,
            rate,
            debounce,
            drag_ended_at: None,
            announced_none: false,
            closed: false,
            next_id: 1,
            captures_created: 0,
            on_stream_changed: None,
            event_callback: None,
        }
    }

    /// Sets the callback receiving each new capture, or `None`.
    #[must_use]
    pub fn with_stream_callback(mut self, callback: StreamChangedCallback) -> Self {
        self.on_stream_changed = Some(callback);
        self
    }

    /// Sets the callback receiving [`CanvasEvent::CaptureReplaced`].
    #[must_use]
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Current capture handle, if one is live.
    pub fn current(&self) -> Option<CaptureHandle> {
        self.current.as_ref().map(|c| c.handle().clone())
    }

    /// Capture rate new captures are created with.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Number of captures created so far.
    pub fn captures_created(&self) -> u64 {
        self.captures_created
    }

    /// Returns `true` while a post-drag recapture is waiting on the debounce.
    pub fn recapture_pending(&self) -> bool {
        self.drag_ended_at.is_some()
    }

    /// Changes the capture rate. Takes effect on the next `ensure_capture`.
    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate.max(1);
    }

    /// A drag gesture started; any pending post-drag recapture is cancelled.
    pub fn notify_drag_started(&mut self) {
        if self.drag_ended_at.take().is_some() {
            tracing::trace!("pending recapture cancelled by new drag");
        }
    }

    /// A drag gesture ended; schedules a recapture after the debounce.
    pub fn notify_drag_ended(&mut self, now: Instant) {
        self.drag_ended_at = Some(now);
    }

    /// Brings the capture in line with the surface.
    ///
    /// `geometry` is `None` while the surface has no drawable size, in which
    /// case any capture is stopped and `None` announced once.
    pub fn ensure_capture(
        &mut self,
        geometry: Option<(u32, u32)>,
        now: Instant,
    ) -> Option<CaptureHandle> {
        if self.closed {
            return None;
        }

        let Some(geometry) = geometry.filter(|(w, h)| *w > 0 && *h > 0) else {
            self.drag_ended_at = None;
            let previous = self.current.take();
            if let Some(prev) = &previous {
                prev.stop();
            }
            if previous.is_some() || !self.announced_none {
                tracing::warn!("surface has no geometry, output capture unavailable");
                self.announce(None, previous.map(|p| p.id()), RecaptureReason::Unavailable);
            }
            return None;
        };

        let reason = match &self.current {
            None => Some(RecaptureReason::Initial),
            Some(c) if c.geometry() != geometry => Some(RecaptureReason::GeometryChanged),
            Some(c) if c.rate() != self.rate => Some(RecaptureReason::RateChanged),
            Some(_) if self.debounce_elapsed(now) => Some(RecaptureReason::DragEnded),
            Some(_) => None,
        };

        match reason {
            Some(reason) => Some(self.replace(geometry, reason, now)),
            None => self.current(),
        }
    }

    /// Samples the surface into the current capture, rate-limited.
    pub fn offer_frame(&mut self, surface: &Surface, now: Instant) -> bool {
        match self.current.as_mut() {
            Some(capture) => capture.offer(surface, now),
            None => false,
        }
    }

    /// Stops the current capture and refuses to create new ones.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.drag_ended_at = None;
        if let Some(prev) = self.current.take() {
            prev.stop();
            tracing::debug!(
                capture = prev.id(),
                frames = prev.frames_sent(),
                "output capture stopped"
            );
            self.announce(None, Some(prev.id()), RecaptureReason::Unavailable);
        }
    }

    fn debounce_elapsed(&self, now: Instant) -> bool {
        self.drag_ended_at
            .is_some_and(|ended| now.saturating_duration_since(ended) >= self.debounce)
    }

    fn replace(
        &mut self,
        geometry: (u32, u32),
        reason: RecaptureReason,
        now: Instant,
    ) -> CaptureHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.drag_ended_at = None;

        let next = OutputCapture::new(id, self.rate, geometry, now);
        let handle = next.handle().clone();
        let previous = self.current.replace(next);
        if let Some(prev) = &previous {
            prev.stop();
        }
        self.captures_created += 1;

        tracing::info!(
            capture = id,
            previous = ?previous.as_ref().map(OutputCapture::id),
            width = geometry.0,
            height = geometry.1,
            rate = self.rate,
            ?reason,
            "output capture created"
        );

        self.announce(Some(handle.clone()), previous.map(|p| p.id()), reason);
        handle
    }

    fn announce(&mut self, current: Option<CaptureHandle>, previous: Option<u64>, reason: RecaptureReason) {
        self.announced_none = current.is_none();
        let current_id = current.as_ref().map(CaptureHandle::id);
        if let Some(callback) = &self.on_stream_changed {
            callback(current);
        }
        emit(
            self.event_callback.as_ref(),
            CanvasEvent::CaptureReplaced {
                previous,
                current: current_id,
                reason,
            },
        );
    }
}

impl std::fmt::Debug for OutputStreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStreamManager")
            .field("current", &self.current.as_ref().map(OutputCapture::id))
            .field("rate", &self.rate)
            .field("debounce", &self.debounce)
            .field("drag_ended_at", &self.drag_ended_at)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
