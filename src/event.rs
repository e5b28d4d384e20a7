//! Runtime events for monitoring a canvas session.
//!
//! Events are non-fatal notifications. The render loop continues after any
//! event is emitted - they're for logging/metrics, not error handling.

use std::sync::Arc;

use crate::source::SourceId;

/// Why an output capture was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecaptureReason {
    /// No capture existed yet.
    Initial,
    /// The surface's drawable geometry changed.
    GeometryChanged,
    /// The capture rate changed with the layout mode.
    RateChanged,
    /// A drag gesture ended and the debounce elapsed.
    DragEnded,
    /// The surface lost its geometry or the session stopped.
    Unavailable,
}

/// Runtime events emitted by a canvas session.
///
/// # Example
///
/// ```
/// use stream_canvas::CanvasEvent;
///
/// fn handle_event(event: CanvasEvent) {
///     match event {
///         CanvasEvent::SourceAttached { source_id, is_local } => {
///             eprintln!("attached {source_id} (local: {is_local})");
///         }
///         CanvasEvent::SourceDetached { source_id } => {
///             eprintln!("detached {source_id}");
///         }
///         CanvasEvent::DrawFailed { source_id, error } => {
///             eprintln!("draw of {source_id} failed: {error}");
///         }
///         CanvasEvent::SegmentationSkipped { source_id, elapsed_ms } => {
///             eprintln!("segmentation for {source_id} over budget ({elapsed_ms}ms)");
///         }
///         CanvasEvent::CaptureReplaced { previous, current, reason } => {
///             eprintln!("capture {previous:?} -> {current:?} ({reason:?})");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum CanvasEvent {
    /// A decode sink was allocated and a track attached to it.
    SourceAttached {
        /// Identity of the source.
        source_id: SourceId,
        /// Whether this is the local source.
        is_local: bool,
    },

    /// A decode sink was detached and its source removed.
    SourceDetached {
        /// Identity of the source.
        source_id: SourceId,
    },

    /// Drawing one source failed this tick. The source is skipped.
    DrawFailed {
        /// Source that failed to draw.
        source_id: SourceId,
        /// Description of the failure.
        error: String,
    },

    /// The segmentation pass ran past its frame budget; the frame was dropped.
    SegmentationSkipped {
        /// Source whose frame was dropped.
        source_id: SourceId,
        /// Time spent before giving up.
        elapsed_ms: u64,
    },

    /// The output capture was superseded.
    CaptureReplaced {
        /// Identifier of the previous capture, if any.
        previous: Option<u64>,
        /// Identifier of the new capture, `None` when no capture is available.
        current: Option<u64>,
        /// What triggered the replacement.
        reason: RecaptureReason,
    },
}

/// Callback type for receiving runtime events.
///
/// Register one via [`StreamCanvasBuilder::on_event()`].
///
/// [`StreamCanvasBuilder::on_event()`]: crate::StreamCanvasBuilder::on_event
pub type EventCallback = Arc<dyn Fn(CanvasEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use stream_canvas::{event_callback, CanvasEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(CanvasEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Sends an event to an optional callback.
pub(crate) fn emit(callback: Option<&EventCallback>, event: CanvasEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_event_debug() {
        let event = CanvasEvent::SegmentationSkipped {
            source_id: SourceId::new("cam"),
            elapsed_ms: 40,
        };
        let debug = format!("{event:?}");
        assert!(debug.contains("SegmentationSkipped"));
        assert!(debug.contains("40"));
    }

    #[test]
    fn test_canvas_event_clone() {
        let event = CanvasEvent::DrawFailed {
            source_id: SourceId::new("alice"),
            error: "source not ready".to_string(),
        };
        if let CanvasEvent::DrawFailed { source_id, error } = event.clone() {
            assert_eq!(source_id.as_str(), "alice");
            assert_eq!(error, "source not ready");
        } else {
            panic!("Expected DrawFailed variant");
        }
    }

    #[test]
    fn test_event_callback_helper() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let callback = event_callback(move |_| {
            called_clone.store(true, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            CanvasEvent::SourceDetached {
                source_id: SourceId::new("bob"),
            },
        );
        assert!(called.load(Ordering::SeqCst));
    }
}
