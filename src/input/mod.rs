//! Pointer and touch input: coordinate mapping and the drag controller.
//!
//! Mouse and touch events are handled identically once mapped into surface
//! space.

mod drag;
mod mapper;

pub use drag::{DragController, DragState};
pub use mapper::map_to_surface;

use crate::geometry::{Point, ScreenRect};

/// Stage of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// Button pressed or finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released or finger lifted.
    Up,
    /// The platform aborted the gesture (touch cancel, pointer leaving).
    Cancel,
}

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerDevice {
    /// Mouse or pen.
    #[default]
    Mouse,
    /// Touch screen.
    Touch,
}

/// A raw pointer event in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Gesture stage.
    pub phase: PointerPhase,
    /// Producing device.
    pub device: PointerDevice,
    /// Position in display space.
    pub client: Point,
    /// The surface's on-screen bounding rectangle when the event fired.
    pub bounds: ScreenRect,
}

impl PointerEvent {
    /// Creates a mouse event.
    pub fn mouse(phase: PointerPhase, client: Point, bounds: ScreenRect) -> Self {
        Self {
            phase,
            device: PointerDevice::Mouse,
            client,
            bounds,
        }
    }

    /// Creates a touch event.
    pub fn touch(phase: PointerPhase, client: Point, bounds: ScreenRect) -> Self {
        Self {
            phase,
            device: PointerDevice::Touch,
            client,
            bounds,
        }
    }
}

/// What a pointer event did to the drag controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTransition {
    /// Nothing changed.
    None,
    /// A gesture started.
    Started,
    /// The region moved.
    Moved,
    /// A gesture ended.
    Ended,
}

/// Feeds one pointer event through the mapper into the drag controller.
///
/// Events that cannot be mapped (surface not laid out) are ignored, except
/// `Up` and `Cancel`, which always end a gesture in progress.
pub fn apply_pointer(
    drag: &mut DragController,
    event: &PointerEvent,
    surface: (u32, u32),
) -> DragTransition {
    match event.phase {
        PointerPhase::Up | PointerPhase::Cancel => {
            if drag.release() {
                DragTransition::Ended
            } else {
                DragTransition::None
            }
        }
        PointerPhase::Down => match map_to_surface(event.client, event.bounds, surface) {
            Some(point) if drag.press(point) => DragTransition::Started,
            _ => DragTransition::None,
        },
        PointerPhase::Move => match map_to_surface(event.client, event.bounds, surface) {
            Some(point) if drag.move_to(point) => DragTransition::Moved,
            _ => DragTransition::None,
        },
    }
}
