//! Drag interaction over one movable region.

use crate::geometry::{Point, Rect};

/// Snapshot of the drag state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    /// `true` between a hit-confirmed press and its release.
    pub is_dragging: bool,
    /// Region left edge.
    pub x: f64,
    /// Region top edge.
    pub y: f64,
    /// Press point relative to the region origin, horizontally.
    pub offset_x: f64,
    /// Press point relative to the region origin, vertically.
    pub offset_y: f64,
}

/// State machine for dragging one region of fixed size across the surface.
///
/// The region's position always stays inside the surface:
/// `x ∈ [0, surface_width - region_width]` and
/// `y ∈ [0, surface_height - region_height]`. When the region is larger than
/// the surface on an axis, that axis is pinned to `0`.
///
/// # Example
///
/// ```
/// use stream_canvas::input::DragController;
/// use stream_canvas::Point;
///
/// let mut drag = DragController::new(800, 600, 250.0, 250.0);
/// assert_eq!(drag.position(), Point::new(275.0, 175.0));
///
/// assert!(drag.press(Point::new(300.0, 200.0)));
/// drag.move_to(Point::new(900.0, 900.0));
/// assert_eq!(drag.position(), Point::new(550.0, 350.0));
///
/// assert!(drag.release());
/// assert_eq!(drag.position(), Point::new(550.0, 350.0));
/// ```
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    region_width: f64,
    region_height: f64,
    surface_width: f64,
    surface_height: f64,
}

impl DragController {
    /// Creates a controller with the region centered on the surface.
    pub fn new(surface_width: u32, surface_height: u32, region_width: f64, region_height: f64) -> Self {
        let surface_width = f64::from(surface_width);
        let surface_height = f64::from(surface_height);
        let mut controller = Self {
            state: DragState::default(),
            region_width,
            region_height,
            surface_width,
            surface_height,
        };
        let (x, y) = controller.constrain(
            (surface_width - region_width) / 2.0,
            (surface_height - region_height) / 2.0,
        );
        controller.state.x = x;
        controller.state.y = y;
        controller
    }

    /// Current state snapshot.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Current region origin.
    pub fn position(&self) -> Point {
        Point::new(self.state.x, self.state.y)
    }

    /// Current region bounding box.
    pub fn region(&self) -> Rect {
        Rect::new(
            self.state.x,
            self.state.y,
            self.region_width,
            self.region_height,
        )
    }

    /// Returns `true` while a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging
    }

    /// Starts a drag if `point` hits the region.
    ///
    /// Returns `true` if a gesture started. A press outside the region, or a
    /// second press during a gesture, changes nothing.
    pub fn press(&mut self, point: Point) -> bool {
        if self.state.is_dragging || !self.region().contains(point) {
            return false;
        }
        self.state.is_dragging = true;
        self.state.offset_x = point.x - self.state.x;
        self.state.offset_y = point.y - self.state.y;
        true
    }

    /// Moves the region so the press point follows `point`.
    ///
    /// Returns `true` if a gesture is in progress. Ignored while idle.
    pub fn move_to(&mut self, point: Point) -> bool {
        if !self.state.is_dragging {
            return false;
        }
        let (x, y) = self.constrain(point.x - self.state.offset_x, point.y - self.state.offset_y);
        self.state.x = x;
        self.state.y = y;
        true
    }

    /// Ends the gesture, keeping the position.
    ///
    /// Returns `true` if a gesture actually ended.
    pub fn release(&mut self) -> bool {
        if !self.state.is_dragging {
            return false;
        }
        self.state.is_dragging = false;
        self.state.offset_x = 0.0;
        self.state.offset_y = 0.0;
        true
    }

    /// Applies a new surface size and re-clamps the position immediately.
    pub fn resize(&mut self, surface_width: u32, surface_height: u32) {
        self.surface_width = f64::from(surface_width);
        self.surface_height = f64::from(surface_height);
        let (x, y) = self.constrain(self.state.x, self.state.y);
        self.state.x = x;
        self.state.y = y;
    }

    fn constrain(&self, x: f64, y: f64) -> (f64, f64) {
        let max_x = (self.surface_width - self.region_width).max(0.0);
        let max_y = (self.surface_height - self.region_height).max(0.0);
        (clamp_axis(x, max_x), clamp_axis(y, max_y))
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_in_bounds(drag: &DragController) {
        let state = drag.state();
        let max_x = (drag.surface_width - drag.region_width).max(0.0);
        let max_y = (drag.surface_height - drag.region_height).max(0.0);
        assert!(
            (0.0..=max_x).contains(&state.x),
            "x={} outside [0, {max_x}]",
            state.x
        );
        assert!(
            (0.0..=max_y).contains(&state.y),
            "y={} outside [0, {max_y}]",
            state.y
        );
    }

    #[test]
    fn test_initial_position_centered() {
        let drag = DragController::new(800, 600, 250.0, 250.0);
        assert_eq!(drag.position(), Point::new(275.0, 175.0));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_drag_scenario() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);

        assert!(drag.press(Point::new(300.0, 200.0)));
        let state = drag.state();
        assert!(state.is_dragging);
        assert_eq!((state.offset_x, state.offset_y), (25.0, 25.0));

        assert!(drag.move_to(Point::new(900.0, 900.0)));
        assert_eq!(drag.position(), Point::new(550.0, 350.0));

        assert!(drag.release());
        let state = drag.state();
        assert!(!state.is_dragging);
        assert_eq!((state.offset_x, state.offset_y), (0.0, 0.0));
        assert_eq!(drag.position(), Point::new(550.0, 350.0));
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        drag.press(Point::new(400.0, 300.0));
        drag.move_to(Point::new(410.0, 290.0));
        assert_eq!(drag.position(), Point::new(285.0, 165.0));
    }

    #[test]
    fn test_press_outside_is_noop() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        let before = drag.state();

        assert!(!drag.press(Point::new(10.0, 10.0)));
        assert_eq!(drag.state(), before);

        // Moves and releases while idle change nothing either
        assert!(!drag.move_to(Point::new(500.0, 500.0)));
        assert!(!drag.release());
        assert_eq!(drag.state(), before);
    }

    #[test]
    fn test_press_on_edge_hits() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        assert!(drag.press(Point::new(525.0, 425.0)));
    }

    #[test]
    fn test_second_press_ignored_while_dragging() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        drag.press(Point::new(300.0, 200.0));
        assert!(!drag.press(Point::new(400.0, 300.0)));
        assert_eq!(drag.state().offset_x, 25.0);
    }

    #[test]
    fn test_move_clamps_negative() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        drag.press(Point::new(300.0, 200.0));
        drag.move_to(Point::new(-500.0, -500.0));
        assert_eq!(drag.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_resize_reclamps_while_idle() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        drag.press(Point::new(300.0, 200.0));
        drag.move_to(Point::new(900.0, 900.0));
        drag.release();

        drag.resize(400, 300);
        assert_eq!(drag.position(), Point::new(150.0, 50.0));
        assert_in_bounds(&drag);
    }

    #[test]
    fn test_region_larger_than_surface_pins_to_origin() {
        let mut drag = DragController::new(200, 100, 250.0, 250.0);
        assert_eq!(drag.position(), Point::new(0.0, 0.0));

        drag.press(Point::new(10.0, 10.0));
        drag.move_to(Point::new(150.0, 80.0));
        assert_eq!(drag.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_nan_move_clamps_to_origin() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        drag.press(Point::new(300.0, 200.0));
        drag.move_to(Point::new(f64::NAN, 100.0));
        assert_in_bounds(&drag);
    }

    #[test]
    fn test_random_event_sequences_stay_in_bounds() {
        let mut drag = DragController::new(800, 600, 250.0, 250.0);
        let mut seed: u32 = 99;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            seed >> 16
        };

        for _ in 0..2000 {
            let kind = next() % 4;
            let x = f64::from(next() % 1400) - 300.0;
            let y = f64::from(next() % 1200) - 300.0;
            match kind {
                0 => {
                    drag.press(Point::new(x, y));
                }
                1 => {
                    drag.move_to(Point::new(x, y));
                }
                2 => {
                    drag.release();
                }
                _ => {
                    let w = 100 + next() % 1000;
                    let h = 100 + next() % 800;
                    drag.resize(w, h);
                }
            }
            assert_in_bounds(&drag);
        }
    }
}
