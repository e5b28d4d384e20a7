//! Display-space to surface-space coordinate mapping.

use crate::geometry::{Point, ScreenRect};

/// Maps a pointer position in display space to surface pixel space.
///
/// The surface is shown inside `bounds` on screen, possibly scaled; the
/// offset from the rectangle's top-left corner is multiplied by the ratio
/// between the surface's pixel size and its displayed size.
///
/// Returns `None` when the displayed rectangle has no area (the surface is
/// not laid out yet) or the input is not finite.
///
/// # Example
///
/// ```
/// use stream_canvas::input::map_to_surface;
/// use stream_canvas::{Point, ScreenRect};
///
/// // 800x600 surface displayed at 400x300, offset by (10, 20)
/// let bounds = ScreenRect::new(10.0, 20.0, 400.0, 300.0);
/// let p = map_to_surface(Point::new(110.0, 70.0), bounds, (800, 600)).unwrap();
/// assert_eq!(p, Point::new(200.0, 100.0));
/// ```
pub fn map_to_surface(client: Point, bounds: ScreenRect, surface: (u32, u32)) -> Option<Point> {
    if !(bounds.width > 0.0 && bounds.height > 0.0) {
        return None;
    }
    if !(client.x.is_finite() && client.y.is_finite()) {
        return None;
    }

    let scale_x = f64::from(surface.0) / bounds.width;
    let scale_y = f64::from(surface.1) / bounds.height;

    Some(Point::new(
        (client.x - bounds.left) * scale_x,
        (client.y - bounds.top) * scale_y,
    ))
}
