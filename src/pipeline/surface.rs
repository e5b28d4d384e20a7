//! The shared pixel surface sources are composited onto.

use std::time::Duration;

use crate::config::LayoutMode;
use crate::frame::{byte_len, BYTES_PER_PIXEL};
use crate::geometry::Rect;
use crate::{DrawError, VideoFrame};

/// Geometry and layout of the surface, shared between session and loop.
///
/// Mutated only by resize notifications and layout-mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceState {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Current layout mode.
    pub mode: LayoutMode,
}

impl SurfaceState {
    /// Geometry if the surface is drawable, `None` while either side is zero.
    pub fn geometry(&self) -> Option<(u32, u32)> {
        (self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }
}

/// An RGBA8 pixel buffer with simple drawing primitives.
///
/// Owned by the render loop; outside readers only see snapshots.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
    label: Option<String>,
}

impl Surface {
    /// Creates a transparent surface.
    ///
    /// A size whose byte length does not fit in `usize` yields an empty
    /// 0x0 surface.
    pub fn new(width: u32, height: u32) -> Self {
        let Some(len) = byte_len(width, height) else {
            tracing::warn!(width, height, "surface size overflows, using empty surface");
            return Self::new(0, 0);
        };
        Self {
            width,
            height,
            data: vec![0; len],
            label: None,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocates the buffer if the size changed. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        *self = Self::new(width, height);
    }

    /// Fills the whole surface and drops any label.
    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
        self.label = None;
    }

    /// Fills `rect` (clipped to the surface) with an opaque color.
    pub fn fill_rect(&mut self, rect: Rect, rgba: [u8; 4]) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            let row = y as usize * self.width as usize;
            for x in x0..x1 {
                let idx = (row + x as usize) * BYTES_PER_PIXEL;
                self.data[idx..idx + BYTES_PER_PIXEL].copy_from_slice(&rgba);
            }
        }
    }

    /// Scales `frame` into `rect` and blends it over the current contents.
    ///
    /// Sampling is nearest-neighbour; blending is source-over using the
    /// frame's alpha, so pixels zeroed by segmentation leave the background
    /// visible.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::MalformedFrame`] if the frame's buffer does not
    /// match its dimensions. Nothing is drawn in that case.
    pub fn draw_frame(&mut self, frame: &VideoFrame, rect: Rect) -> Result<(), DrawError> {
        frame.validate()?;
        if frame.is_empty() {
            return Ok(());
        }

        let dest_x = rect.x.round() as i64;
        let dest_y = rect.y.round() as i64;
        let dest_w = (rect.x + rect.width).round() as i64 - dest_x;
        let dest_h = (rect.y + rect.height).round() as i64 - dest_y;
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return Ok(());
        };

        let src_w = i64::from(frame.width);
        let src_h = i64::from(frame.height);

        for y in y0..y1 {
            let sy = ((i64::from(y) - dest_y) * src_h / dest_h).clamp(0, src_h - 1);
            for x in x0..x1 {
                let sx = ((i64::from(x) - dest_x) * src_w / dest_w).clamp(0, src_w - 1);
                let src_idx = (sy as usize * frame.width as usize + sx as usize) * BYTES_PER_PIXEL;
                let dst_idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
                blend_pixel(
                    &mut self.data[dst_idx..dst_idx + BYTES_PER_PIXEL],
                    &frame.data[src_idx..src_idx + BYTES_PER_PIXEL],
                );
            }
        }
        Ok(())
    }

    /// Attaches a text label to the current contents.
    ///
    /// The surface carries no font rasterizer; the label travels with the
    /// surface so the host can render it over the placeholder box.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    /// The label set since the last clear, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copies the current contents into a frame.
    pub fn snapshot(&self, timestamp: Duration) -> VideoFrame {
        VideoFrame::new(self.data.clone(), self.width, self.height, timestamp)
    }

    /// Converts `rect` to a clipped half-open pixel range.
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        if rect.is_empty() || self.width == 0 || self.height == 0 {
            return None;
        }
        // Edges round as absolute positions so adjacent rects share no column
        let left = rect.x.round().max(0.0);
        let top = rect.y.round().max(0.0);
        let right = (rect.x + rect.width).round().min(f64::from(self.width));
        let bottom = (rect.y + rect.height).round().min(f64::from(self.height));
        if right <= left || bottom <= top {
            return None;
        }
        Some((left as u32, top as u32, right as u32, bottom as u32))
    }
}

/// Source-over blend of one RGBA pixel onto another.
fn blend_pixel(dst: &mut [u8], src: &[u8]) {
    let alpha = u32::from(src[3]);
    if alpha == 255 {
        dst.copy_from_slice(src);
        return;
    }
    if alpha == 0 {
        return;
    }
    let inv = 255 - alpha;
    for c in 0..3 {
        dst[c] = ((u32::from(src[c]) * alpha + u32::from(dst[c]) * inv + 127) / 255) as u8;
    }
    dst[3] = (alpha + (u32::from(dst[3]) * inv + 127) / 255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_clear_and_pixel() {
        let mut surface = Surface::new(4, 4);
        surface.clear(BLACK);
        assert_eq!(surface.pixel(3, 3), Some(BLACK));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn test_draw_frame_scales_into_rect() {
        let mut surface = Surface::new(8, 8);
        surface.clear(BLACK);

        let frame = VideoFrame::filled(2, 2, RED, Duration::ZERO);
        surface.draw_frame(&frame, Rect::new(2.0, 2.0, 4.0, 4.0)).unwrap();

        assert_eq!(surface.pixel(1, 1), Some(BLACK));
        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert_eq!(surface.pixel(5, 5), Some(RED));
        assert_eq!(surface.pixel(6, 6), Some(BLACK));
    }

    #[test]
    fn test_draw_frame_nearest_neighbour() {
        let mut surface = Surface::new(4, 1);
        let frame = VideoFrame::new([RED, BLUE].concat(), 2, 1, Duration::ZERO);
        surface.draw_frame(&frame, Rect::new(0.0, 0.0, 4.0, 1.0)).unwrap();

        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(1, 0), Some(RED));
        assert_eq!(surface.pixel(2, 0), Some(BLUE));
        assert_eq!(surface.pixel(3, 0), Some(BLUE));
    }

    #[test]
    fn test_draw_frame_clips_to_surface() {
        let mut surface = Surface::new(4, 4);
        surface.clear(BLACK);
        let frame = VideoFrame::filled(2, 2, RED, Duration::ZERO);
        surface.draw_frame(&frame, Rect::new(-2.0, -2.0, 4.0, 4.0)).unwrap();

        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(2, 2), Some(BLACK));
    }

    #[test]
    fn test_transparent_pixels_keep_background() {
        let mut surface = Surface::new(2, 1);
        surface.clear(BLUE);
        let frame = VideoFrame::new([[255, 0, 0, 0], RED].concat(), 2, 1, Duration::ZERO);
        surface.draw_frame(&frame, Rect::new(0.0, 0.0, 2.0, 1.0)).unwrap();

        assert_eq!(surface.pixel(0, 0), Some(BLUE));
        assert_eq!(surface.pixel(1, 0), Some(RED));
    }

    #[test]
    fn test_half_alpha_blends() {
        let mut surface = Surface::new(1, 1);
        surface.clear(BLACK);
        let frame = VideoFrame::filled(1, 1, [255, 255, 255, 128], Duration::ZERO);
        surface.draw_frame(&frame, Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        let px = surface.pixel(0, 0).unwrap();
        assert_eq!(px[0], 128);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_malformed_frame_rejected_without_drawing() {
        let mut surface = Surface::new(2, 2);
        surface.clear(BLACK);
        let frame = VideoFrame::new(vec![255; 5], 2, 2, Duration::ZERO);

        let result = surface.draw_frame(&frame, Rect::new(0.0, 0.0, 2.0, 2.0));
        assert!(matches!(result, Err(DrawError::MalformedFrame { .. })));
        assert_eq!(surface.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_fill_rect_and_label() {
        let mut surface = Surface::new(4, 4);
        surface.clear(BLACK);
        surface.fill_rect(Rect::new(1.0, 1.0, 2.0, 2.0), BLUE);
        surface.set_label("Waiting");

        assert_eq!(surface.pixel(0, 0), Some(BLACK));
        assert_eq!(surface.pixel(2, 2), Some(BLUE));
        assert_eq!(surface.label(), Some("Waiting"));

        surface.clear(BLACK);
        assert_eq!(surface.label(), None);
    }

    #[test]
    fn test_resize_reallocates() {
        let mut surface = Surface::new(2, 2);
        surface.resize(3, 1);
        assert_eq!((surface.width(), surface.height()), (3, 1));
        let snap = surface.snapshot(Duration::ZERO);
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn test_adjacent_fractional_cells_share_no_column() {
        let mut surface = Surface::new(800, 600);
        surface.clear(BLACK);
        let cells = crate::pipeline::grid_cells(9, 800, 600);
        let red = VideoFrame::filled(2, 2, RED, Duration::ZERO);
        let blue = VideoFrame::filled(2, 2, BLUE, Duration::ZERO);

        // Right-hand cell first, so any shared column would be overdrawn
        surface.draw_frame(&red, cells[2]).unwrap();
        surface.draw_frame(&blue, cells[1]).unwrap();

        assert_eq!(surface.pixel(266, 10), Some(BLACK));
        assert_eq!(surface.pixel(267, 10), Some(BLUE));
        assert_eq!(surface.pixel(532, 10), Some(BLUE));
        assert_eq!(surface.pixel(533, 10), Some(RED));
        assert_eq!(surface.pixel(799, 10), Some(RED));
    }

    #[test]
    fn test_overflowing_size_yields_empty_surface() {
        let surface = Surface::new(u32::MAX, u32::MAX);
        assert_eq!((surface.width(), surface.height()), (0, 0));
        assert_eq!(surface.pixel(0, 0), None);
    }

    #[test]
    fn test_surface_state_geometry() {
        let state = SurfaceState {
            width: 0,
            height: 600,
            mode: LayoutMode::Grid,
        };
        assert_eq!(state.geometry(), None);
        let state = SurfaceState { width: 800, ..state };
        assert_eq!(state.geometry(), Some((800, 600)));
    }
}
