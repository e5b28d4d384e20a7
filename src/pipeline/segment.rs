//! Per-pixel background segmentation.

use std::time::Instant;

use crate::config::SegmentationThresholds;
use crate::frame::BYTES_PER_PIXEL;
use crate::VideoFrame;

/// Classifies pixels as background and makes them transparent.
///
/// A pixel is background when any of these hold:
///
/// - green exceeds both red and blue by more than `green_margin` (chroma key)
/// - the channel sum is below `dark_threshold`
/// - the channel sum is above `bright_threshold` and every pairwise channel
///   difference is below `white_tolerance` (near white)
///
/// Only the alpha channel is touched; color values pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    thresholds: SegmentationThresholds,
}

impl Segmenter {
    /// Creates a segmenter with the given thresholds.
    pub fn new(thresholds: SegmentationThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns `true` if the color counts as background.
    pub fn is_background(&self, r: u8, g: u8, b: u8) -> bool {
        let t = &self.thresholds;
        let (r16, g16, b16) = (u16::from(r), u16::from(g), u16::from(b));

        let margin = u16::from(t.green_margin);
        if g16 > r16 + margin && g16 > b16 + margin {
            return true;
        }

        let sum = r16 + g16 + b16;
        if sum < t.dark_threshold {
            return true;
        }

        let tol = t.white_tolerance;
        sum > t.bright_threshold
            && r.abs_diff(g) < tol
            && g.abs_diff(b) < tol
            && r.abs_diff(b) < tol
    }

    /// Returns a copy of `frame` with background pixels' alpha set to zero.
    ///
    /// Returns `None` if `deadline` passes mid-frame; the caller should skip
    /// drawing this frame rather than show a partially segmented one. The
    /// deadline is checked once per row.
    pub fn segment(&self, frame: &VideoFrame, deadline: Option<Instant>) -> Option<VideoFrame> {
        let mut data = frame.data.as_ref().clone();
        let row_len = frame.width as usize * BYTES_PER_PIXEL;
        if row_len == 0 {
            return Some(frame.clone());
        }

        for row in data.chunks_mut(row_len) {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return None;
            }
            for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
                if self.is_background(px[0], px[1], px[2]) {
                    px[3] = 0;
                }
            }
        }

        Some(VideoFrame::new(data, frame.width, frame.height, frame.timestamp))
    }
}
