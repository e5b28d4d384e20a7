//! Video frame with metadata.

use std::sync::Arc;
use std::time::Duration;

use crate::DrawError;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded RGBA8 video frame.
///
/// `VideoFrame` is the unit of pixel data passed from tracks to the
/// compositor and from the surface to output captures. Pixels are stored
/// row-major, four bytes per pixel, in an `Arc<Vec<u8>>` so a frame can be
/// held by a decode sink and a capture at once without copying.
///
/// # Example
///
/// ```
/// use stream_canvas::VideoFrame;
/// use std::time::Duration;
///
/// let frame = VideoFrame::filled(4, 2, [255, 0, 0, 255], Duration::ZERO);
/// assert_eq!(frame.pixel(3, 1), Some([255, 0, 0, 255]));
///
/// let frame2 = frame.clone(); // Cheap clone - shares pixel data
/// ```
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGBA8 pixel data, row-major.
    pub data: Arc<Vec<u8>>,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Presentation time relative to the start of the producing track.
    pub timestamp: Duration,
}

impl VideoFrame {
    /// Creates a frame from raw RGBA8 bytes.
    ///
    /// The buffer is not validated here; use [`validate()`](Self::validate)
    /// before reading pixels from untrusted producers.
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp: Duration) -> Self {
        Self {
            data: Arc::new(data),
            width,
            height,
            timestamp,
        }
    }

    /// Creates a frame with every pixel set to `rgba`.
    ///
    /// Dimensions whose byte size does not fit in `usize` yield an empty
    /// buffer, which [`validate()`](Self::validate) rejects.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], timestamp: Duration) -> Self {
        let data = match byte_len(width, height) {
            Some(len) => rgba.repeat(len / BYTES_PER_PIXEL),
            None => Vec::new(),
        };
        Self::new(data, width, height, timestamp)
    }

    /// Number of bytes the declared dimensions require, `None` on overflow.
    pub fn expected_len(&self) -> Option<usize> {
        byte_len(self.width, self.height)
    }

    /// Checks that the buffer matches the declared dimensions.
    pub fn validate(&self) -> Result<(), DrawError> {
        let expected = self.expected_len();
        if expected == Some(self.data.len()) {
            Ok(())
        } else {
            Err(DrawError::MalformedFrame {
                width: self.width,
                height: self.height,
                expected: expected.unwrap_or(usize::MAX),
                actual: self.data.len(),
            })
        }
    }

    /// Returns the RGBA value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?
            .checked_mul(BYTES_PER_PIXEL)?;
        let px = self.data.get(idx..idx.checked_add(BYTES_PER_PIXEL)?)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Returns `true` if the frame has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Bytes needed for an RGBA8 buffer of `width` x `height`.
pub(crate) fn byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}
