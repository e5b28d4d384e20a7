//! Configuration types for canvas sessions.

use std::time::Duration;

use crate::geometry::Rect;

/// How sources are laid out on the surface.
///
/// Each mode also fixes the rate at which the surface is captured for the
/// outgoing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// Every source gets a cell in a `ceil(sqrt(N))` square grid.
    #[default]
    Grid,

    /// One source drawn at a fixed region.
    SingleFixed,

    /// One source drawn at a region the user can drag around.
    SingleDraggable,
}

impl LayoutMode {
    /// Returns the capture rate in frames per second for this mode.
    #[must_use]
    pub fn capture_rate(&self) -> u32 {
        match self {
            Self::Grid | Self::SingleFixed => 30,
            Self::SingleDraggable => 60,
        }
    }

    /// Returns `true` for the modes that draw exactly one source.
    #[must_use]
    pub fn is_single(&self) -> bool {
        matches!(self, Self::SingleFixed | Self::SingleDraggable)
    }
}

/// Fixed thresholds for the segmentation heuristic.
///
/// Channel sums range over `0..=765`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationThresholds {
    /// Green must exceed both red and blue by more than this to count as
    /// chroma-key background.
    pub green_margin: u8,
    /// Pixels whose channel sum is below this are background.
    pub dark_threshold: u16,
    /// Pixels whose channel sum is above this, with channels close together,
    /// are background.
    pub bright_threshold: u16,
    /// Maximum pairwise channel difference for the near-white test.
    pub white_tolerance: u8,
}

impl Default for SegmentationThresholds {
    fn default() -> Self {
        Self {
            green_margin: 40,
            dark_threshold: 60,
            bright_threshold: 650,
            white_tolerance: 30,
        }
    }
}

/// Configuration for compositor and capture behavior.
///
/// Use [`CanvasConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use stream_canvas::CanvasConfig;
/// use std::time::Duration;
///
/// let config = CanvasConfig {
///     segmentation: true,
///     recapture_debounce: Duration::from_millis(250),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Period of the render loop, standing in for the display refresh.
    ///
    /// Default: 16ms
    pub refresh_interval: Duration,

    /// Delay after a drag gesture ends before the output is recaptured.
    ///
    /// Default: 100ms
    pub recapture_debounce: Duration,

    /// Size of the draggable region in surface pixels.
    ///
    /// Default: 250x250
    pub region_size: (f64, f64),

    /// Region used by [`LayoutMode::SingleFixed`]. `None` fills the surface.
    pub fixed_region: Option<Rect>,

    /// Run the segmentation pass on the drawn frame in single-source modes.
    ///
    /// Default: false
    pub segmentation: bool,

    /// Thresholds for the segmentation pass.
    pub thresholds: SegmentationThresholds,

    /// Overrides the mode's capture rate when set.
    pub capture_rate_override: Option<u32>,

    /// RGBA color the surface is cleared to each tick.
    pub background: [u8; 4],

    /// RGBA color of the box drawn when no source is ready.
    pub placeholder_color: [u8; 4],

    /// Label shown when no source is ready in single-source modes.
    pub placeholder_label: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(16),
            recapture_debounce: Duration::from_millis(100),
            region_size: (250.0, 250.0),
            fixed_region: None,
            segmentation: false,
            thresholds: SegmentationThresholds::default(),
            capture_rate_override: None,
            background: [0, 0, 0, 255],
            placeholder_color: [48, 48, 48, 255],
            placeholder_label: "Waiting for video".to_string(),
        }
    }
}

impl CanvasConfig {
    /// Returns the effective capture rate for the given layout mode.
    #[must_use]
    pub fn capture_rate(&self, mode: LayoutMode) -> u32 {
        self.capture_rate_override
            .unwrap_or_else(|| mode.capture_rate())
    }
}
