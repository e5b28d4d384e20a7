//! Mock camera for testing without capture hardware.

use std::time::Duration;

use crate::source::{video_track, ObservedSource, SourceId, TrackHandle, TrackWriter};
use crate::VideoFrame;

/// A mock camera that generates synthetic RGBA frames.
///
/// This allows exercising the full compositor without real video sources,
/// making it suitable for CI environments.
///
/// # Example
///
/// ```
/// use stream_canvas::source::MockCamera;
///
/// let mut camera = MockCamera::new(64, 48);
/// let handle = camera.handle();
///
/// camera.push_solid([0, 0, 255, 255]);
/// assert!(handle.latest_frame().is_some());
/// ```
#[derive(Debug)]
pub struct MockCamera {
    width: u32,
    height: u32,
    writer: TrackWriter,
    handle: TrackHandle,
    frames_pushed: u64,
}

impl MockCamera {
    /// Creates a mock camera producing `width` x `height` frames.
    pub fn new(width: u32, height: u32) -> Self {
        let (writer, handle) = video_track();
        Self {
            width,
            height,
            writer,
            handle,
            frames_pushed: 0,
        }
    }

    /// Creates a 320x240 mock camera.
    pub fn qvga() -> Self {
        Self::new(320, 240)
    }

    /// A handle to the camera's track, for feeding a registry.
    pub fn handle(&self) -> TrackHandle {
        self.handle.clone()
    }

    /// A membership entry for this camera, labelled with its identity.
    pub fn observe(&self, identity: impl Into<SourceId>) -> ObservedSource {
        let identity = identity.into();
        let label = identity.to_string();
        ObservedSource::new(identity, label, self.handle())
    }

    /// Frame width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames pushed so far.
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }

    /// Announces dimensions without producing a frame.
    pub fn announce(&self) {
        self.writer.set_metadata(self.width, self.height);
    }

    /// Pushes a frame filled with one color.
    pub fn push_solid(&mut self, rgba: [u8; 4]) {
        let frame = VideoFrame::filled(self.width, self.height, rgba, self.timestamp());
        self.push(frame);
    }

    /// Pushes a frame with a centered foreground box over a green backdrop.
    ///
    /// The box covers the middle half of the frame in each dimension.
    pub fn push_green_screen(&mut self, foreground: [u8; 4]) {
        let (w, h) = (self.width, self.height);
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            for x in 0..w {
                let inside = x >= w / 4 && x < w - w / 4 && y >= h / 4 && y < h - h / 4;
                if inside {
                    data.extend_from_slice(&foreground);
                } else {
                    data.extend_from_slice(&[0, 255, 0, 255]);
                }
            }
        }
        let frame = VideoFrame::new(data, w, h, self.timestamp());
        self.push(frame);
    }

    /// Pushes a frame whose left half is `left` and right half is `right`.
    pub fn push_split(&mut self, left: [u8; 4], right: [u8; 4]) {
        let (w, h) = (self.width, self.height);
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for _ in 0..h {
            for x in 0..w {
                data.extend_from_slice(if x < w / 2 { &left } else { &right });
            }
        }
        let frame = VideoFrame::new(data, w, h, self.timestamp());
        self.push(frame);
    }

    /// Pushes a frame whose buffer is too short for its dimensions.
    pub fn push_malformed(&mut self) {
        let frame = VideoFrame::new(vec![0; 3], self.width, self.height, self.timestamp());
        self.push(frame);
    }

    /// Pushes an arbitrary frame.
    pub fn push(&mut self, frame: VideoFrame) {
        self.writer.push_frame(frame);
        self.frames_pushed += 1;
    }

    fn timestamp(&self) -> Duration {
        // 30fps cadence so timestamps are deterministic in tests
        Duration::from_millis(self.frames_pushed * 33)
    }
}
