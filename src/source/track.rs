//! Live video tracks and the decode sinks they attach to.
//!
//! A track is a latest-value channel: the producer overwrites the current
//! frame and the consumer always reads the newest one. Nothing is queued, so
//! a slow compositor never builds up a backlog of stale frames.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::watch;

use crate::{DrawError, VideoFrame};

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// How far a source has progressed towards producing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Readiness {
    /// Nothing known about the stream yet.
    NoMetadata,
    /// Dimensions are known but no frame has arrived.
    HasMetadata,
    /// At least one frame is available to draw.
    HasFrameData,
}

#[derive(Debug, Clone, Default)]
struct TrackState {
    dimensions: Option<(u32, u32)>,
    frame: Option<VideoFrame>,
}

/// Creates a connected producer/consumer pair for one video track.
///
/// # Example
///
/// ```
/// use stream_canvas::{video_track, VideoFrame, Readiness};
/// use std::time::Duration;
///
/// let (writer, handle) = video_track();
/// assert_eq!(handle.readiness(), Readiness::NoMetadata);
///
/// writer.push_frame(VideoFrame::filled(2, 2, [0, 0, 0, 255], Duration::ZERO));
/// assert_eq!(handle.readiness(), Readiness::HasFrameData);
/// ```
pub fn video_track() -> (TrackWriter, TrackHandle) {
    let (tx, rx) = watch::channel(TrackState::default());
    let id = NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed);
    (
        TrackWriter {
            tx,
            started: Instant::now(),
        },
        TrackHandle { id, rx },
    )
}

/// Producer side of a video track.
#[derive(Debug)]
pub struct TrackWriter {
    tx: watch::Sender<TrackState>,
    started: Instant,
}

impl TrackWriter {
    /// Announces the stream's dimensions before the first frame.
    pub fn set_metadata(&self, width: u32, height: u32) {
        self.tx.send_modify(|state| state.dimensions = Some((width, height)));
    }

    /// Replaces the current frame.
    pub fn push_frame(&self, frame: VideoFrame) {
        self.tx.send_modify(|state| {
            state.dimensions = Some((frame.width, frame.height));
            state.frame = Some(frame);
        });
    }

    /// Time since the track was created, for stamping frames.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Returns `true` once every handle has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a video track: the opaque handle carried by source feeds.
///
/// Clones observe the same track and share its identifier.
#[derive(Debug, Clone)]
pub struct TrackHandle {
    id: u64,
    rx: watch::Receiver<TrackState>,
}

impl TrackHandle {
    /// Process-unique identifier of the underlying track.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current readiness of the track.
    pub fn readiness(&self) -> Readiness {
        let state = self.rx.borrow();
        match (&state.frame, state.dimensions) {
            (Some(_), _) => Readiness::HasFrameData,
            (None, Some(_)) => Readiness::HasMetadata,
            (None, None) => Readiness::NoMetadata,
        }
    }

    /// Announced dimensions, if any.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.rx.borrow().dimensions
    }

    /// The newest frame, if one has arrived.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.rx.borrow().frame.clone()
    }
}

/// Off-surface sink a track is decoded into.
///
/// Owned exclusively by the [`SourceRegistry`](crate::SourceRegistry);
/// `attach` and `detach` are only reachable through it.
#[derive(Debug, Default)]
pub struct DecodeSink {
    track: Option<TrackHandle>,
}

impl DecodeSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attaches a track, returning the one it replaced.
    pub(crate) fn attach(&mut self, track: TrackHandle) -> Option<TrackHandle> {
        self.track.replace(track)
    }

    /// Detaches the current track, returning it.
    pub(crate) fn detach(&mut self) -> Option<TrackHandle> {
        self.track.take()
    }

    /// Returns `true` while a track is attached.
    pub fn is_attached(&self) -> bool {
        self.track.is_some()
    }

    /// Identifier of the attached track.
    pub fn track_id(&self) -> Option<u64> {
        self.track.as_ref().map(TrackHandle::id)
    }

    /// Readiness of the attached track; detached sinks have no metadata.
    pub fn readiness(&self) -> Readiness {
        self.track
            .as_ref()
            .map_or(Readiness::NoMetadata, TrackHandle::readiness)
    }

    /// The frame to draw this tick.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError::Detached`] without a track,
    /// [`DrawError::NotReady`] before the first frame, and
    /// [`DrawError::MalformedFrame`] for a buffer that does not match its
    /// dimensions.
    pub fn current_frame(&self) -> Result<VideoFrame, DrawError> {
        let track = self.track.as_ref().ok_or(DrawError::Detached)?;
        let frame = track.latest_frame().ok_or(DrawError::NotReady)?;
        frame.validate()?;
        Ok(frame)
    }
}
