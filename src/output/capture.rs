//! Output captures of the composited surface.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use tokio::sync::watch;

use crate::pipeline::Surface;
use crate::VideoFrame;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// One video track of an output capture.
///
/// Clones share the liveness flag: stopping any clone ends the track for
/// every holder.
#[derive(Debug, Clone)]
pub struct CaptureTrack {
    id: u64,
    live: Arc<AtomicBool>,
    frames: watch::Receiver<Option<VideoFrame>>,
}

impl CaptureTrack {
    /// Unique track id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` until the track is stopped.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Most recent frame sampled from the surface.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.frames.borrow().clone()
    }

    /// Waits for the next sampled frame.
    ///
    /// Returns `None` once the track is stopped.
    pub async fn next_frame(&mut self) -> Option<VideoFrame> {
        loop {
            if !self.is_live() {
                return None;
            }
            if self.frames.changed().await.is_err() {
                return None;
            }
            if !self.is_live() {
                return None;
            }
            if let Some(frame) = self.frames.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }

    /// Turns the track into a stream of sampled frames that ends when the
    /// track is stopped.
    pub fn into_stream(self) -> impl Stream<Item = VideoFrame> + Send {
        futures::stream::unfold(self, |mut track| async move {
            let frame = track.next_frame().await?;
            Some((frame, track))
        })
    }

    /// Ends the track. Idempotent.
    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct CaptureInner {
    id: u64,
    rate: u32,
    geometry: (u32, u32),
    tracks: Vec<CaptureTrack>,
}

/// Handle to one capture of the surface, as handed to consumers.
///
/// Cheap to clone. A capture whose tracks are all stopped is dead; the
/// stream manager never hands out a dead capture as current.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    inner: Arc<CaptureInner>,
}

impl CaptureHandle {
    /// Capture id, increasing across the session.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Frames per second the surface is sampled at.
    pub fn rate(&self) -> u32 {
        self.inner.rate
    }

    /// Surface geometry when the capture was created.
    pub fn geometry(&self) -> (u32, u32) {
        self.inner.geometry
    }

    /// All video tracks of this capture.
    pub fn video_tracks(&self) -> &[CaptureTrack] {
        &self.inner.tracks
    }

    /// First video track still live, if any.
    pub fn live_video_track(&self) -> Option<&CaptureTrack> {
        self.inner.tracks.iter().find(|t| t.is_live())
    }

    /// Returns `true` if any track is live.
    pub fn is_live(&self) -> bool {
        self.live_video_track().is_some()
    }
}

impl PartialEq for CaptureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for CaptureHandle {}

/// The producer side of a capture, owned by the stream manager.
#[derive(Debug)]
pub(crate) struct OutputCapture {
    handle: CaptureHandle,
    sender: watch::Sender<Option<VideoFrame>>,
    created_at: Instant,
    last_sample: Option<Instant>,
    frames_sent: u64,
}

impl OutputCapture {
    pub(crate) fn new(id: u64, rate: u32, geometry: (u32, u32), now: Instant) -> Self {
        let (sender, receiver) = watch::channel(None);
        let track = CaptureTrack {
            id: NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed),
            live: Arc::new(AtomicBool::new(true)),
            frames: receiver,
        };
        Self {
            handle: CaptureHandle {
                inner: Arc::new(CaptureInner {
                    id,
                    rate,
                    geometry,
                    tracks: vec![track],
                }),
            },
            sender,
            created_at: now,
            last_sample: None,
            frames_sent: 0,
        }
    }

    pub(crate) fn handle(&self) -> &CaptureHandle {
        &self.handle
    }

    pub(crate) fn id(&self) -> u64 {
        self.handle.id()
    }

    pub(crate) fn rate(&self) -> u32 {
        self.handle.rate()
    }

    pub(crate) fn geometry(&self) -> (u32, u32) {
        self.handle.geometry()
    }

    pub(crate) fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Samples the surface if at least one frame period has passed.
    ///
    /// Returns `true` if a frame was sent.
    pub(crate) fn offer(&mut self, surface: &Surface, now: Instant) -> bool {
        if !self.handle.is_live() {
            return false;
        }
        let period = Duration::from_secs(1) / self.rate().max(1);
        if self
            .last_sample
            .is_some_and(|last| now.saturating_duration_since(last) < period)
        {
            return false;
        }
        if (surface.width(), surface.height()) != self.geometry() {
            return false;
        }
        self.last_sample = Some(now);
        let frame = surface.snapshot(now.saturating_duration_since(self.created_at));
        self.sender.send_replace(Some(frame));
        self.frames_sent += 1;
        true
    }

    /// Stops every track of this capture.
    pub(crate) fn stop(&self) {
        for track in self.handle.video_tracks() {
            track.stop();
        }
        // Wake consumers parked in next_frame so they observe the stop
        self.sender.send_replace(None);
    }
}
