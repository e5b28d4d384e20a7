//! Integration tests for stream-canvas.
//!
//! These drive a real session with its render loop running on the Tokio
//! runtime, feeding it mock cameras instead of network tracks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use stream_canvas::source::MockCamera;
use stream_canvas::{
    publish_capture, stream_channel, CanvasConfig, CanvasEvent, CaptureHandle, CaptureTrack,
    LayoutMode, Point, PointerEvent, PointerPhase, PublishError, Publisher, ScreenRect,
    StreamCanvas, StreamCanvasError,
};
use tokio::sync::watch;

const RED: [u8; 4] = [220, 30, 30, 255];
const BLUE: [u8; 4] = [30, 30, 220, 255];

/// Fast refresh and short debounce so tests finish quickly.
fn fast_config() -> CanvasConfig {
    CanvasConfig {
        refresh_interval: Duration::from_millis(5),
        recapture_debounce: Duration::from_millis(40),
        ..Default::default()
    }
}

/// Waits until the announced capture satisfies `pred`.
async fn wait_for_capture<F>(
    rx: &mut watch::Receiver<Option<CaptureHandle>>,
    pred: F,
) -> Option<CaptureHandle>
where
    F: Fn(&Option<CaptureHandle>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|c| pred(c)))
        .await
        .expect("timed out waiting for capture")
        .expect("stream channel closed")
        .clone()
}

/// Reads frames from `track` until one satisfies `pred`.
async fn wait_for_frame<F>(track: &CaptureTrack, pred: F) -> stream_canvas::VideoFrame
where
    F: Fn(&stream_canvas::VideoFrame) -> bool,
{
    let mut frames = Box::pin(track.clone().into_stream());
    tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = frames.next().await {
            if pred(&frame) {
                return frame;
            }
        }
        panic!("track ended before a matching frame arrived");
    })
    .await
    .expect("timed out waiting for frame")
}

fn mouse(phase: PointerPhase, x: f64, y: f64) -> PointerEvent {
    PointerEvent::mouse(phase, Point::new(x, y), ScreenRect::new(0.0, 0.0, 800.0, 600.0))
}

#[tokio::test]
async fn test_grid_session_streams_composited_frames() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(320, 240)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();

    let mut alice = MockCamera::new(16, 16);
    let mut bob = MockCamera::new(16, 16);
    alice.push_solid(RED);
    bob.push_solid(BLUE);
    let summary = session.reconcile(vec![alice.observe("alice"), bob.observe("bob")]);
    assert_eq!(summary.added.len(), 2);

    let capture = wait_for_capture(&mut streams, Option::is_some).await.unwrap();
    assert_eq!(capture.geometry(), (320, 240));
    assert_eq!(capture.rate(), 30);

    let track = capture.live_video_track().unwrap();
    let frame = wait_for_frame(track, |f| f.pixel(10, 10) == Some(RED)).await;
    assert_eq!(frame.pixel(170, 10), Some(BLUE));
    // Bottom row of the 2x2 grid is empty
    assert_eq!(frame.pixel(10, 130), Some([0, 0, 0, 255]));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_drag_end_recaptures_once_after_debounce() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(800, 600)
        .layout(LayoutMode::SingleDraggable)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();

    let first = wait_for_capture(&mut streams, Option::is_some).await.unwrap();
    assert_eq!(first.rate(), 60);

    session.handle_pointer(&mouse(PointerPhase::Down, 300.0, 200.0));
    session.handle_pointer(&mouse(PointerPhase::Move, 900.0, 900.0));
    // While dragging, no recapture happens
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(session.stats().captures_created, 1);

    session.handle_pointer(&mouse(PointerPhase::Up, 900.0, 900.0));
    let state = session.drag_state();
    assert!(!state.is_dragging);
    assert_eq!((state.x, state.y), (550.0, 350.0));

    let second = wait_for_capture(&mut streams, |c| {
        c.as_ref().is_some_and(|c| c.id() != first.id())
    })
    .await
    .unwrap();
    assert!(second.is_live());
    assert!(!first.is_live());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.stats().captures_created, 2);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_resize_recaptures_with_new_geometry() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(640, 480)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();

    let first = wait_for_capture(&mut streams, Option::is_some).await.unwrap();
    session.resize(320, 180);

    let second = wait_for_capture(&mut streams, |c| {
        c.as_ref().is_some_and(|c| c.geometry() == (320, 180))
    })
    .await
    .unwrap();
    assert!(!first.is_live());
    assert!(second.is_live());

    let frame = wait_for_frame(second.live_video_track().unwrap(), |_| true).await;
    assert_eq!((frame.width, frame.height), (320, 180));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_zero_size_surface_reports_no_capture() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(200, 200)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();

    let first = wait_for_capture(&mut streams, Option::is_some).await.unwrap();

    session.resize(0, 200);
    wait_for_capture(&mut streams, Option::is_none).await;
    assert!(!first.is_live());

    session.resize(200, 100);
    let back = wait_for_capture(&mut streams, Option::is_some).await.unwrap();
    assert_eq!(back.geometry(), (200, 100));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_single_fixed_placeholder_then_source() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(100, 100)
        .layout(LayoutMode::SingleFixed)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();

    let capture = wait_for_capture(&mut streams, Option::is_some).await.unwrap();
    let track = capture.live_video_track().unwrap().clone();
    let placeholder = CanvasConfig::default().placeholder_color;
    wait_for_frame(&track, |f| f.pixel(50, 50) == Some(placeholder)).await;

    let mut local = MockCamera::new(8, 8);
    local.push_solid(BLUE);
    session.set_local_source(Some(local.handle()));
    wait_for_frame(&track, |f| f.pixel(50, 50) == Some(BLUE)).await;

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_events_and_stats() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let session = StreamCanvas::builder()
        .surface_size(64, 64)
        .with_config(fast_config())
        .on_event(move |e| sink.lock().push(e))
        .start()
        .unwrap();

    let mut good = MockCamera::new(4, 4);
    good.push_solid(RED);
    let mut bad = MockCamera::new(4, 4);
    bad.push_malformed();
    session.reconcile(vec![good.observe("good"), bad.observe("bad")]);

    tokio::time::sleep(Duration::from_millis(60)).await;
    session.reconcile(vec![good.observe("good")]);
    assert_eq!(session.source_ids().len(), 1);

    let stats = session.stats();
    assert!(stats.frames_rendered > 0);
    assert!(stats.draw_failures > 0);

    session.stop().await.unwrap();

    let events = events.lock();
    let attached = events
        .iter()
        .filter(|e| matches!(e, CanvasEvent::SourceAttached { .. }))
        .count();
    let detached = events
        .iter()
        .filter(|e| matches!(e, CanvasEvent::SourceDetached { .. }))
        .count();
    assert_eq!(attached, 2);
    assert_eq!(detached, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        CanvasEvent::DrawFailed { source_id, .. } if source_id.as_str() == "bad"
    )));
}

#[tokio::test]
async fn test_stop_reports_none_and_halts_loop() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(64, 64)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();

    let capture = wait_for_capture(&mut streams, Option::is_some).await.unwrap();
    session.stop().await.unwrap();

    assert!(streams.borrow().is_none());
    assert!(!capture.is_live());
}

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<String>>,
    reject_microphone: bool,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish_video(&self, track: &CaptureTrack) -> Result<String, PublishError> {
        let id = format!("video-{}", track.id());
        self.published.lock().push(id.clone());
        Ok(id)
    }

    async fn publish_microphone(&self) -> Result<String, PublishError> {
        if self.reject_microphone {
            return Err(PublishError::rejected("microphone permission denied"));
        }
        self.published.lock().push("mic".to_string());
        Ok("mic".to_string())
    }

    async fn unpublish(&self, publication: &str) -> Result<(), PublishError> {
        self.published.lock().retain(|p| p != publication);
        Ok(())
    }
}

#[tokio::test]
async fn test_publish_current_capture() {
    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(64, 64)
        .with_config(fast_config())
        .on_stream_changed(on_stream)
        .start()
        .unwrap();
    let capture = wait_for_capture(&mut streams, Option::is_some).await.unwrap();

    let publisher = RecordingPublisher::default();
    let ids = publish_capture(&publisher, &capture).await.unwrap();
    assert_eq!(ids.len(), 2);

    let failing = RecordingPublisher {
        reject_microphone: true,
        ..Default::default()
    };
    let err = publish_capture(&failing, &capture).await.unwrap_err();
    assert!(matches!(
        err,
        StreamCanvasError::PublishFailed { rolled_back: 1, .. }
    ));
    assert!(failing.published.lock().is_empty());

    session.stop().await.unwrap();
}
