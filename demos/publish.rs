//! Publishing example.
//!
//! Implements a toy publisher that counts frames, and republishes every new
//! capture the session announces, the way a room client would.
//!
//! Run with: cargo run --example publish

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use stream_canvas::source::MockCamera;
use stream_canvas::{
    publish_capture, stream_channel, CaptureTrack, PublishError, Publisher, StreamCanvas,
};

/// Publisher that drains each video track in a background task.
struct CountingPublisher {
    frames: Arc<AtomicU64>,
}

#[async_trait]
impl Publisher for CountingPublisher {
    fn name(&self) -> &str {
        "counting"
    }

    async fn publish_video(&self, track: &CaptureTrack) -> Result<String, PublishError> {
        let frames = self.frames.clone();
        let stream = track.clone().into_stream();
        tokio::spawn(async move {
            stream
                .for_each(|_| {
                    frames.fetch_add(1, Ordering::Relaxed);
                    async {}
                })
                .await;
        });
        Ok(format!("video-{}", track.id()))
    }

    async fn publish_microphone(&self) -> Result<String, PublishError> {
        Ok("microphone".to_string())
    }

    async fn unpublish(&self, publication: &str) -> Result<(), PublishError> {
        println!("Unpublished {publication}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let (on_stream, mut streams) = stream_channel();
    let session = StreamCanvas::builder()
        .surface_size(640, 360)
        .on_stream_changed(on_stream)
        .start()?;

    let mut camera = MockCamera::qvga();
    camera.push_solid([90, 90, 200, 255]);
    session.set_local_source(Some(camera.handle()));

    let frames = Arc::new(AtomicU64::new(0));
    let publisher = CountingPublisher {
        frames: frames.clone(),
    };

    // Republish on every capture change; a resize midway forces one
    let resize_after = tokio::time::sleep(Duration::from_secs(1));
    tokio::pin!(resize_after);
    let deadline = tokio::time::sleep(Duration::from_secs(2));
    tokio::pin!(deadline);
    let mut resized = false;

    loop {
        tokio::select! {
            changed = streams.changed() => {
                changed?;
                let capture = streams.borrow_and_update().clone();
                if let Some(capture) = capture {
                    let ids = publish_capture(&publisher, &capture).await?;
                    println!("Published capture {} as {ids:?}", capture.id());
                }
            }
            () = &mut resize_after, if !resized => {
                resized = true;
                session.resize(1280, 720);
            }
            () = &mut deadline => break,
        }
    }

    session.stop().await?;
    println!("Frames delivered: {}", frames.load(Ordering::Relaxed));
    Ok(())
}
