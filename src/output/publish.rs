//! Boundary to the external publishing layer.

use async_trait::async_trait;

use crate::output::{CaptureHandle, CaptureTrack};
use crate::{PublishError, StreamCanvasError};

/// A destination that publishes tracks to a remote audience.
///
/// Implemented by the transport layer (an RTC room, a recorder, a test
/// double). Each successful publish returns a publication id that
/// [`unpublish`](Publisher::unpublish) accepts later.
///
/// # Example
///
/// ```
/// use stream_canvas::{CaptureTrack, PublishError, Publisher};
/// use async_trait::async_trait;
///
/// struct LogPublisher;
///
/// #[async_trait]
/// impl Publisher for LogPublisher {
///     fn name(&self) -> &str {
///         "log"
///     }
///
///     async fn publish_video(&self, track: &CaptureTrack) -> Result<String, PublishError> {
///         println!("publishing video track {}", track.id());
///         Ok(format!("video-{}", track.id()))
///     }
///
///     async fn publish_microphone(&self) -> Result<String, PublishError> {
///         Ok("mic".to_string())
///     }
///
///     async fn unpublish(&self, publication: &str) -> Result<(), PublishError> {
///         println!("unpublished {publication}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Publishes a composited video track.
    async fn publish_video(&self, track: &CaptureTrack) -> Result<String, PublishError>;

    /// Acquires and publishes the local microphone.
    async fn publish_microphone(&self) -> Result<String, PublishError>;

    /// Withdraws a publication.
    async fn unpublish(&self, publication: &str) -> Result<(), PublishError>;
}

/// Publishes a capture's first live video track, then a microphone track.
///
/// If either step fails, whatever this call already published is
/// unpublished before the error is returned; the caller never has to clean
/// up a half-published stream. Returns the publication ids in publish order.
///
/// # Errors
///
/// - [`StreamCanvasError::NoLiveVideoTrack`] if the capture was already stopped
/// - [`StreamCanvasError::PublishFailed`] if the publisher rejected a track
pub async fn publish_capture(
    publisher: &dyn Publisher,
    capture: &CaptureHandle,
) -> Result<Vec<String>, StreamCanvasError> {
    let track = capture
        .live_video_track()
        .ok_or(StreamCanvasError::NoLiveVideoTrack {
            capture_id: capture.id(),
        })?;

    let mut published = Vec::with_capacity(2);

    match publisher.publish_video(track).await {
        Ok(publication) => published.push(publication),
        Err(e) => return Err(rollback(publisher, published, &e).await),
    }
    match publisher.publish_microphone().await {
        Ok(publication) => published.push(publication),
        Err(e) => return Err(rollback(publisher, published, &e).await),
    }

    tracing::info!(
        publisher = publisher.name(),
        capture = capture.id(),
        tracks = published.len(),
        "capture published"
    );
    Ok(published)
}

async fn rollback(
    publisher: &dyn Publisher,
    published: Vec<String>,
    cause: &PublishError,
) -> StreamCanvasError {
    tracing::warn!(
        publisher = publisher.name(),
        error = %cause,
        rolling_back = published.len(),
        "publish failed"
    );

    let mut rolled_back = 0;
    for publication in published.iter().rev() {
        match publisher.unpublish(publication).await {
            Ok(()) => rolled_back += 1,
            Err(e) => tracing::warn!(
                publisher = publisher.name(),
                publication = %publication,
                error = %e,
                "unpublish during rollback failed"
            ),
        }
    }

    StreamCanvasError::PublishFailed {
        publisher: publisher.name().to_string(),
        reason: cause.to_string(),
        rolled_back,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputStreamManager;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct TestPublisher {
        live: Mutex<Vec<String>>,
        fail_video: bool,
        fail_microphone: bool,
    }

    #[async_trait]
    impl Publisher for TestPublisher {
        fn name(&self) -> &str {
            "test"
        }

        async fn publish_video(&self, track: &CaptureTrack) -> Result<String, PublishError> {
            if self.fail_video {
                return Err(PublishError::rejected("codec unsupported"));
            }
            let id = format!("video-{}", track.id());
            self.live.lock().push(id.clone());
            Ok(id)
        }

        async fn publish_microphone(&self) -> Result<String, PublishError> {
            if self.fail_microphone {
                return Err(PublishError::Transport("connection reset".into()));
            }
            self.live.lock().push("mic".to_string());
            Ok("mic".to_string())
        }

        async fn unpublish(&self, publication: &str) -> Result<(), PublishError> {
            self.live.lock().retain(|p| p != publication);
            Ok(())
        }
    }

    fn live_capture() -> (OutputStreamManager, CaptureHandle) {
        let mut manager = OutputStreamManager::new(30, Duration::from_millis(100));
        let handle = manager.ensure_capture(Some((64, 48)), Instant::now()).unwrap();
        (manager, handle)
    }

    #[tokio::test]
    async fn test_publish_video_and_microphone() {
        let (_manager, capture) = live_capture();
        let publisher = TestPublisher::default();

        let published = publish_capture(&publisher, &capture).await.unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[1], "mic");
        assert_eq!(publisher.live.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_microphone_failure_rolls_back_video() {
        let (_manager, capture) = live_capture();
        let publisher = TestPublisher {
            fail_microphone: true,
            ..Default::default()
        };

        let err = publish_capture(&publisher, &capture).await.unwrap_err();
        match err {
            StreamCanvasError::PublishFailed {
                publisher: name,
                rolled_back,
                reason,
            } => {
                assert_eq!(name, "test");
                assert_eq!(rolled_back, 1);
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(publisher.live.lock().is_empty());
    }

    #[tokio::test]
    async fn test_video_failure_publishes_nothing() {
        let (_manager, capture) = live_capture();
        let publisher = TestPublisher {
            fail_video: true,
            ..Default::default()
        };

        let err = publish_capture(&publisher, &capture).await.unwrap_err();
        assert!(matches!(
            err,
            StreamCanvasError::PublishFailed { rolled_back: 0, .. }
        ));
        assert!(publisher.live.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_capture_rejected() {
        let (mut manager, capture) = live_capture();
        manager.shutdown();

        let err = publish_capture(&TestPublisher::default(), &capture)
            .await
            .unwrap_err();
        assert!(matches!(err, StreamCanvasError::NoLiveVideoTrack { .. }));
    }
}
