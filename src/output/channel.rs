//! Watch-channel adapter for stream-changed notifications.

use std::sync::Arc;

use tokio::sync::watch;

use crate::output::{CaptureHandle, StreamChangedCallback};

/// Creates a stream-changed callback backed by a tokio watch channel.
///
/// The receiver always holds the most recently announced capture, which
/// suits consumers that only care about the current stream.
///
/// # Example
///
/// ```
/// use stream_canvas::stream_channel;
///
/// let (callback, mut rx) = stream_channel();
/// // Pass `callback` to StreamCanvasBuilder::on_stream_changed, then:
/// // while rx.changed().await.is_ok() { let current = rx.borrow().clone(); }
/// assert!(rx.borrow_and_update().is_none());
/// # drop(callback);
/// ```
pub fn stream_channel() -> (StreamChangedCallback, watch::Receiver<Option<CaptureHandle>>) {
    let (tx, rx) = watch::channel(None);
    let callback: StreamChangedCallback = Arc::new(move |handle| {
        // Receivers may all be gone; the session keeps running regardless
        tx.send_replace(handle);
    });
    (callback, rx)
}
