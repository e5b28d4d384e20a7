//! Grid composition example.
//!
//! Composites three mock cameras into a grid, adds and removes one mid-run,
//! and prints the captured output as it arrives.
//!
//! Run with: cargo run --example grid

use std::time::Duration;
use stream_canvas::source::MockCamera;
use stream_canvas::{stream_channel, LayoutMode, StreamCanvas};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let (on_stream, mut streams) = stream_channel();

    let session = StreamCanvas::builder()
        .surface_size(960, 540)
        .layout(LayoutMode::Grid)
        .on_stream_changed(on_stream)
        .on_event(|e| tracing::info!(?e, "canvas event"))
        .start()?;

    let colors = [[220, 60, 60, 255], [60, 220, 60, 255], [60, 60, 220, 255]];
    let mut cameras: Vec<MockCamera> = colors.iter().map(|_| MockCamera::qvga()).collect();
    for (camera, color) in cameras.iter_mut().zip(colors) {
        camera.push_solid(color);
    }

    let names = ["alice", "bob", "carol"];
    session.reconcile(cameras.iter().zip(names).map(|(c, n)| c.observe(n)));

    streams.changed().await?;
    let capture = streams.borrow_and_update().clone();
    if let Some(capture) = capture {
        println!(
            "Capture {} at {:?}, {} fps",
            capture.id(),
            capture.geometry(),
            capture.rate()
        );
    }

    tokio::time::sleep(Duration::from_secs(1)).await;

    // Carol leaves; the grid shrinks back to 2x2 with one empty cell
    session.reconcile(cameras.iter().zip(names).take(2).map(|(c, n)| c.observe(n)));
    tokio::time::sleep(Duration::from_secs(1)).await;

    let stats = session.stats();
    session.stop().await?;

    println!("Stats: {stats:?}");
    Ok(())
}
