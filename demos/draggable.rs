//! Draggable single-source example.
//!
//! Shows one green-screened mock camera in a draggable region with
//! segmentation enabled, simulates a drag gesture, and reports the
//! recapture that follows the drag once the debounce settles.
//!
//! Run with: cargo run --example draggable

use std::time::Duration;
use stream_canvas::source::MockCamera;
use stream_canvas::{
    stream_channel, LayoutMode, Point, PointerEvent, PointerPhase, ScreenRect, StreamCanvas,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let (on_stream, mut streams) = stream_channel();

    let session = StreamCanvas::builder()
        .surface_size(800, 600)
        .layout(LayoutMode::SingleDraggable)
        .segmentation(true)
        .on_stream_changed(on_stream)
        .start()?;

    let mut camera = MockCamera::qvga();
    camera.push_green_screen([210, 160, 120, 255]);
    session.reconcile(vec![camera.observe("presenter")]);

    streams.changed().await?;
    println!("Initial drag state: {:?}", session.drag_state());

    // The surface is displayed at half size in a window offset by (20, 40)
    let bounds = ScreenRect::new(20.0, 40.0, 400.0, 300.0);
    let path = [(170.0, 140.0), (200.0, 160.0), (260.0, 200.0), (420.0, 330.0)];

    session.handle_pointer(&PointerEvent::touch(
        PointerPhase::Down,
        Point::new(path[0].0, path[0].1),
        bounds,
    ));
    for (x, y) in &path[1..] {
        session.handle_pointer(&PointerEvent::touch(PointerPhase::Move, Point::new(*x, *y), bounds));
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    session.handle_pointer(&PointerEvent::touch(PointerPhase::Up, Point::new(420.0, 330.0), bounds));

    println!("After drag: {:?}", session.drag_state());

    // Wait for the post-drag recapture
    streams.changed().await?;
    if let Some(capture) = streams.borrow_and_update().clone() {
        println!("Recaptured as capture {} at {} fps", capture.id(), capture.rate());
    }

    let stats = session.stats();
    session.stop().await?;
    println!("Stats: {stats:?}");
    Ok(())
}
