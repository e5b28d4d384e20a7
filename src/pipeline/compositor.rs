//! Render loop - composites sources onto the surface once per refresh.
//!
//! Each tick:
//! - reads surface geometry and layout mode
//! - snapshots the registry (one read lock, released before drawing)
//! - draws the grid, or the single source at the fixed or dragged region
//! - brings the output capture in line and offers it the finished surface

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::config::{CanvasConfig, LayoutMode};
use crate::event::{emit, EventCallback};
use crate::geometry::Rect;
use crate::pipeline::{GridLayout, Segmenter, Surface};
use crate::session::SessionState;
use crate::source::{Readiness, SourceSnapshot};
use crate::{CanvasEvent, DrawError};

/// Ticks between periodic debug logs (about five seconds at 60 Hz).
const LOG_EVERY_TICKS: u64 = 300;

/// What one tick drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TickReport {
    pub drawn: usize,
    pub failed: usize,
    pub skipped: usize,
    pub placeholder: bool,
}

/// Owns the surface and draws it from shared session state.
pub(crate) struct FrameCompositor {
    state: Arc<SessionState>,
    config: CanvasConfig,
    surface: Surface,
    segmenter: Segmenter,
    grid: GridLayout,
    event_callback: Option<EventCallback>,
    ticks: u64,
}

impl FrameCompositor {
    pub fn new(
        state: Arc<SessionState>,
        config: CanvasConfig,
        event_callback: Option<EventCallback>,
    ) -> Self {
        let segmenter = Segmenter::new(config.thresholds);
        Self {
            state,
            config,
            surface: Surface::new(0, 0),
            segmenter,
            grid: GridLayout::default(),
            event_callback,
            ticks: 0,
        }
    }

    /// The surface as of the last tick.
    #[cfg(test)]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Runs until the session's running flag clears.
    ///
    /// The flag is checked before every reschedule and again after waking,
    /// so no tick draws after stop is observed.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.config.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.state.running.load(Ordering::SeqCst) {
            interval.tick().await;
            if !self.state.running.load(Ordering::SeqCst) {
                break;
            }
            self.render_tick(Instant::now());
        }

        tracing::debug!(ticks = self.ticks, "render loop stopped");
    }

    /// Draws one frame and updates the output capture.
    pub fn render_tick(&mut self, now: Instant) -> TickReport {
        let surface_state = *self.state.surface.lock();
        self.surface.resize(surface_state.width, surface_state.height);
        self.surface.clear(self.config.background);

        let mut report = TickReport::default();
        match surface_state.mode {
            LayoutMode::Grid => self.draw_grid(&mut report),
            mode => self.draw_single(mode, now, &mut report),
        }

        let geometry = surface_state.geometry();
        {
            let mut output = self.state.output.lock();
            output.ensure_capture(geometry, now);
            output.offer_frame(&self.surface, now);
        }

        self.ticks += 1;
        self.state.frames_rendered.fetch_add(1, Ordering::SeqCst);
        if self.ticks % LOG_EVERY_TICKS == 0 {
            tracing::debug!(
                tick = self.ticks,
                mode = ?surface_state.mode,
                width = surface_state.width,
                height = surface_state.height,
                drawn = report.drawn,
                failed = report.failed,
                skipped = report.skipped,
                placeholder = report.placeholder,
                total_failures = self.state.draw_failures.load(Ordering::SeqCst),
                "render loop alive"
            );
        }
        report
    }

    fn draw_grid(&mut self, report: &mut TickReport) {
        let sources = self.state.registry.read().snapshot();
        let cells = self
            .grid
            .cells(sources.len(), self.surface.width(), self.surface.height())
            .to_vec();

        for (source, cell) in sources.into_iter().zip(cells) {
            // Loading sources leave their cell empty
            if source.readiness != Readiness::HasFrameData {
                continue;
            }
            self.draw_source(source, cell, None, report);
        }
    }

    fn draw_single(&mut self, mode: LayoutMode, now: Instant, report: &mut TickReport) {
        let region = match mode {
            LayoutMode::SingleDraggable => self.state.drag.lock().region(),
            _ => self.config.fixed_region.unwrap_or_else(|| {
                Rect::full(self.surface.width(), self.surface.height())
            }),
        };

        let source = self.state.registry.read().snapshot_first();
        match source {
            Some(source) if source.readiness == Readiness::HasFrameData => {
                let deadline = self.config.segmentation.then(|| now + self.frame_budget(mode));
                self.draw_source(source, region, deadline, report);
            }
            _ => {
                self.surface.fill_rect(region, self.config.placeholder_color);
                self.surface.set_label(self.config.placeholder_label.clone());
                report.placeholder = true;
            }
        }
    }

    /// Time one frame may take at the mode's capture rate.
    fn frame_budget(&self, mode: LayoutMode) -> Duration {
        Duration::from_secs(1) / self.config.capture_rate(mode).max(1)
    }

    fn draw_source(
        &mut self,
        source: SourceSnapshot,
        rect: Rect,
        segment_deadline: Option<Instant>,
        report: &mut TickReport,
    ) {
        let frame = match &source.frame {
            Ok(frame) => frame.clone(),
            Err(e) => {
                self.record_failure(&source, e, report);
                return;
            }
        };

        let frame = match segment_deadline {
            None => frame,
            Some(deadline) => {
                let started = Instant::now();
                match self.segmenter.segment(&frame, Some(deadline)) {
                    Some(masked) => masked,
                    None => {
                        let elapsed_ms = started.elapsed().as_millis() as u64;
                        tracing::debug!(
                            source = %source.id,
                            elapsed_ms,
                            "segmentation over budget, frame dropped"
                        );
                        self.state.segmentation_skips.fetch_add(1, Ordering::SeqCst);
                        report.skipped += 1;
                        emit(
                            self.event_callback.as_ref(),
                            CanvasEvent::SegmentationSkipped {
                                source_id: source.id,
                                elapsed_ms,
                            },
                        );
                        return;
                    }
                }
            }
        };

        match self.surface.draw_frame(&frame, rect) {
            Ok(()) => report.drawn += 1,
            Err(e) => self.record_failure(&source, &e, report),
        }
    }

    fn record_failure(&self, source: &SourceSnapshot, error: &DrawError, report: &mut TickReport) {
        tracing::warn!(source = %source.id, error = %error, "failed to draw source");
        self.state.draw_failures.fetch_add(1, Ordering::SeqCst);
        report.failed += 1;
        emit(
            self.event_callback.as_ref(),
            CanvasEvent::DrawFailed {
                source_id: source.id.clone(),
                error: error.to_string(),
            },
        );
    }
}

/// Spawns the render loop as a background task.
pub(crate) fn spawn_compositor(
    state: Arc<SessionState>,
    config: CanvasConfig,
    event_callback: Option<EventCallback>,
) -> tokio::task::JoinHandle<()> {
    let compositor = FrameCompositor::new(state, config, event_callback);
    tokio::spawn(compositor.run())
}
