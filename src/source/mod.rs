//! Video sources: identities, tracks, decode sinks and the registry.
//!
//! This module is the boundary between externally produced video tracks and
//! the compositor. Tracks arrive through [`SourceRegistry::reconcile`] and
//! [`SourceRegistry::set_local_source`]; the compositor only ever reads
//! registry snapshots.

mod mock;
mod registry;
mod source_id;
mod track;

pub use mock::MockCamera;
pub use registry::{ObservedSource, ReconcileSummary, SourceRegistry, SourceSnapshot, VideoSource};
pub use source_id::SourceId;
pub use track::{video_track, DecodeSink, Readiness, TrackHandle, TrackWriter};
