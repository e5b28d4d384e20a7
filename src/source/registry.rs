//! Registry of available video sources and their decode sinks.
//!
//! The registry is the only owner of decode sinks. Every sink is attached
//! exactly once when its source appears and detached exactly once when it
//! disappears; the attach/detach counters make that pairing auditable.

use std::collections::HashSet;

use crate::event::{emit, EventCallback};
use crate::source::{DecodeSink, Readiness, SourceId, TrackHandle};
use crate::{CanvasEvent, DrawError, VideoFrame};

/// Label given to the local source.
const LOCAL_LABEL: &str = "You";

/// One entry of an upstream membership snapshot.
#[derive(Debug, Clone)]
pub struct ObservedSource {
    /// Stable identity of the participant.
    pub identity: SourceId,
    /// Human-readable label.
    pub display_name: String,
    /// The participant's active video track.
    pub track: TrackHandle,
}

impl ObservedSource {
    /// Creates an observed source entry.
    pub fn new(
        identity: impl Into<SourceId>,
        display_name: impl Into<String>,
        track: TrackHandle,
    ) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            track,
        }
    }
}

/// A tracked source and the decode sink its track is attached to.
#[derive(Debug)]
pub struct VideoSource {
    id: SourceId,
    label: String,
    sink: DecodeSink,
    is_local: bool,
}

impl VideoSource {
    /// Stable identity.
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this is the local source.
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Readiness of the attached track.
    pub fn readiness(&self) -> Readiness {
        self.sink.readiness()
    }

    /// The decode sink, read-only.
    pub fn sink(&self) -> &DecodeSink {
        &self.sink
    }
}

/// Point-in-time view of one source, taken at the start of a tick.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// Identity of the source.
    pub id: SourceId,
    /// Display label.
    pub label: String,
    /// Whether this is the local source.
    pub is_local: bool,
    /// Readiness when the snapshot was taken.
    pub readiness: Readiness,
    /// The frame to draw, or why there is none.
    pub frame: Result<VideoFrame, DrawError>,
}

/// Membership changes applied by one [`SourceRegistry::reconcile`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Identities that were attached.
    pub added: Vec<SourceId>,
    /// Identities that were detached.
    pub removed: Vec<SourceId>,
}

impl ReconcileSummary {
    /// Returns `true` if membership did not change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Tracks the set of available sources keyed by identity.
///
/// Iteration follows insertion order. Remote sources are managed with
/// [`reconcile`](Self::reconcile); the local source with
/// [`set_local_source`](Self::set_local_source).
///
/// # Example
///
/// ```
/// use stream_canvas::{video_track, ObservedSource, SourceRegistry};
///
/// let (_alice_writer, alice) = video_track();
/// let mut registry = SourceRegistry::new();
///
/// registry.reconcile(vec![ObservedSource::new("alice", "Alice", alice)]);
/// assert_eq!(registry.len(), 1);
///
/// registry.reconcile(Vec::new());
/// assert!(registry.is_empty());
/// assert_eq!(registry.attach_count(), registry.detach_count());
/// ```
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<VideoSource>,
    generation: u64,
    attach_count: u64,
    detach_count: u64,
    event_callback: Option<EventCallback>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback notified on attach and detach.
    #[must_use]
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Applies an upstream membership snapshot.
    ///
    /// Identities new to the registry are attached; remote identities missing
    /// from `observed` are detached. Identities present in both are left
    /// alone. Duplicates within `observed` keep their first entry, and
    /// entries using the reserved local identity are ignored.
    pub fn reconcile(
        &mut self,
        observed: impl IntoIterator<Item = ObservedSource>,
    ) -> ReconcileSummary {
        let mut seen = HashSet::new();
        let mut incoming = Vec::new();
        for entry in observed {
            if entry.identity.is_local() {
                tracing::warn!(
                    identity = %entry.identity,
                    "remote source uses the reserved local identity, ignoring"
                );
                continue;
            }
            if seen.insert(entry.identity.clone()) {
                incoming.push(entry);
            }
        }

        let mut summary = ReconcileSummary::default();

        let vanished: Vec<SourceId> = self
            .sources
            .iter()
            .filter(|s| !s.is_local && !seen.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();
        for id in vanished {
            self.remove(&id);
            summary.removed.push(id);
        }

        for entry in incoming {
            if self.contains(&entry.identity) {
                continue;
            }
            summary.added.push(entry.identity.clone());
            self.insert(entry.identity, entry.display_name, entry.track, false);
        }

        if !summary.is_empty() {
            tracing::debug!(
                added = summary.added.len(),
                removed = summary.removed.len(),
                total = self.sources.len(),
                "registry reconciled"
            );
        }
        summary
    }

    /// Sets or clears the local source.
    ///
    /// Setting the stream already attached is a no-op. Setting a different
    /// stream detaches the old one from the local sink before attaching the
    /// new one.
    pub fn set_local_source(&mut self, track: Option<TrackHandle>) {
        let local_id = SourceId::local();
        match track {
            None => {
                if self.remove(&local_id) {
                    tracing::debug!("local source cleared");
                }
            }
            Some(track) => {
                let Some(local) = self.sources.iter_mut().find(|s| s.is_local) else {
                    self.insert(local_id, LOCAL_LABEL.to_string(), track, true);
                    tracing::debug!("local source set");
                    return;
                };
                if local.sink.track_id() == Some(track.id()) {
                    return;
                }
                if local.sink.detach().is_some() {
                    self.detach_count += 1;
                }
                local.sink.attach(track);
                self.attach_count += 1;
                self.generation += 1;
                tracing::debug!("local source stream replaced");
            }
        }
    }

    fn insert(&mut self, id: SourceId, label: String, track: TrackHandle, is_local: bool) {
        let mut sink = DecodeSink::new();
        sink.attach(track);
        self.attach_count += 1;
        self.generation += 1;
        self.sources.push(VideoSource {
            id: id.clone(),
            label,
            sink,
            is_local,
        });
        emit(
            self.event_callback.as_ref(),
            CanvasEvent::SourceAttached {
                source_id: id,
                is_local,
            },
        );
    }

    fn remove(&mut self, id: &SourceId) -> bool {
        let Some(pos) = self.sources.iter().position(|s| &s.id == id) else {
            return false;
        };
        let mut source = self.sources.remove(pos);
        if source.sink.detach().is_some() {
            self.detach_count += 1;
        }
        self.generation += 1;
        emit(
            self.event_callback.as_ref(),
            CanvasEvent::SourceDetached {
                source_id: source.id,
            },
        );
        true
    }

    /// Detaches every source. Used on session teardown.
    pub fn clear(&mut self) {
        let ids: Vec<SourceId> = self.sources.iter().map(|s| s.id.clone()).collect();
        for id in ids {
            self.remove(&id);
        }
    }

    /// Returns `true` if a source with this identity is tracked.
    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.iter().any(|s| &s.id == id)
    }

    /// Looks up a source by identity.
    pub fn get(&self, id: &SourceId) -> Option<&VideoSource> {
        self.sources.iter().find(|s| &s.id == id)
    }

    /// Iterates sources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &VideoSource> {
        self.sources.iter()
    }

    /// Identities in insertion order.
    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }

    /// Number of tracked sources, local included.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Counter bumped on every membership or stream change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total tracks attached over the registry's lifetime.
    pub fn attach_count(&self) -> u64 {
        self.attach_count
    }

    /// Total tracks detached over the registry's lifetime.
    pub fn detach_count(&self) -> u64 {
        self.detach_count
    }

    /// The source single-source layouts draw.
    ///
    /// The first remote source by insertion order, or the local source when
    /// it is the only one.
    pub fn first_for_single(&self) -> Option<&VideoSource> {
        self.sources
            .iter()
            .find(|s| !s.is_local)
            .or_else(|| self.sources.iter().find(|s| s.is_local))
    }

    /// Snapshots every source for one tick.
    pub fn snapshot(&self) -> Vec<SourceSnapshot> {
        self.sources.iter().map(snapshot_of).collect()
    }

    /// Snapshots only the source single-source layouts draw.
    ///
    /// A remote source with frame data is preferred over an earlier one that
    /// is still loading; otherwise this is [`first_for_single`](Self::first_for_single).
    pub fn snapshot_first(&self) -> Option<SourceSnapshot> {
        self.sources
            .iter()
            .filter(|s| !s.is_local)
            .find(|s| s.readiness() == Readiness::HasFrameData)
            .or_else(|| self.first_for_single())
            .map(snapshot_of)
    }
}

fn snapshot_of(source: &VideoSource) -> SourceSnapshot {
    SourceSnapshot {
        id: source.id.clone(),
        label: source.label.clone(),
        is_local: source.is_local,
        readiness: source.readiness(),
        frame: source.sink.current_frame(),
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.ids())
            .field("generation", &self.generation)
            .field("attach_count", &self.attach_count)
            .field("detach_count", &self.detach_count)
            .finish_non_exhaustive()
    }
}
