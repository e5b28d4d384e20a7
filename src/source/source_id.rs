//! Source identification type.

use std::sync::Arc;

/// Identity reserved for the local source.
const LOCAL_SOURCE_ID: &str = "local";

/// Stable identifier for a video source.
///
/// `SourceId` uses `Arc<str>` internally, so cloning is a pointer copy.
/// The identity `"local"` is reserved for the local source; remote sources
/// using it are ignored by the registry.
///
/// # Example
///
/// ```
/// use stream_canvas::SourceId;
///
/// let alice = SourceId::new("alice");
/// assert_ne!(alice, SourceId::local());
/// assert!(SourceId::local().is_local());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Arc<str>);

impl SourceId {
    /// Creates a new source ID from a string.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The reserved identity of the local source.
    pub fn local() -> Self {
        Self::new(LOCAL_SOURCE_ID)
    }

    /// Returns `true` if this is the reserved local identity.
    pub fn is_local(&self) -> bool {
        &*self.0 == LOCAL_SOURCE_ID
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for SourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_equality() {
        assert_eq!(SourceId::new("alice"), SourceId::new("alice"));
        assert_ne!(SourceId::new("alice"), SourceId::new("bob"));
    }

    #[test]
    fn test_source_id_display() {
        let id = SourceId::new("alice");
        assert_eq!(format!("{id}"), "alice");
    }

    #[test]
    fn test_local_identity_reserved() {
        assert!(SourceId::local().is_local());
        assert!(SourceId::new("local").is_local());
        assert!(!SourceId::new("alice").is_local());
    }

    #[test]
    fn test_source_id_conversions() {
        let a: SourceId = "x".into();
        let b: SourceId = String::from("x").into();
        assert_eq!(a, b);
        assert_eq!(a.as_ref(), "x");
    }
}
