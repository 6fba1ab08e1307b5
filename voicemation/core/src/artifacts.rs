//! Artifact Registry
//!
//! Session-lifetime lookup from [`ArtifactId`] to generated media metadata.
//!
//! The registry is an explicit, injected service: the capture controller writes
//! into it and the playback coordinator (and any renderer holding a clone)
//! reads from it. Entries are write-once and never removed while the registry
//! lives; nothing is persisted.
//!
//! # Ordering
//!
//! Callers must finish [`ArtifactRegistry::put`] before appending any
//! transcript message that references the artifact, so every id found in the
//! transcript always resolves here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::ArtifactId;

/// Generated media plus the text that produced it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Client-assigned identifier
    pub id: ArtifactId,
    /// Text the generation was based on (typed or recognized)
    pub source_text: String,
    /// Absolute media URL
    pub media_url: String,
    /// When the artifact was received
    pub timestamp: DateTime<Utc>,
}

impl Artifact {
    /// Create an artifact received now
    pub fn new(id: ArtifactId, source_text: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            id,
            source_text: source_text.into(),
            media_url: media_url.into(),
            timestamp: Utc::now(),
        }
    }

    /// Suggested file name when saving the media locally
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("animation-{}.mp4", self.id)
    }
}

/// Errors from the artifact registry
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An artifact with this id was already registered
    #[error("artifact {0} is already registered")]
    Duplicate(ArtifactId),
}

/// Shared, write-once artifact store
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Debug, Default)]
pub struct ArtifactRegistry {
    inner: Arc<DashMap<ArtifactId, Artifact>>,
}

impl ArtifactRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the id is already present; the
    /// existing entry is left untouched.
    pub fn put(&self, artifact: Artifact) -> Result<(), RegistryError> {
        match self.inner.entry(artifact.id) {
            Entry::Occupied(_) => {
                tracing::warn!(artifact_id = %artifact.id, "Rejected duplicate artifact");
                Err(RegistryError::Duplicate(artifact.id))
            }
            Entry::Vacant(slot) => {
                tracing::debug!(artifact_id = %artifact.id, url = %artifact.media_url, "Registered artifact");
                slot.insert(artifact);
                Ok(())
            }
        }
    }

    /// Look up an artifact
    #[must_use]
    pub fn get(&self, id: &ArtifactId) -> Option<Artifact> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    /// Whether an artifact is registered
    #[must_use]
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.inner.contains_key(id)
    }

    /// Number of registered artifacts
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been registered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: u64) -> Artifact {
        Artifact::new(
            ArtifactId(id),
            "draw a circle",
            "http://localhost:5001/out/1.mp4",
        )
    }

    #[test]
    fn test_put_and_get() {
        let registry = ArtifactRegistry::new();
        assert!(registry.is_empty());

        registry.put(artifact(1)).unwrap();

        let found = registry.get(&ArtifactId(1)).unwrap();
        assert_eq!(found.source_text, "draw a circle");
        assert!(registry.contains(&ArtifactId(1)));
        assert!(registry.get(&ArtifactId(2)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_put_is_write_once() {
        let registry = ArtifactRegistry::new();
        registry.put(artifact(1)).unwrap();

        let mut replacement = artifact(1);
        replacement.source_text = "draw a square".to_string();

        assert_eq!(
            registry.put(replacement),
            Err(RegistryError::Duplicate(ArtifactId(1)))
        );
        assert_eq!(registry.get(&ArtifactId(1)).unwrap().source_text, "draw a circle");
    }

    #[test]
    fn test_clones_share_entries() {
        let writer = ArtifactRegistry::new();
        let reader = writer.clone();

        writer.put(artifact(9)).unwrap();
        assert!(reader.contains(&ArtifactId(9)));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(artifact(123).file_name(), "animation-123.mp4");
    }
}
