//! Track samples and where they come from.
//!
//! Parsing imported files is not this crate's job; a [`TrackLoader`] hands
//! over already-decoded samples for a [`SourceFile`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use kt_model::SourceFile;

use crate::error::{SimError, SimResult};

/// One tracked point of the track: horizontal position and height (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Supplies decoded samples for a source file. Shared with worker threads.
pub trait TrackLoader: Send + Sync {
    fn load(&self, file: &SourceFile) -> SimResult<Arc<[Sample]>>;
}

/// Loader with no tracks at all; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTracks;

impl TrackLoader for NoTracks {
    fn load(&self, file: &SourceFile) -> SimResult<Arc<[Sample]>> {
        Err(SimError::TrackUnavailable {
            path: file.path().to_path_buf(),
            message: "no track source configured".to_string(),
        })
    }
}

/// Tracks held in memory, keyed by path.
///
/// Lookups try the full path first, then the bare file name, so a track
/// registered as `ramp.txt` serves `imports/ramp.txt` as well.
#[derive(Debug, Clone, Default)]
pub struct MemoryTracks {
    tracks: HashMap<PathBuf, Arc<[Sample]>>,
}

impl MemoryTracks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, samples: Vec<Sample>) {
        self.tracks.insert(path.into(), samples.into());
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl TrackLoader for MemoryTracks {
    fn load(&self, file: &SourceFile) -> SimResult<Arc<[Sample]>> {
        let by_path = self.tracks.get(file.path());
        let by_name = || {
            let name = file.path().file_name()?;
            self.tracks
                .iter()
                .find(|(path, _)| path.file_name() == Some(name))
                .map(|(_, samples)| samples)
        };
        by_path
            .or_else(by_name)
            .cloned()
            .ok_or_else(|| SimError::TrackUnavailable {
                path: file.path().to_path_buf(),
                message: "no samples registered".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_tracks_match_by_name() {
        let mut tracks = MemoryTracks::new();
        tracks.insert("ramp.txt", vec![Sample::new(0.0, 1.0), Sample::new(1.0, 0.0)]);

        let samples = tracks.load(&SourceFile::new("imports/ramp.txt")).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(tracks.load(&SourceFile::new("imports/other.txt")).is_err());
    }

    #[test]
    fn no_tracks_always_fails() {
        let err = NoTracks.load(&SourceFile::new("a.txt")).unwrap_err();
        assert!(matches!(err, SimError::TrackUnavailable { .. }));
    }
}
