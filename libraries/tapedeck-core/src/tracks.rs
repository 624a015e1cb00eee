/// Fixed track list with wraparound navigation
use crate::error::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Track identifier: the position of a track in the list
///
/// Stored in journal entries as `song_id`. Sixteen bits keeps it small
/// enough to pack next to the playback state in a single atomic word.
pub type TrackId = u16;

/// Ordered, fixed-size list of track sources
///
/// Never empty and never longer than `TrackId::MAX + 1` entries, so every
/// index arithmetic result fits in a [`TrackId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PathBuf>", into = "Vec<PathBuf>")]
pub struct TrackList {
    paths: Box<[PathBuf]>,
}

impl TrackList {
    /// Largest supported list
    pub const MAX_TRACKS: usize = TrackId::MAX as usize + 1;

    /// Build a track list
    ///
    /// # Errors
    /// Returns `InvalidTrackList` if the list is empty or too long
    pub fn new(paths: Vec<PathBuf>) -> Result<Self> {
        if paths.is_empty() {
            return Err(DeckError::InvalidTrackList(
                "at least one track is required".to_string(),
            ));
        }
        if paths.len() > Self::MAX_TRACKS {
            return Err(DeckError::InvalidTrackList(format!(
                "{} tracks exceeds the limit of {}",
                paths.len(),
                Self::MAX_TRACKS
            )));
        }
        Ok(Self {
            paths: paths.into_boxed_slice(),
        })
    }

    /// Number of tracks (always at least 1)
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; present for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Path for a track, or `None` if the index is out of range
    pub fn get(&self, index: TrackId) -> Option<&Path> {
        self.paths.get(usize::from(index)).map(PathBuf::as_path)
    }

    /// Index after `index`, wrapping to 0 past the end
    pub fn next_index(&self, index: TrackId) -> TrackId {
        let len = self.paths.len();
        let next = (usize::from(index) % len + 1) % len;
        Self::narrow(next)
    }

    /// Index before `index`, wrapping to the last track before 0
    pub fn previous_index(&self, index: TrackId) -> TrackId {
        let len = self.paths.len();
        let prev = (usize::from(index) % len + len - 1) % len;
        Self::narrow(prev)
    }

    /// Iterate over all paths in order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    fn narrow(index: usize) -> TrackId {
        // len <= MAX_TRACKS so every reduced index fits
        TrackId::try_from(index).unwrap_or(0)
    }
}

impl TryFrom<Vec<PathBuf>> for TrackList {
    type Error = DeckError;

    fn try_from(paths: Vec<PathBuf>) -> Result<Self> {
        Self::new(paths)
    }
}

impl From<TrackList> for Vec<PathBuf> {
    fn from(list: TrackList) -> Self {
        list.paths.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(n: usize) -> TrackList {
        TrackList::new((0..n).map(|i| PathBuf::from(format!("/spiffs/{i}.mp3"))).collect()).unwrap()
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            TrackList::new(Vec::new()),
            Err(DeckError::InvalidTrackList(_))
        ));
    }

    #[test]
    fn next_wraps_from_last_to_first() {
        let tracks = list(3);
        assert_eq!(tracks.next_index(0), 1);
        assert_eq!(tracks.next_index(1), 2);
        assert_eq!(tracks.next_index(2), 0);
    }

    #[test]
    fn previous_wraps_from_first_to_last() {
        let tracks = list(3);
        assert_eq!(tracks.previous_index(0), 2);
        assert_eq!(tracks.previous_index(2), 1);
    }

    #[test]
    fn single_track_always_maps_to_zero() {
        let tracks = list(1);
        assert_eq!(tracks.next_index(0), 0);
        assert_eq!(tracks.previous_index(0), 0);
    }

    #[test]
    fn get_is_bounds_checked() {
        let tracks = list(2);
        assert!(tracks.get(1).is_some());
        assert!(tracks.get(2).is_none());
    }

    proptest! {
        /// Property: any walk of next/previous steps stays inside [0, len)
        #[test]
        fn navigation_stays_in_bounds(
            len in 1usize..64,
            steps in prop::collection::vec(any::<bool>(), 0..200)
        ) {
            let tracks = list(len);
            let mut index: TrackId = 0;
            for forward in steps {
                index = if forward { tracks.next_index(index) } else { tracks.previous_index(index) };
                prop_assert!(usize::from(index) < len);
            }
        }
    }
}
