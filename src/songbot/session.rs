//! Per-user record of the last song resolved by that user.

use crate::songbot::song::SongDescriptor;
use crate::songbot::store::BoundedStore;

pub struct SessionState {
    last_songs: BoundedStore<i64, SongDescriptor>,
}

impl SessionState {
    pub fn new(max_users: usize) -> Self {
        Self {
            last_songs: BoundedStore::new(max_users, None),
        }
    }

    /// Overwrites whatever the user looked up before.
    pub fn record_last_song(&self, user_id: i64, song: SongDescriptor) {
        self.last_songs.insert(user_id, song);
    }

    pub fn last_song(&self, user_id: i64) -> Option<SongDescriptor> {
        self.last_songs.get(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str, artist: &str) -> SongDescriptor {
        SongDescriptor {
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Unknown".to_string(),
            preview_url: None,
            canonical_url: None,
            artwork_url: None,
        }
    }

    #[test]
    fn test_record_and_get() {
        let sessions = SessionState::new(10);
        assert!(sessions.last_song(42).is_none());
        sessions.record_last_song(42, song("Yellow", "Coldplay"));
        assert_eq!(sessions.last_song(42).unwrap().title, "Yellow");
    }

    #[test]
    fn test_overwrite_per_user() {
        let sessions = SessionState::new(10);
        sessions.record_last_song(1, song("Yellow", "Coldplay"));
        sessions.record_last_song(1, song("Creep", "Radiohead"));
        sessions.record_last_song(2, song("Hurt", "Johnny Cash"));
        assert_eq!(sessions.last_song(1).unwrap().artist, "Radiohead");
        assert_eq!(sessions.last_song(2).unwrap().artist, "Johnny Cash");
    }
}
