//! Back-history for "previous track"

use crate::types::Track;
use std::collections::VecDeque;

/// Tracks that were current before the one playing now
///
/// Holds at most `limit` entries. Pushing onto a full history drops the
/// track that left the player longest ago; a limit of zero keeps nothing.
#[derive(Debug, Clone)]
pub struct History {
    /// Oldest at the front, most recently replaced at the back
    entries: VecDeque<Track>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Remember a track that stopped being current
    pub fn push(&mut self, track: Track) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(track);
    }

    /// Take the track that was current just before
    pub fn pop(&mut self) -> Option<Track> {
        self.entries.pop_back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackId;

    fn track(id: u64) -> Track {
        Track::new(id, format!("Track {}", id), "Artist", format!("/audio/{}.mp3", id))
    }

    fn ids(history: &History) -> Vec<TrackId> {
        history.iter().map(|t| t.id).collect()
    }

    #[test]
    fn pops_last_replaced_track() {
        let mut history = History::new(10);
        history.push(track(1));
        history.push(track(2));
        history.push(track(3));

        assert_eq!(history.pop().map(|t| t.id), Some(TrackId(3)));
        assert_eq!(history.pop().map(|t| t.id), Some(TrackId(2)));
        assert_eq!(ids(&history), vec![TrackId(1)]);
    }

    #[test]
    fn full_history_drops_oldest() {
        let mut history = History::new(3);
        for id in 1..=5 {
            history.push(track(id));
        }

        assert_eq!(ids(&history), vec![TrackId(3), TrackId(4), TrackId(5)]);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut history = History::new(0);
        history.push(track(1));
        assert!(history.is_empty());
        assert!(history.pop().is_none());
    }
}
