//! Pending-track queue
//!
//! FIFO of tracks waiting to play after the current one. Dequeuing always
//! takes the head, so a dequeued entry is never also left in the queue.

use crate::types::Track;
use std::collections::VecDeque;

/// Queue of upcoming tracks
///
/// Structure:
/// ```text
/// Currently Playing: Track A       (owned by the engine, not the queue)
/// ─────────────────────────────
/// Queue:
///   - Track B   <- head, plays next
///   - Track C
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: VecDeque<Track>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append track to the end of the queue
    pub fn push_back(&mut self, track: Track) {
        self.tracks.push_back(track);
    }

    /// Put a track at the head so it plays next
    pub fn push_front(&mut self, track: Track) {
        self.tracks.push_front(track);
    }

    /// Replace the whole queue
    pub fn replace(&mut self, tracks: impl IntoIterator<Item = Track>) {
        self.tracks = tracks.into_iter().collect();
    }

    /// Take the head of the queue
    pub fn pop_next(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Peek at the head without removing it
    pub fn peek_next(&self) -> Option<&Track> {
        self.tracks.front()
    }

    /// Remove track by index
    ///
    /// Returns the removed track if the index was valid
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        self.tracks.remove(index)
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Get all tracks (head first)
    pub fn get_all(&self) -> Vec<&Track> {
        self.tracks.iter().collect()
    }

    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
