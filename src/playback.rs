//! Watch-progress tracking
//!
//! Converts raw player samples (current time / duration) into the normalized
//! [0, 1] watch position stored on a record. Samples with no useful signal
//! (zero or unknown duration, position at zero) are dropped rather than
//! overwriting a real saved position.

use uuid::Uuid;

use crate::download::DownloadManager;

/// One periodic status sample from a media player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSample {
    /// Seconds into the media
    pub current_time: f64,
    /// Total length in seconds; zero while the player is still probing
    pub duration: f64,
}

impl PlaybackSample {
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
        }
    }

    /// Normalized position in [0, 1], or `None` when the sample carries no
    /// usable signal.
    pub fn position(&self) -> Option<f64> {
        if self.duration <= 0.0 || self.current_time <= 0.0 {
            return None;
        }
        Some((self.current_time / self.duration).clamp(0.0, 1.0))
    }
}

/// Feeds a player's samples into the stored watch progress of one record.
pub struct WatchTracker {
    manager: DownloadManager,
    id: Uuid,
}

impl WatchTracker {
    pub fn new(manager: DownloadManager, id: Uuid) -> Self {
        Self { manager, id }
    }

    /// Apply one sample. Returns whether a position was stored.
    pub fn observe(&self, sample: PlaybackSample) -> bool {
        let Some(position) = sample.position() else {
            return false;
        };
        self.manager.update_watch_progress(self.id, position)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_normalizes() {
        assert_eq!(PlaybackSample::new(30.0, 120.0).position(), Some(0.25));
        assert_eq!(PlaybackSample::new(120.0, 120.0).position(), Some(1.0));
    }

    #[test]
    fn test_position_clamps_overrun() {
        // Players can report a tick past the declared duration
        assert_eq!(PlaybackSample::new(121.0, 120.0).position(), Some(1.0));
    }

    #[test]
    fn test_degenerate_samples_yield_none() {
        assert_eq!(PlaybackSample::new(0.0, 120.0).position(), None);
        assert_eq!(PlaybackSample::new(30.0, 0.0).position(), None);
        assert_eq!(PlaybackSample::new(0.0, 0.0).position(), None);
    }
}
