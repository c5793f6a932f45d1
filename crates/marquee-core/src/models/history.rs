use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A title the user started watching, for the "keep watching" row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub media_id: u32,
    pub title: String,
    pub poster_url: Option<String>,
    pub position_secs: u32,
    pub duration_secs: Option<u32>,
    pub watched_at: DateTime<Utc>,
}

impl WatchEntry {
    /// Playback progress as a whole percentage, if the duration is known.
    pub fn progress_percent(&self) -> Option<u8> {
        let duration = self.duration_secs.filter(|d| *d > 0)?;
        let pct = (u64::from(self.position_secs) * 100 / u64::from(duration)).min(100);
        Some(pct as u8)
    }

    pub fn is_finished(&self) -> bool {
        self.progress_percent().is_some_and(|p| p >= 95)
    }
}
