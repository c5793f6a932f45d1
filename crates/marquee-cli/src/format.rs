//! Display formatting helpers for terminal output.

use chrono::{DateTime, Utc};

use marquee_api::types::Media;

/// Running time in minutes as `1h 52m`.
pub fn runtime(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// One-line summary: `#7  Night Harbor (2025) · Movie · Action, Drama`.
pub fn media_line(media: &Media) -> String {
    let mut line = format!("#{:<4} {}", media.media_id, media.title);
    if let Some(year) = media.release_year {
        line.push_str(&format!(" ({year})"));
    }
    if let Some(ref kind) = media.media_type {
        line.push_str(&format!(" · {kind}"));
    }
    if !media.genres.is_empty() {
        line.push_str(&format!(" · {}", media.genre_names()));
    }
    line
}

pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = usize::from(percent.min(100)) * width / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled)
    )
}

/// Pager dots, the active one filled.
pub fn dots(count: usize, active: usize) -> String {
    (0..count)
        .map(|i| if i == active { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn relative_time(dt: &DateTime<Utc>) -> String {
    let secs = (Utc::now() - *dt).num_seconds().max(0);
    match secs {
        0..=59 => "just now".into(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime() {
        assert_eq!(runtime(45), "45m");
        assert_eq!(runtime(120), "2h");
        assert_eq!(runtime(112), "1h 52m");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------]   0%");
        assert_eq!(progress_bar(65, 10), "[######----]  65%");
        assert_eq!(progress_bar(100, 4), "[####] 100%");
    }

    #[test]
    fn test_dots() {
        assert_eq!(dots(3, 1), "○ ● ○");
        assert_eq!(dots(0, 0), "");
    }

    #[test]
    fn test_relative_time() {
        assert_eq!(relative_time(&Utc::now()), "just now");
        let earlier = Utc::now() - chrono::Duration::hours(3);
        assert_eq!(relative_time(&earlier), "3h ago");
    }
}
