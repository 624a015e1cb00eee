//! Journal entries and their export form

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tapedeck_core::{Command, TrackId};

/// `strftime` pattern used for exported timestamps
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// One accepted command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Command that was accepted
    pub event: Command,
    /// Track index current when the command arrived
    pub song_id: TrackId,
    /// Epoch seconds, `None` when the clock was not set
    pub timestamp: Option<i64>,
}

impl JournalEntry {
    /// Build an entry
    pub fn new(event: Command, song_id: TrackId, timestamp: Option<i64>) -> Self {
        Self {
            event,
            song_id,
            timestamp,
        }
    }

    /// Render the entry for export in the given time zone
    pub fn export_in<Tz: TimeZone>(&self, tz: &Tz) -> ExportedEntry
    where
        Tz::Offset: Display,
    {
        ExportedEntry {
            event: self.event.as_str(),
            song_id: self.song_id,
            timestamp: self.timestamp.and_then(|secs| format_timestamp(secs, tz)),
        }
    }
}

impl Default for JournalEntry {
    // Zeroed slot
    fn default() -> Self {
        Self::new(Command::ToggleAudio, 0, None)
    }
}

/// Exported view of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedEntry {
    /// Command name, e.g. `PLAY/PAUSE`
    pub event: &'static str,
    /// Track index
    pub song_id: TrackId,
    /// Formatted local time, `null` when unknown
    pub timestamp: Option<String>,
}

/// Format epoch seconds with [`TIMESTAMP_FORMAT`]
///
/// Returns `None` for a zero timestamp or one outside chrono's range.
pub fn format_timestamp<Tz: TimeZone>(secs: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: Display,
{
    if secs == 0 {
        return None;
    }
    let utc = DateTime::from_timestamp(secs, 0)?;
    Some(utc.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn formats_in_month_day_year_order() {
        // 2023-11-14T22:13:20Z
        assert_eq!(
            format_timestamp(1_700_000_000, &Utc).as_deref(),
            Some("11/14/2023 22:13:20")
        );
    }

    #[test]
    fn zero_timestamp_exports_as_null() {
        assert_eq!(format_timestamp(0, &Utc), None);

        let exported = JournalEntry::new(Command::Stop, 2, Some(0)).export_in(&Utc);
        assert_eq!(exported.timestamp, None);
    }

    #[test]
    fn export_uses_display_names() {
        let exported = JournalEntry::new(Command::VolumeDown, 7, None).export_in(&Utc);
        let json = serde_json::to_value(&exported).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"event": "VOLUME_DOWN", "song_id": 7, "timestamp": null})
        );
    }

    #[test]
    fn default_slot_is_zeroed() {
        let slot = JournalEntry::default();
        assert_eq!(slot.song_id, 0);
        assert_eq!(slot.timestamp, None);
    }
}
