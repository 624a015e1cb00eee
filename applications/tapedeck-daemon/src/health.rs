/// Periodic health line built from the newest journal entry
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tapedeck_journal::CircularJournal;

/// One health line
pub fn describe(journal: &CircularJournal) -> String {
    match journal.peek_latest() {
        Some(entry) => {
            let exported = entry.export_in(&Local);
            format!(
                "latest {} on track {} at {} ({}/{} entries)",
                exported.event,
                exported.song_id,
                exported.timestamp.as_deref().unwrap_or("unknown time"),
                journal.len(),
                journal.capacity()
            )
        }
        None => "journal empty".to_string(),
    }
}

/// Log [`describe`] every `period` until the task is aborted
pub fn spawn(journal: Arc<CircularJournal>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::info!(target: "tapedeck::health", "{}", describe(&journal));
        }
    })
}
