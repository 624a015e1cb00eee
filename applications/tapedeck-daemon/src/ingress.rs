//! Command ingress
//!
//! Producers hand in text: either a bare command word (`next`, `vol+`,
//! `PLAY/PAUSE`, ...) or a JSON payload such as `{"event": "NEXT"}` or
//! `{"event": 1, "song_id": 3}`. `song_id` is accepted and ignored; the
//! controller records the index that is current when the command lands.
//! Anything else is rejected here and never reaches the command channel.

use serde::Deserialize;
use std::io::BufRead;
use tapedeck_core::{Command, DeckError};
use tapedeck_playback::CommandSender;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventField {
    Code(u8),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct Payload {
    event: EventField,
}

/// Parse one producer message into a command
///
/// Payload fields other than `event` are ignored.
pub fn parse_command(input: &str) -> tapedeck_core::Result<Command> {
    let input = input.trim();
    if !input.starts_with('{') {
        return input.parse();
    }

    let payload: Payload = serde_json::from_str(input)
        .map_err(|e| DeckError::invalid_command(format!("{input}: {e}")))?;

    match payload.event {
        EventField::Code(code) => Command::from_code(code)
            .ok_or_else(|| DeckError::invalid_command(format!("unknown event code {code}"))),
        EventField::Name(name) => name.parse(),
    }
}

/// Lines read by [`pump`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngressStats {
    pub accepted: u64,
    pub rejected: u64,
}

/// Forward every line of `reader` to the command channel
///
/// Blank lines are skipped and invalid ones logged and dropped. Returns at
/// end of input or once the controller is gone.
pub fn pump<R: BufRead>(reader: R, commands: &CommandSender) -> IngressStats {
    let mut stats = IngressStats::default();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Command input failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                if commands.enqueue(command).is_err() {
                    tracing::info!("Controller gone, ingress stopping");
                    break;
                }
                tracing::debug!(command = %command, "Command submitted");
                stats.accepted += 1;
            }
            Err(e) => {
                tracing::error!(input = line.trim(), "Rejected command: {}", e);
                stats.rejected += 1;
            }
        }
    }

    stats
}
