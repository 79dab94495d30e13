//! Recorded load/unload events, one JSON object per line.
//!
//! ```text
//! {"event":"load","type":{"identity":1,"name":"java/lang/Object","loader":"builtin"}}
//! {"event":"load","type":{...},"origin":{"source":"file:/opt/app.jar"}}
//! {"event":"unload","identity":1}
//! ```

use anyhow::{Context, Result};
use classlist_core::{ByteOrigin, ClassListWriter, LoadOutcome, TypeIdentity, TypeRecord};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Load {
        #[serde(rename = "type")]
        ty: TypeRecord,
        #[serde(default)]
        origin: Option<ByteOrigin>,
    },
    Unload {
        identity: TypeIdentity,
    },
}

/// Counts reported after a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub recorded: usize,
    pub rejected: usize,
    pub unloaded: usize,
    pub disabled: usize,
}

/// Feed every event from `reader` to `writer` in order.
pub fn replay(reader: impl BufRead, writer: &ClassListWriter) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read event line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line)
            .with_context(|| format!("Invalid event on line {}", index + 1))?;

        match event {
            Event::Load { ty, origin } => match writer.on_type_loaded(&ty, origin.as_ref()) {
                LoadOutcome::Recorded { .. } => summary.recorded += 1,
                LoadOutcome::Rejected(_) => summary.rejected += 1,
                LoadOutcome::Disabled => summary.disabled += 1,
            },
            Event::Unload { identity } => {
                writer.on_type_unloaded(identity);
                summary.unloaded += 1;
            }
        }
    }

    Ok(summary)
}
