use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::trace::trace_model::ActionEvent;

/// JSONL log of the actions committed in one recording session.
///
/// Opening the log truncates it, so a re-recorded task never mixes events of
/// two sessions. A log that cannot be opened or written is switched off with
/// a warning; the session carries on without it.
pub struct TraceLogger {
    out: Option<BufWriter<File>>,
}

impl TraceLogger {
    pub fn new(path: &Path) -> Self {
        match File::create(path) {
            Ok(file) => Self {
                out: Some(BufWriter::new(file)),
            },
            Err(e) => {
                warn!("Could not open action log '{}': {}", path.display(), e);
                Self { out: None }
            }
        }
    }

    /// Append one event and flush it to disk.
    pub fn log(&mut self, event: &ActionEvent) {
        let Some(out) = self.out.as_mut() else {
            return;
        };

        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(out))
            .and_then(|()| out.flush());

        if let Err(e) = written {
            warn!("Action log disabled after write failure: {}", e);
            self.out = None;
        }
    }
}
