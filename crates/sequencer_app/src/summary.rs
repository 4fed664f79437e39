//! Order-insensitive run summary.

use std::path::PathBuf;

use dashmap::DashMap;
use serde::Serialize;
use sequencer_framework::{CollectionWriter, ProcessCode, ProcessError, ProcessResult, RunContext};
use tracing::info;

use crate::smearing::Hit;

/// Per-event digest of the hit collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    /// Event number.
    pub event: u64,
    /// Number of hits.
    pub hits: usize,
    /// Number of distinct elements hit.
    pub elements: usize,
    /// Hash of every hit position, bit for bit.
    pub checksum: u64,
}

impl EventSummary {
    /// Summarise the hits of one event.
    #[must_use]
    pub fn new(event: u64, hits: &[Hit]) -> Self {
        let mut elements: Vec<u32> = hits.iter().map(|h| h.element.0).collect();
        elements.sort_unstable();
        elements.dedup();
        Self {
            event,
            hits: hits.len(),
            elements: elements.len(),
            checksum: checksum(hits),
        }
    }
}

/// FNV-1a over the bit patterns of the hit coordinates.
fn checksum(hits: &[Hit]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let words = hits.iter().flat_map(|hit| {
        [
            u64::from(hit.particle),
            u64::from(hit.element.0),
            hit.local.x.to_bits(),
            hit.local.y.to_bits(),
        ]
    });
    words.fold(OFFSET, |hash, word| {
        word.to_le_bytes()
            .iter()
            .fold(hash, |h, byte| (h ^ u64::from(*byte)).wrapping_mul(PRIME))
    })
}

/// The whole run, sorted by event.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Events written.
    pub events: Vec<EventSummary>,
    /// Hits over all events.
    pub total_hits: usize,
}

/// Collects one [`EventSummary`] per event from any worker thread and
/// writes them, sorted, at the end of the run.
#[derive(Debug, Default)]
pub struct SummaryWriter {
    rows: DashMap<u64, EventSummary>,
    output: Option<PathBuf>,
}

impl SummaryWriter {
    /// Create a writer. Without `output` the summary is logged.
    #[must_use]
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            rows: DashMap::new(),
            output,
        }
    }

    /// The summary collected so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut events: Vec<EventSummary> =
            self.rows.iter().map(|entry| entry.value().clone()).collect();
        events.sort_by_key(|row| row.event);
        let total_hits = events.iter().map(|row| row.hits).sum();
        RunSummary { events, total_hits }
    }
}

impl CollectionWriter<Vec<Hit>> for SummaryWriter {
    fn name(&self) -> &str {
        "SummaryWriter"
    }

    fn write_collection(&self, context: &RunContext<'_>, hits: &Vec<Hit>) -> ProcessResult {
        let row = EventSummary::new(context.event_number, hits);
        self.rows.insert(context.event_number, row);
        Ok(ProcessCode::Success)
    }

    fn end_run(&self) -> ProcessResult {
        let summary = self.summary();
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| ProcessError::failed(format!("serializing summary: {e}")))?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, json).map_err(|e| {
                    ProcessError::failed(format!("writing {}: {e}", path.display()))
                })?;
                info!(
                    path = %path.display(),
                    events = summary.events.len(),
                    hits = summary.total_hits,
                    "summary written"
                );
            }
            None => info!(
                events = summary.events.len(),
                hits = summary.total_hits,
                "run summary\n{json}"
            ),
        }
        Ok(ProcessCode::Success)
    }
}
