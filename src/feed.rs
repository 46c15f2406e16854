//! Event feed abstraction and the JSON-lines file source

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::info;

use crate::events::EventEnvelope;

/// Ordered, pull-based source of decoded chain events.
///
/// Implementations yield envelopes in on-chain order: ascending block number,
/// then ascending log index within a block. `None` means the feed is
/// exhausted.
#[async_trait]
pub trait EventFeed: Send {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>>;
}

/// File-backed feed: one JSON-encoded envelope per line.
///
/// Stands in for a live log subscription; a capture of decoded contract logs
/// can be replayed through the projector from a flat file.
pub struct JsonFileFeed {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl JsonFileFeed {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open event feed {}", path.display()))?;
        info!("Reading event feed from {}", path.display());
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

#[async_trait]
impl EventFeed for JsonFileFeed {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line.context("failed to read event feed line")?;
            if line.trim().is_empty() {
                continue;
            }
            let envelope: EventEnvelope = serde_json::from_str(&line)
                .with_context(|| format!("malformed event on feed line {}", self.line_no))?;
            return Ok(Some(envelope));
        }
        Ok(None)
    }
}

/// In-memory feed over a fixed event sequence, used in tests.
#[derive(Debug, Default)]
pub struct VecFeed {
    events: VecDeque<EventEnvelope>,
}

impl VecFeed {
    pub fn new(events: Vec<EventEnvelope>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

#[async_trait]
impl EventFeed for VecFeed {
    async fn next_event(&mut self) -> Result<Option<EventEnvelope>> {
        Ok(self.events.pop_front())
    }
}
