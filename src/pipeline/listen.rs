// src/pipeline/listen.rs

//! JSON-lines front-end: one `InboundMessage` per line, processed with
//! bounded concurrency.

use std::collections::BTreeMap;

use futures::{StreamExt, stream};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::models::InboundMessage;
use crate::pipeline::Relay;

/// Counters for one listening session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListenSummary {
    /// Lines that parsed into a message
    pub received: usize,
    /// Lines that were not valid message JSON
    pub invalid: usize,
    /// Outcome label → count
    pub outcomes: BTreeMap<&'static str, usize>,
}

/// Consume `reader` until EOF, handing every message to `relay`.
///
/// Blank lines are skipped. Malformed lines are logged and counted, never
/// fatal; a read error ends the session.
pub async fn listen<R>(relay: &Relay, reader: R) -> ListenSummary
where
    R: AsyncBufRead + Unpin,
{
    let limit = relay.config().relay.max_concurrent.max(1);
    let mut received = 0usize;
    let mut invalid = 0usize;
    log::info!("Listening for messages (concurrency {})", limit);

    let lines = stream::unfold(reader.lines(), |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None,
            Err(e) => {
                log::error!("Stopped reading messages: {}", e);
                None
            }
        }
    });

    let outcomes = lines
        .filter_map(|line| {
            let message = match parse_line(&line) {
                Some(Ok(message)) => {
                    received += 1;
                    Some(message)
                }
                Some(Err(e)) => {
                    log::warn!("Skipping malformed message: {}", e);
                    invalid += 1;
                    None
                }
                None => None,
            };
            async move { message }
        })
        .map(|message| async move {
            relay.handle_message(&message.text, &message.sender).await
        })
        .buffer_unordered(limit)
        .fold(BTreeMap::new(), |mut counts, outcome| async move {
            *counts.entry(outcome.label()).or_insert(0) += 1;
            counts
        })
        .await;

    ListenSummary {
        received,
        invalid,
        outcomes,
    }
}

fn parse_line(line: &str) -> Option<serde_json::Result<InboundMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}
