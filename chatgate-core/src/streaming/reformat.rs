//! The reformatter task
//!
//! Reads the primary backend's body, decodes it unit by unit and writes one
//! `{"response": ...}` line per text fragment into a bounded channel. The
//! receiving half becomes the HTTP response body.

use super::{DecodeSkip, FragmentExtractor, FrameDecoder};
use crate::protocol::OutputRecord;
use crate::providers::adapter::PrimaryStream;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// How the reformatter loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The source signalled end-of-data
    Completed,
    /// Reading the source failed; the output was truncated
    UpstreamError,
    /// The receiver went away (caller disconnected)
    ClientGone,
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReformatSummary {
    pub records: usize,
    pub skipped: usize,
    pub end: StreamEnd,
}

/// Start the reformatter on its own task and return the output channel
///
/// Dropping the receiver stops the task and releases the upstream body.
pub fn spawn_reformatter(
    stream: PrimaryStream,
    capacity: usize,
    request_id: Uuid,
) -> mpsc::Receiver<Bytes> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        let summary = run(stream, tx, request_id).await;
        info!(
            "Stream finished ({:?}): {} records, {} skipped units [request_id: {}]",
            summary.end, summary.records, summary.skipped, request_id
        );
    });
    rx
}

/// Drive the pull loop until the source ends, fails, or the caller leaves
pub async fn run(
    stream: PrimaryStream,
    tx: mpsc::Sender<Bytes>,
    request_id: Uuid,
) -> ReformatSummary {
    let PrimaryStream {
        mut body,
        framing,
        extract,
    } = stream;
    let mut decoder = FrameDecoder::new(framing);
    let mut writer = RecordWriter {
        tx,
        extract,
        request_id,
        records: 0,
        skipped: 0,
    };

    let end = loop {
        let next = tokio::select! {
            next = body.next() => next,
            _ = writer.tx.closed() => break StreamEnd::ClientGone,
        };

        match next {
            Some(Ok(bytes)) => {
                if !writer.emit(decoder.push(&bytes)).await {
                    break StreamEnd::ClientGone;
                }
            }
            Some(Err(e)) => {
                error!("Stream processing error: {} [request_id: {}]", e, request_id);
                break StreamEnd::UpstreamError;
            }
            None => {
                if !writer.emit(decoder.finish()).await {
                    break StreamEnd::ClientGone;
                }
                break StreamEnd::Completed;
            }
        }
    };

    // Closes the backend connection if it is still open
    drop(body);

    ReformatSummary {
        records: writer.records,
        skipped: writer.skipped,
        end,
    }
}

struct RecordWriter {
    tx: mpsc::Sender<Bytes>,
    extract: FragmentExtractor,
    request_id: Uuid,
    records: usize,
    skipped: usize,
}

impl RecordWriter {
    /// Write one line per decodable unit; false once the receiver is gone
    async fn emit(&mut self, units: Vec<Result<String, DecodeSkip>>) -> bool {
        for unit in units {
            let fragment = unit.and_then(|unit| (self.extract)(&unit));
            match fragment {
                Ok(text) => {
                    let line = OutputRecord::response(text).to_line();
                    if self.tx.send(line).await.is_err() {
                        return false;
                    }
                    self.records += 1;
                }
                Err(skip) => {
                    debug!("Skipping stream unit: {} [request_id: {}]", skip, self.request_id);
                    self.skipped += 1;
                }
            }
        }
        true
    }
}
