//! Field extraction from decoded payloads.
//!
//! Extraction is a downstream step: it may be slow or fail, so scanners hand
//! payloads to an [`ExtractionWorker`] over a channel and move on to the next
//! file or frame immediately.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::models::{Field, ScannedRecord};

/// Label used when a payload is not in a recognised layout
pub const RAW_CONTENT_LABEL: &str = "Nội dung gốc";

/// CCCD labels in payload order
pub const CCCD_LABELS: [&str; 7] = [
    "Số CCCD",
    "Số CMND (Cũ)",
    "Họ và tên",
    "Ngày sinh",
    "Giới tính",
    "Địa chỉ thường trú",
    "Ngày cấp",
];

/// Turns a raw payload into an ordered list of distinct-label fields
pub trait FieldExtractor: Send + Sync {
    /// Extract fields from `raw`
    fn extract(&self, raw: &str) -> Result<Vec<Field>, ExtractError>;
}

/// `ddmmyyyy` -> `dd/mm/yyyy`; anything else is returned unchanged
pub fn format_date(value: &str) -> String {
    if value.len() == 8 && value.is_ascii() {
        format!("{}/{}/{}", &value[0..2], &value[2..4], &value[4..])
    } else {
        value.to_string()
    }
}

/// Parse the pipe-delimited CCCD layout
/// `ID|OldID|Name|DOB|Gender|Address|DateOfIssue`.
///
/// Returns `None` unless there are at least six parts and the first is a
/// 12-digit citizen number.
pub fn parse_cccd(raw: &str) -> Option<Vec<Field>> {
    if !raw.contains('|') {
        return None;
    }
    let parts: Vec<&str> = raw.split('|').collect();
    let id = parts[0];
    let looks_like_cccd = id.len() == 12 && id.bytes().all(|b| b.is_ascii_digit());
    if parts.len() < 6 || !looks_like_cccd {
        return None;
    }

    let part = |i: usize| parts.get(i).copied().unwrap_or("");
    let old_id = match part(1) {
        "" => "Không có",
        v => v,
    };

    Some(vec![
        Field::new(CCCD_LABELS[0], id),
        Field::new(CCCD_LABELS[1], old_id),
        Field::new(CCCD_LABELS[2], part(2)),
        Field::new(CCCD_LABELS[3], format_date(part(3))),
        Field::new(CCCD_LABELS[4], part(4)),
        Field::new(CCCD_LABELS[5], part(5)),
        Field::new(CCCD_LABELS[6], format_date(part(6))),
    ])
}

/// Local parser: CCCD layout first, raw-content field otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExtractor;

impl FieldExtractor for LocalExtractor {
    fn extract(&self, raw: &str) -> Result<Vec<Field>, ExtractError> {
        if raw.is_empty() {
            return Err(ExtractError::Empty);
        }
        match parse_cccd(raw) {
            Some(fields) => {
                debug!("payload parsed as CCCD");
                Ok(fields)
            }
            None => Ok(vec![Field::new(RAW_CONTENT_LABEL, raw)]),
        }
    }
}

/// Background thread running a [`FieldExtractor`] over submitted payloads.
///
/// Records come out in submission order. Payloads the extractor rejects are
/// logged and dropped. Finishing or dropping the worker drains what is
/// already queued and stops the thread, even while [`ExtractionWorker::sender`]
/// clones are still alive; later sends on those clones fail.
pub struct ExtractionWorker {
    tx: Option<Sender<String>>,
    shutdown: Option<Sender<()>>,
    records: Receiver<ScannedRecord>,
    handle: Option<JoinHandle<()>>,
}

/// Extract one payload; false once nobody reads records any more
fn extract_into<E: FieldExtractor>(extractor: &E, raw: String, out: &Sender<ScannedRecord>) -> bool {
    match extractor.extract(&raw) {
        Ok(fields) => out.send(ScannedRecord { raw, fields }).is_ok(),
        Err(err) => {
            warn!(%err, "field extraction failed");
            true
        }
    }
}

impl ExtractionWorker {
    /// Start a worker thread
    pub fn spawn<E: FieldExtractor + 'static>(extractor: E) -> Self {
        let (tx, rx) = unbounded::<String>();
        let (shutdown, stop) = bounded::<()>(0);
        let (record_tx, records) = unbounded();
        let handle = thread::spawn(move || {
            loop {
                select! {
                    recv(rx) -> msg => match msg {
                        Ok(raw) => {
                            if !extract_into(&extractor, raw, &record_tx) {
                                return;
                            }
                        }
                        Err(_) => return,
                    },
                    recv(stop) -> _ => {
                        for raw in rx.try_iter() {
                            if !extract_into(&extractor, raw, &record_tx) {
                                return;
                            }
                        }
                        debug!("extraction worker stopped");
                        return;
                    }
                }
            }
        });
        Self {
            tx: Some(tx),
            shutdown: Some(shutdown),
            records,
            handle: Some(handle),
        }
    }

    /// Handle for submitting payloads from other threads
    pub fn sender(&self) -> Option<Sender<String>> {
        self.tx.clone()
    }

    /// Queue a payload; never blocks on extraction
    pub fn submit(&self, raw: impl Into<String>) {
        if let Some(tx) = &self.tx {
            if tx.send(raw.into()).is_err() {
                debug!("extraction worker gone; payload dropped");
            }
        }
    }

    /// Records finished so far
    pub fn try_records(&self) -> Vec<ScannedRecord> {
        self.records.try_iter().collect()
    }

    /// Receiver of finished records
    pub fn records(&self) -> &Receiver<ScannedRecord> {
        &self.records
    }

    /// Stop accepting payloads, wait for the queue to drain and return the
    /// remaining records
    pub fn finish(mut self) -> Vec<ScannedRecord> {
        self.stop();
        self.records.try_iter().collect()
    }

    fn stop(&mut self) {
        self.tx.take();
        self.shutdown.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("extraction worker panicked");
            }
        }
    }
}

impl Drop for ExtractionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
