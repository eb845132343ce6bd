//! Record store over the backing key-value namespace.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::records::types::{
    BulkReport, ChapterId, ChapterStatus, PutAck, Record, StatusReport,
};
use crate::store::{KvError, KvStore};

/// Get/put access to chapter records.
///
/// Every call goes straight to the backing store; nothing is buffered here.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KvStore>,
    namespace: String,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KvStore>, namespace: impl Into<String>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fetch a record. The range check happens before any storage access.
    pub async fn get_record(&self, id: i64) -> GatewayResult<Record> {
        let id = ChapterId::new(id)?;
        match self.load(id).await? {
            Some(record) => Ok(record),
            None => Err(GatewayError::RecordNotFound { chapter: id.get() }),
        }
    }

    /// Validate, stamp and store a record, replacing any previous one.
    pub async fn put_record(&self, id: i64, mut record: Record) -> GatewayResult<PutAck> {
        let id = ChapterId::new(id)?;

        if record.verses.is_empty() {
            metrics::record_record_write("rejected");
            return Err(GatewayError::validation(
                "Invalid chapter data",
                "Chapter data must include at least one verse",
            ));
        }

        let stored_at = crate::now_millis();
        record.chapter = Some(id.get());
        record.stored_at = Some(stored_at);

        let value = serde_json::to_string(&record).map_err(KvError::from)?;
        self.kv.put(&id.key(), value, None).await?;
        metrics::record_record_write("stored");

        tracing::info!(
            chapter = id.get(),
            verses = record.verse_count(),
            "Chapter stored"
        );

        Ok(PutAck {
            success: true,
            chapter: id.get(),
            verse_count: record.verse_count(),
            message: "Chapter stored successfully".to_string(),
            stored_at,
        })
    }

    /// Store many records independently. One entry failing never stops the rest.
    pub async fn bulk_put(&self, chapters: Map<String, Value>) -> BulkReport {
        let mut report = BulkReport::default();

        for (raw_id, body) in chapters {
            let outcome = match ChapterId::parse(&raw_id) {
                Ok(id) => match serde_json::from_value::<Record>(body) {
                    Ok(record) => self.put_record(id.into(), record).await.map(|_| ()),
                    Err(e) => Err(GatewayError::validation("Invalid chapter data", e.to_string())),
                },
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    report.success += 1;
                    report.chapters.insert(raw_id, "success".to_string());
                }
                Err(e) => {
                    tracing::warn!(chapter = %raw_id, error = %e, "Bulk entry rejected");
                    report.failed += 1;
                    let reason = match e {
                        GatewayError::OutOfRangeId { .. } => "Invalid chapter number".to_string(),
                        other => format!("Error: {}", other),
                    };
                    report.chapters.insert(raw_id, reason);
                }
            }
        }

        tracing::info!(
            success = report.success,
            failed = report.failed,
            "Bulk population completed"
        );
        report
    }

    /// Probe a fixed sample of chapters.
    pub async fn status(&self, sample: &[i64]) -> GatewayResult<StatusReport> {
        let mut report = StatusReport::default();

        for raw in sample {
            let id = ChapterId::new(*raw)?;
            let status = match self.load(id).await? {
                Some(record) => {
                    report.available += 1;
                    ChapterStatus {
                        available: true,
                        verse_count: Some(record.verse_count()),
                        stored_at: record.stored_at,
                    }
                }
                None => {
                    report.missing += 1;
                    ChapterStatus {
                        available: false,
                        verse_count: None,
                        stored_at: None,
                    }
                }
            };
            report.chapters.insert(id.get(), status);
        }

        Ok(report)
    }

    /// Read any key of the namespace without interpreting it.
    pub async fn raw(&self, key: &str) -> GatewayResult<Option<String>> {
        Ok(self.kv.get(key).await?)
    }

    async fn load(&self, id: ChapterId) -> GatewayResult<Option<Record>> {
        match self.kv.get(&id.key()).await? {
            Some(raw) => {
                let record = serde_json::from_str(&raw).map_err(KvError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}
