// ── Ribbon events ──
//
// A ribbon is a short-lived progress marker for one queue item. The queue
// managers produce a fresh batch every tick; nothing is remembered between
// ticks and duplicates are the consumer's problem.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::lenient;
use crate::service::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RibbonStage {
    Downloading,
    Moving,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RibbonEvent {
    pub item_key: String,
    pub source: Service,
    pub stage: RibbonStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    /// Unix seconds at which the event was produced.
    pub timestamp: i64,
}

impl RibbonEvent {
    /// Build a ribbon from one `/api/v3/queue` record.
    ///
    /// `title_paths` are tried in order; `fallback_title` covers records
    /// that name nothing at all.
    pub fn from_queue_record(
        source: Service,
        record: &Value,
        title_paths: &[&str],
        fallback_title: &str,
    ) -> Self {
        let size = lenient::number(record.get("size")).unwrap_or(0.0);
        let left = lenient::number(record.get("sizeleft")).unwrap_or(0.0);
        let status = lower_str(record.get("status"));

        let item_key = match record.get("id").filter(|id| !id.is_null()) {
            Some(Value::String(id)) => format!("{}-{id}", source.key()),
            Some(id) => format!("{}-{id}", source.key()),
            None => format!("{}-{}", source.key(), Uuid::new_v4().simple()),
        };
        let title = lenient::first_str(record, title_paths).unwrap_or(fallback_title);

        Self {
            item_key,
            source,
            stage: stage(size, left, &status, awaiting_import(record)),
            title: Some(title.to_owned()),
            percent: (size > 0.0).then(|| lenient::percent((size - left) / size * 100.0)),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// A queue record whose download finished or is waiting on the import step.
pub(crate) fn awaiting_import(record: &Value) -> bool {
    lower_str(record.get("status")).contains("complete")
        || lower_str(record.get("trackedDownloadState")).contains("importpending")
}

fn stage(size: f64, left: f64, status: &str, awaiting_import: bool) -> RibbonStage {
    if status.contains("complete") && size > 0.0 && left == 0.0 {
        RibbonStage::Complete
    } else if awaiting_import {
        RibbonStage::Moving
    } else {
        RibbonStage::Downloading
    }
}

fn lower_str(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}
