use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::store::Document;

pub const CREATED_AT: &str = "createdAt";
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fields that never leave the marketplace service.
pub const PROVIDER_PRIVATE_FIELDS: [&str; 1] = ["email"];

/// Render an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
/// Anything that is not a timestamp is left untouched.
pub fn format_timestamp(value: &mut Value) {
    if let Value::String(raw) = value {
        if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
            *raw = time.with_timezone(&Utc).format(DISPLAY_TIME_FORMAT).to_string();
        }
    }
}

pub fn service_request_record(doc: Document) -> Map<String, Value> {
    let mut record = doc.into_record();
    if let Some(created_at) = record.get_mut(CREATED_AT) {
        format_timestamp(created_at);
    }
    record
}

pub fn provider_record(doc: Document) -> Map<String, Value> {
    let mut record = doc.into_record();
    for field in PROVIDER_PRIVATE_FIELDS {
        record.remove(field);
    }
    record
}
