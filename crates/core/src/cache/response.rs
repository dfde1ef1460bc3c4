//! Response snapshots as stored in, and served from, a cache store.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};

/// Header recording when an entry was written, in milliseconds since the
/// Unix epoch.
pub const TIMESTAMP_HEADER: &str = "sw-cache-timestamp";

/// Status, headers and body of a response, detached from any connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub status_text: String,
    /// Header pairs in arrival order. Names compare case-insensitively.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    /// Builder form of [`ResponseSnapshot::set_header`].
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Replace every header called `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// True for 2xx statuses, the only responses that get stored.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Copy carrying an insertion timestamp for `now`.
    pub fn stamped(&self, now: DateTime<Utc>) -> Self {
        self.clone()
            .with_header(TIMESTAMP_HEADER, now.timestamp_millis().to_string())
    }

    /// Insertion time, if the entry was stamped.
    ///
    /// A header that does not parse is treated as absent.
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.header(TIMESTAMP_HEADER)?.trim().parse().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Whether the entry is too old to satisfy a request at `now`.
    ///
    /// Entries without a timestamp never expire.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Some(stored_at) = self.stored_at() else {
            return false;
        };
        let age_ms = now.signed_duration_since(stored_at).num_milliseconds();
        age_ms > 0 && age_ms as u128 > ttl.as_millis()
    }

    /// Body as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
