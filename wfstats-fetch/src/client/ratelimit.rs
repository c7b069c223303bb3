//! Rate-limit detection from response headers.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use httpdate::parse_http_date;

use crate::error::RateLimitError;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);
const DEFAULT_RESOURCE: &str = "core";

/// Builds a [`RateLimitError`] when a 403/429 response carries exhausted
/// quota or a `retry-after` hint. Any other response yields `None`.
pub fn rate_limit_from_headers(
    status: u16,
    headers: &BTreeMap<String, String>,
    operation: &str,
    now: SystemTime,
) -> Option<RateLimitError> {
    if status != 403 && status != 429 {
        return None;
    }

    let remaining = header_u64(headers, "x-ratelimit-remaining");
    let retry_header = get_header_ci(headers, "retry-after");
    if remaining != Some(0) && retry_header.is_none() {
        return None;
    }

    let reset = header_u64(headers, "x-ratelimit-reset")
        .map(|ts| SystemTime::UNIX_EPOCH + Duration::from_secs(ts));
    let retry_after = retry_header
        .and_then(|v| parse_retry_after_value(v, now))
        .or_else(|| reset.map(|r| r.duration_since(now).unwrap_or(Duration::ZERO)))
        .unwrap_or(DEFAULT_RETRY_AFTER);
    let reset_at = reset.unwrap_or(now + retry_after);

    Some(RateLimitError {
        limit: header_u64(headers, "x-ratelimit-limit").unwrap_or(0),
        remaining: remaining.unwrap_or(0),
        reset_at: DateTime::<Utc>::from(reset_at),
        retry_after,
        resource: get_header_ci(headers, "x-ratelimit-resource")
            .unwrap_or(DEFAULT_RESOURCE)
            .to_string(),
        operation: operation.to_string(),
    })
}

fn parse_retry_after_value(v: &str, now: SystemTime) -> Option<Duration> {
    let v = v.trim();
    if let Ok(secs) = v.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let dt = parse_http_date(v).ok()?;
    Some(dt.duration_since(now).unwrap_or(Duration::ZERO))
}

fn header_u64(headers: &BTreeMap<String, String>, name: &str) -> Option<u64> {
    get_header_ci(headers, name)?.trim().parse().ok()
}

pub(crate) fn get_header_ci<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
