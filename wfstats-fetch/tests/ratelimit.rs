use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use wfstats_fetch::client::ratelimit::rate_limit_from_headers;

fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn retry_after_delta_seconds() {
    let h = headers(&[("Retry-After", "42")]);
    let rl = rate_limit_from_headers(429, &h, "list_runs", SystemTime::now()).unwrap();
    assert_eq!(rl.retry_after, Duration::from_secs(42));
    assert_eq!(rl.resource, "core");
}

#[test]
fn retry_after_http_date() {
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_445_412_470);
    let h = headers(&[("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT")]);
    let rl = rate_limit_from_headers(403, &h, "get_run_attempt", now).unwrap();
    assert_eq!(rl.retry_after, Duration::from_secs(10));
}

#[test]
fn reset_header_drives_retry_after_when_no_hint() {
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
    let h = headers(&[
        ("X-RateLimit-Remaining", "0"),
        ("X-RateLimit-Limit", "60"),
        ("X-RateLimit-Reset", "1300"),
        ("X-RateLimit-Resource", "search"),
    ]);
    let rl = rate_limit_from_headers(403, &h, "list_runs", now).unwrap();
    assert_eq!(rl.retry_after, Duration::from_secs(300));
    assert_eq!(rl.limit, 60);
    assert_eq!(rl.resource, "search");
    assert_eq!(rl.reset_at.timestamp(), 1300);
}

#[test]
fn other_responses_are_not_rate_limits() {
    let now = SystemTime::now();
    let exhausted = headers(&[("x-ratelimit-remaining", "0")]);
    assert!(rate_limit_from_headers(500, &exhausted, "list_runs", now).is_none());

    let healthy = headers(&[("x-ratelimit-remaining", "12")]);
    assert!(rate_limit_from_headers(403, &healthy, "list_runs", now).is_none());
    assert!(rate_limit_from_headers(429, &BTreeMap::new(), "list_runs", now).is_none());
}
