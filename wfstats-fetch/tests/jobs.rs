mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{job, rate_limited, run, workflow, MockClient};
use tokio_util::sync::CancellationToken;
use wfstats_fetch::{FetchError, JobFetcher, Limiter};

#[tokio::test]
async fn empty_input_launches_nothing() {
    let client = Arc::new(MockClient::default());
    let out = JobFetcher::new(client.clone(), Limiter::new(2))
        .fetch(&workflow(), &[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(out.items.is_empty());
    assert!(out.is_complete());
    assert_eq!(client.call_count(""), 0);
}

#[tokio::test]
async fn missing_jobs_are_not_errors() {
    let mut client = MockClient::default();
    client
        .jobs
        .insert((1, 1), Ok(vec![job(11, 1, 1, "build", "success"), job(12, 1, 1, "test", "failure")]));
    let client = Arc::new(client);

    let out = JobFetcher::new(client.clone(), Limiter::new(2))
        .fetch(&workflow(), &[run(1, 1, "success"), run(2, 1, "success")], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.items.len(), 2);
    assert!(out.is_complete());
    assert_eq!(client.call_count("list_jobs"), 2);
}

#[tokio::test]
async fn each_attempt_is_fetched_once() {
    let mut client = MockClient::default();
    client.jobs.insert((1, 1), Ok(vec![job(11, 1, 1, "build", "failure")]));
    client.jobs.insert((1, 2), Ok(vec![job(21, 1, 2, "build", "success")]));
    let client = Arc::new(client);

    let runs = [run(1, 1, "failure"), run(1, 2, "success"), run(1, 2, "success")];
    let out = JobFetcher::new(client.clone(), Limiter::new(2))
        .fetch(&workflow(), &runs, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.items.len(), 2);
    assert_eq!(client.call_count("list_jobs:1:2"), 1);
}

#[tokio::test]
async fn rate_limit_does_not_abort_other_attempts() {
    let mut client = MockClient::default();
    client.jobs.insert((1, 1), Ok(vec![job(11, 1, 1, "build", "success")]));
    client.jobs.insert((2, 1), Err(rate_limited("list_jobs_for_attempt")));
    client.jobs.insert((3, 1), Ok(vec![job(31, 3, 1, "build", "failure")]));
    let client = Arc::new(client);

    let runs = [run(1, 1, "success"), run(2, 1, "success"), run(3, 1, "failure")];
    let out = JobFetcher::new(client.clone(), Limiter::new(1))
        .fetch(&workflow(), &runs, &CancellationToken::new())
        .await
        .unwrap();

    let mut ids: Vec<u64> = out.items.iter().map(|j| j.id).collect();
    ids.sort();
    assert_eq!(ids, [11, 31]);
    assert!(out.is_rate_limited());
    assert_eq!(client.call_count("list_jobs"), 3);
}

#[tokio::test]
async fn failure_with_nothing_gathered_is_an_error() {
    let mut client = MockClient::default();
    client.jobs.insert((1, 1), Err(FetchError::Timeout));
    let client = Arc::new(client);

    let result = JobFetcher::new(client, Limiter::new(1))
        .fetch(&workflow(), &[run(1, 1, "success")], &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(FetchError::Timeout)));
}

#[tokio::test(start_paused = true)]
async fn job_requests_stay_within_the_limiter() {
    let mut client = MockClient {
        delay: Some(Duration::from_millis(10)),
        ..MockClient::default()
    };
    let runs: Vec<_> = (1..=20).map(|id| run(id, 1, "success")).collect();
    for r in &runs {
        client.jobs.insert((r.id, 1), Ok(vec![job(r.id * 10, r.id, 1, "build", "success")]));
    }
    let client = Arc::new(client);

    let out = JobFetcher::new(client.clone(), Limiter::new(3))
        .fetch(&workflow(), &runs, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.items.len(), 20);
    assert!(client.peak() <= 3);
    assert!(client.peak() >= 2);
}
