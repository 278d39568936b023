mod support;

use serverless_kit::services::readiness::{
    PostgresProbe, ProbeError, ReadinessError, RetryPolicy, wait_until_ready,
};
use sqlx::postgres::PgConnectOptions;
use std::{net::TcpListener, time::Duration};
use support::probe::{BrokenProbe, FlakyProbe};

/// Paused-clock timers fire on millisecond ticks, so allow a little slack.
fn assert_waited(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(20),
        "waited {elapsed:?}, expected about {expected:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_n_failures_with_n_plus_one_attempts() {
    let mut probe = FlakyProbe::failing(3);
    let policy = RetryPolicy::fixed(Duration::from_secs(1));

    let report = wait_until_ready(&mut probe, &policy).await.unwrap();

    assert_eq!(report.attempts, 4);
    assert_eq!(probe.calls, 4);
    // One fixed one-second pause after each failure, none after success.
    assert_waited(report.elapsed, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn immediate_success_does_not_sleep() {
    let mut probe = FlakyProbe::failing(0);
    let report = wait_until_ready(&mut probe, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(report.attempts, 1);
    assert_waited(report.elapsed, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn never_probes_again_after_connecting() {
    let mut probe = FlakyProbe::failing(1);
    let policy = RetryPolicy::fixed(Duration::from_millis(10));

    wait_until_ready(&mut probe, &policy).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(probe.calls, 2);
}

#[tokio::test(start_paused = true)]
async fn bounded_policy_gives_up_with_last_error() {
    let mut probe = FlakyProbe::failing(u32::MAX);
    let policy = RetryPolicy {
        max_attempts: Some(4),
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(250),
        multiplier: 2.0,
    };

    let err = wait_until_ready(&mut probe, &policy).await.unwrap_err();

    match err {
        ReadinessError::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 4);
            assert_eq!(last_error, "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(probe.calls, 4);
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_until_capped() {
    let mut probe = FlakyProbe::failing(4);
    let policy = RetryPolicy {
        max_attempts: Some(10),
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(250),
        multiplier: 2.0,
    };

    let report = wait_until_ready(&mut probe, &policy).await.unwrap();

    // 100 + 200 + 250 + 250
    assert_eq!(report.attempts, 5);
    assert_waited(report.elapsed, Duration::from_millis(800));
}

#[tokio::test(start_paused = true)]
async fn fatal_errors_stop_immediately() {
    let mut probe = BrokenProbe {
        error: ProbeError::Fatal("invalid connection options".into()),
        calls: 0,
    };

    let err = wait_until_ready(&mut probe, &RetryPolicy::fixed(Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, ReadinessError::Fatal { attempt: 1, .. }));
    assert_eq!(probe.calls, 1);
}

#[tokio::test]
async fn postgres_probe_treats_refused_connection_as_not_ready() {
    // Bind and release a port so nothing is listening on it.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(port)
        .username("postgres")
        .database("postgres");
    let mut probe = PostgresProbe::new(options);
    let policy = RetryPolicy {
        max_attempts: Some(2),
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(10),
        multiplier: 1.0,
    };

    let err = wait_until_ready(&mut probe, &policy).await.unwrap_err();

    assert!(
        matches!(err, ReadinessError::Exhausted { attempts: 2, .. }),
        "unexpected error: {err}"
    );
}
