//! Block startup until a relational database accepts connections.
//!
//! The probe is a two-state machine: it starts `Disconnected`, stays there
//! after every failed attempt, and moves to `Connected` (terminal) on the
//! first successful connect. Attempts are paced by a [`RetryPolicy`].

use async_trait::async_trait;
use sqlx::{
    Connection,
    postgres::{PgConnectOptions, PgConnection},
};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Result of a single failed probe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The server is not accepting connections yet; worth another try.
    #[error("not ready: {0}")]
    NotReady(String),
    /// Retrying cannot help (bad configuration, unusable options).
    #[error("fatal: {0}")]
    Fatal(String),
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("database still unreachable after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
    #[error("giving up after attempt {attempt}: {message}")]
    Fatal { attempt: u32, message: String },
}

/// One connection attempt against the dependency being waited on.
#[async_trait]
pub trait ConnectionProbe: Send {
    async fn probe(&mut self) -> Result<(), ProbeError>;
}

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(30),
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Unbounded retries at a constant interval.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
        }
    }

    /// Delay to sleep after the `failed_attempts`-th consecutive failure
    /// (1-based). Grows geometrically and is capped at `max_delay`.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(64) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = self.initial_delay.as_secs_f64() * factor;
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Probe until the dependency answers, the policy runs out, or a fatal
/// error is reported.
pub async fn wait_until_ready<P>(
    probe: &mut P,
    policy: &RetryPolicy,
) -> Result<ProbeReport, ReadinessError>
where
    P: ConnectionProbe + ?Sized,
{
    let started = Instant::now();
    let mut state = ConnectionState::Disconnected;
    let mut attempts = 0u32;

    while state == ConnectionState::Disconnected {
        attempts += 1;
        match probe.probe().await {
            Ok(()) => {
                state = ConnectionState::Connected;
                info!(attempts, "connection to database succeeded");
            }
            Err(ProbeError::Fatal(message)) => {
                return Err(ReadinessError::Fatal {
                    attempt: attempts,
                    message,
                });
            }
            Err(ProbeError::NotReady(reason)) => {
                if policy.exhausted(attempts) {
                    return Err(ReadinessError::Exhausted {
                        attempts,
                        last_error: reason,
                    });
                }
                let delay = policy.delay_for(attempts);
                warn!(
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    %reason,
                    "unable to connect to database, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    Ok(ProbeReport {
        attempts,
        elapsed: started.elapsed(),
    })
}

/// Opens (and immediately closes) a single Postgres connection.
pub struct PostgresProbe {
    options: PgConnectOptions,
}

impl PostgresProbe {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ConnectionProbe for PostgresProbe {
    async fn probe(&mut self) -> Result<(), ProbeError> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(classify)?;
        conn.close().await.map_err(classify)
    }
}

/// Map a driver error onto retry semantics: anything that looks like the
/// server being absent or still starting is `NotReady`.
fn classify(err: sqlx::Error) -> ProbeError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::Database(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ProbeError::NotReady(err.to_string()),
        other => ProbeError::Fatal(other.to_string()),
    }
}
