use async_trait::async_trait;
use serverless_kit::services::readiness::{ConnectionProbe, ProbeError};

/// Fails with `NotReady` a fixed number of times, then succeeds forever.
pub struct FlakyProbe {
    failures_left: u32,
    pub calls: u32,
}

impl FlakyProbe {
    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: times,
            calls: 0,
        }
    }
}

#[async_trait]
impl ConnectionProbe for FlakyProbe {
    async fn probe(&mut self) -> Result<(), ProbeError> {
        self.calls += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(ProbeError::NotReady("connection refused".into()));
        }
        Ok(())
    }
}

/// Always fails with the given error.
pub struct BrokenProbe {
    pub error: ProbeError,
    pub calls: u32,
}

#[async_trait]
impl ConnectionProbe for BrokenProbe {
    async fn probe(&mut self) -> Result<(), ProbeError> {
        self.calls += 1;
        Err(self.error.clone())
    }
}
