use async_trait::async_trait;
use std::time::Duration;

/// The loop's only suspension point between ticks.
#[async_trait]
pub trait Ticker: Send {
    async fn sleep(&mut self, interval: Duration);
}

/// Sleeps on the tokio clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTicker;

#[async_trait]
impl Ticker for TokioTicker {
    async fn sleep(&mut self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Returns immediately and records every requested sleep.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct FakeTicker {
    pub sleeps: Vec<Duration>,
}

#[cfg(test)]
impl FakeTicker {
    pub fn elapsed(&self) -> Duration {
        self.sleeps.iter().sum()
    }
}

#[cfg(test)]
#[async_trait]
impl Ticker for FakeTicker {
    async fn sleep(&mut self, interval: Duration) {
        self.sleeps.push(interval);
    }
}
