use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use super::fault::{DrawSource, FaultGenerator};
use super::payload::PayloadRecord;
use super::ticker::Ticker;
use crate::config::Config;
use crate::error::{InjectorError, Result};
use crate::mqtt::{Connector, Transport};

/// Owns the payload record and drives the publish loop.
pub struct FaultInjector<T, K, D> {
    transport: T,
    ticker: K,
    draws: D,
    generator: FaultGenerator,
    record: PayloadRecord,
    topic: String,
    interval: Duration,
    echo: Box<dyn Write + Send>,
}

impl<T, K, D> FaultInjector<T, K, D>
where
    T: Transport,
    K: Ticker,
    D: DrawSource,
{
    pub fn new(transport: T, ticker: K, draws: D, config: &Config) -> Self {
        Self {
            transport,
            ticker,
            draws,
            generator: FaultGenerator::new(config.fault.clone()),
            record: PayloadRecord::new(config.publisher.format),
            topic: config.publisher.topic.clone(),
            interval: config.publisher.interval(),
            echo: Box::new(std::io::stdout()),
        }
    }

    /// Replaces stdout as the destination of the per-tick payload line.
    pub fn with_echo(mut self, echo: Box<dyn Write + Send>) -> Self {
        self.echo = echo;
        self
    }

    #[allow(dead_code)]
    pub fn record(&self) -> &PayloadRecord {
        &self.record
    }

    /// Publishes forever at the configured cadence. Only returns on error.
    pub async fn run(&mut self) -> Result<Infallible> {
        info!(
            "Publishing fault codes to '{}' every {:?}",
            self.topic, self.interval
        );
        loop {
            self.tick().await?;
            self.ticker.sleep(self.interval).await;
        }
    }

    /// Runs `ticks` iterations, each followed by its sleep, and returns the
    /// published payloads in order.
    #[allow(dead_code)]
    pub async fn run_ticks(&mut self, ticks: usize) -> Result<Vec<String>> {
        let mut published = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            published.push(self.tick().await?);
            self.ticker.sleep(self.interval).await;
        }
        Ok(published)
    }

    /// One iteration without the trailing sleep.
    pub async fn tick(&mut self) -> Result<String> {
        self.record.error = self.generator.next_code(&mut self.draws);
        let payload = self.record.to_wire()?;

        self.transport.publish(&self.topic, &payload).await?;
        writeln!(self.echo, "{}", payload).map_err(InjectorError::Echo)?;
        debug!(
            "Published error={} count={:?} to '{}'",
            self.record.error, self.record.count, self.topic
        );

        self.record.advance_count();
        Ok(payload)
    }
}

/// Connects once, then publishes until the transport fails.
pub async fn connect_and_run<C, K, D>(
    connector: &C,
    config: &Config,
    ticker: K,
    draws: D,
    echo: Box<dyn Write + Send>,
) -> Result<Infallible>
where
    C: Connector,
    K: Ticker,
    D: DrawSource,
{
    let transport = connector.connect().await?;
    FaultInjector::new(transport, ticker, draws, config)
        .with_echo(echo)
        .run()
        .await
}
