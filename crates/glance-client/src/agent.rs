//! The agent's poll loop.

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ClientConfig, ClientError, ConnectionManager, ServerApi};

/// Reads the title of the currently focused window.
///
/// One implementation is chosen at startup for the platform and desktop
/// the agent runs on.
pub trait TitleSource: Send {
    fn focused_title(
        &mut self,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// What one poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The title hadn't changed since the last successful report.
    Unchanged,
    /// A changed title was reported.
    Reported,
    /// A changed title couldn't be reported; it will be tried again on the
    /// next tick.
    ReportFailed,
    /// The title couldn't be read.
    NoTitle,
}

/// Polls a [`TitleSource`] and reports changes through a
/// [`ConnectionManager`].
pub struct Agent<A: ServerApi, T: TitleSource> {
    connection: ConnectionManager<A>,
    titles: T,
    os: String,
    last_title: String,
    config: ClientConfig,
}

impl<A: ServerApi, T: TitleSource> Agent<A, T> {
    pub fn new(connection: ConnectionManager<A>, titles: T, config: ClientConfig) -> Self {
        Self {
            connection,
            titles,
            os: config.os.clone(),
            last_title: String::new(),
            config,
        }
    }

    pub fn connection(&self) -> &ConnectionManager<A> {
        &self.connection
    }

    /// The last title the collector accepted.
    pub fn last_title(&self) -> &str {
        &self.last_title
    }

    /// Checks the focused window once and reports it if it changed.
    ///
    /// The remembered title only advances after a successful report, so a
    /// failed one is retried on the next tick. Never more than one report
    /// per tick.
    pub async fn tick(&mut self) -> TickOutcome {
        let title = match self.titles.focused_title().await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read focused window");
                return TickOutcome::NoTitle;
            }
        };

        if title == self.last_title {
            return TickOutcome::Unchanged;
        }
        tracing::info!(%title, "focused window changed");

        match self.connection.send_update(&title, &self.os).await {
            Ok(()) => {
                self.last_title = title;
                TickOutcome::Reported
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to send update");
                TickOutcome::ReportFailed
            }
        }
    }

    /// Connects, then polls every `poll_interval` and heartbeats every
    /// `heartbeat_interval` until `cancel` fires. Failed calls are logged
    /// and never end the loop.
    pub async fn run(mut self, cancel: CancellationToken) {
        self.connection.connect().await;
        tracing::info!(os = %self.os, mode = ?self.connection.mode(), "agent started");

        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let period = self.config.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = poll.tick() => {
                    self.tick().await;
                }
                _ = heartbeat.tick() => {
                    if let Err(e) = self.connection.send_heartbeat().await {
                        tracing::warn!(error = %e, "heartbeat failed");
                    }
                }
            }
        }
        tracing::info!("agent stopped");
    }
}
