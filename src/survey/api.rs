//! End-to-end survey runs: listen, send, settle, stop

use super::listener::{Listener, ListenerHandle, ListenerStats};
use super::range::RangeSpec;
use super::scheduler::FairScheduler;
use super::sender::{SendSummary, Sender};
use super::{SurveyConfig, SurveyError};
use crate::socket::{open_listener_socket, open_sender_socket, EchoTransport, ReplySource};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::future::Future;
use std::io::{LineWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Outcome of a complete survey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyReport {
    /// Ranges that were probed
    pub ranges: Vec<RangeSpec>,
    /// Addresses covered by those ranges
    pub addresses: u64,
    /// Echo requests transmitted
    pub probes_sent: u64,
    /// Reply records appended to the log
    pub replies_logged: u64,
    /// Receive errors the listener skipped
    pub receive_errors: u64,
    /// Where replies were logged
    pub log_path: PathBuf,
    /// Time spent sending
    pub send_duration: Duration,
    /// Total wall-clock time including the settle period
    pub total_duration: Duration,
}

/// A configured survey, ready to run
///
/// # Examples
///
/// ```no_run
/// use autoping::{Survey, SurveyConfig};
///
/// let config = SurveyConfig::builder()
///     .range("192.0.2.0/24".parse()?)
///     .log_path("replies.log")
///     .build()
///     .map_err(autoping::SurveyError::ConfigError)?;
/// let report = Survey::new(config).run()?;
/// println!("{} replies", report.replies_logged);
/// # Ok::<(), autoping::SurveyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Survey {
    config: SurveyConfig,
}

impl Survey {
    /// Create a survey from a configuration
    pub fn new(config: SurveyConfig) -> Self {
        Self { config }
    }

    /// The configuration this survey will run with
    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler.
    ///
    /// Nothing touches the network until this has succeeded.
    fn prepare(&self) -> Result<FairScheduler, SurveyError> {
        self.config.validate().map_err(SurveyError::ConfigError)?;
        FairScheduler::from_specs(&self.config.ranges)
    }

    fn open_log(&self) -> Result<LineWriter<std::fs::File>, SurveyError> {
        let path = &self.config.log_path;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SurveyError::LogSinkError(format!("{}: {}", path.display(), e)))?;
        Ok(LineWriter::new(file))
    }

    fn report(&self, sent: SendSummary, stats: ListenerStats, started: Instant) -> SurveyReport {
        SurveyReport {
            ranges: self.config.ranges.clone(),
            addresses: self.config.address_count(),
            probes_sent: sent.probes_sent,
            replies_logged: stats.records,
            receive_errors: stats.receive_errors,
            log_path: self.config.log_path.clone(),
            send_duration: sent.duration,
            total_duration: started.elapsed(),
        }
    }

    /// Run over raw sockets, blocking the calling thread throughout
    pub fn run(&self) -> Result<SurveyReport, SurveyError> {
        let scheduler = self.prepare()?;
        let source = open_listener_socket()?;
        let sink = self.open_log()?;
        let transport = open_sender_socket()?;
        self.run_prepared(scheduler, transport, source, sink)
    }

    /// Run over caller-supplied transports, blocking the calling thread
    pub fn run_with<T, S, W>(&self, transport: T, source: S, sink: W) -> Result<SurveyReport, SurveyError>
    where
        T: EchoTransport,
        S: ReplySource + 'static,
        W: Write + Send + 'static,
    {
        let scheduler = self.prepare()?;
        self.run_prepared(scheduler, transport, source, sink)
    }

    fn run_prepared<T, S, W>(
        &self,
        mut scheduler: FairScheduler,
        transport: T,
        source: S,
        sink: W,
    ) -> Result<SurveyReport, SurveyError>
    where
        T: EchoTransport,
        S: ReplySource + 'static,
        W: Write + Send + 'static,
    {
        let started = Instant::now();
        let listener = Listener::spawn(source, sink, self.config.poll_interval)?;

        let sent = match Sender::new(transport).run(&mut scheduler) {
            Ok(sent) => sent,
            Err(e) => {
                if let Err(listener_err) = listener.shutdown() {
                    tracing::warn!(error = %listener_err, "listener failed while aborting send");
                }
                return Err(e);
            }
        };

        tracing::info!(settle_ms = self.config.settle_time.as_millis() as u64, "waiting for late replies");
        std::thread::sleep(self.config.settle_time);
        let stats = listener.shutdown()?;
        Ok(self.report(sent, stats, started))
    }

    /// Run over raw sockets on the tokio runtime.
    ///
    /// Sending happens on a blocking worker. The settle period ends early if
    /// `shutdown` completes first (for example on Ctrl-C).
    pub async fn run_until<F>(&self, shutdown: F) -> Result<SurveyReport, SurveyError>
    where
        F: Future<Output = ()>,
    {
        let mut scheduler = self.prepare()?;
        let started = Instant::now();
        let source = open_listener_socket()?;
        let sink = self.open_log()?;
        let listener = Listener::spawn(source, sink, self.config.poll_interval)?;

        let sent = match tokio::task::spawn_blocking(move || {
            let transport = open_sender_socket()?;
            Sender::new(transport).run(&mut scheduler)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => Err(SurveyError::ProbeSendError(format!("sender task failed: {e}"))),
        };

        let sent = match sent {
            Ok(sent) => sent,
            Err(e) => {
                if let Err(listener_err) = stop_listener(listener).await {
                    tracing::warn!(error = %listener_err, "listener failed while aborting send");
                }
                return Err(e);
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(self.config.settle_time) => {}
            _ = shutdown => {
                tracing::info!("settle period interrupted");
            }
        }

        let stats = stop_listener(listener).await?;
        Ok(self.report(sent, stats, started))
    }
}

async fn stop_listener(listener: ListenerHandle) -> Result<ListenerStats, SurveyError> {
    tokio::task::spawn_blocking(move || listener.shutdown())
        .await
        .map_err(|e| SurveyError::ListenerError(e.to_string()))?
}
