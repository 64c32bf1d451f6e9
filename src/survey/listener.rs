//! Reply listener running on its own thread
//!
//! The listener owns its socket and its log sink. The only way to talk to it
//! is the one-slot stop channel: [`ListenerHandle::stop`] drops a
//! [`StopSignal`] into the slot and returns immediately, and the listener
//! notices it on its next poll.

use super::SurveyError;
use crate::config::timing;
use crate::socket::{is_would_block, open_listener_socket, ReplySource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{LineWriter, Write};
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

/// One line of the reply log: who answered and when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Source address of the received datagram
    pub source: Ipv4Addr,
    /// Receipt time in whole seconds since the Unix epoch
    pub received_at: u64,
}

impl LogRecord {
    /// Stamp a record for `source` with the current time
    pub fn now(source: Ipv4Addr) -> Self {
        let received_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            source,
            received_at,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.source, self.received_at)
    }
}

impl FromStr for LogRecord {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, secs) = s
            .trim_end()
            .split_once(',')
            .ok_or_else(|| SurveyError::InvalidAddress(s.to_string()))?;
        Ok(Self {
            source: addr
                .parse()
                .map_err(|_| SurveyError::InvalidAddress(addr.to_string()))?,
            received_at: secs.parse().map_err(|_| {
                SurveyError::LogSinkError(format!("bad timestamp in record: {s}"))
            })?,
        })
    }
}

/// Lifecycle of a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListenerState {
    /// Polling for replies
    Running,
    /// A stop has been requested but not yet observed
    Stopping,
    /// The loop has exited and the socket is closed
    Stopped,
}

/// Message carried by the stop channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopSignal;

/// Writing end of the stop channel
#[derive(Debug, Clone)]
pub struct StopSender(mpsc::Sender<StopSignal>);

impl StopSender {
    /// Put a stop signal in the slot without waiting.
    ///
    /// Returns false if a signal is already pending or the listener is gone;
    /// in both cases nothing is queued.
    pub fn request_stop(&self) -> bool {
        match self.0.try_send(StopSignal) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Reading end of the stop channel
#[derive(Debug)]
pub struct StopReceiver(mpsc::Receiver<StopSignal>);

impl StopReceiver {
    /// Non-blocking check for a stop request.
    ///
    /// A closed channel counts as a stop so the listener can never be orphaned.
    pub fn should_stop(&mut self) -> bool {
        match self.0.try_recv() {
            Ok(StopSignal) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("stop channel closed; stopping listener");
                true
            }
        }
    }
}

/// Create a stop channel with room for exactly one signal
pub fn stop_channel() -> (StopSender, StopReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (StopSender(tx), StopReceiver(rx))
}

/// Counters reported when a listener exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerStats {
    /// Records appended to the sink
    pub records: u64,
    /// Receive errors that were logged and skipped
    pub receive_errors: u64,
}

/// Polls a [`ReplySource`] and appends a [`LogRecord`] per datagram
pub struct Listener<S, W> {
    source: S,
    sink: W,
    stop: StopReceiver,
    poll_interval: Duration,
    recv_buffer: Vec<u8>,
}

impl<S: ReplySource, W: Write> Listener<S, W> {
    /// Create a listener and the sender half of its stop channel
    pub fn new(source: S, sink: W) -> (Self, StopSender) {
        let (tx, rx) = stop_channel();
        (Self::with_stop_receiver(source, sink, rx), tx)
    }

    /// Create a listener that watches an existing stop channel
    pub fn with_stop_receiver(source: S, sink: W, stop: StopReceiver) -> Self {
        Self {
            source,
            sink,
            stop,
            poll_interval: timing::listener_poll_interval(),
            recv_buffer: vec![0u8; timing::recv_buffer_bytes()],
        }
    }

    /// Set how long to sleep after a poll that found nothing
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the poll loop on the current thread until a stop is observed.
    ///
    /// Receive errors other than would-block are logged and skipped. A sink
    /// write failure ends the loop with [`SurveyError::LogSinkError`].
    pub fn run(mut self) -> Result<ListenerStats, SurveyError> {
        let mut stats = ListenerStats::default();
        let mut state = ListenerState::Running;
        tracing::info!(poll_ms = self.poll_interval.as_millis() as u64, "listener running");

        while state == ListenerState::Running {
            let idle = match self.source.try_recv(&mut self.recv_buffer) {
                Ok((_len, from)) => {
                    let record = LogRecord::now(from);
                    writeln!(self.sink, "{record}")
                        .and_then(|()| self.sink.flush())
                        .map_err(|e| SurveyError::LogSinkError(e.to_string()))?;
                    stats.records += 1;
                    tracing::debug!(source = %from, "reply logged");
                    false
                }
                Err(e) if is_would_block(&e) => true,
                Err(e) => {
                    stats.receive_errors += 1;
                    tracing::warn!(error = %e, "receive failed; continuing");
                    true
                }
            };

            if self.stop.should_stop() {
                state = ListenerState::Stopping;
                tracing::debug!("stop signal received");
            } else if idle && !self.poll_interval.is_zero() {
                std::thread::sleep(self.poll_interval);
            }
        }

        tracing::info!(
            records = stats.records,
            receive_errors = stats.receive_errors,
            "listener stopped"
        );
        Ok(stats)
    }
}

impl<S, W> Listener<S, W>
where
    S: ReplySource + 'static,
    W: Write + Send + 'static,
{
    /// Start a listener on a dedicated thread
    pub fn spawn(source: S, sink: W, poll_interval: Duration) -> Result<ListenerHandle, SurveyError> {
        let (listener, stop) = Self::new(source, sink);
        let listener = listener.with_poll_interval(poll_interval);
        let thread = std::thread::Builder::new()
            .name("autoping-listener".to_string())
            .spawn(move || listener.run())
            .map_err(|e| SurveyError::ListenerError(e.to_string()))?;

        Ok(ListenerHandle {
            stop,
            stop_requested: false,
            thread: Some(thread),
        })
    }
}

/// Open a raw socket and an append-only log at `log_path`, then start listening.
///
/// Socket and file errors surface here, before the thread starts.
pub fn start_listener(
    log_path: impl AsRef<Path>,
    poll_interval: Duration,
) -> Result<ListenerHandle, SurveyError> {
    let log_path = log_path.as_ref();
    let socket = open_listener_socket()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| SurveyError::LogSinkError(format!("{}: {}", log_path.display(), e)))?;
    Listener::spawn(socket, LineWriter::new(file), poll_interval)
}

/// Owner's view of a running listener
#[derive(Debug)]
pub struct ListenerHandle {
    stop: StopSender,
    stop_requested: bool,
    thread: Option<JoinHandle<Result<ListenerStats, SurveyError>>>,
}

impl ListenerHandle {
    /// Current lifecycle state
    pub fn state(&self) -> ListenerState {
        match &self.thread {
            Some(thread) if !thread.is_finished() => {
                if self.stop_requested {
                    ListenerState::Stopping
                } else {
                    ListenerState::Running
                }
            }
            _ => ListenerState::Stopped,
        }
    }

    /// Ask the listener to stop and return without waiting.
    ///
    /// Returns true if a signal was delivered. Calling this again, or after
    /// the listener has stopped, has no effect and returns false.
    pub fn stop(&mut self) -> bool {
        if self.stop_requested || self.state() == ListenerState::Stopped {
            return false;
        }
        self.stop_requested = self.stop.request_stop();
        self.stop_requested
    }

    /// Wait for the listener thread to exit and collect its counters
    pub fn join(mut self) -> Result<ListenerStats, SurveyError> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| SurveyError::ListenerError("already joined".to_string()))?;
        thread
            .join()
            .map_err(|_| SurveyError::ListenerError("listener thread panicked".to_string()))?
    }

    /// Request a stop, then wait for the thread to exit
    pub fn shutdown(mut self) -> Result<ListenerStats, SurveyError> {
        self.stop();
        self.join()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        // An unjoined listener would otherwise poll forever
        if self.thread.is_some() {
            self.stop.request_stop();
        }
    }
}
