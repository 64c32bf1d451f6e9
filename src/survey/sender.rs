//! Transmit one echo request per scheduled address

use super::range::RangeSpec;
use super::scheduler::FairScheduler;
use super::SurveyError;
use crate::packet::build_echo_request;
use crate::socket::{open_sender_socket, EchoTransport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// Totals for one completed send run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendSummary {
    /// Number of ranges scheduled
    pub ranges: usize,
    /// Echo requests transmitted
    pub probes_sent: u64,
    /// Bytes handed to the transport
    pub bytes_sent: u64,
    /// Wall-clock time spent sending
    pub duration: Duration,
}

/// Drives a [`FairScheduler`] and transmits an echo request for every address
///
/// Identifiers are drawn independently for each packet; nothing prevents two
/// in-flight requests from sharing one.
pub struct Sender<T, R = StdRng> {
    transport: T,
    identifiers: R,
}

impl<T: EchoTransport> Sender<T, StdRng> {
    /// Create a sender with an OS-seeded identifier source
    pub fn new(transport: T) -> Self {
        Self::with_rng(transport, StdRng::from_os_rng())
    }
}

impl<T: EchoTransport, R: Rng> Sender<T, R> {
    /// Create a sender with a caller-supplied identifier source
    pub fn with_rng(transport: T, identifiers: R) -> Self {
        Self {
            transport,
            identifiers,
        }
    }

    /// Send a single echo request to `target`, returning the identifier used.
    ///
    /// Short writes are retried with the unsent remainder until the whole
    /// packet has been accepted.
    pub fn send_echo(&mut self, target: Ipv4Addr) -> Result<u16, SurveyError> {
        let identifier: u16 = self.identifiers.random();
        let packet = build_echo_request(identifier);

        let mut remaining = packet.as_slice();
        while !remaining.is_empty() {
            match self.transport.send_to(remaining, target) {
                Ok(0) => {
                    return Err(SurveyError::ProbeSendError(format!(
                        "{target}: transport accepted no bytes"
                    )))
                }
                Ok(sent) => remaining = &remaining[sent.min(remaining.len())..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SurveyError::ProbeSendError(format!("{target}: {e}"))),
            }
        }

        tracing::trace!(%target, identifier, "sent echo request");
        Ok(identifier)
    }

    /// Send to every address the scheduler yields, until it is drained
    pub fn run(&mut self, scheduler: &mut FairScheduler) -> Result<SendSummary, SurveyError> {
        let start = Instant::now();
        let mut summary = SendSummary {
            ranges: scheduler.len(),
            ..SendSummary::default()
        };
        tracing::info!(
            ranges = summary.ranges,
            addresses = scheduler.remaining(),
            "sender starting"
        );

        while let Some(target) = scheduler.step() {
            self.send_echo(target)?;
            summary.probes_sent += 1;
            summary.bytes_sent += crate::packet::ECHO_PACKET_LEN as u64;
        }

        summary.duration = start.elapsed();
        tracing::info!(
            probes = summary.probes_sent,
            elapsed_ms = summary.duration.as_millis() as u64,
            "sender finished"
        );
        Ok(summary)
    }

    /// Consume the sender and hand back its transport
    pub fn into_transport(self) -> T {
        self.transport
    }
}

/// Send one echo request per address in `specs` over `transport`.
///
/// Every specification is validated before anything is transmitted.
pub fn send_pings_with<T: EchoTransport>(
    specs: &[RangeSpec],
    transport: T,
) -> Result<SendSummary, SurveyError> {
    let mut scheduler = FairScheduler::from_specs(specs)?;
    Sender::new(transport).run(&mut scheduler)
}

/// Send one echo request per address in `specs` over a fresh raw socket.
///
/// Ranges are validated before the socket is opened; the socket is closed
/// when this returns, whether or not the run succeeded.
pub fn send_pings(specs: &[RangeSpec]) -> Result<SendSummary, SurveyError> {
    let mut scheduler = FairScheduler::from_specs(specs)?;
    let socket = open_sender_socket()?;
    Sender::new(socket).run(&mut scheduler)
}

/// Send a single echo request to `target` over its own short-lived socket
pub fn echo_once(target: Ipv4Addr) -> Result<u16, SurveyError> {
    let socket = open_sender_socket()?;
    Sender::new(socket).send_echo(target)
}
