//! Raw ICMPv4 socket plumbing for the sender and listener
//!
//! The sender and listener each own their own socket; nothing here is shared
//! between them. Both sides are expressed as small traits so the survey logic
//! can run against in-memory transports in tests.

use serde::{Deserialize, Serialize};
use std::io;
use std::net::Ipv4Addr;

pub mod factory;
pub mod icmp_v4;
pub mod utils;

pub use factory::{create_raw_icmp_socket, open_listener_socket, open_sender_socket};
pub use icmp_v4::RawIcmpV4Socket;

/// Which side of the survey a socket serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketRole {
    /// Blocking outbound socket used to transmit echo requests
    Sender,
    /// Non-blocking inbound socket used to capture replies
    Listener,
}

impl SocketRole {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            SocketRole::Sender => "sender",
            SocketRole::Listener => "listener",
        }
    }
}

/// Outbound half of a survey: transmits ICMP datagrams
pub trait EchoTransport {
    /// Send `packet` to `target`, returning how many bytes were accepted.
    ///
    /// May accept fewer bytes than offered; callers resend the remainder.
    fn send_to(&mut self, packet: &[u8], target: Ipv4Addr) -> io::Result<usize>;
}

impl<T: EchoTransport + ?Sized> EchoTransport for &mut T {
    fn send_to(&mut self, packet: &[u8], target: Ipv4Addr) -> io::Result<usize> {
        (**self).send_to(packet, target)
    }
}

impl<T: EchoTransport + ?Sized> EchoTransport for Box<T> {
    fn send_to(&mut self, packet: &[u8], target: Ipv4Addr) -> io::Result<usize> {
        (**self).send_to(packet, target)
    }
}

/// Inbound half of a survey: yields whatever ICMP traffic arrives
pub trait ReplySource: Send {
    /// Receive one datagram without blocking.
    ///
    /// Returns the number of bytes written into `buf` and the sender's
    /// address, or an error of kind [`io::ErrorKind::WouldBlock`] when
    /// nothing is waiting.
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)>;
}

impl<T: ReplySource + ?Sized> ReplySource for Box<T> {
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        (**self).try_recv(buf)
    }
}

/// Returns true for errors that only mean "nothing to read yet"
pub fn is_would_block(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
