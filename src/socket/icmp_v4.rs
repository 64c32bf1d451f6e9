//! IPv4 raw ICMP socket

use super::{EchoTransport, ReplySource, SocketRole};
use socket2::{SockAddr, Socket as Socket2};
use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Raw ICMP socket for IPv4
///
/// The kernel supplies the IP header on send; received datagrams include
/// the IP header of the reply.
pub struct RawIcmpV4Socket {
    socket: Socket2,
    role: SocketRole,
}

impl RawIcmpV4Socket {
    /// Wrap an already-configured raw socket
    pub fn new(socket: Socket2, role: SocketRole) -> Self {
        Self { socket, role }
    }

    /// Which side of the survey this socket serves
    pub fn role(&self) -> SocketRole {
        self.role
    }

    /// Borrow the underlying socket
    pub fn as_socket(&self) -> &Socket2 {
        &self.socket
    }
}

impl std::fmt::Debug for RawIcmpV4Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawIcmpV4Socket")
            .field("role", &self.role.description())
            .finish_non_exhaustive()
    }
}

impl EchoTransport for RawIcmpV4Socket {
    fn send_to(&mut self, packet: &[u8], target: Ipv4Addr) -> io::Result<usize> {
        // ICMP has no ports; the kernel ignores this one
        let target_addr = SockAddr::from(SocketAddrV4::new(target, 0));
        self.socket.send_to(packet, &target_addr)
    }
}

/// Largest datagram read in one call; longer replies are truncated
pub const MAX_DATAGRAM_BYTES: usize = 1500;

/// View the first `size` bytes of a receive buffer as initialized data.
///
/// # Safety
///
/// The caller must guarantee that `recv_buf[..size]` was written, as
/// `recv_from` does for the length it returns.
unsafe fn initialized_prefix(recv_buf: &[MaybeUninit<u8>], size: usize) -> &[u8] {
    let initialized_part: &[MaybeUninit<u8>] = &recv_buf[..size];
    &*(initialized_part as *const [MaybeUninit<u8>] as *const [u8])
}

impl ReplySource for RawIcmpV4Socket {
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        let mut recv_buf = [MaybeUninit::<u8>::uninit(); MAX_DATAGRAM_BYTES];
        let limit = buf.len().min(MAX_DATAGRAM_BYTES);
        let (size, socket_addr) = self.socket.recv_from(&mut recv_buf[..limit])?;

        let from = socket_addr
            .as_socket_ipv4()
            .map(|s| *s.ip())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "non-IPv4 source"))?;

        // SAFETY: recv_from initialized exactly `size` bytes of recv_buf
        let packet_data = unsafe { initialized_prefix(&recv_buf, size) };
        buf[..size].copy_from_slice(packet_data);
        Ok((size, from))
    }
}
