//! Creation of raw ICMPv4 sockets with descriptive permission errors

use super::icmp_v4::RawIcmpV4Socket;
use super::utils::{elevation_hint, raw_socket_requirement};
use super::SocketRole;
use crate::survey::SurveyError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

// Common POSIX error codes
const EPERM: i32 = 1; // Operation not permitted
const EACCES: i32 = 13; // Permission denied
// Windows
const WSAEACCES: i32 = 10013;

/// Returns true if `err` means the host refused raw socket access
pub fn is_permission_error(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::PermissionDenied)
        || err
            .raw_os_error()
            .map(|code| code == EPERM || code == EACCES || code == WSAEACCES)
            .unwrap_or(false)
}

/// Map a socket creation failure onto the survey error taxonomy
pub fn classify_socket_error(err: io::Error) -> SurveyError {
    if is_permission_error(&err) {
        SurveyError::InsufficientPermissions {
            required: format!(
                "ICMP raw sockets can only be opened by processes with {}",
                raw_socket_requirement()
            ),
            suggestion: elevation_hint(),
        }
    } else {
        SurveyError::SocketError(err.to_string())
    }
}

/// Open a raw ICMPv4 socket
pub fn create_raw_icmp_socket() -> Result<Socket, SurveyError> {
    Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(classify_socket_error)
}

/// Open the blocking outbound socket used by the sender
pub fn open_sender_socket() -> Result<RawIcmpV4Socket, SurveyError> {
    let socket = RawIcmpV4Socket::new(create_raw_icmp_socket()?, SocketRole::Sender);
    tracing::debug!(role = socket.role().description(), "opened raw ICMP socket");
    Ok(socket)
}

/// Open the non-blocking inbound socket used by the listener
pub fn open_listener_socket() -> Result<RawIcmpV4Socket, SurveyError> {
    let socket = create_raw_icmp_socket()?;
    socket
        .set_nonblocking(true)
        .map_err(|e| SurveyError::SocketError(format!("failed to set non-blocking: {e}")))?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    socket
        .bind(&bind_addr.into())
        .map_err(|e| SurveyError::SocketError(format!("failed to bind ICMP socket: {e}")))?;

    let socket = RawIcmpV4Socket::new(socket, SocketRole::Listener);
    tracing::debug!(role = socket.role().description(), "opened raw ICMP socket");
    Ok(socket)
}
