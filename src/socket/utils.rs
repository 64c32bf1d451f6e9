//! Utility functions for socket operations

/// Check if running as root
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        // No portable equivalent; assume an unprivileged user
        false
    }
}

/// What the host needs to grant before raw ICMP sockets can be opened
pub fn raw_socket_requirement() -> &'static str {
    if cfg!(target_os = "linux") {
        "root or CAP_NET_RAW"
    } else if cfg!(target_os = "windows") {
        "administrator rights"
    } else {
        "root"
    }
}

/// Suggested remedy for a raw socket permission failure
pub fn elevation_hint() -> String {
    let command = std::env::args().collect::<Vec<_>>().join(" ");
    if cfg!(target_os = "linux") {
        format!(
            "Run with sudo: sudo {command}\n\
             Or grant the capability: sudo setcap cap_net_raw+ep <path-to-binary>"
        )
    } else if cfg!(target_os = "windows") {
        "Run from an elevated (Administrator) prompt".to_string()
    } else {
        format!("Run with sudo: sudo {command}")
    }
}
