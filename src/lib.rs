//! autoping - survey IPv4 address ranges with ICMP echo requests
//!
//! Ranges are walked in a collision-free pseudorandom order, interleaved so
//! that every range advances at the same relative pace, and probed from one
//! raw socket while an independent listener thread logs every reply it hears.

pub mod config;
pub mod packet;
pub mod socket;
pub mod survey;

// Re-export core types for library users
pub use config::TimingConfig;
pub use packet::{build_echo_request, internet_checksum};
pub use socket::{EchoTransport, ReplySource};
pub use survey::{
    parse_range_list, read_range_file, send_pings, start_listener, AddressRange, FairScheduler,
    ListenerHandle, ListenerState, LogRecord, RangeSpec, Sender, Survey, SurveyConfig,
    SurveyConfigBuilder, SurveyError, SurveyReport,
};
