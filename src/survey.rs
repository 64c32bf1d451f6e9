//! Range traversal, fair scheduling, and the sender/listener pair

pub mod api;
pub mod config;
pub mod error;
pub mod listener;
pub mod range;
pub mod scheduler;
pub mod sender;

// Re-export commonly used types
pub use api::{Survey, SurveyReport};
pub use config::{SurveyConfig, SurveyConfigBuilder};
pub use error::SurveyError;
pub use listener::{
    start_listener, stop_channel, Listener, ListenerHandle, ListenerState, ListenerStats,
    LogRecord, StopReceiver, StopSender, StopSignal,
};
pub use range::{parse_range_list, read_range_file, AddressRange, RangeSpec};
pub use scheduler::{FairScheduler, SchedulerEntry};
pub use sender::{echo_once, send_pings, send_pings_with, SendSummary, Sender};
