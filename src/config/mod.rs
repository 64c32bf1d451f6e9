//! Process-wide configuration

pub mod timing;

pub use timing::TimingConfig;
