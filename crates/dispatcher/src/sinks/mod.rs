//! Feed transports
//!
//! Contains HttpSink and LogSink.

mod http;
mod log;

pub use self::http::{HttpSink, HttpSinkConfig};
pub use self::log::LogSink;
