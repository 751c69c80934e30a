//! 事件源实现

mod lines;
mod mock;
mod udp;

pub use lines::LineSource;
pub use mock::MockEventSource;
pub use udp::UdpSource;
