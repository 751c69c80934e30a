//! 事件处理器模块
//!
//! 每个处理器负责将一种网关事件转换为 `Packet`。

pub mod common;
mod electricity;
mod heating;
mod solar;
mod weather;

pub use electricity::ElectricityHandler;
pub use heating::HeatingHandler;
pub use solar::SolarHandler;
pub use weather::WeatherHandler;
