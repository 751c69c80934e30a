//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::{config_debug, run_relay};
pub use validate::run_validate;
