mod config;
mod constants;
mod format;
mod stats;

pub use config::*;
pub use constants::*;
pub use format::*;
pub use stats::*;
