pub mod change;
pub mod config;
pub mod error;

pub use change::*;
pub use config::{Config, ScheduleConfig};
pub use error::*;
