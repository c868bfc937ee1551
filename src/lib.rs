pub mod config;
pub mod error;
pub mod properties;
pub mod startup;

pub mod kafka;

pub use config::SmokeConfig;
pub use error::{Error, Result};
pub use startup::{ExitOutcome, StartupSmokeProducer};
