pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{Config, LogFormat};
pub use error::{Error, Result};
pub use provider::PriceSeriesProvider;
pub use types::*;
