use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed series for {instrument} at bar {index}: {detail}")]
    MalformedSeries {
        instrument: String,
        index: usize,
        detail: String,
    },

    #[error("Insufficient history for {instrument}: {available} bars available, {required} required")]
    InsufficientHistory {
        instrument: String,
        available: usize,
        required: usize,
    },

    #[error("Fetch failed for {instrument}: {message}")]
    Fetch { instrument: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand used by providers to report a failed retrieval.
    pub fn fetch(instrument: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Fetch {
            instrument: instrument.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
