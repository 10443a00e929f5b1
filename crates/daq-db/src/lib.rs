//! InfluxDB access layer for the LBNL Building 59 and Lab WiFi datasets
//!
//! A thin layer over the InfluxDB 1.x HTTP API. Query execution,
//! transport and authentication are left to the server; this crate only
//! builds statements, sends them and shapes the results.

pub mod client;
pub mod database;
pub mod forecast;
pub mod generic;
pub mod point;
pub mod setup;

pub use client::*;
pub use database::*;
pub use forecast::*;
pub use generic::*;
pub use point::*;
pub use setup::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("InfluxDB error: {0}")]
    Server(String),

    #[error("Unexpected response {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Config(#[from] daq_config::ConfigError),

    #[error(transparent)]
    Core(#[from] daq_core::CoreError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Point for {0} has no fields")]
    EmptyPoint(String),

    #[error("Timestamp out of range: {0}")]
    TimestampRange(String),

    #[error("The sample rate of the forecast is not constant. Cannot write to database.")]
    IrregularSampleRate,

    #[error("Cannot determine a sample rate from {0} rows")]
    SampleRateUndetermined(usize),

    #[error("Unknown database interface style {0}")]
    UnknownStyle(String),
}

pub type DbResult<T> = Result<T, DbError>;
