//! Core data types for the DAQ InfluxDB interface
//!
//! Values, result series and time-indexed frames as returned by an
//! InfluxDB 1.x server, plus the naming and time helpers shared by the
//! database interfaces.

pub mod frame;
pub mod names;
pub mod time;
pub mod types;

pub use frame::*;
pub use names::*;
pub use time::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid time '{0}'")]
    InvalidTime(String),

    #[error("Series {0} has no time column")]
    MissingTimeColumn(String),

    #[error("Row has {got} values, frame has {expected} columns")]
    RowLength { expected: usize, got: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;
