//! Forecast interface
//!
//! A whole forecast column is stored as one point: fields `1..n` hold the
//! values in time order, `sample_rate` the spacing in seconds and
//! `start_time` the instant before the first value. Reading the point back
//! rebuilds the time index as `start_time + i * sample_rate`.

use chrono::{Duration, DurationRound};
use daq_core::{
    compatible_name, detect_sample_rate, format_db_time, parse_time, quote_ident, FieldValue,
    Frame, Timestamp,
};
use tracing::{info, instrument, warn};

use crate::{DbError, DbResult, InfluxClient, Measurements, Point};

/// Spacing assumed when a stored forecast does not carry one
pub const DEFAULT_SAMPLE_RATE_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct ForecastDatabase {
    client: InfluxClient,
}

impl ForecastDatabase {
    pub fn new(client: InfluxClient) -> Self {
        Self { client }
    }

    /// Store each column of `frame` as a forecast issued at `time`.
    ///
    /// The frame must be evenly spaced. Without `time` the forecast is
    /// stored for the hour before its first entry.
    #[instrument(skip(self, frame), fields(rows = frame.len()))]
    pub async fn write_data(
        &self,
        frame: &Frame,
        dbname: &str,
        time: Option<Timestamp>,
        compatible_names: bool,
    ) -> DbResult<()> {
        let rate = detect_sample_rate(frame.index())
            .ok_or(DbError::SampleRateUndetermined(frame.len()))?;
        if rate.distinct > 1 {
            return Err(DbError::IrregularSampleRate);
        }

        let mut frame = frame.clone();
        frame.sort_index();
        let first = frame.index()[0];

        let (time_db, start_time) = match time {
            None => {
                let t = (first - Duration::hours(1))
                    .duration_trunc(Duration::hours(1))
                    .map_err(|e| DbError::TimestampRange(e.to_string()))?;
                (t, t)
            }
            Some(t) => (t, first - Duration::seconds(rate.seconds)),
        };

        let mut points = Vec::with_capacity(frame.columns().len());
        for column in frame.columns() {
            let key = if compatible_names {
                compatible_name(column)
            } else {
                column.clone()
            };
            let mut point = Point::new(key).time(time_db);
            let values = frame.column(column).unwrap_or_default();
            for (i, (_, value)) in values.into_iter().enumerate() {
                point = point.field((i + 1).to_string(), value.clone());
            }
            point = point
                .field("sample_rate", rate.seconds)
                .field("start_time", format_db_time(&start_time));
            points.push(point);
        }

        self.client.write_points(&points, Some(dbname)).await?;
        info!(
            "Data for {:?} written to database {}.",
            frame.columns(),
            dbname
        );
        Ok(())
    }

    /// Read the forecast for `key` issued at `time`. An empty frame means
    /// nothing was stored for that time.
    #[instrument(skip(self))]
    pub async fn get_data(
        &self,
        key: &str,
        dbname: &str,
        time: Timestamp,
        compatible_names: bool,
    ) -> DbResult<Frame> {
        let measurement = if compatible_names {
            compatible_name(key)
        } else {
            key.to_string()
        };
        let q = format!(
            "SELECT * FROM {} WHERE time = '{}'",
            quote_ident(&measurement),
            format_db_time(&time)
        );
        let res = self.client.query(&q, Some(dbname)).await?;
        info!("Data for {} retrieved from database {}.", measurement, dbname);

        let Some(row) = res.series().next().and_then(|s| s.row_map(0)) else {
            warn!("Data retrieved is empty.");
            return Ok(Frame::default());
        };

        let sample_rate = match row.get("sample_rate") {
            Some(v) => v.as_i64().unwrap_or_else(|| {
                info!("sample_rate found, but None. Using 3600 seconds.");
                DEFAULT_SAMPLE_RATE_SECS
            }),
            None => {
                info!("sample_rate not found. Using 3600 seconds.");
                DEFAULT_SAMPLE_RATE_SECS
            }
        };
        let start_time = match row.get("start_time") {
            Some(FieldValue::String(s)) => parse_time(s)?,
            Some(_) => {
                info!("start_time found, but None. Using database measurement time.");
                time
            }
            None => {
                info!("start_time not found. Using database measurement time.");
                time
            }
        };

        // the column is named by the caller's key, not the stored measurement
        let mut frame = Frame::new(vec![key.to_string()]);
        for (column, value) in row {
            let Ok(step) = column.parse::<i64>() else {
                continue;
            };
            let t = step
                .checked_mul(sample_rate)
                .and_then(Duration::try_seconds)
                .and_then(|offset| start_time.checked_add_signed(offset))
                .ok_or_else(|| {
                    DbError::TimestampRange(format!(
                        "field {} at sample_rate {} from {}",
                        step,
                        sample_rate,
                        format_db_time(&start_time)
                    ))
                })?;
            frame.insert(t, key, value);
        }
        frame.sort_index();
        Ok(frame)
    }
}

#[async_trait::async_trait]
impl Measurements for ForecastDatabase {
    fn client(&self) -> &InfluxClient {
        &self.client
    }
}
