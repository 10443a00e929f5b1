//! Frame-oriented interface: one measurement per column

use daq_core::{compatible_name, format_db_time, quote_ident, Frame, Timestamp};
use tracing::{info, instrument, warn};

use crate::client::first_column;
use crate::{DbResult, InfluxClient, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every column was written
    Written,
    /// At least one column held no data and was skipped
    Partial,
}

/// Database-level operations shared by every interface style
#[async_trait::async_trait]
pub trait Measurements: Send + Sync {
    fn client(&self) -> &InfluxClient;

    /// Create `dbname` unless an existing database name already contains it
    async fn create_database(&self, dbname: &str) -> DbResult<CreateOutcome> {
        let existing = self.client().get_list_database().await?;
        if existing.iter().any(|name| name.contains(dbname)) {
            info!("Database {} found already.", dbname);
            return Ok(CreateOutcome::AlreadyExists);
        }
        info!("Creating database {}.", dbname);
        self.client().create_database(dbname).await?;
        Ok(CreateOutcome::Created)
    }

    /// Drop an entire measurement
    async fn drop_measurement(
        &self,
        key: &str,
        dbname: &str,
        compatible_names: bool,
    ) -> DbResult<()> {
        let key = if compatible_names {
            compatible_name(key)
        } else {
            key.to_string()
        };
        let q = format!("DROP MEASUREMENT {}", quote_ident(&key));
        self.client().query(&q, Some(dbname)).await?;
        Ok(())
    }

    async fn get_measurements_list(&self, dbname: &str) -> DbResult<Vec<String>> {
        let res = self
            .client()
            .query("SHOW MEASUREMENTS", Some(dbname))
            .await?;
        Ok(first_column(&res, "measurements"))
    }
}

/// Reads and writes frames, storing each column as its own measurement
/// with a single field of the same name.
#[derive(Debug, Clone)]
pub struct Database {
    client: InfluxClient,
}

impl Database {
    pub fn new(client: InfluxClient) -> Self {
        Self { client }
    }

    /// Write every column of `frame`. Null cells are dropped; a column
    /// with no data is skipped and reported through [`WriteOutcome::Partial`].
    #[instrument(skip(self, frame), fields(columns = frame.columns().len()))]
    pub async fn write_data(
        &self,
        frame: &Frame,
        dbname: &str,
        compatible_names: bool,
    ) -> DbResult<WriteOutcome> {
        let mut outcome = WriteOutcome::Written;
        for column in frame.columns() {
            let key = if compatible_names {
                compatible_name(column)
            } else {
                column.clone()
            };
            let points: Vec<Point> = frame
                .column_non_null(column)
                .unwrap_or_default()
                .into_iter()
                .map(|(time, value)| Point::new(&key).field(&key, value.clone()).time(time))
                .collect();

            if points.is_empty() {
                warn!(
                    "{} not able to be stored in database. Contains all NaN.",
                    key
                );
                outcome = WriteOutcome::Partial;
                continue;
            }
            self.client.write_points(&points, Some(dbname)).await?;
            info!("Data for {} written to database {}.", key, dbname);
        }
        Ok(outcome)
    }

    /// Read one measurement between `start_time` and `final_time`
    /// (inclusive). With `compatible_names` the measurement is looked up
    /// under its compatible name and the column is renamed back to `key`.
    #[instrument(skip(self))]
    pub async fn get_data(
        &self,
        key: &str,
        dbname: &str,
        start_time: Timestamp,
        final_time: Timestamp,
        compatible_names: bool,
    ) -> DbResult<Option<Frame>> {
        let measurement = if compatible_names {
            compatible_name(key)
        } else {
            key.to_string()
        };
        let q = format!(
            "SELECT * FROM {} WHERE time >= '{}' AND time <= '{}'",
            quote_ident(&measurement),
            format_db_time(&start_time),
            format_db_time(&final_time)
        );
        let res = self.client.query(&q, Some(dbname)).await?;

        let Some(series) = res.into_series().find(|s| s.name == measurement) else {
            warn!(
                "Data for {} not found in database. Check that the key and time interval are correct and that there is data during the time interval.",
                measurement
            );
            return Ok(None);
        };

        let mut frame = series.into_frame()?;
        if compatible_names {
            frame.rename_column(&measurement, key);
        }
        info!("Data for {} retrieved from database {}.", measurement, dbname);
        Ok(Some(frame))
    }
}

#[async_trait::async_trait]
impl Measurements for Database {
    fn client(&self) -> &InfluxClient {
        &self.client
    }
}
