//! Generic interface: one point of arbitrary fields per measurement and time

use std::collections::BTreeMap;

use daq_core::{compatible_name, format_db_time, quote_ident, FieldValue, QueryResult, Timestamp};
use tracing::{info, instrument, warn};

use crate::{DbResult, InfluxClient, Measurements, Point};

#[derive(Debug, Clone)]
pub struct GenericDatabase {
    client: InfluxClient,
}

impl GenericDatabase {
    pub fn new(client: InfluxClient) -> Self {
        Self { client }
    }

    /// Write `message` (field -> value) as measurement `name` at `time`
    #[instrument(skip(self, message))]
    pub async fn write_data(
        &self,
        name: &str,
        dbname: &str,
        time: Timestamp,
        message: &BTreeMap<String, FieldValue>,
    ) -> DbResult<()> {
        let point = Point {
            measurement: name.to_string(),
            tags: BTreeMap::new(),
            fields: message.clone(),
            time: Some(time),
        };
        self.client.write_points(&[point], Some(dbname)).await?;
        info!("Data for {} written to database {}.", name, dbname);
        Ok(())
    }

    /// Read the point stored for `name` at `time` as column -> value,
    /// with the measurement name under `name`.
    #[instrument(skip(self))]
    pub async fn get_data(
        &self,
        name: &str,
        dbname: &str,
        time: Timestamp,
    ) -> DbResult<Option<BTreeMap<String, FieldValue>>> {
        let time_db = format_db_time(&time);
        let q = format!(
            "SELECT * FROM {} WHERE time = '{}'",
            quote_ident(name),
            time_db
        );
        let res = self.client.query(&q, Some(dbname)).await?;

        let found = res.series().next().and_then(|series| {
            let mut data = series.row_map(0)?;
            data.insert("name".to_string(), FieldValue::String(series.name.clone()));
            Some(data)
        });
        match &found {
            Some(_) => info!("Data for {} retrieved from database {}.", name, dbname),
            None => warn!(
                "Could not find data for {} at {}. Check that the key and time are correct and that data exists.",
                name, time_db
            ),
        }
        Ok(found)
    }

    /// Every point of a measurement, unshaped
    #[instrument(skip(self))]
    pub async fn get_data_all_raw(
        &self,
        key: &str,
        dbname: &str,
        compatible_names: bool,
    ) -> DbResult<QueryResult> {
        let key = if compatible_names {
            compatible_name(key)
        } else {
            key.to_string()
        };
        let q = format!("SELECT * FROM {}", quote_ident(&key));
        self.client.query(&q, Some(dbname)).await
    }
}

#[async_trait::async_trait]
impl Measurements for GenericDatabase {
    fn client(&self) -> &InfluxClient {
        &self.client
    }
}
