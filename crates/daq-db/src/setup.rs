//! Connection setup for the LBNL-hosted demo databases

use std::str::FromStr;
use std::time::Duration;

use daq_config::{get_access, AppConfig, SourceConfig};
use tracing::info;

use crate::{
    ConnectionBuilder, Database, DbError, DbResult, ForecastDatabase, GenericDatabase,
    InfluxClient, Measurements,
};

/// Source used when none is named
pub const DEFAULT_SOURCE: &str = "building59";

/// Default database of every handle opened by [`setup_lbnl`]
pub const HANDLE_DATABASE: &str = "dhblum";

/// Interface style to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Frame,
    Forecasts,
    Generic,
}

impl FromStr for Style {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frame" => Ok(Style::Frame),
            "forecasts" => Ok(Style::Forecasts),
            "generic" => Ok(Style::Generic),
            other => Err(DbError::UnknownStyle(other.to_string())),
        }
    }
}

/// A configured interface of one of the three styles
#[derive(Debug, Clone)]
pub enum Interface {
    Frame(Database),
    Forecast(ForecastDatabase),
    Generic(GenericDatabase),
}

impl Interface {
    pub fn style(&self) -> Style {
        match self {
            Interface::Frame(_) => Style::Frame,
            Interface::Forecast(_) => Style::Forecasts,
            Interface::Generic(_) => Style::Generic,
        }
    }

    pub fn client(&self) -> &InfluxClient {
        match self {
            Interface::Frame(db) => db.client(),
            Interface::Forecast(db) => db.client(),
            Interface::Generic(db) => db.client(),
        }
    }
}

/// Open a client for `src` using credentials from the access file. The
/// handle's default database is `database`.
pub fn connect_source(
    config: &AppConfig,
    src: &SourceConfig,
    database: &str,
) -> DbResult<InfluxClient> {
    let creds = get_access(config.access_file_path(), &src.access_key)?;

    let mut builder = ConnectionBuilder::new(database)
        .host(src.host.clone())
        .port(src.port)
        .username(creds.username)
        .password(creds.password)
        .ssl(src.ssl)
        .verify_ssl(src.verify_ssl);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;
    info!(url = %client.base_url(), database, "connection configured");
    Ok(client)
}

/// Set up the interface to an LBNL-hosted database (`building59` or
/// `wifi`). Returns the interface and the name of the database holding
/// the source's data. The handle itself defaults to [`HANDLE_DATABASE`].
pub fn setup_lbnl(
    config: &AppConfig,
    database_name: &str,
    style: Option<Style>,
) -> DbResult<(Interface, String)> {
    let src = config.source(database_name)?;
    let client = connect_source(config, &src, HANDLE_DATABASE)?;

    let interface = match style.unwrap_or_default() {
        Style::Frame => Interface::Frame(Database::new(client)),
        Style::Forecasts => Interface::Forecast(ForecastDatabase::new(client)),
        Style::Generic => Interface::Generic(GenericDatabase::new(client)),
    };
    Ok((interface, src.database))
}
