//! Measurement naming helpers

/// Make a column or key name usable as an InfluxDB measurement name:
/// `-` and `/` become `_`, `#` is removed and spaces become `_`.
pub fn compatible_name(name: &str) -> String {
    name.replace('-', "_")
        .replace('#', "")
        .replace('/', "_")
        .replace(' ', "_")
}

/// Quote an identifier for use inside an InfluxQL statement.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
