//! Credentials file reader
//!
//! Each CSV record holds three hex-encoded UTF-8 fields:
//! source name, user name and password. The file must be readable by its
//! owner only (mode 0400) or access is refused.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::ConfigError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read the credentials for `source` from the access file at `path`
pub fn get_access<P: AsRef<Path>>(path: P, source: &str) -> Result<Credentials, ConfigError> {
    let path = path.as_ref();
    let denied = || ConfigError::AccessDenied {
        path: path.to_path_buf(),
    };

    check_permissions(path).map_err(|_| denied())?;
    let content = fs::read_to_string(path).map_err(|_| denied())?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    for record in reader.records() {
        let record = record.map_err(|e| ConfigError::MalformedAccessLine {
            line: e.position().map_or(0, |p| p.line() as usize),
            reason: e.to_string(),
        })?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let name = decode_field(record.get(0).unwrap_or_default(), line)?;
        if name != source {
            continue;
        }
        if record.len() < 3 {
            return Err(ConfigError::MalformedAccessLine {
                line,
                reason: format!("expected 3 fields, found {}", record.len()),
            });
        }
        tracing::debug!(source, "access entry found");
        return Ok(Credentials {
            username: decode_field(&record[1], line)?,
            password: decode_field(&record[2], line)?,
        });
    }

    Err(ConfigError::SourceNotFound(source.to_string()))
}

#[cfg(unix)]
fn check_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode() & 0o777;
    if mode != 0o400 {
        tracing::warn!(path = %path.display(), mode = %format!("{:o}", mode), "accessing file with wrong permissions");
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "access file must have mode 0400",
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(path: &Path) -> std::io::Result<()> {
    fs::metadata(path).map(|_| ())
}

fn decode_field(field: &str, line: usize) -> Result<String, ConfigError> {
    let bytes = hex::decode(field).map_err(|e| ConfigError::MalformedAccessLine {
        line,
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| ConfigError::MalformedAccessLine {
        line,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(source: &str, user: &str, password: &str) -> String {
        format!(
            "{},{},{}\n",
            hex::encode(source),
            hex::encode(user),
            hex::encode(password)
        )
    }

    fn write_access(dir: &Path, content: &str, mode: u32) -> PathBuf {
        let path = dir.join("access.config");
        fs::write(&path, content).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = mode;
        path
    }

    #[test]
    fn reads_matching_source() {
        let dir = tempfile::tempdir().unwrap();
        let content = entry("wifi", "wifi_reader", "pw1") + &entry("IDBC", "bldg", "s3cret,x");
        let path = write_access(dir.path(), &content, 0o400);

        let creds = get_access(&path, "IDBC").unwrap();
        assert_eq!(creds.username, "bldg");
        assert_eq!(creds.password, "s3cret,x");

        let creds = get_access(&path, "wifi").unwrap();
        assert_eq!(creds.username, "wifi_reader");
    }

    #[test]
    fn unknown_source_denied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_access(dir.path(), &entry("wifi", "u", "p"), 0o400);
        assert!(matches!(
            get_access(&path, "IDBC"),
            Err(ConfigError::SourceNotFound(_))
        ));
    }

    #[test]
    fn missing_file_denied() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            get_access(dir.path().join("access.config"), "wifi"),
            Err(ConfigError::AccessDenied { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn wrong_permissions_denied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_access(dir.path(), &entry("wifi", "u", "p"), 0o644);
        assert!(matches!(
            get_access(&path, "wifi"),
            Err(ConfigError::AccessDenied { .. })
        ));
    }

    #[test]
    fn bad_hex_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_access(dir.path(), "zz,00,00\n", 0o400);
        assert!(matches!(
            get_access(&path, "wifi"),
            Err(ConfigError::MalformedAccessLine { line: 1, .. })
        ));
    }

    #[test]
    fn quoted_fields_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!("\n{}\n", r#""77696669","75","70""#);
        let path = write_access(dir.path(), &content, 0o400);

        let creds = get_access(&path, "wifi").unwrap();
        assert_eq!(creds.username, "u");
        assert_eq!(creds.password, "p");
    }

    #[test]
    fn short_record_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let content = entry("IDBC", "u", "p") + &hex::encode("wifi") + "," + &hex::encode("u") + "\n";
        let path = write_access(dir.path(), &content, 0o400);
        assert!(matches!(
            get_access(&path, "wifi"),
            Err(ConfigError::MalformedAccessLine { line: 2, .. })
        ));
    }

    #[test]
    fn password_not_in_debug() {
        let creds = Credentials {
            username: "u".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
