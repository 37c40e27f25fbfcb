//! INI file configuration adapter.

use crate::domain::error::SmacrossError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SmacrossError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|e| SmacrossError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SmacrossError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SmacrossError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
csv_path = data/stock.csv
symbol = STOCK

[strategy]
short_window = 50
long_window = 200
start_date = 2015-01-01
end_date = 2020-12-31
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "csv_path"),
            Some("data/stock.csv".to_string())
        );
        assert_eq!(adapter.get_string("data", "symbol"), Some("STOCK".to_string()));
        assert_eq!(
            adapter.get_string("strategy", "start_date"),
            Some("2015-01-01".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("strategy", "short_window", 0), 50);
        assert_eq!(adapter.get_int("strategy", "long_window", 0), 200);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nshort_window = fifty\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "short_window", 42), 42);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("strategy", "long_window", 0), 200);
    }

    #[test]
    fn from_file_error_for_missing_file() {
        let err = FileConfigAdapter::from_file("/nonexistent/config.ini").unwrap_err();
        assert!(matches!(err, SmacrossError::ConfigParse { .. }));
    }
}
