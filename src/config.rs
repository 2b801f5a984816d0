//! Configuration loading: YAML/JSON file plus command-line overrides.

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::domain::errors::{ExportError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// libpq-style connection string, e.g. `host=db user=ro dbname=sierra`.
    pub connection_string: String,
    /// Rows fetched from the server per cursor round trip.
    #[serde(default = "default_itersize")]
    pub itersize: usize,
}

fn default_itersize() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Existing directory the dated output file is written into.
    pub output_path: String,
    /// Two-statement staging unit: unconditional drop of the staged object,
    /// then create-as-select. Executed verbatim in one transaction.
    pub staging_sql: String,
    /// Select over the staged object, driven through the named cursor.
    pub export_query: String,
    /// Treat a zero-row export as a failure instead of an empty file.
    #[serde(default)]
    pub fail_on_empty: bool,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    // Overrides for ad-hoc runs
    #[arg(long)]
    pub connection_string: Option<String>,
    #[arg(long)]
    pub itersize: Option<usize>,
    #[arg(short, long)]
    pub output: Option<String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).map_err(|e| ExportError::Config(format!("{}: {}", path, e)))?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents).map_err(|e| ExportError::Config(e.to_string()))?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ExportError::Config(e.to_string()))?
        };

        Ok(config)
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(c) = &args.connection_string {
            self.database.connection_string = c.clone();
        }
        if let Some(i) = args.itersize {
            self.database.itersize = i;
        }
        if let Some(o) = &args.output {
            self.export.output_path = o.clone();
        }
    }

    /// Fails fast on anything the pipeline would otherwise trip over mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.database.connection_string.trim().is_empty() {
            return Err(ExportError::Config(
                "database.connection_string must not be empty".to_string(),
            ));
        }
        if self.database.itersize == 0 {
            return Err(ExportError::Config(
                "database.itersize must be at least 1".to_string(),
            ));
        }
        if !Path::new(&self.export.output_path).is_dir() {
            return Err(ExportError::Config(format!(
                "output path does not exist: {}",
                self.export.output_path
            )));
        }
        if self.export.staging_sql.trim().is_empty() {
            return Err(ExportError::Config(
                "export.staging_sql must not be empty".to_string(),
            ));
        }
        if self.export.export_query.trim().is_empty() {
            return Err(ExportError::Config(
                "export.export_query must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml = r#"
database:
  connection_string: "host=localhost user=test dbname=test"
  itersize: 500
export:
  output_path: "./out"
  staging_sql: "DROP TABLE IF EXISTS temp_output; CREATE TEMP TABLE temp_output AS SELECT 1 AS id"
  export_query: "SELECT * FROM temp_output"
"#;
        let file = write_config(yaml, ".yaml");
        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(
            config.database.connection_string,
            "host=localhost user=test dbname=test"
        );
        assert_eq!(config.database.itersize, 500);
        assert_eq!(config.export.output_path, "./out");
        assert!(!config.export.fail_on_empty);
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{
  "database": {"connection_string": "host=h user=u"},
  "export": {
    "output_path": "/tmp",
    "staging_sql": "DROP TABLE IF EXISTS t; CREATE TEMP TABLE t AS SELECT 1",
    "export_query": "SELECT * FROM t",
    "fail_on_empty": true
  }
}"#;
        let file = write_config(json, ".json");
        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();

        // itersize falls back to its default when omitted.
        assert_eq!(config.database.itersize, 1000);
        assert!(config.export.fail_on_empty);
    }

    fn base_config(output_path: &str) -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                connection_string: "host=h user=u".to_string(),
                itersize: 1000,
            },
            export: ExportConfig {
                output_path: output_path.to_string(),
                staging_sql: "DROP TABLE IF EXISTS t; CREATE TEMP TABLE t AS SELECT 1".to_string(),
                export_query: "SELECT * FROM t".to_string(),
                fail_on_empty: false,
            },
        }
    }

    #[test]
    fn test_validate_accepts_existing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = base_config(dir.path().to_str().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let config = base_config(missing.to_str().unwrap());
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_itersize() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = base_config(dir.path().to_str().unwrap());
        config.database.itersize = 0;
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_staging_sql() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = base_config(dir.path().to_str().unwrap());
        config.export.staging_sql = "  ".to_string();
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = base_config("./somewhere");
        let args = CliArgs {
            config: "config.yaml".to_string(),
            connection_string: Some("host=other".to_string()),
            itersize: Some(25),
            output: Some(dir.path().to_str().unwrap().to_string()),
        };
        config.merge_cli(&args);

        assert_eq!(config.database.connection_string, "host=other");
        assert_eq!(config.database.itersize, 25);
        assert_eq!(config.export.output_path, dir.path().to_str().unwrap());
    }
}
