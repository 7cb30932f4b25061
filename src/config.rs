// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "tasks";
pub const DEFAULT_APP_NAME: &str = "mongo-tasks";

/// Connection and collection settings, read from an optional YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub uri: String,
    pub database: String,
    pub app_name: Option<String>,
    pub collections: CollectionNames,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionNames {
    pub users: String,
    pub students: String,
    pub articles: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            collections: CollectionNames::default(),
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            students: "students".to_string(),
            articles: "articles".to_string(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid settings file")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_yaml_str(&text)
    }

    /// Command-line and environment values win over the file.
    pub fn with_overrides(mut self, uri: Option<String>, database: Option<String>) -> Self {
        if let Some(uri) = uri {
            self.uri = uri;
        }
        if let Some(database) = database {
            self.database = database;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = Settings::from_yaml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.collections.articles, "articles");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let settings = Settings::from_yaml_str(
            "database: school\ncollections:\n  students: pupils\n",
        )
        .unwrap();
        assert_eq!(settings.database, "school");
        assert_eq!(settings.uri, DEFAULT_URI);
        assert_eq!(settings.collections.students, "pupils");
        assert_eq!(settings.collections.users, "users");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_yaml_str("databse: typo\n").is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let settings = Settings::from_yaml_str("uri: mongodb://file:27017\ndatabase: file\n")
            .unwrap()
            .with_overrides(Some("mongodb://cli:27017".into()), None);
        assert_eq!(settings.uri, "mongodb://cli:27017");
        assert_eq!(settings.database, "file");
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "app_name: nightly").unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.app_name.as_deref(), Some("nightly"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Settings::load("/nonexistent/mongo-tasks.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/mongo-tasks.yaml"));
    }
}
