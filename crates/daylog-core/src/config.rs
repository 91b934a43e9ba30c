//! Run configuration
//!
//! Settings are collected into a [`PartialConfig`] from any number of
//! sources (a TOML file, command-line flags, environment variables), layered
//! with [`PartialConfig::overlay`], and turned into a [`Config`] once at
//! startup. The resulting value is handed to each client's constructor.
//!
//! ```toml
//! todoist_api_token = "0123abcd"
//! google_sheet_id = "1AbCdEf"
//! service_account_file = "service_account.json"
//! todoist_project_name = "Daily"
//!
//! [retry]
//! max_attempts = 3
//! base_delay_secs = 1
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{RetryPolicy, SyncError};

/// Retry settings as written in the config file
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub base_delay_secs: Option<u64>,
}

/// Configuration with every field optional, as read from one source
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub todoist_api_token: Option<String>,
    pub google_sheet_id: Option<String>,
    pub service_account_file: Option<PathBuf>,
    pub todoist_project_name: Option<String>,
    pub retry: RetrySettings,
}

impl PartialConfig {
    /// Parse TOML config text
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        toml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Layer `other` on top of `self`; values set in `other` win
    pub fn overlay(self, other: PartialConfig) -> Self {
        Self {
            todoist_api_token: other.todoist_api_token.or(self.todoist_api_token),
            google_sheet_id: other.google_sheet_id.or(self.google_sheet_id),
            service_account_file: other.service_account_file.or(self.service_account_file),
            todoist_project_name: other.todoist_project_name.or(self.todoist_project_name),
            retry: RetrySettings {
                max_attempts: other.retry.max_attempts.or(self.retry.max_attempts),
                base_delay_secs: other.retry.base_delay_secs.or(self.retry.base_delay_secs),
            },
        }
    }

    /// Validate and complete the configuration.
    ///
    /// Every missing or blank required key is named in a single error. A
    /// relative credential path is resolved against `working_dir`.
    pub fn resolve(self, working_dir: &Path) -> Result<Config, SyncError> {
        let mut missing = Vec::new();

        let todoist_api_token = required(self.todoist_api_token, "todoist_api_token", &mut missing);
        let google_sheet_id = required(self.google_sheet_id, "google_sheet_id", &mut missing);
        let todoist_project_name =
            required(self.todoist_project_name, "todoist_project_name", &mut missing);
        let service_account_file = self
            .service_account_file
            .filter(|p| !p.as_os_str().is_empty());
        if service_account_file.is_none() {
            missing.push("service_account_file");
        }

        if !missing.is_empty() {
            return Err(SyncError::Config(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            )));
        }

        let max_attempts = self
            .retry
            .max_attempts
            .unwrap_or(RetryPolicy::DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(SyncError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        let base_delay = self
            .retry
            .base_delay_secs
            .map_or(RetryPolicy::DEFAULT_BASE_DELAY, Duration::from_secs);

        Ok(Config {
            todoist_api_token: todoist_api_token.unwrap_or_default(),
            google_sheet_id: google_sheet_id.unwrap_or_default(),
            service_account_file: working_dir.join(service_account_file.unwrap_or_default()),
            todoist_project_name: todoist_project_name.unwrap_or_default(),
            retry: RetryPolicy::new(max_attempts, base_delay),
        })
    }
}

impl fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialConfig")
            .field("todoist_api_token", &self.todoist_api_token.as_ref().map(|_| "<redacted>"))
            .field("google_sheet_id", &self.google_sheet_id)
            .field("service_account_file", &self.service_account_file)
            .field("todoist_project_name", &self.todoist_project_name)
            .field("retry", &self.retry)
            .finish()
    }
}

fn required(value: Option<String>, key: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty());
    if value.is_none() {
        missing.push(key);
    }
    value
}

/// Validated configuration for one run
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub todoist_api_token: String,
    pub google_sheet_id: String,
    /// Absolute path to the service-account key file
    pub service_account_file: PathBuf,
    pub todoist_project_name: String,
    pub retry: RetryPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("todoist_api_token", &"<redacted>")
            .field("google_sheet_id", &self.google_sheet_id)
            .field("service_account_file", &self.service_account_file)
            .field("todoist_project_name", &self.todoist_project_name)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn complete() -> PartialConfig {
        PartialConfig {
            todoist_api_token: Some("token".into()),
            google_sheet_id: Some("sheet".into()),
            service_account_file: Some(PathBuf::from("key.json")),
            todoist_project_name: Some("Daily".into()),
            retry: RetrySettings::default(),
        }
    }

    #[test]
    fn resolve_complete_config() {
        let config = complete().resolve(Path::new("/work")).unwrap();
        assert_eq!(config.todoist_api_token, "token");
        assert_eq!(config.google_sheet_id, "sheet");
        assert_eq!(config.service_account_file, PathBuf::from("/work/key.json"));
        assert_eq!(config.todoist_project_name, "Daily");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn absolute_credential_path_is_kept() {
        let mut partial = complete();
        partial.service_account_file = Some(PathBuf::from("/etc/daylog/key.json"));
        let config = partial.resolve(Path::new("/work")).unwrap();
        assert_eq!(config.service_account_file, PathBuf::from("/etc/daylog/key.json"));
    }

    #[test]
    fn missing_keys_are_all_reported() {
        let partial = PartialConfig {
            google_sheet_id: Some("sheet".into()),
            todoist_project_name: Some("   ".into()),
            ..PartialConfig::default()
        };
        let err = partial.resolve(Path::new("/work")).unwrap_err();
        assert_eq!(
            err,
            SyncError::Config(
                "missing required setting(s): todoist_api_token, todoist_project_name, service_account_file"
                    .into()
            )
        );
        assert_eq!(err.kind(), crate::ErrorKind::Fatal);
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut partial = complete();
        partial.retry.max_attempts = Some(0);
        assert!(matches!(
            partial.resolve(Path::new("/work")),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn overlay_prefers_the_upper_layer() {
        let file = PartialConfig {
            todoist_project_name: Some("FromFile".into()),
            google_sheet_id: Some("file-sheet".into()),
            retry: RetrySettings {
                max_attempts: Some(5),
                base_delay_secs: Some(2),
            },
            ..PartialConfig::default()
        };
        let flags = PartialConfig {
            todoist_project_name: Some("FromFlag".into()),
            retry: RetrySettings {
                max_attempts: None,
                base_delay_secs: Some(0),
            },
            ..PartialConfig::default()
        };

        let merged = file.overlay(flags);
        assert_eq!(merged.todoist_project_name.as_deref(), Some("FromFlag"));
        assert_eq!(merged.google_sheet_id.as_deref(), Some("file-sheet"));
        assert_eq!(merged.retry.max_attempts, Some(5));
        assert_eq!(merged.retry.base_delay_secs, Some(0));
    }

    #[test]
    fn load_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
todoist_api_token = "abc"
google_sheet_id = "sheet-1"
service_account_file = "creds/key.json"
todoist_project_name = "Habits"

[retry]
max_attempts = 4
base_delay_secs = 3
"#
        )
        .unwrap();

        let config = PartialConfig::load(file.path())
            .unwrap()
            .resolve(Path::new("/home/me"))
            .unwrap();
        assert_eq!(config.todoist_project_name, "Habits");
        assert_eq!(config.service_account_file, PathBuf::from("/home/me/creds/key.json"));
        assert_eq!(config.retry, RetryPolicy::new(4, Duration::from_secs(3)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PartialConfig::parse("todoist_token = \"x\"").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let config = complete().resolve(Path::new("/work")).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("<redacted>"));
    }
}
