//! Application configuration loaded from a JSON file.
//!
//! ```json
//! {
//!   "paths": { "templates": "templates", "output": "output" },
//!   "text_positions": { "invoice_reference": [400, 120] },
//!   "rows_per_page": 58,
//!   "failure_policy": "skip"
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use invoicestamp_core::{EngineError, EngineResult};
use invoicestamp_invoicing::{DEFAULT_ROWS_PER_PAGE, LayoutRegistry, Position};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "INVOICESTAMP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_EXPORT_FILE_NAME: &str = "QT_Fillable_data.xlsx";
pub const DEFAULT_FRONT_PAGE_TEMPLATE: &str = "front_pager.pdf";
pub const DEFAULT_BACKUP_PAGE_TEMPLATE: &str = "blank_template.pdf";

/// What the batch does when one invoice fails.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing invoice; no export is written.
    #[default]
    Abort,
    /// Record the failure, roll back its cross-reference rows, continue.
    Skip,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Skip => "skip",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(EngineError::configuration(format!(
                "unknown failure policy '{other}' (expected 'abort' or 'skip')"
            ))),
        }
    }
}

impl core::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub templates: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateNames {
    #[serde(default = "default_front_page")]
    pub front_page: String,
    #[serde(default = "default_backup_page")]
    pub backup_page: String,
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            front_page: default_front_page(),
            backup_page: default_backup_page(),
        }
    }
}

fn default_front_page() -> String {
    DEFAULT_FRONT_PAGE_TEMPLATE.to_string()
}

fn default_backup_page() -> String {
    DEFAULT_BACKUP_PAGE_TEMPLATE.to_string()
}

fn default_rows_per_page() -> usize {
    DEFAULT_ROWS_PER_PAGE
}

fn default_export_file_name() -> String {
    DEFAULT_EXPORT_FILE_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub templates: TemplateNames,
    /// Slot key → `[x, y]`, top-left origin.
    pub text_positions: BTreeMap<String, [f32; 2]>,
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl AppConfig {
    /// Config location: explicit path, then `INVOICESTAMP_CONFIG`, then
    /// `config.json` in the working directory.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::configuration(format!("cannot read config {}: {e}", path.display()))
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_json_str(&text, base_dir)
    }

    /// Parse a config document; relative paths resolve against `base_dir`.
    pub fn from_json_str(text: &str, base_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let mut config: AppConfig = serde_json::from_str(text)
            .map_err(|e| EngineError::configuration(format!("invalid config: {e}")))?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.rows_per_page == 0 {
            return Err(EngineError::configuration("rows_per_page must be at least 1"));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(EngineError::configuration("export_file_name must not be empty"));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve(&self.paths.templates)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output)
    }

    pub fn front_page_template(&self) -> PathBuf {
        self.templates_dir().join(&self.templates.front_page)
    }

    pub fn backup_page_template(&self) -> PathBuf {
        self.templates_dir().join(&self.templates.backup_page)
    }

    pub fn export_path(&self) -> PathBuf {
        self.output_dir().join(&self.export_file_name)
    }

    /// Build the layout registry; unknown keys are logged and ignored.
    pub fn layout_registry(&self) -> EngineResult<LayoutRegistry> {
        let registry = LayoutRegistry::from_entries(
            self.text_positions
                .iter()
                .map(|(key, [x, y])| (key.as_str(), Position::new(*x, *y))),
        )?;
        for key in registry.ignored_keys() {
            tracing::warn!(key = %key, "ignoring unknown layout key");
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicestamp_invoicing::Slot;

    fn positions_json() -> String {
        let entries: Vec<String> = Slot::ALL
            .iter()
            .map(|slot| format!("\"{}\": [10, 20]", slot.key()))
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    fn minimal(extra: &str) -> String {
        format!(
            r#"{{"paths": {{"templates": "tpl", "output": "/srv/out"}},
                "text_positions": {}{extra}}}"#,
            positions_json()
        )
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config = AppConfig::from_json_str(&minimal(""), "/etc/invoicestamp").unwrap();
        assert_eq!(config.rows_per_page, 58);
        assert_eq!(config.export_file_name, "QT_Fillable_data.xlsx");
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.templates.front_page, "front_pager.pdf");
        assert_eq!(config.templates.backup_page, "blank_template.pdf");
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let config = AppConfig::from_json_str(&minimal(""), "/etc/invoicestamp").unwrap();
        assert_eq!(
            config.front_page_template(),
            PathBuf::from("/etc/invoicestamp/tpl/front_pager.pdf")
        );
        assert_eq!(
            config.export_path(),
            PathBuf::from("/srv/out/QT_Fillable_data.xlsx")
        );
    }

    #[test]
    fn overrides_are_read() {
        let text = minimal(r#", "rows_per_page": 2, "failure_policy": "skip""#);
        let config = AppConfig::from_json_str(&text, "").unwrap();
        assert_eq!(config.rows_per_page, 2);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
    }

    #[test]
    fn zero_rows_per_page_is_rejected() {
        let text = minimal(r#", "rows_per_page": 0"#);
        let err = AppConfig::from_json_str(&text, "").unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = AppConfig::from_json_str("{not json", "").unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = AppConfig::load("/definitely/not/here/config.json").unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn layout_registry_requires_every_slot() {
        let text = r#"{"paths": {"templates": "t", "output": "o"},
                       "text_positions": {"po": [1, 2]}}"#;
        let config = AppConfig::from_json_str(text, "").unwrap();
        assert!(config.layout_registry().is_err());

        let config = AppConfig::from_json_str(&minimal(""), "").unwrap();
        let registry = config.layout_registry().unwrap();
        assert_eq!(registry.position(Slot::Po).unwrap(), Position::new(10.0, 20.0));
    }

    #[test]
    fn failure_policy_parses_case_insensitively() {
        assert_eq!("SKIP".parse::<FailurePolicy>().unwrap(), FailurePolicy::Skip);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
