//! Command-line configuration file.
//!
//! ```toml
//! max_depth = 256
//!
//! [seed]
//! a = 2
//! c = 7
//! ```

use directories::ProjectDirs;
use lazysheet_engine::SheetConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    max_depth: Option<usize>,
    seed: Option<BTreeMap<String, i64>>,
}

/// Settings for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub sheet: SheetConfig,
    /// Values assigned before any table or `--set`, in name order.
    pub seed: Vec<(String, i64)>,
}

/// Load the configuration, falling back to defaults with warnings on problems.
///
/// An explicit path that does not exist is a warning; a missing file at the
/// default location is not.
pub fn load_config(config_file: Option<&PathBuf>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = config_file.cloned().or_else(user_config_path);
    let mut config = Config::default();

    let Some(path) = config_path.as_ref() else {
        return (config, warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (config, warnings);
    }

    let parsed = match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    if let Some(file) = parsed {
        if let Some(max_depth) = file.max_depth {
            if max_depth == 0 {
                warnings.push("max_depth must be at least 1; using 1".to_string());
            }
            config.sheet = config.sheet.with_max_depth(max_depth);
        }
        config.seed = file.seed.unwrap_or_default().into_iter().collect();
        log::debug!("Loaded config from {}", path.display());
    }

    (config, warnings)
}

pub(crate) fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "lazysheet")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_config_path_is_deterministic() {
        // Should never panic and should either be Some(path) or None.
        assert_eq!(user_config_path(), user_config_path());
    }

    #[test]
    fn load_config_reads_seed_and_depth() {
        let temp_path = std::env::temp_dir().join("lazysheet_config_test.toml");
        let content = r#"
max_depth = 64

[seed]
c = 7
a = 2
"#;
        std::fs::write(&temp_path, content).expect("write temp config");

        let (config, warnings) = load_config(Some(&temp_path));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.sheet.max_depth, 64);
        assert_eq!(
            config.seed,
            vec![("a".to_string(), 2), ("c".to_string(), 7)]
        );

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_config_rejects_unknown_field() {
        let temp_path = std::env::temp_dir().join("lazysheet_config_unknown_field.toml");
        std::fs::write(&temp_path, "colour = \"blue\"\n").expect("write temp config");

        let (config, warnings) = load_config(Some(&temp_path));
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Failed to parse"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_config_rejects_oversized_file() {
        let temp_path = std::env::temp_dir().join("lazysheet_config_large.toml");
        let content = "#".repeat((MAX_CONFIG_FILE_BYTES + 1) as usize);
        std::fs::write(&temp_path, content).expect("write temp config");

        let (config, warnings) = load_config(Some(&temp_path));
        assert_eq!(config, Config::default());
        assert!(warnings[0].contains("too large"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn load_config_warns_on_missing_explicit_file() {
        let temp_path = std::env::temp_dir().join("lazysheet_config_missing.toml");
        let _ = std::fs::remove_file(&temp_path);

        let (config, warnings) = load_config(Some(&temp_path));
        assert_eq!(config, Config::default());
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn zero_max_depth_is_clamped() {
        let temp_path = std::env::temp_dir().join("lazysheet_config_zero_depth.toml");
        std::fs::write(&temp_path, "max_depth = 0\n").expect("write temp config");

        let (config, warnings) = load_config(Some(&temp_path));
        assert_eq!(config.sheet.max_depth, 1);
        assert_eq!(warnings.len(), 1);

        let _ = std::fs::remove_file(&temp_path);
    }
}
