//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use commons_sampler::config_syntax::{
    self, parse_integer, parse_number, parse_string_literal,
};

use crate::cli::MAX_SLEEP_SECS;

const CONFIG_DIR_NAME: &str = "commons-sampler";
const CONFIG_FILE_NAME: &str = "config.toml";

/// File configuration for sampler defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub output_dir: Option<PathBuf>,
    pub per_category: Option<u16>,
    pub seed: Option<String>,
    pub sleep_secs: Option<f64>,
    pub categories_file: Option<PathBuf>,
    pub api_url: Option<String>,
    pub contact: Option<String>,
    /// API attempts per call (same range as `-r`).
    pub max_retries: Option<u8>,
    /// Search results collected per category.
    pub search_limit: Option<usize>,
    /// Ranked titles resolved to metadata per category.
    pub metadata_pool: Option<usize>,
    /// Titles per metadata request (1..=50).
    pub metadata_batch_size: Option<usize>,
    pub api_timeout_secs: Option<u64>,
    pub download_timeout_secs: Option<u64>,
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("per_category", self.per_category.map(u64::from), 1, 500)?;
        validate_range("max_retries", self.max_retries.map(u64::from), 1, 10)?;
        validate_range("search_limit", self.search_limit.map(as_u64), 1, 10_000)?;
        validate_range("metadata_pool", self.metadata_pool.map(as_u64), 1, 10_000)?;
        validate_range(
            "metadata_batch_size",
            self.metadata_batch_size.map(as_u64),
            1,
            50,
        )?;
        validate_range("api_timeout_secs", self.api_timeout_secs, 1, 3600)?;
        validate_range("download_timeout_secs", self.download_timeout_secs, 1, 3600)?;

        if let Some(sleep_secs) = self.sleep_secs
            && !(0.0..=MAX_SLEEP_SECS).contains(&sleep_secs)
        {
            bail!(
                "Invalid config value for `sleep_secs`: {sleep_secs}. Expected range: 0..={MAX_SLEEP_SECS}"
            );
        }
        if let Some(seed) = &self.seed
            && seed.is_empty()
        {
            bail!("Invalid config value for `seed`: expected a non-empty string");
        }

        Ok(())
    }
}

fn as_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/commons-sampler/config.toml`
/// 2. `$HOME/.config/commons-sampler/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(read_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn read_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for assignment in config_syntax::assignments(raw) {
        let assignment = assignment?;
        let line = assignment.line;
        let value = assignment.value;
        let invalid = |key: &str| format!("Invalid `{key}` value on line {line}");

        match assignment.key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(|| invalid("output_dir"))?,
                ));
            }
            "per_category" => {
                cfg.per_category = Some(parse_bounded(value).with_context(|| invalid("per_category"))?);
            }
            "seed" => {
                cfg.seed = Some(parse_string_literal(value).with_context(|| invalid("seed"))?);
            }
            "sleep_secs" => {
                cfg.sleep_secs = Some(parse_number(value).with_context(|| invalid("sleep_secs"))?);
            }
            "categories_file" => {
                cfg.categories_file = Some(PathBuf::from(
                    parse_string_literal(value).with_context(|| invalid("categories_file"))?,
                ));
            }
            "api_url" => {
                cfg.api_url = Some(parse_string_literal(value).with_context(|| invalid("api_url"))?);
            }
            "contact" => {
                cfg.contact = Some(parse_string_literal(value).with_context(|| invalid("contact"))?);
            }
            "max_retries" => {
                cfg.max_retries = Some(parse_bounded(value).with_context(|| invalid("max_retries"))?);
            }
            "search_limit" => {
                cfg.search_limit = Some(parse_bounded(value).with_context(|| invalid("search_limit"))?);
            }
            "metadata_pool" => {
                cfg.metadata_pool =
                    Some(parse_bounded(value).with_context(|| invalid("metadata_pool"))?);
            }
            "metadata_batch_size" => {
                cfg.metadata_batch_size =
                    Some(parse_bounded(value).with_context(|| invalid("metadata_batch_size"))?);
            }
            "api_timeout_secs" => {
                cfg.api_timeout_secs =
                    Some(parse_integer(value).with_context(|| invalid("api_timeout_secs"))?);
            }
            "download_timeout_secs" => {
                cfg.download_timeout_secs =
                    Some(parse_integer(value).with_context(|| invalid("download_timeout_secs"))?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(|| invalid("verbosity"))?;
                cfg.verbosity = Some(
                    parse_verbosity(&parsed)
                        .with_context(|| format!("Invalid `verbosity` value '{parsed}' on line {line}"))?,
                );
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn parse_bounded<T: TryFrom<u64>>(raw_value: &str) -> Result<T> {
    let value = parse_integer(raw_value)?;
    T::try_from(value).map_err(|_| anyhow::anyhow!("Integer value {value} out of range"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
per_category = 8
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.per_category, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.output_dir.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
output_dir = "/data/samples"
per_category = 12
seed = "2024-run"
sleep_secs = 0.5
categories_file = "cats.toml"
api_url = "https://commons.example.org/w/api.php"
contact = "ops@example.org"
max_retries = 3
search_limit = 100
metadata_pool = 50
metadata_batch_size = 10
api_timeout_secs = 15
download_timeout_secs = 90
verbosity = "quiet"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/data/samples")));
        assert_eq!(cfg.seed.as_deref(), Some("2024-run"));
        assert_eq!(cfg.sleep_secs, Some(0.5));
        assert_eq!(cfg.categories_file, Some(PathBuf::from("cats.toml")));
        assert_eq!(cfg.max_retries, Some(3));
        assert_eq!(cfg.search_limit, Some(100));
        assert_eq!(cfg.metadata_pool, Some(50));
        assert_eq!(cfg.metadata_batch_size, Some(10));
        assert_eq!(cfg.api_timeout_secs, Some(15));
        assert_eq!(cfg.download_timeout_secs, Some(90));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Quiet));
    }

    #[test]
    fn test_parse_config_rejects_invalid_per_category() {
        let err = parse_config_str("per_category = 0").expect_err("invalid per_category expected");
        assert!(err.to_string().contains("per_category"));
    }

    #[test]
    fn test_parse_config_rejects_batch_size_above_api_limit() {
        let err = parse_config_str("metadata_batch_size = 51").expect_err("51 is above range");
        assert!(err.to_string().contains("metadata_batch_size"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("per_category = 4 trailing").expect_err("trailing token error");
        assert!(err.to_string().contains("per_category"));
    }

    #[test]
    fn test_parse_config_rejects_max_retries_too_large_for_u8() {
        let err = parse_config_str("max_retries = 300").expect_err("out-of-range u8 error");
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_parse_config_rejects_negative_sleep() {
        let err = parse_config_str("sleep_secs = -0.5").expect_err("negative sleep error");
        assert!(err.to_string().contains("sleep_secs"));
    }

    #[test]
    fn test_parse_config_rejects_sleep_above_cap() {
        let err = parse_config_str("sleep_secs = 1e20").expect_err("huge sleep error");
        assert!(err.to_string().contains("sleep_secs"));
        let cfg = parse_config_str("sleep_secs = 3600").expect("cap itself is accepted");
        assert_eq!(cfg.sleep_secs, Some(3600.0));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
seed = "a#b" # seed with a hash
per_category = 4 # smaller sample
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.seed.as_deref(), Some("a#b"));
        assert_eq!(cfg.per_category, Some(4));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_bad_verbosity() {
        let err = parse_config_str(r#"verbosity = "loud""#).expect_err("bad verbosity");
        assert!(err.to_string().contains("verbosity"));
    }

    #[test]
    fn test_load_file_config_explicit_missing_path_errors() {
        let temp_dir = TempDir::new().expect("temp dir");
        let missing = temp_dir.path().join("nope.toml");
        let err = load_file_config(Some(&missing)).expect_err("missing explicit config");
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_file_config_explicit_path() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("sampler.toml");
        std::fs::write(&path, "seed = \"x\"\n").expect("write config");
        let loaded = load_file_config(Some(&path)).expect("config should load");
        assert_eq!(loaded.config.and_then(|c| c.seed).as_deref(), Some("x"));
    }
}
