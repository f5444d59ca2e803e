// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading and validation for actionkit adapters.
//!
//! This crate provides [`AdapterConfig`] (the default entity, the response
//! walker's depth cap, and the description limit advertised to toolsets)
//! together with helpers for loading from TOML files, applying environment
//! overrides, and producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use ak_error::{AkError, ErrorCode};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file or an override could not be parsed.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

impl From<ConfigError> for AkError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        AkError::new(ErrorCode::ConfigInvalid, message).with_source(err)
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The walker depth cap is far above anything a model produces.
    LargeDepthCap {
        /// Configured cap.
        depth: usize,
    },
    /// Descriptions are sent to the model without a length cap.
    UnboundedDescriptions,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::LargeDepthCap { depth } => {
                write!(f, "max_args_depth {depth} is unusually large")
            }
            ConfigWarning::UnboundedDescriptions => {
                write!(f, "description_char_limit is unset; long descriptions may be rejected")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Entity used when neither the caller nor the config names one.
pub const DEFAULT_ENTITY_ID: &str = "default";

/// Default recursion cap for converting function-call arguments.
pub const DEFAULT_MAX_ARGS_DEPTH: usize = 64;

/// Default description cap (the Google AI function-declaration limit).
pub const DEFAULT_DESCRIPTION_CHAR_LIMIT: usize = 1024;

/// Hard upper bound for `max_args_depth`.
const MAX_ARGS_DEPTH_LIMIT: usize = 1024;

/// Threshold above which a depth cap generates a warning.
const LARGE_DEPTH_THRESHOLD: usize = 256;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Runtime settings shared by the toolset adapters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Entity that actions execute under when the caller does not name one.
    #[serde(default = "default_entity_id")]
    pub entity_id: String,

    /// Maximum nesting accepted when converting function-call arguments.
    #[serde(default = "default_max_args_depth")]
    pub max_args_depth: usize,

    /// Maximum description length, in characters, for exported tools.
    ///
    /// `None` means no cap. Config files spell that as `0`.
    #[serde(
        default = "default_description_char_limit",
        deserialize_with = "limit_from_file",
        serialize_with = "limit_to_file"
    )]
    #[schemars(with = "Option<usize>")]
    pub description_char_limit: Option<usize>,

    /// Log level for the `ak` tracing targets (e.g. `"debug"`, `"info"`).
    ///
    /// See [`AdapterConfig::log_directive`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_entity_id() -> String {
    DEFAULT_ENTITY_ID.to_string()
}

fn default_max_args_depth() -> usize {
    DEFAULT_MAX_ARGS_DEPTH
}

fn default_description_char_limit() -> Option<usize> {
    Some(DEFAULT_DESCRIPTION_CHAR_LIMIT)
}

fn limit_from_file<'de, D: Deserializer<'de>>(de: D) -> Result<Option<usize>, D::Error> {
    Ok(Option::<usize>::deserialize(de)?.filter(|&limit| limit != 0))
}

fn limit_to_file<S: Serializer>(limit: &Option<usize>, ser: S) -> Result<S::Ok, S::Error> {
    limit.unwrap_or(0).serialize(ser)
}

impl AdapterConfig {
    /// `tracing_subscriber::EnvFilter` directive for the adapter targets.
    ///
    /// Yields `ak=<log_level>`, or `ak=info` when no level is set. Every
    /// actionkit target starts with `ak`, so the directive covers them all.
    #[must_use]
    pub fn log_directive(&self) -> String {
        format!("ak={}", self.log_level.as_deref().unwrap_or("info"))
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            entity_id: default_entity_id(),
            max_args_depth: DEFAULT_MAX_ARGS_DEPTH,
            description_char_limit: default_description_char_limit(),
            log_level: Some("info".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`AdapterConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`AdapterConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<AdapterConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => AdapterConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML string into an [`AdapterConfig`].
pub fn parse_toml(content: &str) -> Result<AdapterConfig, ConfigError> {
    toml::from_str::<AdapterConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `AK_ENTITY_ID`
/// - `AK_MAX_ARGS_DEPTH`
/// - `AK_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut AdapterConfig) -> Result<(), ConfigError> {
    apply_overrides_with(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup` instead of the process environment.
pub fn apply_overrides_with(
    config: &mut AdapterConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = lookup("AK_ENTITY_ID") {
        config.entity_id = val;
    }
    if let Some(val) = lookup("AK_MAX_ARGS_DEPTH") {
        config.max_args_depth = val.trim().parse().map_err(|_| ConfigError::ParseError {
            reason: format!("AK_MAX_ARGS_DEPTH must be an integer, got '{val}'"),
        })?;
    }
    if let Some(val) = lookup("AK_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (blank entity, out-of-range depth cap, zero description
/// limit, unknown log level) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &AdapterConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.entity_id.trim().is_empty() {
        errors.push("entity_id must not be empty".into());
    }

    let depth = config.max_args_depth;
    if depth == 0 || depth > MAX_ARGS_DEPTH_LIMIT {
        errors.push(format!(
            "max_args_depth {depth} out of range (1..={MAX_ARGS_DEPTH_LIMIT})"
        ));
    } else if depth > LARGE_DEPTH_THRESHOLD {
        warnings.push(ConfigWarning::LargeDepthCap { depth });
    }

    match config.description_char_limit {
        Some(0) => {
            errors.push("description_char_limit must be positive; use None for no cap".into());
        }
        Some(_) => {}
        None => warnings.push(ConfigWarning::UnboundedDescriptions),
    }

    if let Some(ref level) = config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid_without_warnings() {
        let warnings = validate_config(&AdapterConfig::default()).unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = AdapterConfig::default();
        assert_eq!(cfg.entity_id, "default");
        assert_eq!(cfg.max_args_depth, 64);
        assert_eq!(cfg.description_char_limit, Some(1024));
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn parse_empty_toml_fills_defaults() {
        let cfg = parse_toml("").unwrap();
        assert_eq!(cfg.entity_id, DEFAULT_ENTITY_ID);
        assert_eq!(cfg.max_args_depth, DEFAULT_MAX_ARGS_DEPTH);
        assert_eq!(cfg.description_char_limit, Some(DEFAULT_DESCRIPTION_CHAR_LIMIT));
        assert!(cfg.log_level.is_none());
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            entity_id = "team-42"
            max_args_depth = 16
            description_char_limit = 512
            log_level = "debug"
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.entity_id, "team-42");
        assert_eq!(cfg.max_args_depth, 16);
        assert_eq!(cfg.description_char_limit, Some(512));
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn zero_description_limit_in_toml_means_unbounded() {
        let cfg = parse_toml("description_char_limit = 0").unwrap();
        assert_eq!(cfg.description_char_limit, None);
        let warnings = validate_config(&cfg).unwrap();
        assert_eq!(warnings, vec![ConfigWarning::UnboundedDescriptions]);
    }

    #[test]
    fn log_directive_follows_log_level() {
        let mut cfg = AdapterConfig::default();
        assert_eq!(cfg.log_directive(), "ak=info");
        cfg.log_level = Some("trace".into());
        assert_eq!(cfg.log_directive(), "ak=trace");
        cfg.log_level = None;
        assert_eq!(cfg.log_directive(), "ak=info");
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let err = parse_toml("this is [not valid toml =").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_wrong_types_gives_parse_error() {
        let err = parse_toml("max_args_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_blank_entity() {
        let cfg = AdapterConfig {
            entity_id: "   ".into(),
            ..Default::default()
        };
        match validate_config(&cfg).unwrap_err() {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("entity_id")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn validation_catches_zero_depth() {
        let cfg = AdapterConfig {
            max_args_depth: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&cfg),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn large_depth_warns() {
        let cfg = AdapterConfig {
            max_args_depth: 512,
            ..Default::default()
        };
        let warnings = validate_config(&cfg).unwrap();
        assert_eq!(warnings, vec![ConfigWarning::LargeDepthCap { depth: 512 }]);
    }

    #[test]
    fn missing_description_limit_warns() {
        let cfg = AdapterConfig {
            description_char_limit: None,
            ..Default::default()
        };
        let warnings = validate_config(&cfg).unwrap();
        assert_eq!(warnings, vec![ConfigWarning::UnboundedDescriptions]);
    }

    #[test]
    fn validation_collects_every_problem() {
        let cfg = AdapterConfig {
            entity_id: String::new(),
            max_args_depth: 5000,
            description_char_limit: Some(0),
            log_level: Some("verbose".into()),
        };
        match validate_config(&cfg).unwrap_err() {
            ConfigError::ValidationError { reasons } => assert_eq!(reasons.len(), 4),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_values() {
        let env: HashMap<&str, &str> = [
            ("AK_ENTITY_ID", "ops"),
            ("AK_MAX_ARGS_DEPTH", "8"),
            ("AK_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();
        let mut cfg = AdapterConfig::default();
        apply_overrides_with(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.entity_id, "ops");
        assert_eq!(cfg.max_args_depth, 8);
        assert_eq!(cfg.log_level.as_deref(), Some("trace"));
    }

    #[test]
    fn unparsable_depth_override_is_an_error() {
        let mut cfg = AdapterConfig::default();
        let err = apply_overrides_with(&mut cfg, |k| {
            (k == "AK_MAX_ARGS_DEPTH").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert_eq!(cfg.max_args_depth, DEFAULT_MAX_ARGS_DEPTH);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "entity_id = \"from-file\"").unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        // AK_ENTITY_ID may be set by the surrounding environment.
        if std::env::var("AK_ENTITY_ID").is_err() {
            assert_eq!(cfg.entity_id, "from-file");
        }
    }

    #[test]
    fn load_missing_file_gives_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/actionkit.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn config_error_converts_to_config_invalid() {
        let err: AkError = ConfigError::ParseError {
            reason: "bad".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ConfigInvalid);
        assert!(std::error::Error::source(&err).is_some());
    }
}
