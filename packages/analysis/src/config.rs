//! Engine policy configuration.
//!
//! The default policy lives in `config/engine.toml` and is embedded at
//! compile time. Deployments can override any subset of it with their own
//! TOML file; missing keys fall back to the defaults.

use std::path::Path;

use civic_watch_analysis_models::EngineConfig;

use crate::ConfigError;

const EMBEDDED_CONFIG: &str = include_str!("../config/engine.toml");

/// Returns the embedded default configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a build-time asset, so this
/// is caught by the test suite).
#[must_use]
pub fn embedded() -> EngineConfig {
    from_toml_str(EMBEDDED_CONFIG)
        .unwrap_or_else(|e| panic!("Failed to parse embedded engine config: {e}"))
}

/// Parses and validates a configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Invalid`] when a value breaks a policy constraint.
pub fn from_toml_str(toml_str: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::de::from_str(toml_str)?;
    validate(&config)?;
    Ok(config)
}

/// Reads, parses, and validates a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
/// [`from_toml_str`].
pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
    log::debug!("Loading engine config from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    from_toml_str(&contents)
}

/// Checks the cross-field constraints serde cannot express.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] describing the first violation.
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let pattern = &config.pattern;

    if !(pattern.local_radius_meters.is_finite() && pattern.local_radius_meters > 0.0) {
        return Err(invalid(format!(
            "local_radius_meters must be positive, got {}",
            pattern.local_radius_meters
        )));
    }

    if !(pattern.zone_cells_per_degree.is_finite() && pattern.zone_cells_per_degree > 0.0) {
        return Err(invalid(format!(
            "zone_cells_per_degree must be positive, got {}",
            pattern.zone_cells_per_degree
        )));
    }

    if !(pattern.declining_ratio > 0.0 && pattern.declining_ratio <= pattern.increasing_ratio) {
        return Err(invalid(format!(
            "trend ratios must satisfy 0 < declining ({}) <= increasing ({})",
            pattern.declining_ratio, pattern.increasing_ratio
        )));
    }

    if pattern.persistent_trend_span_ms <= 0 {
        return Err(invalid(format!(
            "persistent_trend_span_ms must be positive, got {}",
            pattern.persistent_trend_span_ms
        )));
    }

    let cluster = &config.cluster;
    if cluster.medium_above >= cluster.large_above {
        return Err(invalid(format!(
            "cluster medium_above ({}) must be below large_above ({})",
            cluster.medium_above, cluster.large_above
        )));
    }

    Ok(())
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid { message }
}

#[cfg(test)]
mod tests {
    use civic_watch_analysis_models::{ClusterConfig, PatternConfig};

    use super::*;

    #[test]
    fn embedded_matches_defaults() {
        assert_eq!(embedded(), EngineConfig::default());
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config = from_toml_str("[pattern]\nlocal_radius_meters = 350.0\n").unwrap();
        assert!((config.pattern.local_radius_meters - 350.0).abs() < f64::EPSILON);
        assert!(
            (config.pattern.increasing_ratio - PatternConfig::default().increasing_ratio).abs()
                < f64::EPSILON
        );
        assert_eq!(config.cluster, ClusterConfig::default());
    }

    #[test]
    fn partial_cluster_override_keeps_presets() {
        let config = from_toml_str("[cluster]\nmedium_above = 5\n").unwrap();
        assert_eq!(config.cluster.medium_above, 5);
        assert_eq!(config.cluster.large_above, ClusterConfig::default().large_above);
        assert_eq!(config.cluster.large, ClusterConfig::default().large);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn rejects_non_positive_radius() {
        let err = from_toml_str("[pattern]\nlocal_radius_meters = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_inverted_trend_ratios() {
        let err =
            from_toml_str("[pattern]\nincreasing_ratio = 0.5\ndeclining_ratio = 0.9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = from_toml_str("[pattern\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load(Path::new("/nonexistent/civic-watch/engine.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "{err}");
    }
}
