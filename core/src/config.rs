//! Configuration loading
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file (`charm.toml` in the working directory, or an explicit path
//!    from the builder / `CHARM_CONFIG_PATH`)
//! 3. Environment variables prefixed `CHARM_`, nested with `__`
//!    (e.g. `CHARM_ENGINE__MAX_DEPTH=32`)
//!
//! A `.env` file is loaded into the environment first.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/* ===================== Settings ===================== */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Limits and defaults the evaluator enforces per execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest allowed chain of nested handler dispatches
    pub max_depth: usize,
    /// Most iterations a single loop may run
    pub max_iterations: usize,
    /// Deepest allowed nesting inside a tier 3 literal
    pub max_literal_depth: usize,
    /// Default iteration mode for `$loop` and `$foreach`
    pub parallel_loops: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_iterations: 10_000,
            max_literal_depth: 32,
            parallel_loops: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/* ===================== Builder ===================== */

#[derive(Debug)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    use_environment: bool,
}

impl ConfigBuilder {
    /// Use this TOML file instead of the default search
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Whether `.env` and `CHARM_*` variables are consulted (default: yes)
    pub fn environment(mut self, enabled: bool) -> Self {
        self.use_environment = enabled;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if self.use_environment {
            // A missing .env file is fine
            let _ = dotenvy::dotenv();
        }

        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        let path = self.config_path.or_else(|| {
            self.use_environment
                .then(|| std::env::var("CHARM_CONFIG_PATH").ok().map(PathBuf::from))
                .flatten()
        });
        builder = match path {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder.add_source(config::File::with_name("charm").required(false)),
        };

        if self.use_environment {
            builder = builder.add_source(
                config::Environment::with_prefix("CHARM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config_path: None,
            use_environment: true,
        }
    }

    /// Load with the default search and environment overrides
    pub fn load() -> Result<Config, ConfigError> {
        Config::builder().build()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_depth == 0 {
            return Err(ConfigError::Invalid("engine.max_depth must be at least 1".into()));
        }
        if self.engine.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_iterations must be at least 1".into(),
            ));
        }
        if self.engine.max_literal_depth == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_literal_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "charm-config-test-{}-{}.toml",
            std::process::id(),
            contents.len()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::builder()
            .environment(false)
            .config_path(None)
            .build()
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine.max_depth, 64);
        assert!(!config.engine.parallel_loops);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_config(
            r#"
[engine]
max_iterations = 5
parallel_loops = true

[logging]
level = "debug"
"#,
        );

        let config = Config::builder()
            .environment(false)
            .config_path(Some(path.clone()))
            .build()
            .unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(config.engine.max_iterations, 5);
        assert!(config.engine.parallel_loops);
        // Untouched keys keep their defaults
        assert_eq!(config.engine.max_depth, 64);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let path = write_config("[engine]\nmax_depth = 0\n");

        let result = Config::builder()
            .environment(false)
            .config_path(Some(path.clone()))
            .build();
        std::fs::remove_file(path).ok();

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
