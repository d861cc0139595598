//! Config path and argument lookup for the binaries

use std::path::PathBuf;

/// Which configuration file a binary reads
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// `config/terminal_config.yaml`, overridable with `TERMINAL_CONFIG_PATH`
    Terminal,
    /// Explicit path, overridable with `CONFIG_PATH`
    Custom(String),
}

impl ConfigType {
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Terminal => "config/terminal_config.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Terminal => "TERMINAL_CONFIG_PATH",
            ConfigType::Custom(_) => "CONFIG_PATH",
        }
    }

    /// Path from `value` when it is set and non-blank, else the default
    fn resolve(&self, value: Option<String>) -> PathBuf {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.default_path().to_string())
            .into()
    }
}

/// Config path from the environment variable for `config_type`, else its default
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    config_type.resolve(std::env::var(config_type.env_var_name()).ok())
}

/// Command line arguments without the program name
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
