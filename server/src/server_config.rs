use gridlock_common::config::{ConfigManager, FileContentConfigProvider, VerifierConfig, YamlConfigSerializer};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "gridlock_verifier.yaml";
pub const LOG_PREFIX: &str = "Verifier";

pub type VerifierConfigManager =
    ConfigManager<FileContentConfigProvider, VerifierConfig, YamlConfigSerializer>;

fn default_config_path() -> String {
    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        return exe_dir
            .join(DEFAULT_CONFIG_FILE_NAME)
            .to_string_lossy()
            .into_owned();
    }
    DEFAULT_CONFIG_FILE_NAME.to_string()
}

/// Config from `path`, or from the file next to the executable. A missing
/// file yields the defaults.
pub fn get_config_manager(path: Option<&str>) -> VerifierConfigManager {
    match path {
        Some(path) => ConfigManager::from_yaml_file(path),
        None => ConfigManager::from_yaml_file(&default_config_path()),
    }
}

/// `--use-log-prefix` wins over the configured prefix, which wins over none.
pub fn resolve_log_prefix(use_log_prefix: bool, config: &VerifierConfig) -> Option<String> {
    if use_log_prefix {
        Some(LOG_PREFIX.to_string())
    } else {
        config.log_prefix.clone()
    }
}
