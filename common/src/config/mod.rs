mod config_content_provider;
mod config_manager;
mod config_serializer;
mod validate;
mod verifier_config;

pub use config_content_provider::{
    ConfigContentProvider, FileContentConfigProvider, InMemoryConfigProvider,
};
pub use config_manager::ConfigManager;
pub use config_serializer::{ConfigSerializer, YamlConfigSerializer};
pub use validate::Validate;
pub use verifier_config::VerifierConfig;
