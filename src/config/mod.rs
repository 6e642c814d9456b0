#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{Language, Variant};
#[cfg(feature = "cli")]
use crate::utils::{error::Result, validation::Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use cli::PanelCommand;
#[cfg(feature = "cli")]
use toml_config::{PanelConfig, BACKEND_FIREBASE};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "iot-panel")]
#[command(about = "Home-automation panel with voice control for a curtain actuator")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Actuator model: three-level or binary
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Recognition language: vi-VN or en-US
    #[arg(long)]
    pub language: Option<Language>,

    /// Realtime database URL; implies the firebase backend
    #[arg(long)]
    pub store_url: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: PanelCommand,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the config file (or defaults), applies flag overrides and
    /// validates the result.
    pub fn resolve(&self) -> Result<PanelConfig> {
        let mut config = match &self.config {
            Some(path) => PanelConfig::from_file(path)?,
            None => PanelConfig::default(),
        };

        if let Some(variant) = self.variant {
            config.panel.variant = variant;
        }
        if let Some(language) = self.language {
            config.panel.language = language;
        }
        if let Some(url) = &self.store_url {
            config.store.backend = BACKEND_FIREBASE.to_string();
            config.store.url = Some(url.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
