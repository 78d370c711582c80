pub mod toml_config;

pub use toml_config::CorrecterConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "urn-correcter")]
#[command(about = "Corrects malformed persistent identifiers of stored objects")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override storage.data_dir from the config
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Override logging.format from the config (compact or json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Validate and report without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Corrects the URN of the object OBJECT_ID
    Correct {
        /// Object id, e.g. mir_mods_00000001
        object_id: String,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔並套用命令列覆蓋
    pub fn resolve(&self) -> Result<CorrecterConfig> {
        let mut config = match &self.config {
            Some(path) => CorrecterConfig::from_file(path)?,
            None => CorrecterConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        Ok(config)
    }
}
