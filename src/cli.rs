use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "cors-relay")]
#[command(about = "Reverse proxy that spoofs origin headers and opens CORS for one upstream")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upstream base URL
    #[arg(short, long)]
    pub target: Option<String>,

    /// Origin presented to the upstream
    #[arg(short, long)]
    pub origin: Option<String>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            target: self.target.clone(),
            origin: self.origin.clone(),
        }
    }
}
