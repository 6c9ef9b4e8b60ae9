use clap::{Parser, Subcommand};
use iroh::EndpointId;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "balloon")]
#[command(about = "Take turns pumping a shared balloon. Don't be the one who pops it.")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a room and wait for the other players
    Host {
        /// Match settings (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Player name
        #[arg(short, long, default_value = "host")]
        name: String,
    },
    /// Join a room by its host's endpoint ID
    Join {
        /// Endpoint ID printed by the host
        host: EndpointId,

        /// Match settings (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Player name
        #[arg(short, long, default_value = "guest")]
        name: String,
    },
}

impl Command {
    pub fn config(&self) -> Option<&Path> {
        match self {
            Command::Host { config, .. } | Command::Join { config, .. } => config.as_deref(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Host { name, .. } | Command::Join { name, .. } => name,
        }
    }
}
