use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rcm", version, about = "RCM daemon CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the RCM daemon with config file
    Start {
        #[arg(short, long)]
        config: PathBuf,
    },
}
