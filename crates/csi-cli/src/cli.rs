use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "csi")]
#[command(about = "CodeSystem Import Engine — drive a CodeSystem/$import batch")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// PostgreSQL connection URL (overrides CSI_DATABASE_URL)
    #[arg(long, global = true, env = "CSI_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Log level passed to the tracing env-filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one CodeSystem/$import batch from a JSON file
    Import(ImportArgs),
    /// Create the engine's tables if they do not already exist
    Migrate,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Path to a JSON batch file: {"system": "...", "concept": [...], "property": [...]}
    #[arg(long)]
    pub file: String,

    /// Confirms the caller holds elevated privilege required for this operation
    #[arg(long)]
    pub privileged: bool,
}
