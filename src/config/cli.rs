use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

use super::{ConfigError, Settings};

/// Command-line arguments for the Vitrina binary.
#[derive(Debug, Parser)]
#[command(name = "vitrina", version, about = "Vitrina catalog service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VITRINA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Vitrina HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the shared invalidation secret.
    #[arg(
        long = "invalidate-token",
        env = "VITRINA_INVALIDATE_TOKEN",
        value_name = "SECRET",
        hide_env_values = true
    )]
    pub invalidate_token: Option<String>,
}

/// Parse CLI arguments and load the layered configuration they select.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli = CliArgs::parse();
    let overrides = match &cli.command {
        Some(Command::Serve(args)) => args.overrides.clone(),
        None => ServeOverrides::default(),
    };
    let settings = super::load(cli.config_file.as_ref(), &overrides)?;
    Ok((cli, settings))
}
