use anyhow::Result;
use clap::Parser;
use std::path::Path;

use cargo_liquid::cli::commands::{BuildCommand, Command, NewCommand};
use cargo_liquid::cli::{Cli, Commands};
use cargo_liquid::{init_telemetry, LiquidConfig};

fn main() -> Result<()> {
    let Cli::Liquid(cli) = Cli::parse();

    if let Err(e) = LiquidConfig::load_env_file() {
        eprintln!("warning: ignoring unreadable .env file: {e}");
    }

    match cli.command {
        Commands::Build(args) => {
            let contract_dir = match args.manifest_path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let mut config = LiquidConfig::load(contract_dir)?;
            if args.log_json {
                config.observability.json_logs = true;
            }
            init_telemetry(args.verbosity.verbosity(), &config.observability)?;

            let command = BuildCommand::new(&args, config)?;
            tokio::runtime::Runtime::new()?.block_on(async { command.execute().await })
        }
        Commands::New(args) => {
            let config = LiquidConfig::load(Path::new("."))?;
            init_telemetry(None, &config.observability)?;

            let command = NewCommand::new(args.name, args.target_dir).with_force(args.force);
            tokio::runtime::Runtime::new()?.block_on(async { command.execute().await })
        }
    }
}
