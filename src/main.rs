use anyhow::{Context, Result};
use chunkscribe::app::run_transcribe_command;
use chunkscribe::cli::{Cli, Commands, ConfigAction};
use chunkscribe::config::Config;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "chunkscribe",
                &mut std::io::stdout(),
            );
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &cli)?;
        }
        None => {
            let Some(input) = cli.input.clone() else {
                Cli::command().print_help()?;
                anyhow::bail!("No audio file given");
            };
            let config = load_config(&cli)?;
            let quiet = cli.quiet || (!std::io::stderr().is_terminal() && cli.verbose == 0);
            run_transcribe_command(config, input, quiet).await?;
        }
    }

    Ok(())
}

/// Route `log` output to stderr.
///
/// `-v` enables info, `-vv` debug; `RUST_LOG` takes precedence when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(verbose > 1)
        .init();
}

/// Load configuration from file, environment and command line.
///
/// Priority order (highest first):
/// 1. Command-line flags
/// 2. CHUNKSCRIBE_* environment variables
/// 3. Config file (--config, or ~/.config/chunkscribe/config.toml)
/// 4. Built-in defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = file_config(cli)?.with_env_overrides()?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn file_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config)
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = file_config(cli)?.with_env_overrides()?;
            print!("{}", config.to_toml_string()?);
        }
        ConfigAction::Path => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("{}", "(file does not exist, using defaults)".dimmed());
            }
        }
    }
    Ok(())
}
