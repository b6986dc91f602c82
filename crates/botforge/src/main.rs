// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Botforge - a multi-tenant conversational bot platform.
//!
//! This is the binary entry point for the Botforge service.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;
mod status;

/// Botforge - a multi-tenant conversational bot platform.
#[derive(Parser, Debug)]
#[command(name = "botforge", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot platform: workers, pipeline, and gateway.
    Serve,
    /// Query a running instance for bot health and status.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match botforge_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            botforge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config) => {
            match toml_render(&config) {
                Ok(rendered) => {
                    println!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        None => {
            println!("botforge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("botforge: {e}");
        std::process::exit(1);
    }
}

fn toml_render(
    config: &botforge_config::BotforgeConfig,
) -> Result<String, botforge_core::BotforgeError> {
    toml::to_string_pretty(config)
        .map_err(|e| botforge_core::BotforgeError::Internal(format!("config render failed: {e}")))
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config =
            botforge_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.service.name, "botforge");
    }

    #[test]
    fn rendered_config_is_valid_toml() {
        let config =
            botforge_config::load_and_validate().expect("default config should be valid");
        let rendered = super::toml_render(&config).expect("config should render");
        assert!(rendered.contains("[service]"));
        // the printed config must load back unchanged
        let reloaded = botforge_config::load_and_validate_str(&rendered)
            .expect("rendered config should parse");
        assert_eq!(reloaded.gateway.port, config.gateway.port);
    }
}
