mod cli;
mod commands;
mod mcp;
mod page_range;
mod pdf;
mod selection;
mod server;
mod view;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the MCP transport and command output.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            server::serve(args.into()).await?;
        }
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Extract {
            path,
            pages,
            output,
        } => {
            commands::extract::run(&path, &pages, &output)?;
        }
        Commands::Normalize { text } => {
            commands::normalize::run(&text)?;
        }
        Commands::Select {
            path,
            thumbnails,
            scale,
        } => {
            commands::select::run(&path, thumbnails.as_deref(), scale).await?;
        }
    }

    Ok(())
}
