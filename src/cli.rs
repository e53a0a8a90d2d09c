use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::server::{PagePolicy, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};

#[derive(Parser)]
#[command(name = "pagepick")]
#[command(about = "Pick pages out of a PDF: HTTP split service, MCP server and CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP split service
    Serve(ServeArgs),

    /// Run as MCP server over stdio
    Mcp,

    /// Extract page ranges to a new PDF
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Page ranges (e.g., "1,3,5-7"); pages are written in ascending order
        pages: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the shortest range form of a page list
    Normalize {
        /// Page ranges (e.g., "3,1,2,7-5")
        text: String,
    },

    /// Interactively pick pages from a PDF, reading commands from stdin
    Select {
        /// PDF file to pick pages from
        path: PathBuf,

        /// Write a PNG thumbnail per rendered page into this directory
        #[arg(long)]
        thumbnails: Option<PathBuf>,

        /// Thumbnail scale relative to the page size in points
        #[arg(long, default_value = "0.25")]
        scale: f32,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "PAGEPICK_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "PAGEPICK_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Reject requests naming pages the document does not have instead of skipping them
    #[arg(long, env = "PAGEPICK_STRICT_PAGES")]
    pub strict_pages: bool,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        ServerConfig {
            addr: args.addr,
            max_upload_bytes: args.max_upload_bytes,
            policy: if args.strict_pages {
                PagePolicy::Strict
            } else {
                PagePolicy::Permissive
            },
        }
    }
}
