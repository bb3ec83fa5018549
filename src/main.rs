//! CLI entry point for amelie

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "amelie")]
#[command(version)]
#[command(about = "A minimal markdown blog server", long_about = None)]
struct Cli {
    /// Content directory holding config/, blog/, page/ and static/
    #[arg(short, long, global = true, env = "AM_FILEPATH", default_value = ".")]
    root: PathBuf,

    /// Disable syntax highlighting of code blocks
    #[arg(long, global = true)]
    no_highlight: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "AM_PORT", default_value = "80")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "0.0.0.0")]
        ip: String,
    },

    /// List site content
    List {
        /// Type of content to list (post, page)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Load every post and page and report the ones that fail
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "amelie=debug,tower_http=debug,info"
    } else {
        "amelie=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut app = amelie::Amelie::new(&cli.root);
    if cli.no_highlight {
        app = app.with_highlight_theme(None);
    }

    match cli.command {
        Commands::Serve { port, ip } => {
            tracing::info!("Starting server at http://{}:{}", ip, port);
            amelie::server::start(&app, &ip, port).await?;
        }

        Commands::List { r#type } => {
            amelie::commands::list::run(&app, &r#type).await?;
        }

        Commands::Check => {
            amelie::commands::check::run(&app).await?;
        }
    }

    Ok(())
}
