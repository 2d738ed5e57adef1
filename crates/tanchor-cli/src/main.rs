//! Transparency Anchor CLI
//!
//! Command-line interface for creating, publishing and verifying anchors

use clap::{Parser, Subcommand};
use tanchor_core::logging_facility::init::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tanchor")]
#[command(about = "Transparency anchor - commit registry and event-chain state to public targets", long_about = None)]
struct Cli {
    /// SQLite database path (overrides TANCHOR_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Emit JSON logs on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Snapshot upstream state into a new anchor and publish it
    Run(commands::anchor::RunArgs),
    /// Publish an existing anchor to a target
    Publish(commands::anchor::PublishArgs),
    /// Record a confirmation obtained out of band
    Confirm(commands::anchor::ConfirmArgs),
    /// Print one anchor
    Get(commands::history::GetArgs),
    /// Print the most recent anchor
    Latest,
    /// Anchor history, newest first
    List(commands::history::ListArgs),
    /// Check whether a combined root hash was anchored
    Verify(commands::history::VerifyArgs),
    /// List enabled publish targets
    Targets,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match commands::AppContext::open(cli.db.as_deref()) {
        Ok(app) => {
            let result = match cli.command {
                Commands::Run(args) => commands::anchor::run(&app, args).await,
                Commands::Publish(args) => commands::anchor::publish(&app, args).await,
                Commands::Confirm(args) => commands::anchor::confirm(&app, args).await,
                Commands::Get(args) => commands::history::get(&app, args),
                Commands::Latest => commands::history::latest(&app),
                Commands::List(args) => commands::history::list(&app, args),
                Commands::Verify(args) => commands::history::verify(&app, args),
                Commands::Targets => commands::history::targets(&app),
            };
            app.engine.lifecycle().flush_audit().await;
            result
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
