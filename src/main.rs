use anyhow::Result;
use clap::{Parser, Subcommand};

use churnboard::cli::{self, FilterArgs};
use churnboard::config;

#[derive(Debug, Parser)]
#[command(name = "churnboard")]
#[command(about = "Customer churn analytics dashboard for the terminal")]
struct App {
    /// Disable ANSI colours
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Refresh every dataset once and print the dashboard
    Show {
        /// Customer segment (default: first option)
        #[arg(long)]
        segment: Option<String>,
        /// Internet service (default: first option)
        #[arg(long)]
        service: Option<String>,
        /// Contract type (default: first option)
        #[arg(long)]
        contract: Option<String>,
        /// Output format: table or json (default from config)
        #[arg(long)]
        format: Option<String>,
    },
    /// Change filters at a prompt and refresh on `apply`
    Interactive,
    /// List the filter values the backend accepts
    Filters {
        /// Output format: table or json (default from config)
        #[arg(long)]
        format: Option<String>,
    },
    /// Check config files, backend reachability and the refresh log
    Health,
    /// Summarise logged refreshes
    History {
        /// Only include the last N refreshes
        #[arg(long)]
        limit: Option<usize>,
        /// Output format: table or json (default from config)
        #[arg(long)]
        format: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default ~/.churnboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `backend.url http://host:8000`
    Set { key: String, value: String },
    /// Restore the default configuration
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    if app.no_color || !cfg.display.color {
        colored::control::set_override(false);
    }

    match app.command {
        Commands::Show {
            segment,
            service,
            contract,
            format,
        } => {
            let filters = FilterArgs {
                segment,
                service,
                contract,
            };
            let fmt = cli::resolve_format(format.as_deref(), &cfg);
            cli::run_show(&cfg, &filters, fmt)
        }
        Commands::Interactive => cli::run_interactive(&cfg),
        Commands::Filters { format } => {
            let fmt = cli::resolve_format(format.as_deref(), &cfg);
            cli::run_filters(&cfg, fmt)
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::History { limit, format } => {
            let fmt = cli::resolve_format(format.as_deref(), &cfg);
            cli::run_history(&cfg, limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
